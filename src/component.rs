//! The [`Component`] trait and the compile-time traits that drive storage
//! policy (§6: "Component traits. Per-type compile-time constants visible
//! to the ECS: `page_size` ... and an optional `is_fixed` marker").

use crate::page::DEFAULT_PAGE_SIZE;

/// A type that can be stored in a [`crate::component_set::ComponentSet`].
///
/// `#[derive(Component)]` (see `hearth-derive`) implements this with the
/// default page size and non-fixed storage; use
/// `#[component(page_size = N)]` / `#[component(fixed)]` to override.
pub trait Component: Sized + 'static {
    /// Page size for this component's pool, in slots. Must be a power of
    /// two. Defaults to [`DEFAULT_PAGE_SIZE`].
    const PAGE_SIZE: usize = DEFAULT_PAGE_SIZE;

    /// When `true`, this component's storage never moves a value once
    /// inserted: `erase` degrades to `fixed_erase`, and it may not take
    /// part in sorting or in a [`crate::collection::Collection`]. Defaults
    /// to `false`.
    const FIXED: bool = false;
}

/// Returns whether `T` is a zero-sized "tag" component, which gets the
/// storage-free pool specialization of §4.2.
#[inline]
pub(crate) const fn is_empty_component<T>() -> bool {
    std::mem::size_of::<T>() == 0
}
