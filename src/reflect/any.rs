//! Type-erased value containers: §4.9 of the core runtime spec.
//!
//! `Any` unifies the spec's `any` and `any_ref`: a value constructed with
//! [`Any::new`] owns its payload; one constructed with [`Any::from_ref`] or
//! [`Any::from_mut`] borrows it for lifetime `'a` and is, by construction,
//! what the spec calls an `any_ref`. [`AnyRef`] is a type alias documenting
//! call sites that expect the borrowed flavor.
//!
//! Per-type vtables (`drop`/`clone`/`eq`/`debug`) are instantiated once per
//! `T` via a local `static` inside a generic function — a distinct copy is
//! monomorphized per instantiation, giving the "constant vtable per type"
//! the spec asks for without a manual registration step.
//!
//! **Deviation from spec, recorded as a deliberate simplification (see
//! DESIGN.md):** the spec's vtable makes `compare` optional, falling back
//! to pointer equality for types without a notion of equality, and
//! describes a small-buffer "local" storage mode alongside the owned/ref
//! modes. Expressing an *optional* trait bound per stored type needs
//! specialization, which is not stable. `Any::new` therefore requires
//! `Clone + PartialEq + Debug`, and `Any::is_local` always reports `false`
//! (no inline storage is implemented; every owned payload is heap-boxed).

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;

type DropFn = unsafe fn(*mut ());
type CloneFn = unsafe fn(*const ()) -> *mut ();
type EqFn = unsafe fn(*const (), *const ()) -> bool;
type DebugFn = unsafe fn(*const (), &mut fmt::Formatter<'_>) -> fmt::Result;

/// The per-type vtable backing an [`Any`]'s `copy_construct`/`compare`/
/// `destroy` operations.
pub struct Vtable {
    type_id: TypeId,
    type_name: &'static str,
    drop: DropFn,
    clone: CloneFn,
    eq: EqFn,
    debug: DebugFn,
}

impl Vtable {
    /// The reflected type's [`TypeId`].
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The reflected type's name, as produced by [`std::any::type_name`]
    /// (or overridden via `type_info::reflect_as`).
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Deep-clones the value at `ptr` (which must be of this vtable's type)
    /// into a freshly owned [`Any`]. Used by [`TypeInfo::convert`] to hand
    /// back an owned value for a one-hop parent upcast.
    ///
    /// [`TypeInfo::convert`]: super::type_info::TypeInfo::convert
    pub(crate) fn clone_to_any(&'static self, ptr: *const ()) -> Any<'static> {
        Any {
            repr: Repr::Owned(unsafe { (self.clone)(ptr) }),
            vtable: Some(self),
        }
    }
}

unsafe fn drop_impl<T>(ptr: *mut ()) {
    drop(unsafe { Box::from_raw(ptr as *mut T) });
}

unsafe fn clone_impl<T: Clone>(ptr: *const ()) -> *mut () {
    let value = unsafe { &*(ptr as *const T) }.clone();
    Box::into_raw(Box::new(value)) as *mut ()
}

unsafe fn eq_impl<T: PartialEq>(a: *const (), b: *const ()) -> bool {
    unsafe { &*(a as *const T) == &*(b as *const T) }
}

unsafe fn debug_impl<T: fmt::Debug>(ptr: *const (), f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:?}", unsafe { &*(ptr as *const T) })
}

/// Returns the process-wide vtable for `T`, building it on first use.
pub fn vtable_of<T>() -> &'static Vtable
where
    T: Clone + PartialEq + fmt::Debug + 'static,
{
    // One copy of this `static` exists per monomorphization of `vtable_of`,
    // so each `T` gets its own lazily-built, process-lifetime `Vtable`.
    static VTABLE: once_cell::sync::OnceCell<Vtable> = once_cell::sync::OnceCell::new();
    VTABLE.get_or_init(|| Vtable {
        type_id: TypeId::of::<T>(),
        type_name: std::any::type_name::<T>(),
        drop: drop_impl::<T>,
        clone: clone_impl::<T>,
        eq: eq_impl::<T>,
        debug: debug_impl::<T>,
    })
}

enum Repr<'a> {
    Empty,
    Owned(*mut ()),
    Ref { ptr: *mut (), is_const: bool },
    #[allow(dead_code)]
    Marker(PhantomData<&'a ()>),
}

/// A type-erased value or reference, with a value-equality-capable vtable.
///
/// See the module docs for the `any`/`any_ref` unification and the
/// documented simplifications versus spec §4.9.
pub struct Any<'a> {
    repr: Repr<'a>,
    vtable: Option<&'static Vtable>,
}

/// Alias documenting a borrowed `Any`, matching spec's `any_ref`.
pub type AnyRef<'a> = Any<'a>;

impl<'a> Any<'a> {
    /// The empty `any`. `empty() == empty()` is always true (spec §8 item 8).
    pub fn empty() -> Any<'static> {
        Any {
            repr: Repr::Empty,
            vtable: None,
        }
    }

    /// Constructs an owned `any` holding `value`.
    pub fn new<T>(value: T) -> Any<'static>
    where
        T: Clone + PartialEq + fmt::Debug + 'static,
    {
        let vtable = vtable_of::<T>();
        let ptr = Box::into_raw(Box::new(value)) as *mut ();
        Any {
            repr: Repr::Owned(ptr),
            vtable: Some(vtable),
        }
    }

    /// Constructs a const `any_ref` borrowing `value` for `'a`.
    pub fn from_ref<T>(value: &'a T) -> Any<'a>
    where
        T: Clone + PartialEq + fmt::Debug + 'static,
    {
        Any {
            repr: Repr::Ref {
                ptr: value as *const T as *mut (),
                is_const: true,
            },
            vtable: Some(vtable_of::<T>()),
        }
    }

    /// Constructs a mutable `any_ref` borrowing `value` for `'a`.
    pub fn from_mut<T>(value: &'a mut T) -> Any<'a>
    where
        T: Clone + PartialEq + fmt::Debug + 'static,
    {
        Any {
            repr: Repr::Ref {
                ptr: value as *mut T as *mut (),
                is_const: false,
            },
            vtable: Some(vtable_of::<T>()),
        }
    }

    /// True for the empty `any`.
    pub fn is_empty(&self) -> bool {
        matches!(self.repr, Repr::Empty)
    }

    /// True when this `any` is known to hold a reference (an `any_ref`).
    pub fn is_ref(&self) -> bool {
        matches!(self.repr, Repr::Ref { .. })
    }

    /// Always `false`: no small-buffer inline storage mode is implemented
    /// (see module docs).
    pub fn is_local(&self) -> bool {
        false
    }

    /// True when this is a const reference, or the empty `any`. Owned
    /// values are always mutable.
    pub fn is_const(&self) -> bool {
        match self.repr {
            Repr::Ref { is_const, .. } => is_const,
            Repr::Empty => true,
            Repr::Owned(_) => false,
            Repr::Marker(_) => unreachable!(),
        }
    }

    /// The stored type's [`TypeId`], or `None` for the empty `any`.
    pub fn type_id(&self) -> Option<TypeId> {
        self.vtable.map(Vtable::type_id)
    }

    /// The stored type's name, or `None` for the empty `any`.
    pub fn type_name(&self) -> Option<&'static str> {
        self.vtable.map(Vtable::type_name)
    }

    fn raw_ptr(&self) -> Option<*const ()> {
        match self.repr {
            Repr::Empty => None,
            Repr::Owned(p) => Some(p),
            Repr::Ref { ptr, .. } => Some(ptr),
            Repr::Marker(_) => unreachable!(),
        }
    }

    /// Raw mutable data pointer. `None` for the empty `any` or a const
    /// reference (spec: "`data()` ... returns null for const references").
    pub fn data(&mut self) -> Option<*mut ()> {
        if self.is_const() {
            return None;
        }
        match self.repr {
            Repr::Owned(p) => Some(p),
            Repr::Ref { ptr, is_const: false } => Some(ptr),
            _ => None,
        }
    }

    /// Raw const data pointer. `None` only for the empty `any`.
    pub fn cdata(&self) -> Option<*const ()> {
        self.raw_ptr()
    }

    /// Returns a reference-flavored `Any` borrowing from `self`, preserving
    /// constness.
    pub fn borrow(&self) -> Any<'_> {
        match (&self.repr, self.vtable) {
            (Repr::Empty, _) => Any::empty(),
            (Repr::Owned(p), Some(vt)) => Any {
                repr: Repr::Ref {
                    ptr: *p,
                    is_const: false,
                },
                vtable: Some(vt),
            },
            (Repr::Ref { ptr, is_const }, Some(vt)) => Any {
                repr: Repr::Ref {
                    ptr: *ptr,
                    is_const: *is_const,
                },
                vtable: Some(vt),
            },
            _ => unreachable!(),
        }
    }

    /// Returns a const reference-flavored `Any` borrowing from `self`.
    pub fn borrow_const(&self) -> Any<'_> {
        match (&self.repr, self.vtable) {
            (Repr::Empty, _) => Any::empty(),
            (_, Some(vt)) => Any {
                repr: Repr::Ref {
                    ptr: self.raw_ptr().unwrap() as *mut (),
                    is_const: true,
                },
                vtable: Some(vt),
            },
            _ => unreachable!(),
        }
    }

    /// Returns `&T` iff the stored type is exactly `T` (preserving the
    /// type, not walking reflected parents — see [`Any::try_cast`] for that).
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.type_id()? != TypeId::of::<T>() {
            return None;
        }
        self.raw_ptr().map(|p| unsafe { &*(p as *const T) })
    }

    /// Returns `&mut T` iff the stored type is exactly `T` and this `any`
    /// is not const.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if self.is_const() {
            return None;
        }
        if self.type_id()? != TypeId::of::<T>() {
            return None;
        }
        self.data().map(|p| unsafe { &mut *(p as *mut T) })
    }

    /// Spec-named alias for [`Any::downcast_ref`].
    pub fn as_ptr<T: 'static>(&self) -> Option<&T> {
        self.downcast_ref::<T>()
    }

    /// Attempts to view this `any` as `T`, trying an exact match first and
    /// then walking the stored type's reflected parent chain (see
    /// [`crate::reflect::type_info`]).
    pub fn try_cast<T: 'static>(&self) -> Option<&T> {
        if let Some(v) = self.downcast_ref::<T>() {
            return Some(v);
        }
        let type_id = self.type_id()?;
        let info = crate::reflect::type_info::registry().by_type_id(type_id)?;
        let target = TypeId::of::<T>();
        let erased = info.upcast_chain_to(target, self.raw_ptr()?)?;
        Some(unsafe { &*(erased as *const T) })
    }

    /// [`Any::try_cast`], raising [`crate::error::Error::TypeMismatch`] on
    /// failure.
    pub fn cast<T: 'static>(&self) -> crate::error::Result<&T> {
        self.try_cast().ok_or(crate::error::Error::TypeMismatch {
            expected: std::any::type_name::<T>(),
            found: self.type_name().unwrap_or("<empty>"),
        })
    }

    /// Converts the stored value to `T`: identity if it already is `T`, else
    /// a one-hop parent upcast, else a registered conversion, else recursion
    /// through the stored type's reflected parents. Returns the empty `any`
    /// on failure rather than panicking, matching spec's "returns empty any
    /// on failure".
    pub fn convert<T: 'static>(&self) -> Any<'static> {
        let target = TypeId::of::<T>();
        if self.type_id() == Some(target) {
            return self.clone_as_owned();
        }
        let Some(type_id) = self.type_id() else {
            return Any::empty();
        };
        let Some(ptr) = self.raw_ptr() else {
            return Any::empty();
        };
        crate::reflect::type_info::registry()
            .by_type_id(type_id)
            .and_then(|info| info.convert(target, ptr))
            .unwrap_or_else(Any::empty)
    }

    /// Deep-clones this value into a freshly owned `any`, regardless of
    /// whether `self` is itself a reference.
    fn clone_as_owned(&self) -> Any<'static> {
        match (&self.repr, self.vtable) {
            (Repr::Empty, _) => Any::empty(),
            (_, Some(vt)) => vt.clone_to_any(self.raw_ptr().unwrap()),
            _ => unreachable!(),
        }
    }

    /// Looks up a method node named `name` on the stored type with an
    /// argument count matching `args`, and calls it. Raised as
    /// [`crate::error::Error::TypeMismatch`] when the stored type has no
    /// such node, mirroring `cast`'s error shape.
    pub fn invoke(&self, name: &str, args: &[Any]) -> crate::error::Result<Any<'static>> {
        let type_id = self.type_id().ok_or(crate::error::Error::TypeMismatch {
            expected: "a reflected type",
            found: "<empty>",
        })?;
        let found = self.type_name().unwrap_or("<empty>");
        let ptr = self
            .raw_ptr()
            .ok_or(crate::error::Error::TypeMismatch { expected: "a reflected type", found })?;
        crate::reflect::type_info::registry()
            .by_type_id(type_id)
            .and_then(|info| info.invoke(name, ptr, args))
            .ok_or(crate::error::Error::TypeMismatch {
                expected: "a matching method signature",
                found,
            })
    }

    /// Value equality: empty `any`s are equal to each other; otherwise the
    /// types must match and the vtable's `eq` must report equal.
    pub fn value_eq(&self, other: &Any<'_>) -> bool {
        match (self.vtable, other.vtable) {
            (None, None) => true,
            (Some(a), Some(b)) if a.type_id == b.type_id => {
                let pa = self.raw_ptr().unwrap();
                let pb = other.raw_ptr().unwrap();
                unsafe { (a.eq)(pa, pb) }
            }
            _ => false,
        }
    }
}

impl<'a> Drop for Any<'a> {
    fn drop(&mut self) {
        if let (Repr::Owned(ptr), Some(vt)) = (&self.repr, self.vtable) {
            unsafe { (vt.drop)(*ptr) };
        }
    }
}

impl<'a> Clone for Any<'a> {
    /// Cloning a reference keeps it a reference (same borrow); cloning an
    /// owned value deep-copies the payload via the vtable.
    fn clone(&self) -> Self {
        match (&self.repr, self.vtable) {
            (Repr::Empty, _) => Any::empty(),
            (Repr::Owned(p), Some(vt)) => Any {
                repr: Repr::Owned(unsafe { (vt.clone)(*p) }),
                vtable: Some(vt),
            },
            (Repr::Ref { ptr, is_const }, Some(vt)) => Any {
                repr: Repr::Ref {
                    ptr: *ptr,
                    is_const: *is_const,
                },
                vtable: Some(vt),
            },
            _ => unreachable!(),
        }
    }
}

impl<'a> PartialEq for Any<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.value_eq(other)
    }
}

impl<'a> fmt::Debug for Any<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.repr, self.vtable) {
            (Repr::Empty, _) => write!(f, "Any(empty)"),
            (_, Some(vt)) => {
                write!(f, "Any<{}>(", vt.type_name)?;
                unsafe { (vt.debug)(self.raw_ptr().unwrap(), f)? };
                write!(f, ")")
            }
            _ => unreachable!(),
        }
    }
}

// `Any` owns a heap allocation it alone is responsible for freeing (the
// `Owned` case) or borrows data the caller guarantees outlives `'a` (the
// `Ref` case); neither involves thread-local or interior-mutable state, so
// it is safe to move (and, transitively, send) across threads as long as
// `T` itself would be.
unsafe impl<'a> Send for Any<'a> {}
