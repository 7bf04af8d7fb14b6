//! Hearth error types.
//!
//! Mirrors the shape of `specs::error` (one variant per failure kind, all
//! folded into a single enum) but expressed with `thiserror` the way the
//! rest of the retrieval pack does it, rather than the teacher's hand-rolled
//! `Display`/`std::error::Error` impls.

use crate::entity::Entity;

/// Errors surfaced by the reflection facility and the checked ECS entry
/// points (`try_insert`, `try_push_back`, checked `get`/`erase`/`replace`).
///
/// See spec §7 for the full trigger/handling table this enum is grounded
/// on; the unchecked entry points (`get`, `erase`, `replace` on
/// [`crate::component_set::ComponentSet`]) remain undefined-behavior-on-misuse
/// by design and do not return this type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `any::cast`, `invoke`, `construct` or message dispatch hit an
    /// incompatible type after exhausting the parent/conversion chain.
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        /// The type that was required.
        expected: &'static str,
        /// The type that was actually present.
        found: &'static str,
    },

    /// A checked accessor was used on an entity absent from the set.
    #[error("entity {entity:?} is not present in this set")]
    MissingEntity {
        /// The entity that was looked up.
        entity: Entity,
    },

    /// `try_insert`/`try_push_back` found the entity already present.
    #[error("entity {entity:?} is already present in this set")]
    DuplicateInsert {
        /// The entity that was already present.
        entity: Entity,
    },

    /// Sorting/collecting a fixed-storage component, or swapping a locked
    /// component.
    #[error("operation `{operation}` is not permitted on a {reason}")]
    OrderViolation {
        /// The operation that was attempted (`"sort"`, `"collect"`, `"swap"`, ...).
        operation: &'static str,
        /// Why it was rejected (`"fixed-storage component"`, `"locked component"`).
        reason: &'static str,
    },

    /// A component constructor panicked/returned an error during
    /// `emplace`/`push_back`. The provisional entity-set entry has already
    /// been rolled back by the time this is raised.
    #[error("constructor for component `{component}` failed: {message}")]
    ConstructorFailure {
        /// The component type whose constructor failed.
        component: &'static str,
        /// A human-readable message describing the failure.
        message: String,
    },

    /// `enable()` on an already-enabled plugin, or `disable()` on an
    /// already-disabled one.
    #[error("plugin `{name}` is already {state}")]
    PluginTransition {
        /// The plugin's registered name.
        name: String,
        /// The state it was already in (`"enabled"`/`"disabled"`).
        state: &'static str,
    },

    /// A plugin's `on_enable` subscriber vetoed the transition or panicked.
    #[error("plugin `{name}` failed to enable: {message}")]
    PluginUserError {
        /// The plugin's registered name.
        name: String,
        /// A human-readable message describing the failure.
        message: String,
    },

    /// `type_info::reflect::<T>()` (or `reflect_as`) was called with a name
    /// that is already registered to a different type.
    #[error("type name `{name}` is already registered")]
    RegistryConflict {
        /// The name that collided.
        name: String,
    },
}

/// Convenience alias for fallible hearth operations.
pub type Result<T> = std::result::Result<T, Error>;
