//! # Hearth
//!
//! A single-threaded, sparse-set Entity-Component-System core paired with a
//! type-erased reflection facility, synchronous event dispatch, and a
//! process-wide plugin registry.
//!
//! The ECS half ([`World`], [`ComponentSet`], [`View`], [`Collection`],
//! [`Query`]) is grounded on `specs`' storage/join split, generalized from
//! its masked-bitset storage to packed-entity sparse sets and from its
//! `shred`-driven parallel dispatch to direct, single-threaded borrows —
//! spec §5 rules out internal synchronization in the core, so there is no
//! system scheduler here, only the data structures a caller's own loop
//! drives directly.
//!
//! The reflection half ([`reflect::Any`], [`reflect::TypeInfo`],
//! [`reflect::Registry`]) and the dispatch primitives
//! ([`dispatch::Delegate`], [`dispatch::Event`], [`dispatch::MessageQueue`])
//! have no teacher counterpart; they're built in the same idiom (name-keyed
//! `once_cell`-backed singletons, `thiserror`-driven error reporting) as the
//! ECS core they sit alongside.

pub mod collection;
pub mod component;
pub mod component_set;
pub mod dispatch;
pub mod entity;
pub mod error;
mod page;
pub mod plugin;
pub mod pool;
pub mod query;
pub mod reflect;
pub mod sparse_set;
pub mod view;
pub mod world;

pub use collection::Collection;
pub use component::Component;
pub use component_set::ComponentSet;
pub use entity::Entity;
pub use error::{Error, Result};
pub use query::{Query, QueryResult};
pub use view::View;
pub use world::{EntityBuilder, World};

#[cfg(feature = "derive")]
pub use hearth_derive::Component;
