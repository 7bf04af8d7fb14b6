//! Entity-keyed component storage: §4.3 of the core runtime spec.
//!
//! Couples a [`SparseSet`] (entity accounting) with a [`Pool<T>`] (value
//! storage), keeping both in lock-step, and layers five ordered events
//! (`on_create`/`on_modify`/`on_remove`/`on_lock`/`on_enable`) over the
//! mutating operations — grounded on `amethyst-specs`' `Storage` wrapper,
//! which layers masked reads/writes over a raw `UnprotectedStorage`, with
//! the `shrev`-style reader channel swapped for the synchronous
//! [`crate::dispatch::Event`] this crate uses everywhere else.

use crate::component::Component;
use crate::dispatch::Event;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::pool::Pool;
use crate::reflect::Any;
use crate::sparse_set::SparseSet;

/// Entity-keyed storage for a single component type `T`.
pub struct ComponentSet<T: Component> {
    set: SparseSet,
    pool: Pool<T>,
    on_create: Event<Entity>,
    on_modify: Event<Entity>,
    on_remove: Event<Entity>,
    on_lock: Event<(Entity, bool)>,
    on_enable: Event<(Entity, bool)>,
}

impl<T: Component> Default for ComponentSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ComponentSet<T> {
    pub fn new() -> Self {
        ComponentSet {
            set: SparseSet::with_page_size(T::PAGE_SIZE),
            pool: Pool::new(T::PAGE_SIZE),
            on_create: Event::new(),
            on_modify: Event::new(),
            on_remove: Event::new(),
            on_lock: Event::new(),
            on_enable: Event::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn contains(&self, e: Entity) -> bool {
        self.set.contains(e)
    }

    pub fn on_create(&mut self) -> &mut Event<Entity> {
        &mut self.on_create
    }

    pub fn on_modify(&mut self) -> &mut Event<Entity> {
        &mut self.on_modify
    }

    pub fn on_remove(&mut self) -> &mut Event<Entity> {
        &mut self.on_remove
    }

    pub fn on_lock(&mut self) -> &mut Event<(Entity, bool)> {
        &mut self.on_lock
    }

    pub fn on_enable(&mut self) -> &mut Event<(Entity, bool)> {
        &mut self.on_enable
    }

    pub fn get(&self, e: Entity) -> Option<&T> {
        let pos = self.set.find(e)?;
        self.pool.get(pos)
    }

    pub fn get_mut(&mut self, e: Entity) -> Option<&mut T> {
        let pos = self.set.find(e)?;
        self.pool.get_mut(pos)
    }

    /// Constructs `value` for `e`, reusing a free slot if one is available.
    /// Fires `on_create`.
    ///
    /// Undefined (debug-asserted) if `e` is already present.
    pub fn emplace(&mut self, e: Entity, value: T) -> &mut T {
        let pos = self.set.insert(e);
        self.pool.emplace(pos, value);
        self.on_create.dispatch(e);
        self.pool.get_mut(pos).expect("just emplaced")
    }

    /// Checked [`ComponentSet::emplace`].
    pub fn try_emplace(&mut self, e: Entity, value: T) -> Result<&mut T> {
        if self.set.contains(e) {
            return Err(Error::DuplicateInsert { entity: e });
        }
        Ok(self.emplace(e, value))
    }

    /// As [`ComponentSet::emplace`], but always appends rather than reusing
    /// a freed slot (preserves existing sort/collection ordering).
    pub fn push_back(&mut self, e: Entity, value: T) -> &mut T {
        let pos = self.set.push_back(e);
        self.pool.emplace(pos, value);
        self.on_create.dispatch(e);
        self.pool.get_mut(pos).expect("just pushed")
    }

    /// Checked [`ComponentSet::push_back`].
    pub fn try_push_back(&mut self, e: Entity, value: T) -> Result<&mut T> {
        if self.set.contains(e) {
            return Err(Error::DuplicateInsert { entity: e });
        }
        Ok(self.push_back(e, value))
    }

    /// Overwrites `e`'s component with `value`. Fires `on_modify`.
    ///
    /// Undefined (debug-asserted) if `e` is not present.
    pub fn replace(&mut self, e: Entity, value: T) {
        let pos = self.set.find(e).expect("entity not present");
        *self.pool.get_mut(pos).expect("bound to pool") = value;
        self.on_modify.dispatch(e);
    }

    /// Checked [`ComponentSet::replace`].
    pub fn try_replace(&mut self, e: Entity, value: T) -> Result<()> {
        if !self.set.contains(e) {
            return Err(Error::MissingEntity { entity: e });
        }
        self.replace(e, value);
        Ok(())
    }

    /// Applies `f` to `e`'s component in place. Fires `on_modify`.
    pub fn apply<F: FnOnce(&mut T)>(&mut self, e: Entity, f: F) -> Result<()> {
        let pos = self.set.find(e).ok_or(Error::MissingEntity { entity: e })?;
        f(self.pool.get_mut(pos).expect("bound to pool"));
        self.on_modify.dispatch(e);
        Ok(())
    }

    /// Removes `e`'s component. Locked and [`Component::FIXED`] storage
    /// degrade to an in-place tombstone ([`SparseSet::fixed_erase`]);
    /// everything else swaps the last live entity into the freed slot.
    /// `on_remove` fires before either form of removal touches the
    /// storage, so subscribers still observe the about-to-be-removed
    /// value at its original position.
    ///
    /// Undefined (debug-asserted) if `e` is not present.
    pub fn erase(&mut self, e: Entity) {
        let pos = self.set.find(e).expect("entity not present");
        self.on_remove.dispatch(e);
        if T::FIXED || self.pool.is_locked(pos) {
            self.set.fixed_erase(e);
            self.pool.erase(pos);
        } else {
            let last = self.set.len() - 1;
            self.set.erase(e);
            if pos != last {
                self.pool.move_value(pos, last);
            }
            self.pool.pop();
        }
    }

    /// Checked [`ComponentSet::erase`].
    pub fn try_erase(&mut self, e: Entity) -> Result<()> {
        if !self.set.contains(e) {
            return Err(Error::MissingEntity { entity: e });
        }
        self.erase(e);
        Ok(())
    }

    /// Removes tombstones left behind by fixed-storage/locked erases,
    /// compacting the entity set back to a tombstone-free prefix and
    /// physically relocating pool values to match (mirrors
    /// [`SparseSet::pack`]'s own write/read walk so the two stay aligned).
    /// After `pack`, `len() == raw_len()`.
    pub fn pack(&mut self) {
        let raw_len = self.set.raw_len();
        let mut write = 0usize;
        for read in 0..raw_len {
            if self.set.at(read).is_tombstone() {
                continue;
            }
            if write != read {
                self.pool.move_value(write, read);
            }
            write += 1;
        }
        for _ in write..raw_len {
            self.pool.pop();
        }
        self.set.pack();
    }

    /// Raw dense length, including tombstones left by fixed-storage erases.
    /// See [`ComponentSet::pack`].
    pub fn raw_len(&self) -> usize {
        self.set.raw_len()
    }

    pub fn is_locked(&self, e: Entity) -> bool {
        self.set.find(e).is_some_and(|pos| self.pool.is_locked(pos))
    }

    /// Sets the locked flag for `e`. Fires `on_lock` only when the value
    /// actually changes.
    ///
    /// Undefined (debug-asserted) if `e` is not present.
    pub fn set_locked(&mut self, e: Entity, locked: bool) {
        let pos = self.set.find(e).expect("entity not present");
        let prev = self.pool.set_locked(pos, locked);
        if prev != locked {
            self.on_lock.dispatch((e, locked));
        }
    }

    pub fn is_enabled(&self, e: Entity) -> bool {
        self.set.find(e).is_some_and(|pos| self.pool.is_enabled(pos))
    }

    /// Sets the enabled flag for `e`. Fires `on_enable` only when the value
    /// actually changes.
    ///
    /// Undefined (debug-asserted) if `e` is not present.
    pub fn set_enabled(&mut self, e: Entity, enabled: bool) {
        let pos = self.set.find(e).expect("entity not present");
        let prev = self.pool.set_enabled(pos, enabled);
        if prev != enabled {
            self.on_enable.dispatch((e, enabled));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.set.iter()
    }

    pub(crate) fn sparse_set(&self) -> &SparseSet {
        &self.set
    }
}

/// Type-erased bookkeeping surface implemented by every `ComponentSet<T>`,
/// used by [`crate::world::World`] to remove an entity from every
/// component type it might be present in without knowing those types, and
/// to recover the concrete `ComponentSet<T>` from its type-keyed storage map.
pub trait AnyComponentSet: std::any::Any + Send {
    fn contains(&self, e: Entity) -> bool;
    fn erase(&mut self, e: Entity);
    fn len(&self) -> usize;
    fn as_any(&self) -> &dyn std::any::Any;
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

impl<T: Component + Send> AnyComponentSet for ComponentSet<T> {
    fn contains(&self, e: Entity) -> bool {
        ComponentSet::contains(self, e)
    }

    fn erase(&mut self, e: Entity) {
        ComponentSet::erase(self, e)
    }

    fn len(&self) -> usize {
        ComponentSet::len(self)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Type-erased value access, implemented for component types that also
/// satisfy [`crate::reflect::Any`]'s bounds (`Clone + PartialEq + Debug`).
pub trait ReflectableComponentSet: AnyComponentSet {
    fn get_any(&self, e: Entity) -> Option<Any<'_>>;
    fn replace_any(&mut self, e: Entity, value: Any) -> Result<()>;
    fn insert_any(&mut self, e: Entity, value: Any) -> Result<()>;
}

impl<T> ReflectableComponentSet for ComponentSet<T>
where
    T: Component + Send + Clone + PartialEq + std::fmt::Debug,
{
    fn get_any(&self, e: Entity) -> Option<Any<'_>> {
        self.get(e).map(Any::from_ref)
    }

    fn replace_any(&mut self, e: Entity, value: Any) -> Result<()> {
        let expected = std::any::type_name::<T>();
        let value = value
            .downcast_ref::<T>()
            .ok_or(Error::TypeMismatch {
                expected,
                found: value.type_name().unwrap_or("<empty>"),
            })?
            .clone();
        self.try_replace(e, value)
    }

    fn insert_any(&mut self, e: Entity, value: Any) -> Result<()> {
        let expected = std::any::type_name::<T>();
        let found = value.type_name().unwrap_or("<empty>");
        let value = value
            .downcast_ref::<T>()
            .ok_or(Error::TypeMismatch { expected, found })?
            .clone();
        self.try_emplace(e, value)?;
        Ok(())
    }
}
