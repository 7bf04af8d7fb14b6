//! The world: per-type component-set ownership and entity lifecycle.
//! §4.7 of the core runtime spec, plus the `[SUPPLEMENT]` convenience API
//! documented in SPEC_FULL.md (`create_entity`/`is_alive`/`entities`).
//!
//! Grounded on `amethyst-specs`' `World`, generalized from its two
//! concerns — a generic `Resources` map (`shred`, excluded per
//! SPEC_FULL.md's dropped-dependency notes, since this crate has no
//! generic resource system beyond component storage) and entity lifecycle
//! (`world::entity::Allocator`) — into a single `TypeId`-keyed map of
//! `Box<dyn AnyComponentSet>` plus a much simpler allocator: spec §5
//! forbids internal synchronization in the ECS core, so there is no
//! atomic/deferred allocation split here, unlike the teacher's
//! `allocate`/`allocate_atomic`/`merge` trio.

use std::any::TypeId;
use std::collections::HashMap;

use crate::component::Component;
use crate::component_set::{AnyComponentSet, ComponentSet};
use crate::entity::Entity;

/// Recycles freed indices with a bumped generation. `slots[i]` holds the
/// entity value currently assigned to index `i`, whether or not that index
/// is alive; an index is alive exactly when its slot's bits equal an
/// entity callers actually hold, which `is_alive` checks directly rather
/// than tracking a separate liveness bit.
#[derive(Default)]
struct Allocator {
    slots: Vec<Entity>,
    free: Vec<u32>,
}

impl Allocator {
    fn create(&mut self) -> Entity {
        match self.free.pop() {
            Some(index) => self.slots[index as usize],
            None => {
                let index = self.slots.len() as u32;
                let entity = Entity::new(index, 0);
                self.slots.push(entity);
                entity
            }
        }
    }

    fn destroy(&mut self, e: Entity) {
        let index = e.index() as usize;
        self.slots[index] = e.bump_generation();
        self.free.push(e.index());
    }

    fn is_alive(&self, e: Entity) -> bool {
        !e.is_tombstone()
            && self
                .slots
                .get(e.index() as usize)
                .is_some_and(|&slot| slot == e)
    }

    fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        let free: std::collections::HashSet<u32> = self.free.iter().copied().collect();
        self.slots
            .iter()
            .enumerate()
            .filter(move |(i, _)| !free.contains(&(*i as u32)))
            .map(|(_, &e)| e)
    }
}

/// Owns one [`ComponentSet<T>`] per registered component type plus the
/// entity allocator, and keeps the two in lock-step: destroying an entity
/// erases it from every storage that holds it.
#[derive(Default)]
pub struct World {
    alloc: Allocator,
    stores: HashMap<TypeId, Box<dyn AnyComponentSet>, ahash::RandomState>,
}

impl World {
    pub fn new() -> Self {
        World::default()
    }

    /// Allocates a new entity, reusing a freed index with a bumped
    /// generation when one is available.
    pub fn create(&mut self) -> Entity {
        let entity = self.alloc.create();
        log::trace!("created entity {entity:?}");
        entity
    }

    /// Erases `e` from every component type it's currently present in,
    /// then releases its index back to the allocator with a bumped
    /// generation.
    pub fn destroy(&mut self, e: Entity) {
        if !self.alloc.is_alive(e) {
            log::warn!("destroy called on a dead or unknown entity {e:?}");
            return;
        }
        for store in self.stores.values_mut() {
            if store.contains(e) {
                store.erase(e);
            }
        }
        self.alloc.destroy(e);
        log::trace!("destroyed entity {e:?}");
    }

    pub fn is_alive(&self, e: Entity) -> bool {
        self.alloc.is_alive(e)
    }

    /// Every currently-live entity, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alloc.iter_alive()
    }

    /// The component set for `T`, creating it empty on first access.
    pub fn storage<T: Component + Send>(&mut self) -> &mut ComponentSet<T> {
        self.stores
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentSet::<T>::new()))
            .as_any_mut()
            .downcast_mut::<ComponentSet<T>>()
            .expect("component storage keyed under the wrong TypeId")
    }

    /// As [`World::storage`], but read-only and `None` if `T` has never
    /// been registered — used by read-only query contexts, which must not
    /// silently create storage for a type nobody has written yet.
    pub fn storage_ref<T: Component + Send>(&self) -> Option<&ComponentSet<T>> {
        self.stores
            .get(&TypeId::of::<T>())
            .map(|store| {
                store
                    .as_any()
                    .downcast_ref::<ComponentSet<T>>()
                    .expect("component storage keyed under the wrong TypeId")
            })
    }

    /// Starts building an entity with a chain of `.with::<T>(value)` calls,
    /// per SPEC_FULL.md's `[SUPPLEMENT]` convenience API.
    pub fn create_entity(&mut self) -> EntityBuilder<'_> {
        let entity = self.create();
        EntityBuilder {
            world: self,
            entity,
        }
    }
}

/// Accumulates components onto a freshly created entity. Grounded on
/// `amethyst-specs`' `world::EntityBuilder`/`Builder` pair, minus the
/// rollback-on-drop safety net: this crate's `.with` calls cannot fail
/// (storage creation is infallible), so there is no partially-built state
/// to roll back.
pub struct EntityBuilder<'a> {
    world: &'a mut World,
    entity: Entity,
}

impl<'a> EntityBuilder<'a> {
    /// Attaches `value` as the entity's `T` component.
    pub fn with<T: Component + Send>(self, value: T) -> Self {
        self.world.storage::<T>().emplace(self.entity, value);
        self
    }

    /// Finishes construction, returning the built entity.
    pub fn build(self) -> Entity {
        self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    struct Pos(i32);
    impl Component for Pos {}

    #[derive(Clone, PartialEq, Debug)]
    struct Vel(i32);
    impl Component for Vel {}

    #[test]
    fn create_then_destroy_frees_the_index() {
        let mut world = World::new();
        let e = world.create();
        assert!(world.is_alive(e));
        world.destroy(e);
        assert!(!world.is_alive(e));
    }

    #[test]
    fn destroyed_index_is_reused_with_bumped_generation() {
        let mut world = World::new();
        let first = world.create();
        world.destroy(first);
        let second = world.create();
        assert_eq!(first.index(), second.index());
        assert_ne!(first.generation(), second.generation());
        assert!(!world.is_alive(first));
        assert!(world.is_alive(second));
    }

    #[test]
    fn destroy_removes_entity_from_every_storage() {
        let mut world = World::new();
        let e = world.create();
        world.storage::<Pos>().emplace(e, Pos(1));
        world.storage::<Vel>().emplace(e, Vel(2));
        world.destroy(e);
        assert!(!world.storage::<Pos>().contains(e));
        assert!(!world.storage::<Vel>().contains(e));
    }

    #[test]
    fn storage_ref_is_none_for_untouched_types() {
        let world = World::new();
        assert!(world.storage_ref::<Pos>().is_none());
    }

    #[test]
    fn entity_builder_attaches_components() {
        let mut world = World::new();
        let e = world.create_entity().with(Pos(1)).with(Vel(2)).build();
        assert_eq!(world.storage::<Pos>().get(e), Some(&Pos(1)));
        assert_eq!(world.storage::<Vel>().get(e), Some(&Vel(2)));
    }

    #[test]
    fn entities_lists_only_live_entities() {
        let mut world = World::new();
        let a = world.create();
        let b = world.create();
        world.destroy(a);
        let live: Vec<_> = world.entities().collect();
        assert_eq!(live, vec![b]);
    }
}
