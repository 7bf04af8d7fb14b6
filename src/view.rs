//! Stateless multi-component projections: §4.4 of the core runtime spec.
//!
//! A [`View`] selects the smallest included component set as its driving
//! set on every call (`for_each`/`get`/`size_hint` each re-derive it; there
//! is no cached state to invalidate), then filters driving-set candidates
//! against the remaining included and excluded sets. Grounded on
//! `amethyst-specs`' `Join` trait — the same "iterate the smallest mask,
//! test membership in the rest" strategy — generalized from `specs`' bitset
//! intersection (which this crate's sparse sets don't maintain) to direct
//! `O(1)` `ComponentSet::contains` checks, and bounded to include/optional
//! arities of 1 through 4 via a local macro rather than true variadic
//! generics.
//!
//! **Deviation from spec, recorded as a deliberate simplification (see
//! DESIGN.md):** selecting the driving set materializes its live entities
//! into a `Vec` rather than handing back a zero-allocation iterator
//! borrowing the set directly. A borrowing iterator would need to be
//! generic over *which* tuple element was chosen as driving, which Rust's
//! type system can't express without per-arity enum boilerplate; the `Vec`
//! keeps the API uniform across arities at the cost of one allocation per
//! `View` traversal.

use crate::component::Component;
use crate::component_set::ComponentSet;
use crate::entity::Entity;

/// Type-erased membership/length surface used only to pick a [`View`]'s
/// driving set and to test excluded sets; typed value access goes through
/// [`IncludeTuple`]/[`OptionalTuple`] instead.
pub trait DynSet {
    fn len(&self) -> usize;
    fn contains(&self, e: Entity) -> bool;
    fn entities(&self) -> Vec<Entity>;
}

impl<T: Component> DynSet for ComponentSet<T> {
    fn len(&self) -> usize {
        ComponentSet::len(self)
    }

    fn contains(&self, e: Entity) -> bool {
        ComponentSet::contains(self, e)
    }

    fn entities(&self) -> Vec<Entity> {
        self.iter().collect()
    }
}

/// A tuple of `&ComponentSet<T>` references, one per included type.
pub trait IncludeTuple<'a> {
    type Item;
    fn dyn_sets(&self) -> Vec<&dyn DynSet>;
    fn fetch(&self, e: Entity) -> Self::Item;
}

/// A tuple of `&ComponentSet<T>` references, one per optionally-included
/// type; `()` for no optional types.
pub trait OptionalTuple<'a> {
    type Item;
    fn fetch(&self, e: Entity) -> Self::Item;
}

impl<'a> OptionalTuple<'a> for () {
    type Item = ();
    fn fetch(&self, _e: Entity) -> Self::Item {}
}

macro_rules! impl_include_tuple {
    ($($t:ident : $idx:tt),+) => {
        impl<'a, $($t: Component),+> IncludeTuple<'a> for ($(&'a ComponentSet<$t>,)+) {
            type Item = ($(&'a $t,)+);

            fn dyn_sets(&self) -> Vec<&dyn DynSet> {
                vec![$(self.$idx as &dyn DynSet),+]
            }

            fn fetch(&self, e: Entity) -> Self::Item {
                ($(self.$idx.get(e).expect("driving-set invariant violated"),)+)
            }
        }
    };
}

impl_include_tuple!(A: 0);
impl_include_tuple!(A: 0, B: 1);
impl_include_tuple!(A: 0, B: 1, C: 2);
impl_include_tuple!(A: 0, B: 1, C: 2, D: 3);

macro_rules! impl_optional_tuple {
    ($($t:ident : $idx:tt),+) => {
        impl<'a, $($t: Component),+> OptionalTuple<'a> for ($(&'a ComponentSet<$t>,)+) {
            type Item = ($(Option<&'a $t>,)+);

            fn fetch(&self, e: Entity) -> Self::Item {
                ($(self.$idx.get(e),)+)
            }
        }
    };
}

impl_optional_tuple!(A: 0);
impl_optional_tuple!(A: 0, B: 1);
impl_optional_tuple!(A: 0, B: 1, C: 2);
impl_optional_tuple!(A: 0, B: 1, C: 2, D: 3);

/// The control flow a [`View::for_each`]/[`crate::collection::Collection::for_each`]
/// functor can signal through its return value: `()` always continues,
/// `bool` halts iteration on `false`.
pub trait ForEachControl {
    fn should_continue(&self) -> bool;
}

impl ForEachControl for () {
    fn should_continue(&self) -> bool {
        true
    }
}

impl ForEachControl for bool {
    fn should_continue(&self) -> bool {
        *self
    }
}

/// A stateless projection over a combination of included, optional, and
/// excluded component sets.
pub struct View<'a, Inc, Opt = ()> {
    includes: Inc,
    optionals: Opt,
    exclude_sets: Vec<&'a dyn DynSet>,
    filters: Vec<Box<dyn Fn(Entity) -> bool + 'a>>,
}

impl<'a, Inc: IncludeTuple<'a>> View<'a, Inc, ()> {
    /// Starts a view over `includes`, a tuple of `&ComponentSet<T>`
    /// references (one per required type).
    pub fn new(includes: Inc) -> Self {
        View {
            includes,
            optionals: (),
            exclude_sets: Vec::new(),
            filters: Vec::new(),
        }
    }
}

impl<'a, Inc: IncludeTuple<'a>> View<'a, Inc, ()> {
    /// Adds optional component types, fetched as `Option<&T>` alongside
    /// the required ones.
    pub fn optional<Opt: OptionalTuple<'a>>(self, optionals: Opt) -> View<'a, Inc, Opt> {
        View {
            includes: self.includes,
            optionals,
            exclude_sets: self.exclude_sets,
            filters: self.filters,
        }
    }
}

impl<'a, Inc, Opt> View<'a, Inc, Opt> {
    /// Excludes entities present in `set`.
    pub fn exclude<T: Component>(mut self, set: &'a ComponentSet<T>) -> Self {
        self.exclude_sets.push(set);
        self
    }

    /// As [`View::exclude`], taking an already type-erased set reference.
    /// Used by [`crate::query::Query`], which collects its excludes before
    /// the concrete `Inc`/`Opt` types of the view it eventually builds are
    /// fixed.
    pub fn exclude_dyn(mut self, set: &'a dyn DynSet) -> Self {
        self.exclude_sets.push(set);
        self
    }

    /// Adds an arbitrary predicate an entity must satisfy, beyond set
    /// membership.
    pub fn filter<F: Fn(Entity) -> bool + 'a>(mut self, f: F) -> Self {
        self.filters.push(Box::new(f));
        self
    }
}

impl<'a, Inc: IncludeTuple<'a>, Opt: OptionalTuple<'a>> View<'a, Inc, Opt> {
    fn driving_entities(&self) -> Vec<Entity> {
        let sets = self.includes.dyn_sets();
        let driving = sets
            .iter()
            .min_by_key(|s| s.len())
            .expect("a view must include at least one component type");
        driving.entities()
    }

    /// Upper bound on how many entities [`View::for_each`] will visit — the
    /// size of the smallest included set, before exclusion filtering.
    pub fn size_hint(&self) -> usize {
        self.driving_entities().len()
    }

    /// True if `e` satisfies every included and excluded constraint.
    pub fn contains(&self, e: Entity) -> bool {
        self.includes.dyn_sets().iter().all(|s| s.contains(e))
            && self.exclude_sets.iter().all(|s| !s.contains(e))
            && self.filters.iter().all(|f| f(e))
    }

    /// Fetches `e`'s projection if it satisfies the view's constraints.
    pub fn get(&self, e: Entity) -> Option<(Inc::Item, Opt::Item)> {
        if !self.contains(e) {
            return None;
        }
        Some((self.includes.fetch(e), self.optionals.fetch(e)))
    }

    /// Visits every matching entity. Order follows the driving set's dense
    /// array and is not otherwise specified. `f` may return either `()` to
    /// always continue, or `bool` to halt iteration early on `false`.
    pub fn for_each<R, F>(&self, mut f: F)
    where
        R: ForEachControl,
        F: FnMut(Entity, Inc::Item, Opt::Item) -> R,
    {
        for e in self.driving_entities() {
            if self.contains(e) && !f(e, self.includes.fetch(e), self.optionals.fetch(e)).should_continue() {
                break;
            }
        }
    }

    /// Re-derives the driving set. A no-op: this view recomputes it on
    /// every call already, since it holds no cached state. Kept for API
    /// parity with [`crate::collection::Collection::rebind`], which does
    /// have state to refresh.
    pub fn rebind(&self) {}
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

    #[derive(Clone, PartialEq, Debug)]
    struct Dead;
    impl Component for Dead {}

    fn e(i: u32) -> Entity {
        Entity::new(i, 0)
    }

    #[test]
    fn two_way_join_visits_intersection() {
        let mut pos: ComponentSet<Pos> = ComponentSet::new();
        let mut vel: ComponentSet<Vel> = ComponentSet::new();
        pos.emplace(e(0), Pos(0));
        pos.emplace(e(1), Pos(1));
        pos.emplace(e(2), Pos(2));
        vel.emplace(e(1), Vel(10));
        vel.emplace(e(2), Vel(20));

        let view = View::new((&pos, &vel));
        let mut seen = Vec::new();
        view.for_each(|e, (p, v), ()| seen.push((e.index(), p.0, v.0)));
        seen.sort();
        assert_eq!(seen, vec![(1, 1, 10), (2, 2, 20)]);
    }

    #[test]
    fn exclude_filters_out_matches() {
        let mut pos: ComponentSet<Pos> = ComponentSet::new();
        let mut dead: ComponentSet<Dead> = ComponentSet::new();
        pos.emplace(e(0), Pos(0));
        pos.emplace(e(1), Pos(1));
        dead.emplace(e(1), Dead);

        let view = View::new((&pos,)).exclude(&dead);
        let mut seen = Vec::new();
        view.for_each(|e, (p,), ()| seen.push((e.index(), p.0)));
        assert_eq!(seen, vec![(0, 0)]);
    }

    #[test]
    fn optional_yields_none_when_absent() {
        let mut pos: ComponentSet<Pos> = ComponentSet::new();
        let vel: ComponentSet<Vel> = ComponentSet::new();
        pos.emplace(e(0), Pos(5));

        let view = View::new((&pos,)).optional((&vel,));
        let result = view.get(e(0)).unwrap();
        assert_eq!((result.0).0 .0, 5);
        assert_eq!((result.1).0, None);
    }

    #[test]
    fn for_each_halts_on_false_return() {
        let mut pos: ComponentSet<Pos> = ComponentSet::new();
        for i in 0..10 {
            pos.emplace(e(i), Pos(i as i32));
        }
        let view = View::new((&pos,));
        let mut seen = Vec::new();
        view.for_each(|e, (p,), ()| {
            seen.push((e.index(), p.0));
            e.index() < 3
        });
        assert_eq!(seen, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn driving_set_is_the_smallest_include() {
        let mut small: ComponentSet<Vel> = ComponentSet::new();
        let mut big: ComponentSet<Pos> = ComponentSet::new();
        for i in 0..100 {
            big.emplace(e(i), Pos(i as i32));
        }
        small.emplace(e(7), Vel(1));
        let view = View::new((&big, &small));
        assert_eq!(view.size_hint(), 1);
    }
}
