//! The `order_by`/`include`/`optional`/`exclude`/`filter` builder DSL:
//! §4.6 of the core runtime spec.
//!
//! A [`Query`] is sugar over [`crate::view::View`] and
//! [`crate::collection::Collection`]: without `order_by` it finalizes into
//! a `View`; `order_by` requires a `Collection` to have somewhere to keep
//! the resulting order, per spec's "order_by implies Collection" rule.
//!
//! **Deviation from spec, recorded as a deliberate simplification (see
//! DESIGN.md):** spec additionally requires "optional types are a subset
//! of included types", a constraint that presumes separate *included* and
//! *collected* type sets. This crate's [`Collection`] fuses those two (see
//! `collection.rs`'s module docs), so optional types never participate in
//! ordering regardless, and the subset constraint has nothing independent
//! left to check — it is satisfied vacuously rather than enforced.

use std::cmp::Ordering;

use crate::collection::{Collection, FixedFree};
use crate::component::Component;
use crate::component_set::ComponentSet;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::view::{DynSet, IncludeTuple, OptionalTuple, View};

/// The result of finalizing a [`Query`]: a one-shot [`View`] or a
/// [`Collection`] that can be `refresh`ed and re-sorted later.
pub enum QueryResult<'a, Inc: IncludeTuple<'a>, Opt: OptionalTuple<'a> = ()> {
    View(View<'a, Inc, Opt>),
    Ordered(Collection<'a, Inc, Opt>),
}

/// Builder for a [`Query`]. Construct with [`Query::new`], chain
/// `optional`/`exclude`/`filter`/`order_by`, then [`Query::finalize`].
pub struct Query<'a, Inc: IncludeTuple<'a>, Opt: OptionalTuple<'a> = ()> {
    includes: Inc,
    optionals: Opt,
    exclude_sets: Vec<&'a dyn DynSet>,
    filters: Vec<Box<dyn Fn(Entity) -> bool + 'a>>,
    order: Option<Box<dyn Fn(Entity, Entity) -> Ordering + 'a>>,
}

impl<'a, Inc: IncludeTuple<'a>> Query<'a, Inc, ()> {
    pub fn new(includes: Inc) -> Self {
        Query {
            includes,
            optionals: (),
            exclude_sets: Vec::new(),
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn optional<Opt: OptionalTuple<'a>>(self, optionals: Opt) -> Query<'a, Inc, Opt> {
        Query {
            includes: self.includes,
            optionals,
            exclude_sets: self.exclude_sets,
            filters: self.filters,
            order: self.order,
        }
    }
}

impl<'a, Inc: IncludeTuple<'a>, Opt: OptionalTuple<'a>> Query<'a, Inc, Opt> {
    pub fn exclude<T: Component>(mut self, set: &'a ComponentSet<T>) -> Self {
        self.exclude_sets.push(set);
        self
    }

    /// Adds an arbitrary predicate an entity must satisfy.
    pub fn filter<F: Fn(Entity) -> bool + 'a>(mut self, f: F) -> Self {
        self.filters.push(Box::new(f));
        self
    }

    /// Requests a maintained order. Finalizing a query with `order_by` set
    /// always produces [`QueryResult::Ordered`].
    pub fn order_by<F: Fn(Entity, Entity) -> Ordering + 'a>(mut self, cmp: F) -> Self {
        self.order = Some(Box::new(cmp));
        self
    }

    fn build_view(self) -> View<'a, Inc, Opt> {
        let mut view = View::new(self.includes).optional(self.optionals);
        for set in self.exclude_sets {
            view = view.exclude_dyn(set);
        }
        for f in self.filters {
            view = view.filter(move |e| f(e));
        }
        view
    }

    /// Finalizes the query. `read_only` reflects the world/context this
    /// query runs against; requesting `order_by` against a read-only
    /// context is rejected, since a [`Collection`]'s maintained order is
    /// mutable state the query would otherwise need to own silently.
    pub fn finalize(mut self, read_only: bool) -> Result<QueryResult<'a, Inc, Opt>>
    where
        Inc: FixedFree,
    {
        let order = self.order.take();
        match order {
            Some(cmp) if read_only => Err(Error::OrderViolation {
                operation: "order_by",
                reason: "read-only world",
            }),
            Some(cmp) => {
                Inc::check_not_fixed()?;
                let view = self.build_view();
                let mut order = Vec::with_capacity(view.size_hint());
                view.for_each(|e, _inc, _opt| order.push(e));
                let mut collection = Collection::from_parts(view, order);
                collection.sort_by(|a, b| cmp(a, b));
                Ok(QueryResult::Ordered(collection))
            }
            None => Ok(QueryResult::View(self.build_view())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug)]
    struct Pos(i32);
    impl Component for Pos {}

    fn e(i: u32) -> Entity {
        Entity::new(i, 0)
    }

    #[test]
    fn query_without_order_by_yields_view() {
        let mut pos: ComponentSet<Pos> = ComponentSet::new();
        pos.emplace(e(0), Pos(1));
        let result = Query::new((&pos,)).finalize(true).unwrap();
        assert!(matches!(result, QueryResult::View(_)));
    }

    #[test]
    fn query_with_order_by_yields_ordered_collection() {
        let mut pos: ComponentSet<Pos> = ComponentSet::new();
        pos.emplace(e(0), Pos(3));
        pos.emplace(e(1), Pos(1));
        let pos_ref = &pos;
        let result = Query::new((&pos,))
            .order_by(move |a, b| pos_ref.get(a).unwrap().0.cmp(&pos_ref.get(b).unwrap().0))
            .finalize(false)
            .unwrap();
        match result {
            QueryResult::Ordered(collection) => {
                let order: Vec<_> = collection.iter().map(|e| pos.get(e).unwrap().0).collect();
                assert_eq!(order, vec![1, 3]);
            }
            _ => panic!("expected an ordered collection"),
        }
    }

    #[test]
    fn order_by_on_read_only_context_is_rejected() {
        let pos: ComponentSet<Pos> = ComponentSet::new();
        let result = Query::new((&pos,)).order_by(|a, b| a.index().cmp(&b.index())).finalize(true);
        assert!(matches!(result, Err(Error::OrderViolation { .. })));
    }
}
