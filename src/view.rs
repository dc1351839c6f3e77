//! The base view: a named constituent/relation container for one layer of
//! one document.
//!
//! A view owns its constituents and relations in per-view arenas addressed
//! by stable [`NodeId`]/[`EdgeId`] handles. The backing iteration order is
//! kept start-sorted: [`View::add`] appends when the new constituent is in
//! order with respect to the previous last one and re-sorts otherwise,
//! which amortizes the common left-to-right append pattern.
//! [`View::add_unsorted`] defers that work for bulk builders, which restore
//! order with [`View::resort`] once.
//!
//! Callers are responsible for adding only constituents and relations that
//! belong to the view's document; handles are view-scoped, so an edge
//! between two documents (or two views) is not constructible.

use crate::constituent::{Constituent, NodeId};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::queries::Predicate;
use crate::relation::{EdgeId, Relation};
use crate::span::Span;
use crate::symtab::{LabelId, SymbolTable};
use serde::{Deserialize, Serialize};

/// Named constituent/relation container for one layer of one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    name: String,
    name_id: LabelId,
    generator: String,
    score: f64,
    constituents: Vec<Constituent>,
    relations: Vec<Option<Relation>>,
    order: Vec<NodeId>,
    unsorted: bool,
}

impl View {
    /// Create an empty view of `doc`. The name is interned through the
    /// document's symbol table so name-filtered edge scans compare ids.
    #[must_use]
    pub fn new(
        doc: &Document,
        name: impl Into<String>,
        generator: impl Into<String>,
        score: f64,
    ) -> Self {
        let name = name.into();
        let name_id = doc.symbols().intern(&name);
        Self {
            name,
            name_id,
            generator: generator.into(),
            score,
            constituents: Vec::new(),
            relations: Vec::new(),
            order: Vec::new(),
            unsorted: false,
        }
    }

    /// The view name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The interned view name id.
    #[must_use]
    pub fn name_id(&self) -> LabelId {
        self.name_id
    }

    /// The name of whatever produced this view.
    #[must_use]
    pub fn generator(&self) -> &str {
        &self.generator
    }

    /// The view-level score (used to rank alternative views of one name).
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Number of constituents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constituents.len()
    }

    /// Whether the view holds no constituents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }

    /// Number of live relations.
    #[must_use]
    pub fn relation_count(&self) -> usize {
        self.relations.iter().filter(|r| r.is_some()).count()
    }

    /// Add a constituent and return its handle, keeping the backing order
    /// start-sorted.
    pub fn add(&mut self, constituent: Constituent) -> NodeId {
        let id = self.push(constituent);
        if !self.last_two_in_order() {
            self.sort_order();
            self.unsorted = false;
        }
        id
    }

    /// Add a constituent without restoring sort order (tolerated unsorted
    /// insert). Lookups stay correct but iterate in insertion order until
    /// [`Self::resort`] runs.
    pub fn add_unsorted(&mut self, constituent: Constituent) -> NodeId {
        let id = self.push(constituent);
        if !self.last_two_in_order() {
            self.unsorted = true;
        }
        id
    }

    fn push(&mut self, constituent: Constituent) -> NodeId {
        let id = NodeId(self.constituents.len() as u32);
        self.constituents.push(constituent);
        self.order.push(id);
        id
    }

    fn last_two_in_order(&self) -> bool {
        let n = self.order.len();
        if n < 2 {
            return true;
        }
        let prev = &self.constituents[self.order[n - 2].index()];
        let last = &self.constituents[self.order[n - 1].index()];
        (prev.start_span(), prev.end_span()) <= (last.start_span(), last.end_span())
    }

    /// Restore start-sorted iteration order after unsorted inserts.
    pub fn resort(&mut self) {
        if self.unsorted {
            self.sort_order();
            self.unsorted = false;
        }
    }

    fn sort_order(&mut self) {
        let constituents = &self.constituents;
        self.order.sort_by_key(|id| {
            let c = &constituents[id.index()];
            (c.start_span(), c.end_span())
        });
    }

    /// Add a directed, labeled, scored edge between two constituents of
    /// this view. This is the only way an edge enters the graph; its sole
    /// side effect is registering the edge into `source.outgoing` and
    /// `target.incoming`, performed as the final construction step so no
    /// half-registered edge is ever observable.
    ///
    /// # Errors
    ///
    /// Fails if either endpoint handle is not from this view.
    pub fn add_relation(
        &mut self,
        symbols: &SymbolTable,
        name: &str,
        source: NodeId,
        target: NodeId,
        score: f64,
    ) -> Result<EdgeId> {
        self.add_relation_interned(symbols.intern(name), source, target, score)
    }

    pub(crate) fn add_relation_interned(
        &mut self,
        name: LabelId,
        source: NodeId,
        target: NodeId,
        score: f64,
    ) -> Result<EdgeId> {
        let len = self.constituents.len();
        if source.index() >= len || target.index() >= len {
            return Err(Error::invalid_input(format!(
                "relation endpoint out of range in view '{}' of {} constituents",
                self.name, len
            )));
        }
        let id = EdgeId(self.relations.len() as u32);
        self.relations.push(Some(Relation::new(name, source, target, score)));
        self.constituents[source.index()].outgoing.push(id);
        self.constituents[target.index()].incoming.push(id);
        Ok(id)
    }

    /// Remove one relation, unregistering it from both endpoints. The
    /// handle becomes dead; handles are never reused.
    pub fn remove_relation(&mut self, id: EdgeId) {
        let Some(slot) = self.relations.get_mut(id.index()) else {
            return;
        };
        let Some(relation) = slot.take() else {
            return;
        };
        self.constituents[relation.source().index()]
            .outgoing
            .retain(|&e| e != id);
        self.constituents[relation.target().index()]
            .incoming
            .retain(|&e| e != id);
    }

    /// Remove every relation.
    pub fn remove_all_relations(&mut self) {
        self.relations.clear();
        for c in &mut self.constituents {
            c.outgoing.clear();
            c.incoming.clear();
        }
    }

    /// Remove every constituent, and with them every relation.
    pub fn remove_all_constituents(&mut self) {
        self.constituents.clear();
        self.relations.clear();
        self.order.clear();
        self.unsorted = false;
    }

    /// Borrow a constituent by handle.
    ///
    /// # Panics
    ///
    /// Panics if the handle is not from this view.
    #[must_use]
    pub fn constituent(&self, id: NodeId) -> &Constituent {
        &self.constituents[id.index()]
    }

    /// Mutably borrow a constituent (for attribute edits; span, label and
    /// score are immutable after construction).
    ///
    /// # Panics
    ///
    /// Panics if the handle is not from this view.
    #[must_use]
    pub fn constituent_mut(&mut self, id: NodeId) -> &mut Constituent {
        &mut self.constituents[id.index()]
    }

    /// Borrow a relation by handle; `None` for a removed edge.
    #[must_use]
    pub fn relation(&self, id: EdgeId) -> Option<&Relation> {
        self.relations.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutably borrow a relation (for attribute edits).
    #[must_use]
    pub fn relation_mut(&mut self, id: EdgeId) -> Option<&mut Relation> {
        self.relations.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Constituent handles in the backing (start-sorted) order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    /// Constituents with their handles, in the backing order.
    pub fn constituents(&self) -> impl Iterator<Item = (NodeId, &Constituent)> {
        self.order
            .iter()
            .map(move |&id| (id, &self.constituents[id.index()]))
    }

    /// Live relations with their handles, in insertion order.
    pub fn relations(&self) -> impl Iterator<Item = (EdgeId, &Relation)> {
        self.relations
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (EdgeId(i as u32), r)))
    }

    /// Handles of constituents covering the given token.
    pub fn covering_token(&self, token: usize) -> impl Iterator<Item = NodeId> + '_ {
        self.constituents()
            .filter(move |(_, c)| c.covers_token(token))
            .map(|(id, _)| id)
    }

    /// Handles of constituents lying entirely within the given token range.
    pub fn in_span(&self, span: Span) -> impl Iterator<Item = NodeId> + '_ {
        self.constituents()
            .filter(move |(_, c)| c.span().contained_in(span))
            .map(|(id, _)| id)
    }

    /// Handles of constituents overlapping the given token range.
    pub fn overlapping(&self, span: Span) -> impl Iterator<Item = NodeId> + '_ {
        self.constituents()
            .filter(move |(_, c)| c.span().overlaps(span))
            .map(|(id, _)| id)
    }

    /// Lazily filter the view's constituents by a predicate.
    pub fn matching<'a>(
        &'a self,
        doc: &'a Document,
        predicate: Predicate,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.node_ids().filter(move |&id| predicate.eval(doc, self, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn doc() -> Document {
        Document::from_tokenized_text("a b c d e").unwrap()
    }

    fn constituent(d: &Document, label: &str, start: usize, end: usize) -> Constituent {
        Constituent::new(d, "TEST", label, 1.0, Span::new(start, end)).unwrap()
    }

    #[test]
    fn in_order_appends_stay_sorted() {
        let d = doc();
        let mut v = View::new(&d, "TEST", "test", 1.0);
        v.add(constituent(&d, "A", 0, 1));
        v.add(constituent(&d, "B", 1, 3));
        v.add(constituent(&d, "C", 3, 4));
        let starts: Vec<usize> = v.constituents().map(|(_, c)| c.start_span()).collect();
        assert_eq!(starts, vec![0, 1, 3]);
    }

    #[test]
    fn out_of_order_add_triggers_resort() {
        let d = doc();
        let mut v = View::new(&d, "TEST", "test", 1.0);
        v.add(constituent(&d, "B", 2, 3));
        v.add(constituent(&d, "A", 0, 1));
        let starts: Vec<usize> = v.constituents().map(|(_, c)| c.start_span()).collect();
        assert_eq!(starts, vec![0, 2]);
    }

    #[test]
    fn unsorted_adds_keep_insertion_order_until_resort() {
        let d = doc();
        let mut v = View::new(&d, "TEST", "test", 1.0);
        v.add_unsorted(constituent(&d, "B", 2, 3));
        v.add_unsorted(constituent(&d, "A", 0, 1));
        let starts: Vec<usize> = v.constituents().map(|(_, c)| c.start_span()).collect();
        assert_eq!(starts, vec![2, 0]);
        v.resort();
        let starts: Vec<usize> = v.constituents().map(|(_, c)| c.start_span()).collect();
        assert_eq!(starts, vec![0, 2]);
    }

    #[test]
    fn relation_registers_into_both_endpoints() {
        let d = doc();
        let mut v = View::new(&d, "TEST", "test", 1.0);
        let a = v.add(constituent(&d, "A", 0, 1));
        let b = v.add(constituent(&d, "B", 1, 2));
        let e = v.add_relation(d.symbols(), "ParentOf", a, b, 1.0).unwrap();
        assert_eq!(v.constituent(a).outgoing(), &[e]);
        assert_eq!(v.constituent(b).incoming(), &[e]);
        assert!(v.constituent(a).incoming().is_empty());
        assert!(v.constituent(b).outgoing().is_empty());
        let r = v.relation(e).unwrap();
        assert_eq!(r.source(), a);
        assert_eq!(r.target(), b);
        assert_eq!(&*r.name(&d), "ParentOf");
    }

    #[test]
    fn relation_with_bad_endpoint_fails() {
        let d = doc();
        let mut v = View::new(&d, "TEST", "test", 1.0);
        let a = v.add(constituent(&d, "A", 0, 1));
        let bad = NodeId(7);
        assert!(v.add_relation(d.symbols(), "X", a, bad, 1.0).is_err());
        // nothing was registered
        assert!(v.constituent(a).outgoing().is_empty());
        assert_eq!(v.relation_count(), 0);
    }

    #[test]
    fn remove_relation_unregisters_both_sides() {
        let d = doc();
        let mut v = View::new(&d, "TEST", "test", 1.0);
        let a = v.add(constituent(&d, "A", 0, 1));
        let b = v.add(constituent(&d, "B", 1, 2));
        let e = v.add_relation(d.symbols(), "X", a, b, 1.0).unwrap();
        v.remove_relation(e);
        assert!(v.relation(e).is_none());
        assert!(v.constituent(a).outgoing().is_empty());
        assert!(v.constituent(b).incoming().is_empty());
        // dead handles are never reused
        let e2 = v.add_relation(d.symbols(), "Y", a, b, 1.0).unwrap();
        assert_ne!(e, e2);
    }

    #[test]
    fn span_lookups() {
        let d = doc();
        let mut v = View::new(&d, "TEST", "test", 1.0);
        let a = v.add(constituent(&d, "A", 0, 2));
        let b = v.add(constituent(&d, "B", 1, 4));
        let c = v.add(constituent(&d, "C", 4, 5));

        let covering: Vec<NodeId> = v.covering_token(1).collect();
        assert_eq!(covering, vec![a, b]);

        let inside: Vec<NodeId> = v.in_span(Span::new(0, 4)).collect();
        assert_eq!(inside, vec![a, b]);

        let overlapping: Vec<NodeId> = v.overlapping(Span::new(3, 5)).collect();
        assert_eq!(overlapping, vec![b, c]);
    }
}
