//! Composable span predicates over constituents.
//!
//! A [`Predicate`] is a boolean function over one constituent of a view,
//! closed under [`Predicate::and`], [`Predicate::or`] and
//! [`Predicate::not`]. Views evaluate them lazily through
//! [`View::matching`](crate::View::matching), and
//! [`Document::select`](crate::Document::select) exposes the same surface
//! with a silently empty result for missing views.
//!
//! Span primitives compare against a fixed token range; graph primitives
//! walk the view's relation lists at evaluation time, except
//! [`descendant_of`], which computes the breadth-first closure from its
//! fixed root once, at construction, and membership-tests afterwards.
//!
//! # Example
//!
//! ```rust
//! use palimpsest::{queries, Document, Span, SpanLabelView};
//!
//! let mut doc = Document::from_tokenized_text("The cat sat .").unwrap();
//! let mut chunks = SpanLabelView::new(&doc, "CHUNKS", "chunker", 1.0);
//! chunks.add_span_label(&doc, Span::new(0, 2), "NP", 1.0).unwrap();
//! chunks.add_span_label(&doc, Span::new(2, 3), "VP", 1.0).unwrap();
//! doc.add_view(chunks);
//!
//! let query = queries::overlapping(Span::new(0, 3)).and(queries::has_label("NP"));
//! assert_eq!(doc.select("CHUNKS").matching(query).len(), 1);
//! ```

use crate::constituent::NodeId;
use crate::document::Document;
use crate::span::Span;
use crate::view::View;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// A composable boolean function over a constituent.
#[derive(Clone)]
pub struct Predicate {
    test: Arc<dyn Fn(&Document, &View, NodeId) -> bool + Send + Sync>,
}

impl Predicate {
    /// Wrap a closure as a predicate.
    pub fn new(test: impl Fn(&Document, &View, NodeId) -> bool + Send + Sync + 'static) -> Self {
        Self { test: Arc::new(test) }
    }

    /// Evaluate against one constituent of `view`.
    #[must_use]
    pub fn eval(&self, doc: &Document, view: &View, id: NodeId) -> bool {
        (self.test)(doc, view, id)
    }

    /// Both predicates hold.
    #[must_use]
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::new(move |doc, view, id| self.eval(doc, view, id) && other.eval(doc, view, id))
    }

    /// Either predicate holds.
    #[must_use]
    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::new(move |doc, view, id| self.eval(doc, view, id) || other.eval(doc, view, id))
    }

    /// The predicate does not hold.
    #[must_use]
    pub fn not(self) -> Predicate {
        Predicate::new(move |doc, view, id| !self.eval(doc, view, id))
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// The constituent covers `span` entirely (inclusive containment).
#[must_use]
pub fn covering(span: Span) -> Predicate {
    Predicate::new(move |_, view, id| view.constituent(id).span().covers(span))
}

/// The constituent covers `span` and is strictly larger.
#[must_use]
pub fn covering_strict(span: Span) -> Predicate {
    covering(span).and(same_span_as(span).not())
}

/// The constituent lies entirely within `span`.
#[must_use]
pub fn covered_by(span: Span) -> Predicate {
    Predicate::new(move |_, view, id| view.constituent(id).span().contained_in(span))
}

/// The constituent lies strictly within `span`.
#[must_use]
pub fn covered_by_strict(span: Span) -> Predicate {
    covered_by(span).and(same_span_as(span).not())
}

/// The constituent has exactly the given span.
#[must_use]
pub fn same_span_as(span: Span) -> Predicate {
    Predicate::new(move |_, view, id| view.constituent(id).span() == span)
}

/// The constituent starts where `span` starts.
#[must_use]
pub fn same_start_as(span: Span) -> Predicate {
    Predicate::new(move |_, view, id| view.constituent(id).span().start == span.start)
}

/// The constituent ends where `span` ends.
#[must_use]
pub fn same_end_as(span: Span) -> Predicate {
    Predicate::new(move |_, view, id| view.constituent(id).span().end == span.end)
}

/// Half-open interval intersection with `span`.
#[must_use]
pub fn overlapping(span: Span) -> Predicate {
    Predicate::new(move |_, view, id| view.constituent(id).span().overlaps(span))
}

/// No intersection with `span`.
#[must_use]
pub fn not_overlapping(span: Span) -> Predicate {
    overlapping(span).not()
}

/// The constituent overlaps `span` without either side containing the other
/// or the spans being equal.
#[must_use]
pub fn exclusively_overlapping(span: Span) -> Predicate {
    overlapping(span)
        .and(covered_by(span).not())
        .and(covering(span).not())
        .and(same_span_as(span).not())
}

/// The constituent ends at or before `span` starts.
#[must_use]
pub fn before(span: Span) -> Predicate {
    Predicate::new(move |_, view, id| view.constituent(id).span().before(span))
}

/// The constituent starts at or after `span` ends.
#[must_use]
pub fn after(span: Span) -> Predicate {
    Predicate::new(move |_, view, id| view.constituent(id).span().after(span))
}

/// The constituent ends exactly where `span` starts.
#[must_use]
pub fn adjacent_before(span: Span) -> Predicate {
    Predicate::new(move |_, view, id| view.constituent(id).span().adjacent_before(span))
}

/// The constituent starts exactly where `span` ends.
#[must_use]
pub fn adjacent_after(span: Span) -> Predicate {
    Predicate::new(move |_, view, id| view.constituent(id).span().adjacent_after(span))
}

/// The constituent's primary label equals `label`.
#[must_use]
pub fn has_label(label: impl Into<String>) -> Predicate {
    let label = label.into();
    Predicate::new(move |doc, view, id| {
        doc.symbols()
            .get_id(&label)
            .is_some_and(|label_id| view.constituent(id).label_id() == label_id)
    })
}

/// The constituent has at least one incoming relation.
#[must_use]
pub fn has_parent() -> Predicate {
    Predicate::new(|_, view, id| !view.constituent(id).incoming().is_empty())
}

/// The constituent has at least one outgoing relation.
#[must_use]
pub fn has_children() -> Predicate {
    Predicate::new(|_, view, id| !view.constituent(id).outgoing().is_empty())
}

/// The constituent is a source of an edge into `child`.
#[must_use]
pub fn parent_of(child: NodeId) -> Predicate {
    Predicate::new(move |_, view, id| {
        view.constituent(child)
            .incoming()
            .iter()
            .filter_map(|&e| view.relation(e))
            .any(|r| r.source() == id)
    })
}

/// The constituent is a target of an edge out of `parent`.
#[must_use]
pub fn child_of(parent: NodeId) -> Predicate {
    Predicate::new(move |_, view, id| {
        view.constituent(parent)
            .outgoing()
            .iter()
            .filter_map(|&e| view.relation(e))
            .any(|r| r.target() == id)
    })
}

/// The constituent is the `n`th child of `parent` (by edge insertion order
/// over live edges).
#[must_use]
pub fn nth_child_of(parent: NodeId, n: usize) -> Predicate {
    Predicate::new(move |_, view, id| {
        view.constituent(parent)
            .outgoing()
            .iter()
            .filter_map(|&e| view.relation(e))
            .nth(n)
            .is_some_and(|r| r.target() == id)
    })
}

/// The constituent shares a parent with `c` (a constituent is its own
/// sibling).
#[must_use]
pub fn sibling_of(c: NodeId) -> Predicate {
    Predicate::new(move |_, view, id| {
        if id == c {
            return true;
        }
        let parents_of = |node: NodeId| {
            view.constituent(node)
                .incoming()
                .iter()
                .filter_map(|&e| view.relation(e))
                .map(|r| r.source())
        };
        parents_of(c).any(|p| parents_of(id).any(|q| q == p))
    })
}

/// Some parent of the constituent is a child of `grandparent`.
#[must_use]
pub fn grandchild_of(grandparent: NodeId) -> Predicate {
    Predicate::new(move |_, view, id| {
        view.constituent(id)
            .incoming()
            .iter()
            .filter_map(|&e| view.relation(e))
            .map(|r| r.source())
            .any(|parent| {
                view.constituent(parent)
                    .incoming()
                    .iter()
                    .filter_map(|&e| view.relation(e))
                    .any(|r| r.source() == grandparent)
            })
    })
}

/// The constituent is reachable from `root` over outgoing edges (the root
/// is its own descendant). The closure is computed once, here, and
/// membership-tested at evaluation time.
#[must_use]
pub fn descendant_of(view: &View, root: NodeId) -> Predicate {
    let mut descendants = HashSet::new();
    let mut queue = VecDeque::from([root]);
    while let Some(node) = queue.pop_front() {
        if descendants.insert(node) {
            for &edge in view.constituent(node).outgoing() {
                if let Some(r) = view.relation(edge) {
                    queue.push_back(r.target());
                }
            }
        }
    }
    Predicate::new(move |_, _, id| descendants.contains(&id))
}
