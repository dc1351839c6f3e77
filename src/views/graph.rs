//! General graph views with distance queries.

use crate::constituent::{Constituent, NodeId};
use crate::document::Document;
use crate::error::Result;
use crate::relation::EdgeId;
use crate::symtab::SymbolTable;
use crate::view::View;
use crate::views::find_sentence_roots;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::ops::Deref;

/// A view over an arbitrary directed graph of constituents.
///
/// Adds per-sentence root discovery (a root has no incoming relations) and
/// all-pairs shortest distances over outgoing edges, computed by one
/// breadth-first pass per node and cached. Structural mutation through this
/// type clears the caches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphView {
    view: View,
    #[serde(skip)]
    roots: OnceCell<Vec<Option<NodeId>>>,
    #[serde(skip)]
    distances: OnceCell<HashMap<(NodeId, NodeId), u32>>,
}

impl GraphView {
    /// Create an empty graph view.
    #[must_use]
    pub fn new(
        doc: &Document,
        name: impl Into<String>,
        generator: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            view: View::new(doc, name, generator, score),
            roots: OnceCell::new(),
            distances: OnceCell::new(),
        }
    }

    /// Whether a constituent is a root (no incoming relations).
    #[must_use]
    pub fn is_root(c: &Constituent) -> bool {
        c.incoming().is_empty()
    }

    /// Whether a constituent is a leaf (no outgoing relations).
    #[must_use]
    pub fn is_leaf(c: &Constituent) -> bool {
        c.outgoing().is_empty()
    }

    /// Add a constituent.
    pub fn add(&mut self, constituent: Constituent) -> NodeId {
        self.clear_caches();
        self.view.add(constituent)
    }

    /// Add a graph edge.
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
        self.clear_caches();
        self.view.add_relation(symbols, name, source, target, score)
    }

    pub(crate) fn clear_caches(&mut self) {
        self.roots.take();
        self.distances.take();
    }

    /// The parent of a constituent, following its first incoming relation.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let &edge = self.view.constituent(id).incoming().first()?;
        Some(self.view.relation(edge)?.source())
    }

    /// The first root constituent inside the given sentence, if any.
    #[must_use]
    pub fn root_constituent(&self, doc: &Document, sentence_id: usize) -> Option<NodeId> {
        self.roots
            .get_or_init(|| find_sentence_roots(&self.view, doc))
            .get(sentence_id)
            .copied()
            .flatten()
    }

    /// The number of outgoing edges on the shortest directed path from
    /// `from` to `to`, or `None` when `to` is unreachable. A node is at
    /// distance zero from itself.
    #[must_use]
    pub fn node_distance(&self, from: NodeId, to: NodeId) -> Option<u32> {
        self.all_distances().get(&(from, to)).copied()
    }

    fn all_distances(&self) -> &HashMap<(NodeId, NodeId), u32> {
        self.distances.get_or_init(|| {
            let mut distances = HashMap::new();
            for start in self.view.node_ids() {
                let mut seen = HashSet::from([start]);
                let mut queue = VecDeque::from([(start, 0u32)]);
                distances.insert((start, start), 0);
                while let Some((node, depth)) = queue.pop_front() {
                    for &edge in self.view.constituent(node).outgoing() {
                        let Some(relation) = self.view.relation(edge) else {
                            continue;
                        };
                        let target = relation.target();
                        if seen.insert(target) {
                            distances.insert((start, target), depth + 1);
                            queue.push_back((target, depth + 1));
                        }
                    }
                }
            }
            distances
        })
    }

    /// The underlying base view.
    #[must_use]
    pub fn base(&self) -> &View {
        &self.view
    }

    pub(crate) fn base_mut(&mut self) -> &mut View {
        &mut self.view
    }
}

impl Deref for GraphView {
    type Target = View;

    fn deref(&self) -> &View {
        &self.view
    }
}
