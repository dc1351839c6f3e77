//! Coreference cluster views.
//!
//! Mentions are constituents; an edge from a canonical mention to another
//! mention marks them coreferent. Because a view's edge list is shared and
//! may carry other relation kinds, every cluster operation filters edges by
//! relation name equal to the view name.

use crate::constituent::{Constituent, NodeId};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::view::View;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// A view of coreference clusters: canonical mentions linked to their
/// coreferent mentions by edges named after the view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreferenceView {
    view: View,
}

impl CoreferenceView {
    /// Create an empty coreference view.
    #[must_use]
    pub fn new(
        doc: &Document,
        name: impl Into<String>,
        generator: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            view: View::new(doc, name, generator, score),
        }
    }

    /// Add a mention.
    pub fn add(&mut self, constituent: Constituent) -> NodeId {
        self.view.add(constituent)
    }

    /// Link a canonical mention to its coreferent mentions. Edges are named
    /// after the view, which is what cluster queries filter on. A
    /// self-link in `coreferents` is skipped.
    ///
    /// # Errors
    ///
    /// Fails if any handle is not from this view.
    pub fn add_coref_edges(&mut self, canonical: NodeId, coreferents: &[NodeId]) -> Result<()> {
        let name_id = self.view.name_id();
        for &mention in coreferents {
            if mention == canonical {
                continue;
            }
            self.view
                .add_relation_interned(name_id, canonical, mention, 1.0)?;
        }
        Ok(())
    }

    /// Sources of the mention's name-filtered incoming edges.
    fn canonical_sources(&self, mention: NodeId) -> Vec<NodeId> {
        let name_id = self.view.name_id();
        let mut sources: Vec<NodeId> = self
            .view
            .constituent(mention)
            .incoming()
            .iter()
            .filter_map(|&e| self.view.relation(e))
            .filter(|r| r.name_id() == name_id)
            .map(|r| r.source())
            .collect();
        sources.sort_unstable();
        sources.dedup();
        sources
    }

    /// All canonical mentions of `mention`. A mention with no filtered
    /// incoming edge is its own canonical representative; more than one
    /// entry flags an ambiguous cluster.
    #[must_use]
    pub fn canonical_mentions(&self, mention: NodeId) -> Vec<NodeId> {
        let sources = self.canonical_sources(mention);
        if sources.is_empty() {
            vec![mention]
        } else {
            sources
        }
    }

    /// The canonical mention of `mention`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AmbiguousCluster`] when the mention has more
    /// than one distinct canonical source; use
    /// [`Self::canonical_mentions`] there instead.
    pub fn canonical_mention(&self, mention: NodeId) -> Result<NodeId> {
        let candidates = self.canonical_mentions(mention);
        if candidates.len() > 1 {
            log::warn!(
                "mention {:?} in view '{}' has {} canonical sources",
                mention,
                self.view.name(),
                candidates.len()
            );
            return Err(Error::AmbiguousCluster {
                candidates: candidates.len(),
            });
        }
        Ok(candidates[0])
    }

    /// Targets of the canonical mention's name-filtered outgoing edges.
    #[must_use]
    pub fn coreferent_mentions(&self, canonical: NodeId) -> Vec<NodeId> {
        let name_id = self.view.name_id();
        self.view
            .constituent(canonical)
            .outgoing()
            .iter()
            .filter_map(|&e| self.view.relation(e))
            .filter(|r| r.name_id() == name_id)
            .map(|r| r.target())
            .collect()
    }

    /// The whole cluster around `mention`: every canonical source plus all
    /// of their coreferents, sorted and deduplicated.
    #[must_use]
    pub fn cluster_of(&self, mention: NodeId) -> Vec<NodeId> {
        let mut cluster = Vec::new();
        for canonical in self.canonical_mentions(mention) {
            cluster.push(canonical);
            cluster.extend(self.coreferent_mentions(canonical));
        }
        cluster.sort_unstable();
        cluster.dedup();
        cluster
    }

    /// Every cluster as (canonical, members). Canonicals are the mentions
    /// with no filtered incoming edge; members include the canonical
    /// itself. Singletons form one-element clusters.
    #[must_use]
    pub fn clusters(&self) -> Vec<(NodeId, Vec<NodeId>)> {
        self.view
            .node_ids()
            .filter(|&id| self.canonical_sources(id).is_empty())
            .map(|canonical| {
                let mut members = vec![canonical];
                members.extend(self.coreferent_mentions(canonical));
                members.sort_unstable();
                members.dedup();
                (canonical, members)
            })
            .collect()
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

impl Deref for CoreferenceView {
    type Target = View;

    fn deref(&self) -> &View {
        &self.view
    }
}
