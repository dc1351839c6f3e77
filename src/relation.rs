//! Relations: the edge type of an annotation graph.
//!
//! A relation is a directed, labeled, scored edge between two constituents
//! of the same view. Relations cannot be built directly: the only
//! constructor is [`View::add_relation`](crate::View::add_relation), whose
//! sole side effect is registering the new edge into both endpoints — an
//! edge can therefore never exist on only one side.

use crate::constituent::NodeId;
use crate::document::Document;
use crate::symtab::LabelId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Stable handle of a relation within its view.
///
/// Handles are never reused; a removed relation leaves a dead handle behind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EdgeId(pub(crate) u32);

impl EdgeId {
    /// Position of the relation in its view's arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A directed, labeled, scored edge between two constituents of one view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    name: LabelId,
    source: NodeId,
    target: NodeId,
    score: f64,
    attributes: Option<BTreeMap<String, String>>,
}

impl Relation {
    pub(crate) fn new(name: LabelId, source: NodeId, target: NodeId, score: f64) -> Self {
        Self {
            name,
            source,
            target,
            score,
            attributes: None,
        }
    }

    /// The interned relation name id.
    #[must_use]
    pub fn name_id(&self) -> LabelId {
        self.name
    }

    /// The relation name, resolved through the owning document's table.
    #[must_use]
    pub fn name(&self, doc: &Document) -> Arc<str> {
        doc.symbols().label(self.name)
    }

    /// The source constituent handle.
    #[must_use]
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// The target constituent handle.
    #[must_use]
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The edge score.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Look up an attribute.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.as_ref()?.get(key).map(String::as_str)
    }

    /// Whether an attribute is present.
    #[must_use]
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }

    /// Set an attribute.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
    }

    /// The full attribute bag, if any attribute was ever set.
    #[must_use]
    pub fn attributes(&self) -> Option<&BTreeMap<String, String>> {
        self.attributes.as_ref()
    }
}
