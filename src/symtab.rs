//! Append-only label interner shared by every view of one document.
//!
//! Constituent labels, relation names and view names all resolve through one
//! per-document table, so label comparisons inside a document reduce to id
//! comparisons. The table is document-scoped by design — never a
//! process-wide singleton — and is handed to constituent and relation
//! construction explicitly (through the owning [`crate::Document`]).
//!
//! Ids are dense, start at zero and are never recycled. Only the mutating
//! append path takes the write lock; lookups take the read side, so
//! concurrent producers of distinct views can intern in parallel.

use crate::sync::{self, RwLock};
use serde::de::{Deserializer, SeqAccess, Visitor};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identifier of an interned label.
///
/// Valid only against the table that produced it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LabelId(u32);

impl LabelId {
    /// Position of the label in its table.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default)]
struct Inner {
    labels: Vec<Arc<str>>,
    ids: HashMap<Arc<str>, LabelId>,
}

/// Per-document append-only string ↔ id table.
#[derive(Debug, Default)]
pub struct SymbolTable {
    inner: RwLock<Inner>,
}

impl SymbolTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the id of a label, if it has been interned.
    #[must_use]
    pub fn get_id(&self, label: &str) -> Option<LabelId> {
        sync::read(&self.inner).ids.get(label).copied()
    }

    /// Intern a label, returning the existing id or appending a new one.
    pub fn intern(&self, label: &str) -> LabelId {
        if let Some(id) = self.get_id(label) {
            return id;
        }
        let mut inner = sync::write(&self.inner);
        // another writer may have appended between the read and the write lock
        if let Some(id) = inner.ids.get(label).copied() {
            return id;
        }
        let id = LabelId(inner.labels.len() as u32);
        let label: Arc<str> = Arc::from(label);
        inner.labels.push(label.clone());
        inner.ids.insert(label, id);
        id
    }

    /// Resolve an id back to its label.
    ///
    /// # Panics
    ///
    /// Panics if the id did not come from this table — looking up an
    /// out-of-range id is a programming error, not a recoverable condition.
    #[must_use]
    pub fn label(&self, id: LabelId) -> Arc<str> {
        let inner = sync::read(&self.inner);
        inner
            .labels
            .get(id.index())
            .unwrap_or_else(|| {
                panic!(
                    "label id {} out of range for table of {} labels",
                    id.index(),
                    inner.labels.len()
                )
            })
            .clone()
    }

    /// Number of interned labels.
    #[must_use]
    pub fn len(&self) -> usize {
        sync::read(&self.inner).labels.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for SymbolTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let inner = sync::read(&self.inner);
        serializer.collect_seq(inner.labels.iter().map(|l| l.as_ref()))
    }
}

impl<'de> Deserialize<'de> for SymbolTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor;

        impl<'de> Visitor<'de> for TableVisitor {
            type Value = SymbolTable;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a sequence of labels")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<SymbolTable, A::Error> {
                let table = SymbolTable::new();
                while let Some(label) = seq.next_element::<String>()? {
                    table.intern(&label);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_seq(TableVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let t = SymbolTable::new();
        let a = t.intern("NP");
        let b = t.intern("VP");
        assert_ne!(a, b);
        assert_eq!(t.intern("NP"), a);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn get_id_does_not_intern() {
        let t = SymbolTable::new();
        assert_eq!(t.get_id("missing"), None);
        assert!(t.is_empty());
        let id = t.intern("present");
        assert_eq!(t.get_id("present"), Some(id));
    }

    #[test]
    fn labels_resolve_in_insertion_order() {
        let t = SymbolTable::new();
        let a = t.intern("first");
        let b = t.intern("second");
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(&*t.label(a), "first");
        assert_eq!(&*t.label(b), "second");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_id_panics() {
        let t = SymbolTable::new();
        let id = t.intern("only");
        drop(t);
        let other = SymbolTable::new();
        let _ = other.label(id);
    }

    #[test]
    fn serde_round_trip_preserves_ids() {
        let t = SymbolTable::new();
        t.intern("a");
        t.intern("b");
        let json = serde_json::to_string(&t).unwrap();
        let back: SymbolTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back.get_id("a").map(LabelId::index), Some(0));
        assert_eq!(back.get_id("b").map(LabelId::index), Some(1));
    }
}
