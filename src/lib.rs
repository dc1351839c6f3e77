//! # palimpsest
//!
//! Layered annotation graphs over immutable text.
//!
//! A [`Document`] owns one text, its tokens with byte offsets, and any
//! number of named [`views`](ViewVariant) — independently produced
//! annotation layers. Each view is a graph: labeled, scored token spans
//! ([`Constituent`]s) connected by labeled, scored directed edges
//! ([`Relation`]s). Arbitrarily overlapping layers and heterogeneous
//! structures — flat chunks, per-token tags, trees, general graphs,
//! coreference clusters, predicate-argument frames — share this one
//! node/edge abstraction.
//!
//! # Terminology
//!
//! - **Constituent**: a labeled, scored half-open `[start, end)` token
//!   span; the node type of an annotation graph.
//! - **Relation**: a labeled, scored directed edge between two
//!   constituents of one view.
//! - **View**: a named layer of constituents and relations representing
//!   one analysis of one document.
//! - **Sentence**: a read-only restriction of the document (and all of its
//!   views) to one contiguous token range.
//!
//! # Quick start
//!
//! ```rust
//! use palimpsest::{queries, Document, Span, SpanLabelView};
//!
//! // "The cat sat ." — four tokens, one sentence
//! let mut doc = Document::from_tokenized_text("The cat sat .")?;
//!
//! // produce a view against &doc, then hand it over
//! let mut chunks = SpanLabelView::new(&doc, "SHALLOW_PARSE", "demo-chunker", 1.0);
//! chunks.add_span_label(&doc, Span::new(0, 2), "NP", 0.9)?;
//! doc.add_view(chunks);
//!
//! // span-indexed lookup
//! let view = doc.view("SHALLOW_PARSE")?;
//! let covering: Vec<_> = view.base().covering_token(1).collect();
//! assert_eq!(covering.len(), 1);
//! assert_eq!(view.base().constituent(covering[0]).surface_form(&doc), "The cat");
//!
//! // composable predicate queries; missing views select empty
//! let nps = doc.select("SHALLOW_PARSE").matching(queries::has_label("NP"));
//! assert_eq!(nps.len(), 1);
//! assert!(doc.select("NEVER_PRODUCED").is_empty());
//! # Ok::<(), palimpsest::Error>(())
//! ```
//!
//! # Design
//!
//! - Constituents and relations live in per-view arenas behind stable
//!   [`NodeId`]/[`EdgeId`] handles; handles are object identity, while
//!   structural content comparison is explicit
//!   ([`Constituent::content_eq`]).
//! - Labels, relation names and view names intern through one
//!   per-document, append-only [`SymbolTable`]; its append path is the
//!   only shared state, so distinct views can be produced in parallel
//!   against `&Document`.
//! - An edge enters a graph only through
//!   [`View::add_relation`], which registers it into both endpoints as
//!   its final step — no half-registered edge is observable.
//! - [`transform`] copies views across documents with token-index
//!   remapping: sentence extraction, re-embedding, and mapping a
//!   cleaned-text document back onto its original text.
//!
//! Documents and their views serialize with `serde` as an opaque object
//! graph for pipeline-local caching ([`Document::to_json`]); lazy caches
//! rebuild on demand after deserialization.

#![warn(missing_docs)]

mod annotator;
mod constituent;
mod document;
mod error;
mod relation;
mod sentence;
mod span;
mod string_transformation;
mod symtab;
mod view;
mod views;

pub mod queries;
pub mod sync;
pub mod transform;
pub mod view_names;

pub use annotator::Annotator;
pub use constituent::{Constituent, NodeId};
pub use document::{Document, Selection};
pub use error::{Error, Result};
pub use queries::Predicate;
pub use relation::{EdgeId, Relation};
pub use sentence::Sentence;
pub use span::{Span, TextSpan};
pub use string_transformation::StringTransformation;
pub use symtab::{LabelId, SymbolTable};
pub use view::View;
pub use views::{
    CoreferenceView, DependencyNode, GraphView, PredicateArgumentView, SpanLabelView,
    TokenLabelView, Tree, TreeView, ViewVariant, LEMMA_ATTRIBUTE, PARENT_OF, SENSE_ATTRIBUTE,
};
