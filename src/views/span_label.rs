//! Flat span-labeling views.

use crate::constituent::{Constituent, NodeId};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::relation::EdgeId;
use crate::span::Span;
use crate::symtab::SymbolTable;
use crate::view::View;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

/// A flat view of labeled spans, such as chunks, named entities or sentence
/// boundaries.
///
/// By default the view forbids overlapping spans: adding a span that
/// intersects an existing one fails. Construct with
/// [`SpanLabelView::allowing_overlap`] for layers where crossing spans are
/// legitimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanLabelView {
    view: View,
    allow_overlap: bool,
}

impl SpanLabelView {
    /// Create an empty no-overlap span view.
    #[must_use]
    pub fn new(
        doc: &Document,
        name: impl Into<String>,
        generator: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            view: View::new(doc, name, generator, score),
            allow_overlap: false,
        }
    }

    /// Permit overlapping spans.
    #[must_use]
    pub fn allowing_overlap(mut self) -> Self {
        self.allow_overlap = true;
        self
    }

    /// Whether overlapping spans are permitted.
    #[must_use]
    pub fn allows_overlap(&self) -> bool {
        self.allow_overlap
    }

    /// Add a constituent, rejecting overlap unless permitted.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::OverlappingSpan`] when overlap is forbidden and
    /// the new span intersects an existing one.
    pub fn add(&mut self, constituent: Constituent) -> Result<NodeId> {
        if !self.allow_overlap {
            let new = constituent.span();
            let clash = self
                .view
                .constituents()
                .map(|(_, c)| c.span())
                .find(|existing| existing.overlaps(new));
            if let Some(existing) = clash {
                return Err(Error::OverlappingSpan { new, existing });
            }
        }
        Ok(self.view.add(constituent))
    }

    /// Build and add a labeled span in one step.
    ///
    /// # Errors
    ///
    /// Fails on an invalid span or on forbidden overlap.
    pub fn add_span_label(
        &mut self,
        doc: &Document,
        span: Span,
        label: &str,
        score: f64,
    ) -> Result<NodeId> {
        let c = Constituent::new(doc, self.view.name(), label, score, span)?;
        self.add(c)
    }

    /// Add a relation between two spans of this view.
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
        self.view.add_relation(symbols, name, source, target, score)
    }

    /// The label of the first span covering `token`, if any.
    #[must_use]
    pub fn label_at(&self, doc: &Document, token: usize) -> Option<Arc<str>> {
        let id = self.view.covering_token(token).next()?;
        Some(self.view.constituent(id).label(doc))
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

impl Deref for SpanLabelView {
    type Target = View;

    fn deref(&self) -> &View {
        &self.view
    }
}
