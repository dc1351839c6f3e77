//! Per-token labeling views.

use crate::constituent::{Constituent, NodeId};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::span::Span;
use crate::view::View;
use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::sync::Arc;

/// A view assigning one label per token: part-of-speech tags, lemmas, the
/// reserved `TOKENS` view.
///
/// Every constituent spans exactly one token, and the view carries no
/// relations — there is deliberately no way to add one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLabelView {
    view: View,
}

impl TokenLabelView {
    /// Create an empty token-label view.
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

    /// Add a constituent, which must span exactly one token.
    ///
    /// # Errors
    ///
    /// Fails for any span of length other than one.
    pub fn add(&mut self, constituent: Constituent) -> Result<NodeId> {
        if constituent.span().len() != 1 {
            return Err(Error::invalid_span(
                constituent.span(),
                "token label views hold single-token spans",
            ));
        }
        Ok(self.view.add(constituent))
    }

    /// Label one token.
    ///
    /// # Errors
    ///
    /// Fails if the token index is out of range.
    pub fn add_token_label(
        &mut self,
        doc: &Document,
        token: usize,
        label: &str,
        score: f64,
    ) -> Result<NodeId> {
        let c = Constituent::new(
            doc,
            self.view.name(),
            label,
            score,
            Span::new(token, token + 1),
        )?;
        self.add(c)
    }

    /// The label of the given token, if one was assigned.
    #[must_use]
    pub fn label_at(&self, doc: &Document, token: usize) -> Option<Arc<str>> {
        let id = self.view.covering_token(token).next()?;
        Some(self.view.constituent(id).label(doc))
    }

    /// The label score of the given token, if one was assigned.
    #[must_use]
    pub fn score_at(&self, token: usize) -> Option<f64> {
        let id = self.view.covering_token(token).next()?;
        Some(self.view.constituent(id).score())
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

impl Deref for TokenLabelView {
    type Target = View;

    fn deref(&self) -> &View {
        &self.view
    }
}
