//! Predicate-argument frame views.

use crate::constituent::{Constituent, NodeId};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::relation::EdgeId;
use crate::symtab::SymbolTable;
use crate::view::View;
use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Attribute key holding a predicate's lemma.
pub const LEMMA_ATTRIBUTE: &str = "predicate";

/// Attribute key holding a predicate's sense number.
pub const SENSE_ATTRIBUTE: &str = "SenseNumber";

/// A view of predicate-argument frames, such as semantic roles: predicates
/// are the constituents with no incoming relation, their outgoing relation
/// targets are arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredicateArgumentView {
    view: View,
    predicates: Vec<NodeId>,
}

impl PredicateArgumentView {
    /// Create an empty predicate-argument view.
    #[must_use]
    pub fn new(
        doc: &Document,
        name: impl Into<String>,
        generator: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            view: View::new(doc, name, generator, score),
            predicates: Vec::new(),
        }
    }

    /// Add a constituent (a predicate or argument to be linked later).
    pub fn add(&mut self, constituent: Constituent) -> NodeId {
        self.view.add(constituent)
    }

    /// Link a predicate to its arguments. Relation names and scores run
    /// parallel to `arguments`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::FrameMismatch`] when the three lengths disagree,
    /// or if any handle is not from this view.
    pub fn add_frame(
        &mut self,
        symbols: &SymbolTable,
        predicate: NodeId,
        arguments: &[NodeId],
        relation_names: &[&str],
        scores: &[f64],
    ) -> Result<()> {
        if arguments.len() != relation_names.len() || arguments.len() != scores.len() {
            return Err(Error::FrameMismatch {
                arguments: arguments.len(),
                relations: relation_names.len(),
                scores: scores.len(),
            });
        }
        for ((&argument, &name), &score) in
            arguments.iter().zip(relation_names).zip(scores)
        {
            self.view
                .add_relation(symbols, name, predicate, argument, score)?;
        }
        if !self.predicates.contains(&predicate) {
            self.predicates.push(predicate);
        }
        Ok(())
    }

    /// Rediscover predicates from the graph: every constituent with no
    /// incoming relation is a predicate.
    pub fn find_predicates(&mut self) {
        self.predicates = self
            .view
            .node_ids()
            .filter(|&id| self.view.constituent(id).incoming().is_empty())
            .collect();
    }

    /// The known predicates. When none were registered, discovers them as
    /// the zero-incoming constituents.
    #[must_use]
    pub fn predicates(&self) -> Vec<NodeId> {
        if self.predicates.is_empty() {
            self.view
                .node_ids()
                .filter(|&id| self.view.constituent(id).incoming().is_empty())
                .collect()
        } else {
            self.predicates.clone()
        }
    }

    /// A predicate's argument edges as (edge, argument) pairs.
    ///
    /// # Errors
    ///
    /// Fails if the constituent is not a predicate of this view.
    pub fn arguments(&self, predicate: NodeId) -> Result<Vec<(EdgeId, NodeId)>> {
        if !self.predicates().contains(&predicate) {
            return Err(Error::invalid_input(format!(
                "constituent {} is not a predicate of view '{}'",
                predicate.index(),
                self.view.name()
            )));
        }
        Ok(self
            .view
            .constituent(predicate)
            .outgoing()
            .iter()
            .filter_map(|&e| self.view.relation(e).map(|r| (e, r.target())))
            .collect())
    }

    /// The predicate's lemma: its lemma attribute when present, otherwise
    /// the lowercased tokenized surface form.
    #[must_use]
    pub fn predicate_lemma(&self, doc: &Document, predicate: NodeId) -> String {
        let c = self.view.constituent(predicate);
        match c.attribute(LEMMA_ATTRIBUTE) {
            Some(lemma) => lemma.to_string(),
            None => c.tokenized_surface_form(doc).to_lowercase(),
        }
    }

    /// The predicate's sense attribute, or the empty string.
    #[must_use]
    pub fn predicate_sense(&self, predicate: NodeId) -> String {
        self.view
            .constituent(predicate)
            .attribute(SENSE_ATTRIBUTE)
            .unwrap_or_default()
            .to_string()
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

impl Deref for PredicateArgumentView {
    type Target = View;

    fn deref(&self) -> &View {
        &self.view
    }
}
