//! Error types for palimpsest.

use crate::span::Span;
use thiserror::Error;

/// Result type for palimpsest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for palimpsest operations.
///
/// Most variants are invariant violations: the operation aborts without
/// leaving partial shared state. Degraded-but-valid outcomes (a missing view
/// under [`crate::Document::select`], a disconnected node pair in a graph
/// view) are expressed as empty results or `None`, not as errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A token span is malformed or out of range for its document.
    #[error("Invalid span {span}: {reason}")]
    InvalidSpan {
        /// The offending span.
        span: Span,
        /// Why the span was rejected.
        reason: String,
    },

    /// Sentence boundaries passed at document construction are malformed.
    #[error("Malformed sentence boundaries: {0}")]
    SentenceBoundaries(String),

    /// A span was added to a no-overlap view that intersects an existing one.
    #[error("Span {new} overlaps existing span {existing} in a no-overlap view")]
    OverlappingSpan {
        /// The span being added.
        new: Span,
        /// The already-present span it intersects.
        existing: Span,
    },

    /// The strict view getter was asked for a view the document lacks.
    #[error("View not found: {0}")]
    ViewNotFound(String),

    /// Predicate-argument frame counts disagree.
    #[error(
        "Frame mismatch: {arguments} arguments, {relations} relation names, {scores} scores"
    )]
    FrameMismatch {
        /// Number of argument constituents supplied.
        arguments: usize,
        /// Number of relation names supplied.
        relations: usize,
        /// Number of scores supplied.
        scores: usize,
    },

    /// A mention has more than one distinct canonical source; use the
    /// set-returning lookup instead.
    #[error("Ambiguous coreference cluster: mention has {candidates} distinct canonical sources")]
    AmbiguousCluster {
        /// How many distinct canonical mentions point at the mention.
        candidates: usize,
    },

    /// A tree view was asked to hold both phrase and dependency trees.
    #[error("Tree mode mismatch: {0}")]
    TreeMode(String),

    /// A text edit overlaps a previously recorded edit.
    #[error("Conflicting text edit: {0}")]
    EditConflict(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// Create an invalid span error.
    pub fn invalid_span(span: Span, reason: impl Into<String>) -> Self {
        Error::InvalidSpan {
            span,
            reason: reason.into(),
        }
    }

    /// Create a sentence boundary error.
    pub fn sentence_boundaries(msg: impl Into<String>) -> Self {
        Error::SentenceBoundaries(msg.into())
    }

    /// Create a tree mode error.
    pub fn tree_mode(msg: impl Into<String>) -> Self {
        Error::TreeMode(msg.into())
    }

    /// Create an edit conflict error.
    pub fn edit_conflict(msg: impl Into<String>) -> Self {
        Error::EditConflict(msg.into())
    }
}
