//! Standard view names.
//!
//! Nothing requires these names, but producers and consumers that agree on
//! them compose without configuration. `SENTENCE` and `TOKENS` are
//! reserved: every document builds them at construction.

/// Sentence boundaries; reserved, built at document construction.
pub const SENTENCE: &str = "SENTENCE";

/// One constituent per token; reserved, built at document construction.
pub const TOKENS: &str = "TOKENS";

/// Part-of-speech tags.
pub const POS: &str = "POS";

/// Lemmas.
pub const LEMMA: &str = "LEMMA";

/// Named entities.
pub const NER: &str = "NER";

/// Shallow parse (chunk) spans.
pub const SHALLOW_PARSE: &str = "SHALLOW_PARSE";

/// Phrase-structure parse trees.
pub const PARSE: &str = "PARSE";

/// Dependency trees.
pub const DEPENDENCY: &str = "DEPENDENCY";

/// Verb semantic roles.
pub const SRL_VERB: &str = "SRL_VERB";

/// Coreference clusters.
pub const COREF: &str = "COREF";

/// Whether a view name is reserved for document construction.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    name == SENTENCE || name == TOKENS
}
