//! The document: root container for a text's raw content, tokens and views.

use crate::constituent::{Constituent, NodeId};
use crate::error::{Error, Result};
use crate::queries::Predicate;
use crate::sentence::Sentence;
use crate::span::{Span, TextSpan};
use crate::symtab::SymbolTable;
use crate::view_names;
use crate::views::{SpanLabelView, TokenLabelView, ViewVariant};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// All annotation for one piece of text: the immutable raw text, its
/// tokens with byte offsets, the shared label interner, and a map from
/// view name to ranked view alternatives.
///
/// Tokens and text are set exactly once, at construction, which also
/// builds the two reserved views: the `SENTENCE` boundary span view and
/// the one-constituent-per-token `TOKENS` view.
///
/// Distinct views may be produced in parallel against `&Document` (one
/// writer per view name); the interner's append path is the only shared
/// state and carries its own lock.
#[derive(Debug, Serialize, Deserialize)]
pub struct Document {
    corpus_id: String,
    id: String,
    text: String,
    tokens: Vec<String>,
    token_offsets: Vec<TextSpan>,
    symbols: Arc<SymbolTable>,
    views: HashMap<String, Vec<ViewVariant>>,
    #[serde(skip)]
    sentences: OnceCell<Vec<Sentence>>,
    #[serde(skip)]
    tokenized_text: OnceCell<String>,
}

impl Document {
    /// Construct a document from raw text, tokens with their byte offsets,
    /// and sentence-end token indices.
    ///
    /// # Errors
    ///
    /// Fails when the token and offset counts differ, the document has no
    /// tokens, any offset pair is inverted, out of text range, off a UTF-8
    /// boundary or non-monotonic, or the sentence ends are not strictly
    /// increasing and terminated by the token count.
    pub fn new(
        corpus_id: impl Into<String>,
        id: impl Into<String>,
        text: impl Into<String>,
        tokens: Vec<String>,
        token_offsets: Vec<TextSpan>,
        sentence_ends: &[usize],
    ) -> Result<Self> {
        let text = text.into();
        if tokens.is_empty() {
            return Err(Error::invalid_input("a document needs at least one token"));
        }
        if tokens.len() != token_offsets.len() {
            return Err(Error::invalid_input(format!(
                "{} tokens but {} token offsets",
                tokens.len(),
                token_offsets.len()
            )));
        }
        let mut previous_end = 0;
        for (i, offset) in token_offsets.iter().enumerate() {
            if !offset.is_ordered() || offset.end > text.len() {
                return Err(Error::invalid_input(format!(
                    "token {i} offset {offset} out of range for text of {} bytes",
                    text.len()
                )));
            }
            if !text.is_char_boundary(offset.start) || !text.is_char_boundary(offset.end) {
                return Err(Error::invalid_input(format!(
                    "token {i} offset {offset} splits a UTF-8 character"
                )));
            }
            if offset.start < previous_end {
                return Err(Error::invalid_input(format!(
                    "token {i} offset {offset} not monotonic"
                )));
            }
            previous_end = offset.end;
        }
        match sentence_ends.last() {
            None => {
                return Err(Error::sentence_boundaries("no sentence boundaries given"));
            }
            Some(&last) if last != tokens.len() => {
                return Err(Error::sentence_boundaries(format!(
                    "last boundary is {last}, should be the token count {}",
                    tokens.len()
                )));
            }
            Some(_) => {}
        }
        if sentence_ends.windows(2).any(|w| w[0] >= w[1]) || sentence_ends[0] == 0 {
            return Err(Error::sentence_boundaries(
                "boundaries must be strictly increasing and non-empty",
            ));
        }

        let mut doc = Self {
            corpus_id: corpus_id.into(),
            id: id.into(),
            text,
            tokens,
            token_offsets,
            symbols: Arc::new(SymbolTable::new()),
            views: HashMap::new(),
            sentences: OnceCell::new(),
            tokenized_text: OnceCell::new(),
        };

        let mut sentence_view =
            SpanLabelView::new(&doc, view_names::SENTENCE, "UserSpecified", 1.0);
        let mut start = 0;
        for &end in sentence_ends {
            sentence_view.add_span_label(
                &doc,
                Span::new(start, end),
                view_names::SENTENCE,
                1.0,
            )?;
            start = end;
        }

        let mut token_view = TokenLabelView::new(&doc, view_names::TOKENS, "UserSpecified", 1.0);
        for token in 0..doc.tokens.len() {
            token_view.add_token_label(&doc, token, "", 1.0)?;
        }

        doc.views.insert(
            view_names::SENTENCE.to_string(),
            vec![ViewVariant::SpanLabel(sentence_view)],
        );
        doc.views.insert(
            view_names::TOKENS.to_string(),
            vec![ViewVariant::TokenLabel(token_view)],
        );
        Ok(doc)
    }

    /// Build a document by whitespace-tokenizing one string per sentence,
    /// joined by single spaces.
    ///
    /// # Errors
    ///
    /// Fails when no sentence, or a blank one, is given.
    pub fn from_sentences(
        corpus_id: impl Into<String>,
        id: impl Into<String>,
        sentences: &[&str],
    ) -> Result<Self> {
        let mut tokens: Vec<String> = Vec::new();
        let mut ends = Vec::with_capacity(sentences.len());
        for sentence in sentences {
            let before = tokens.len();
            tokens.extend(sentence.split_whitespace().map(str::to_string));
            if tokens.len() == before {
                return Err(Error::invalid_input("empty sentence"));
            }
            ends.push(tokens.len());
        }
        let text = tokens.join(" ");
        let mut offsets = Vec::with_capacity(tokens.len());
        let mut position = 0;
        for token in &tokens {
            offsets.push(TextSpan::new(position, position + token.len()));
            position += token.len() + 1;
        }
        Self::new(corpus_id, id, text, tokens, offsets, &ends)
    }

    /// Build a single-sentence document by whitespace-tokenizing `text`.
    ///
    /// # Errors
    ///
    /// Fails on blank text.
    pub fn from_tokenized_text(text: &str) -> Result<Self> {
        Self::from_sentences("corpus", "document", &[text])
    }

    /// The corpus identifier.
    #[must_use]
    pub fn corpus_id(&self) -> &str {
        &self.corpus_id
    }

    /// The document identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The raw text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// All tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// One token.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of range.
    #[must_use]
    pub fn token(&self, index: usize) -> &str {
        &self.tokens[index]
    }

    /// The tokens of a span.
    ///
    /// # Panics
    ///
    /// Panics if the span reaches past the token count.
    #[must_use]
    pub fn tokens_in_span(&self, span: Span) -> &[String] {
        &self.tokens[span.start..span.end]
    }

    /// Number of tokens.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// The byte offsets of one token in the raw text.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of range.
    #[must_use]
    pub fn token_offset(&self, index: usize) -> TextSpan {
        self.token_offsets[index]
    }

    /// The tokens joined by single spaces, built lazily and cached.
    #[must_use]
    pub fn tokenized_text(&self) -> &str {
        self.tokenized_text.get_or_init(|| self.tokens.join(" "))
    }

    /// The index of the token whose offsets contain the given byte offset,
    /// found by binary search.
    #[must_use]
    pub fn token_at_offset(&self, offset: usize) -> Option<usize> {
        let candidate = self
            .token_offsets
            .partition_point(|span| span.end <= offset);
        let span = self.token_offsets.get(candidate)?;
        (span.start <= offset).then_some(candidate)
    }

    /// The shared label interner.
    #[must_use]
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// A shareable handle on the interner, for editing a view in place
    /// while the document is mutably borrowed.
    #[must_use]
    pub fn symbols_shared(&self) -> Arc<SymbolTable> {
        Arc::clone(&self.symbols)
    }

    /// Add (or replace) the single value of a view name. The name is the
    /// view's own.
    pub fn add_view(&mut self, view: impl Into<ViewVariant>) {
        let view = view.into();
        self.views.insert(view.name().to_string(), vec![view]);
    }

    /// Add ranked alternatives for one view name, sorted by descending
    /// view score.
    ///
    /// # Errors
    ///
    /// Fails when the list is empty or a view's name differs from `name`.
    pub fn add_top_k_views(
        &mut self,
        name: impl Into<String>,
        mut views: Vec<ViewVariant>,
    ) -> Result<()> {
        let name = name.into();
        if views.is_empty() {
            return Err(Error::invalid_input("no views given"));
        }
        if let Some(stray) = views.iter().find(|v| v.name() != name) {
            return Err(Error::invalid_input(format!(
                "view named '{}' added under '{name}'",
                stray.name()
            )));
        }
        views.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(Ordering::Equal)
        });
        self.views.insert(name, views);
        Ok(())
    }

    /// Remove a view name entirely, returning its ranked values.
    pub fn remove_view(&mut self, name: &str) -> Option<Vec<ViewVariant>> {
        self.views.remove(name)
    }

    /// Whether the document has a view of this name.
    #[must_use]
    pub fn has_view(&self, name: &str) -> bool {
        self.views.contains_key(name)
    }

    /// The highest-scoring view of this name.
    ///
    /// # Errors
    ///
    /// Fails when the view is absent. [`Self::select`] is the non-failing
    /// query surface.
    pub fn view(&self, name: &str) -> Result<&ViewVariant> {
        self.views
            .get(name)
            .and_then(|ranked| ranked.first())
            .ok_or_else(|| Error::ViewNotFound(name.to_string()))
    }

    /// Mutable access to the highest-scoring view of this name. Pair with
    /// [`Self::symbols_shared`] when the edit needs to intern.
    ///
    /// # Errors
    ///
    /// Fails when the view is absent.
    pub fn view_mut(&mut self, name: &str) -> Result<&mut ViewVariant> {
        self.views
            .get_mut(name)
            .and_then(|ranked| ranked.first_mut())
            .ok_or_else(|| Error::ViewNotFound(name.to_string()))
    }

    /// Every ranked value of this view name, best first.
    ///
    /// # Errors
    ///
    /// Fails when the view is absent.
    pub fn top_k_views(&self, name: &str) -> Result<&[ViewVariant]> {
        self.views
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::ViewNotFound(name.to_string()))
    }

    /// Names of the available views, in no particular order.
    pub fn available_views(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    /// The query surface over a named view: empty when the view is absent,
    /// in contrast to the strict [`Self::view`] getter.
    #[must_use]
    pub fn select(&self, name: &str) -> Selection<'_> {
        Selection {
            doc: self,
            view: self.views.get(name).and_then(|ranked| ranked.first()),
        }
    }

    /// The document's sentences, sorted by start, built once from the
    /// `SENTENCE` view on first access and cached. The returned slice is
    /// identity-stable across calls.
    #[must_use]
    pub fn sentences(&self) -> &[Sentence] {
        self.sentences.get_or_init(|| self.build_sentences())
    }

    fn build_sentences(&self) -> Vec<Sentence> {
        let Ok(view) = self.view(view_names::SENTENCE) else {
            log::warn!("document '{}' lost its SENTENCE view", self.id);
            return Vec::new();
        };
        let mut sentences: Vec<Sentence> = view
            .base()
            .constituents()
            .map(|(_, c)| Sentence::new(c.clone()))
            .collect();
        sentences.sort_by_key(|s| s.start_span());
        sentences
    }

    /// One sentence by index.
    #[must_use]
    pub fn sentence(&self, index: usize) -> Option<&Sentence> {
        self.sentences().get(index)
    }

    /// Number of sentences.
    #[must_use]
    pub fn sentence_count(&self) -> usize {
        self.sentences().len()
    }

    /// The index of the sentence containing the given token.
    ///
    /// # Errors
    ///
    /// Fails when no sentence contains the token.
    pub fn sentence_id_of_token(&self, token: usize) -> Result<usize> {
        self.sentences()
            .iter()
            .position(|s| s.span().covers_token(token))
            .ok_or_else(|| Error::invalid_input(format!("no sentence contains token {token}")))
    }

    /// The sentence containing the given token.
    ///
    /// # Errors
    ///
    /// Fails when no sentence contains the token.
    pub fn sentence_of_token(&self, token: usize) -> Result<&Sentence> {
        let index = self.sentence_id_of_token(token)?;
        Ok(&self.sentences()[index])
    }

    /// Serialize the document and all its views to JSON, the persisted
    /// form for pipeline-local caching.
    ///
    /// # Errors
    ///
    /// Fails when serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Rebuild a document from its JSON persisted form. Lazy caches start
    /// empty and rebuild on demand.
    ///
    /// # Errors
    ///
    /// Fails on malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Documents compare by content identity — corpus id, document id, text,
/// tokens and sentence spans — not by the views they carry.
impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.corpus_id == other.corpus_id
            && self.id == other.id
            && self.text == other.text
            && self.tokens == other.tokens
            && self
                .sentences()
                .iter()
                .map(Sentence::span)
                .eq(other.sentences().iter().map(Sentence::span))
    }
}

/// The result of [`Document::select`]: a queryable, possibly absent view.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    doc: &'a Document,
    view: Option<&'a ViewVariant>,
}

impl<'a> Selection<'a> {
    /// The selected view, when present.
    #[must_use]
    pub fn view(&self) -> Option<&'a ViewVariant> {
        self.view
    }

    /// Whether the selection holds no constituents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.view.map_or(true, |v| v.base().is_empty())
    }

    /// The selection's constituents with their handles; empty when the
    /// view is absent.
    #[must_use]
    pub fn constituents(&self) -> Vec<(NodeId, &'a Constituent)> {
        match self.view {
            Some(v) => v.base().constituents().collect(),
            None => Vec::new(),
        }
    }

    /// The handles matching a predicate; empty when the view is absent.
    #[must_use]
    pub fn matching(&self, predicate: Predicate) -> Vec<NodeId> {
        match self.view {
            Some(v) => v.base().matching(self.doc, predicate).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries;

    fn cat_doc() -> Document {
        Document::new(
            "test-corpus",
            "doc0",
            "The cat sat .",
            vec!["The".into(), "cat".into(), "sat".into(), ".".into()],
            vec![
                TextSpan::new(0, 3),
                TextSpan::new(4, 7),
                TextSpan::new(8, 11),
                TextSpan::new(12, 13),
            ],
            &[4],
        )
        .unwrap()
    }

    #[test]
    fn construction_builds_reserved_views() {
        let d = cat_doc();
        assert!(d.has_view(view_names::SENTENCE));
        assert!(d.has_view(view_names::TOKENS));
        assert_eq!(d.view(view_names::TOKENS).unwrap().base().len(), 4);
        assert_eq!(d.view(view_names::SENTENCE).unwrap().base().len(), 1);
    }

    #[test]
    fn bad_sentence_boundaries_fail_fast() {
        let tokens: Vec<String> = vec!["a".into(), "b".into()];
        let offsets = vec![TextSpan::new(0, 1), TextSpan::new(2, 3)];
        // last boundary differs from the token count
        assert!(matches!(
            Document::new("c", "d", "a b", tokens.clone(), offsets.clone(), &[1]),
            Err(Error::SentenceBoundaries(_))
        ));
        assert!(matches!(
            Document::new("c", "d", "a b", tokens.clone(), offsets.clone(), &[]),
            Err(Error::SentenceBoundaries(_))
        ));
        assert!(Document::new("c", "d", "a b", tokens, offsets, &[2]).is_ok());
    }

    #[test]
    fn non_monotonic_offsets_fail() {
        let tokens: Vec<String> = vec!["a".into(), "b".into()];
        let offsets = vec![TextSpan::new(2, 3), TextSpan::new(0, 1)];
        assert!(Document::new("c", "d", "a b", tokens, offsets, &[2]).is_err());
    }

    #[test]
    fn mismatched_token_and_offset_counts_fail() {
        let tokens: Vec<String> = vec!["a".into(), "b".into()];
        assert!(Document::new("c", "d", "a b", tokens, vec![TextSpan::new(0, 1)], &[2]).is_err());
    }

    #[test]
    fn from_sentences_computes_offsets() {
        let d = Document::from_sentences("c", "d", &["The cat sat .", "It purred ."]).unwrap();
        assert_eq!(d.token_count(), 7);
        assert_eq!(d.sentence_count(), 2);
        assert_eq!(d.text(), "The cat sat . It purred .");
        assert_eq!(d.token_offset(4), TextSpan::new(14, 16));
        assert_eq!(d.token(4), "It");
        assert_eq!(d.tokenized_text(), d.text());
    }

    #[test]
    fn sentences_are_built_once_and_identity_stable() {
        let d = cat_doc();
        let first = d.sentences().as_ptr();
        let second = d.sentences().as_ptr();
        assert_eq!(first, second);
        assert_eq!(d.sentence_count(), 1);
        assert_eq!(d.sentence(0).unwrap().span(), Span::new(0, 4));
        assert_eq!(d.sentence_id_of_token(3).unwrap(), 0);
        assert!(d.sentence_id_of_token(4).is_err());
    }

    #[test]
    fn strict_getter_fails_where_select_is_empty() {
        let d = cat_doc();
        assert!(matches!(d.view("NER"), Err(Error::ViewNotFound(_))));
        let selection = d.select("NER");
        assert!(selection.is_empty());
        assert!(selection.constituents().is_empty());
        assert!(selection
            .matching(queries::overlapping(Span::new(0, 4)))
            .is_empty());
    }

    #[test]
    fn flat_span_query_scenario() {
        let mut d = cat_doc();
        let mut chunks = SpanLabelView::new(&d, view_names::SHALLOW_PARSE, "chunker", 1.0);
        chunks
            .add_span_label(&d, Span::new(0, 2), "NP", 1.0)
            .unwrap();
        d.add_view(chunks);

        let view = d.view(view_names::SHALLOW_PARSE).unwrap();
        let covering: Vec<NodeId> = view.base().covering_token(1).collect();
        assert_eq!(covering.len(), 1);
        let c = view.base().constituent(covering[0]);
        assert_eq!(c.span(), Span::new(0, 2));
        assert_eq!(&*c.label(&d), "NP");
        assert_eq!(c.surface_form(&d), "The cat");
    }

    #[test]
    fn ranked_views_sort_by_score() {
        let mut d = cat_doc();
        let a = ViewVariant::Basic(crate::View::new(&d, "ALT", "low", 0.3));
        let b = ViewVariant::Basic(crate::View::new(&d, "ALT", "high", 0.9));
        d.add_top_k_views("ALT", vec![a, b]).unwrap();
        assert_eq!(d.view("ALT").unwrap().generator(), "high");
        assert_eq!(d.top_k_views("ALT").unwrap().len(), 2);

        let stray = ViewVariant::Basic(crate::View::new(&d, "OTHER", "x", 1.0));
        assert!(d.add_top_k_views("ALT", vec![stray]).is_err());
    }

    #[test]
    fn token_at_offset_binary_search() {
        let d = cat_doc();
        assert_eq!(d.token_at_offset(0), Some(0));
        assert_eq!(d.token_at_offset(2), Some(0));
        assert_eq!(d.token_at_offset(3), None); // the space
        assert_eq!(d.token_at_offset(4), Some(1));
        assert_eq!(d.token_at_offset(12), Some(3));
        assert_eq!(d.token_at_offset(13), None);
    }

    #[test]
    fn json_round_trip_preserves_views() {
        let mut d = cat_doc();
        let mut chunks = SpanLabelView::new(&d, "CHUNKS", "chunker", 1.0);
        chunks
            .add_span_label(&d, Span::new(0, 2), "NP", 0.8)
            .unwrap();
        d.add_view(chunks);

        let json = d.to_json().unwrap();
        let back = Document::from_json(&json).unwrap();
        assert_eq!(back, d);
        let view = back.view("CHUNKS").unwrap();
        assert_eq!(view.base().len(), 1);
        let (_, c) = view.base().constituents().next().unwrap();
        assert_eq!(&*c.label(&back), "NP");
        assert_eq!(c.score(), 0.8);
    }
}
