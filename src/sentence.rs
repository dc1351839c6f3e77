//! Read-only sentence projections.

use crate::constituent::Constituent;
use crate::document::Document;
use crate::error::Result;
use crate::span::Span;
use crate::sync::{self, Mutex};
use crate::transform;
use crate::views::ViewVariant;
use std::collections::HashMap;
use std::sync::Arc;

/// A read-only projection of a document onto one contiguous token range.
///
/// Sentences are materialized lazily by
/// [`Document::sentences`](crate::Document::sentences) from the reserved
/// `SENTENCE` view and live for as long as the owning document. Text and
/// tokens are derived by slicing the document; per-view restrictions are
/// built on first request and cached under the view name.
///
/// The type deliberately exposes no mutators — edits go through the owning
/// document.
#[derive(Debug)]
pub struct Sentence {
    constituent: Constituent,
    restricted: Mutex<HashMap<String, Arc<ViewVariant>>>,
}

impl Sentence {
    pub(crate) fn new(constituent: Constituent) -> Self {
        Self {
            constituent,
            restricted: Mutex::new(HashMap::new()),
        }
    }

    /// The sentence's token range in the document.
    #[must_use]
    pub fn span(&self) -> Span {
        self.constituent.span()
    }

    /// First token index.
    #[must_use]
    pub fn start_span(&self) -> usize {
        self.constituent.start_span()
    }

    /// One-past-the-last token index.
    #[must_use]
    pub fn end_span(&self) -> usize {
        self.constituent.end_span()
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.constituent.len()
    }

    /// Whether the sentence covers no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constituent.is_empty()
    }

    /// Start byte offset in the document text.
    #[must_use]
    pub fn start_char_offset(&self) -> usize {
        self.constituent.start_char_offset()
    }

    /// End byte offset in the document text.
    #[must_use]
    pub fn end_char_offset(&self) -> usize {
        self.constituent.end_char_offset()
    }

    /// The sentence-boundary constituent backing this sentence.
    #[must_use]
    pub fn constituent(&self) -> &Constituent {
        &self.constituent
    }

    /// The raw text slice of the sentence.
    #[must_use]
    pub fn text<'a>(&self, doc: &'a Document) -> &'a str {
        self.constituent.surface_form(doc)
    }

    /// The sentence tokens joined by single spaces.
    #[must_use]
    pub fn tokenized_text(&self, doc: &Document) -> String {
        self.constituent.tokenized_surface_form(doc)
    }

    /// The sentence's tokens, sliced from the document.
    #[must_use]
    pub fn tokens<'a>(&self, doc: &'a Document) -> &'a [String] {
        doc.tokens_in_span(self.span())
    }

    /// One token by sentence-relative index.
    ///
    /// # Panics
    ///
    /// Panics if the index is outside the sentence.
    #[must_use]
    pub fn token<'a>(&self, doc: &'a Document, index: usize) -> &'a str {
        assert!(index < self.len(), "token {index} outside sentence");
        doc.token(self.start_span() + index)
    }

    /// The document's view of this name restricted to the sentence's token
    /// range, with token indices kept document-absolute.
    ///
    /// The restriction is built on first request — the first reader pays
    /// the cost — cached under the same name, and served from the cache
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Fails when the document lacks the view.
    pub fn view(&self, doc: &Document, name: &str) -> Result<Arc<ViewVariant>> {
        let mut cache = sync::lock(&self.restricted);
        if let Some(view) = cache.get(name) {
            return Ok(Arc::clone(view));
        }
        let source = doc.view(name)?;
        let restricted = Arc::new(transform::restrict_view(doc, source, self.span())?);
        cache.insert(name.to_string(), Arc::clone(&restricted));
        Ok(restricted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::TextSpan;
    use crate::views::SpanLabelView;

    fn doc() -> Document {
        Document::from_sentences("c", "d", &["The cat sat .", "It purred ."]).unwrap()
    }

    #[test]
    fn text_and_tokens_slice_the_document() {
        let d = doc();
        let s = d.sentence(1).unwrap();
        assert_eq!(s.span(), Span::new(4, 7));
        assert_eq!(s.text(&d), "It purred .");
        assert_eq!(s.tokens(&d), &["It", "purred", "."]);
        assert_eq!(s.token(&d, 1), "purred");
        assert_eq!(s.len(), 3);
        assert_eq!(
            TextSpan::new(s.start_char_offset(), s.end_char_offset()),
            TextSpan::new(14, 25)
        );
    }

    #[test]
    fn view_restriction_filters_to_the_sentence_range() {
        let mut d = doc();
        let mut ner = SpanLabelView::new(&d, "NER", "tagger", 1.0);
        ner.add_span_label(&d, Span::new(1, 2), "ANIMAL", 1.0).unwrap();
        ner.add_span_label(&d, Span::new(4, 5), "PRONOUN", 1.0).unwrap();
        d.add_view(ner);

        let second = d.sentence(1).unwrap();
        let restricted = second.view(&d, "NER").unwrap();
        assert_eq!(restricted.base().len(), 1);
        let (_, c) = restricted.base().constituents().next().unwrap();
        // token indices stay document-absolute
        assert_eq!(c.span(), Span::new(4, 5));
        assert_eq!(&*c.label(&d), "PRONOUN");
    }

    #[test]
    fn view_restriction_is_cached() {
        let mut d = doc();
        let ner = SpanLabelView::new(&d, "NER", "tagger", 1.0);
        d.add_view(ner);
        let s = d.sentence(0).unwrap();
        let first = s.view(&d, "NER").unwrap();
        let second = s.view(&d, "NER").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_view_fails() {
        let d = doc();
        let s = d.sentence(0).unwrap();
        assert!(s.view(&d, "MISSING").is_err());
    }
}
