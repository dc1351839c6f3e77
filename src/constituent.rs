//! Constituents: the node type of an annotation graph.
//!
//! A constituent is a labeled, scored token span owned by exactly one view
//! of one document. Constituents are the nodes and
//! [`Relation`](crate::Relation)s the edges of a view's graph. Structure is
//! immutable after construction; only the attribute bag and the incident
//! edge lists (maintained by the owning [`View`](crate::View)) change.
//!
//! Identity versus content: a constituent's identity is its [`NodeId`]
//! handle within its view — two constituents with identical content are
//! still distinct entities, which is what transformation copy maps rely on.
//! Content comparison ([`Constituent::content_eq`],
//! [`Constituent::content_hash`]) is the client-facing structural notion:
//! document text, span, label, score, view name, attributes and label map.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::relation::EdgeId;
use crate::span::{Span, TextSpan};
use crate::symtab::LabelId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Stable handle of a constituent within its view.
///
/// Handles are never reused and serve as object identity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Position of the constituent in its view's arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// A labeled, scored token span; the node type of an annotation graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constituent {
    span: Span,
    label: LabelId,
    score: f64,
    labels_to_scores: Option<BTreeMap<LabelId, f64>>,
    view_name: LabelId,
    offsets: TextSpan,
    attributes: Option<BTreeMap<String, String>>,
    pub(crate) outgoing: Vec<EdgeId>,
    pub(crate) incoming: Vec<EdgeId>,
}

impl Constituent {
    /// Create a constituent over `[span.start, span.end)` tokens of `doc`.
    ///
    /// The label is interned through the document's symbol table and the
    /// text offsets are computed once, here. A zero-length span at or past
    /// the token count is the "virtual" marker case: both offsets clamp to
    /// the document's final token offset.
    ///
    /// # Errors
    ///
    /// Fails if the span is inverted or reaches past the document's tokens.
    pub fn new(
        doc: &Document,
        view_name: &str,
        label: &str,
        score: f64,
        span: Span,
    ) -> Result<Self> {
        Self::assemble(doc, view_name, label, score, None, None, span)
    }

    /// Create a constituent from a label → score map. The primary label is
    /// the arg-max of the map; ties resolve to the lexicographically first
    /// label.
    ///
    /// # Errors
    ///
    /// Fails on an empty map or an invalid span.
    pub fn with_label_scores(
        doc: &Document,
        view_name: &str,
        labels_to_scores: BTreeMap<String, f64>,
        span: Span,
    ) -> Result<Self> {
        let (label, score) = {
            let mut best: Option<(&str, f64)> = None;
            for (l, &s) in &labels_to_scores {
                match best {
                    Some((_, bs)) if s <= bs => {}
                    _ => best = Some((l, s)),
                }
            }
            let (l, s) = best
                .ok_or_else(|| Error::invalid_input("empty label-to-score map"))?;
            (l.to_string(), s)
        };
        Self::assemble(
            doc,
            view_name,
            &label,
            score,
            Some(labels_to_scores),
            None,
            span,
        )
    }

    fn assemble(
        doc: &Document,
        view_name: &str,
        label: &str,
        score: f64,
        labels_to_scores: Option<BTreeMap<String, f64>>,
        attributes: Option<BTreeMap<String, String>>,
        span: Span,
    ) -> Result<Self> {
        if span.start > span.end {
            return Err(Error::invalid_span(span, "start exceeds end"));
        }
        let offsets = Self::compute_offsets(doc, span)?;
        if offsets.end < offsets.start {
            return Err(Error::invalid_span(
                span,
                format!("end offset {} precedes start offset {}", offsets.end, offsets.start),
            ));
        }
        let symbols = doc.symbols();
        Ok(Self {
            span,
            label: symbols.intern(label),
            score,
            labels_to_scores: labels_to_scores.map(|map| {
                map.into_iter()
                    .map(|(l, s)| (symbols.intern(&l), s))
                    .collect()
            }),
            view_name: symbols.intern(view_name),
            offsets,
            attributes,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        })
    }

    fn compute_offsets(doc: &Document, span: Span) -> Result<TextSpan> {
        let token_count = doc.token_count();
        if span.start == span.end && span.start >= token_count {
            // virtual zero-length marker beyond the last token
            let end = doc.token_offset(token_count - 1).end;
            return Ok(TextSpan::new(end, end));
        }
        if span.start >= token_count {
            return Err(Error::invalid_span(
                span,
                format!("start past the document's {token_count} tokens"),
            ));
        }
        if span.end > token_count {
            return Err(Error::invalid_span(
                span,
                format!("end past the document's {token_count} tokens"),
            ));
        }
        let start = doc.token_offset(span.start).start;
        let end = if span.end > span.start {
            doc.token_offset(span.end - 1).end
        } else {
            // Inherited special case: an in-text empty span reads the end of
            // token `end`, not token `end - 1`. Inverted spans are rejected
            // above, so this fires only for start == end < token_count.
            doc.token_offset(span.end).end
        };
        Ok(TextSpan::new(start, end))
    }

    /// The token span.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// First token index.
    #[must_use]
    pub fn start_span(&self) -> usize {
        self.span.start
    }

    /// One-past-the-last token index.
    #[must_use]
    pub fn end_span(&self) -> usize {
        self.span.end
    }

    /// Number of tokens covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.span.len()
    }

    /// Whether the constituent covers no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }

    /// The interned primary label id.
    #[must_use]
    pub fn label_id(&self) -> LabelId {
        self.label
    }

    /// The primary label, resolved through the owning document's table.
    #[must_use]
    pub fn label(&self, doc: &Document) -> Arc<str> {
        doc.symbols().label(self.label)
    }

    /// The confidence score of the primary label.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// The full label → score map, resolved to strings, if one was supplied.
    #[must_use]
    pub fn labels_to_scores(&self, doc: &Document) -> Option<BTreeMap<String, f64>> {
        self.labels_to_scores.as_ref().map(|map| {
            map.iter()
                .map(|(&l, &s)| (doc.symbols().label(l).to_string(), s))
                .collect()
        })
    }

    /// The name of the view this constituent was built for.
    #[must_use]
    pub fn view_name(&self, doc: &Document) -> Arc<str> {
        doc.symbols().label(self.view_name)
    }

    pub(crate) fn view_name_id(&self) -> LabelId {
        self.view_name
    }

    /// The cached byte offsets of the span in the document text.
    #[must_use]
    pub fn text_span(&self) -> TextSpan {
        self.offsets
    }

    /// Start byte offset (inclusive).
    #[must_use]
    pub fn start_char_offset(&self) -> usize {
        self.offsets.start
    }

    /// End byte offset (exclusive).
    #[must_use]
    pub fn end_char_offset(&self) -> usize {
        self.offsets.end
    }

    /// End byte offset in inclusive form (`end - 1`, saturating at zero for
    /// an empty span at the text start).
    #[must_use]
    pub fn inclusive_end_char_offset(&self) -> usize {
        self.offsets.end.saturating_sub(1)
    }

    /// The original surface form: the raw text slice between the cached
    /// offsets. Compare [`Self::tokenized_surface_form`], which is a
    /// different normalization.
    #[must_use]
    pub fn surface_form<'a>(&self, doc: &'a Document) -> &'a str {
        self.offsets.slice(doc.text())
    }

    /// The tokenized surface form: covered tokens joined by single spaces.
    #[must_use]
    pub fn tokenized_surface_form(&self, doc: &Document) -> String {
        doc.tokens()[self.span.start..self.span.end].join(" ")
    }

    /// Whether the constituent covers the given token.
    #[must_use]
    pub fn covers_token(&self, token: usize) -> bool {
        self.span.covers_token(token)
    }

    /// Whether this constituent covers `other` entirely.
    #[must_use]
    pub fn covers(&self, other: &Constituent) -> bool {
        self.span.covers(other.span)
    }

    /// Whether the constituent lies within the given token range.
    #[must_use]
    pub fn in_range(&self, range: Span) -> bool {
        self.span.contained_in(range)
    }

    /// Index of the sentence containing this constituent, or `None` for a
    /// constituent outside every sentence (for instance a virtual marker).
    #[must_use]
    pub fn sentence_id(&self, doc: &Document) -> Option<usize> {
        doc.sentence_id_of_token(self.span.start).ok()
    }

    /// Edges for which this constituent is the source.
    #[must_use]
    pub fn outgoing(&self) -> &[EdgeId] {
        &self.outgoing
    }

    /// Edges for which this constituent is the target.
    #[must_use]
    pub fn incoming(&self) -> &[EdgeId] {
        &self.incoming
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

    /// The attribute keys, in sorted order.
    pub fn attribute_keys(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .iter()
            .flat_map(|map| map.keys().map(String::as_str))
    }

    /// The full attribute bag, if any attribute was ever set.
    #[must_use]
    pub fn attributes(&self) -> Option<&BTreeMap<String, String>> {
        self.attributes.as_ref()
    }

    /// Drop every attribute.
    pub fn remove_all_attributes(&mut self) {
        self.attributes = None;
    }

    /// An independent copy of this constituent under a new view name: same
    /// span, score, label map and attributes, no relations.
    ///
    /// # Errors
    ///
    /// Fails only if the span no longer fits the document, which cannot
    /// happen when `doc` is the owning document.
    pub fn clone_for_new_view(&self, doc: &Document, new_view_name: &str) -> Result<Self> {
        self.rebuilt_for(doc, doc, new_view_name, None, self.span)
    }

    /// Like [`Self::clone_for_new_view`], with the primary label replaced.
    ///
    /// # Errors
    ///
    /// Fails only if the span no longer fits the document.
    pub fn clone_with_label(
        &self,
        doc: &Document,
        new_view_name: &str,
        label: &str,
    ) -> Result<Self> {
        self.rebuilt_for(doc, doc, new_view_name, Some(label), self.span)
    }

    /// Rebuild this constituent against `dst`, re-resolving every interned
    /// string from `src` and recomputing offsets for `span`. Relations are
    /// not carried over. This is the transformation-copy workhorse.
    pub(crate) fn rebuilt_for(
        &self,
        src: &Document,
        dst: &Document,
        view_name: &str,
        label_override: Option<&str>,
        span: Span,
    ) -> Result<Self> {
        let label = match label_override {
            Some(l) => l.to_string(),
            None => self.label(src).to_string(),
        };
        Self::assemble(
            dst,
            view_name,
            &label,
            self.score,
            self.labels_to_scores(src),
            self.attributes.clone(),
            span,
        )
    }

    /// Structural content equality: document text, span, primary label,
    /// score, view name, attributes and label map. Deliberately not
    /// identity — two separately built constituents with the same content
    /// are equal.
    #[must_use]
    pub fn content_eq(&self, doc: &Document, other: &Constituent, other_doc: &Document) -> bool {
        doc.text() == other_doc.text()
            && self.span == other.span
            && self.label(doc) == other.label(other_doc)
            && self.score.to_bits() == other.score.to_bits()
            && self.view_name(doc) == other.view_name(other_doc)
            && self.attributes == other.attributes
            && self.labels_to_scores(doc) == other.labels_to_scores(other_doc)
    }

    /// Hash of the structural content; equal content hashes equally.
    #[must_use]
    pub fn content_hash(&self, doc: &Document) -> u64 {
        let mut hasher = DefaultHasher::new();
        doc.text().hash(&mut hasher);
        self.span.hash(&mut hasher);
        self.label(doc).as_ref().hash(&mut hasher);
        self.score.to_bits().hash(&mut hasher);
        self.view_name(doc).as_ref().hash(&mut hasher);
        self.attributes.hash(&mut hasher);
        if let Some(map) = self.labels_to_scores(doc) {
            for (label, score) in map {
                label.hash(&mut hasher);
                score.to_bits().hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}
