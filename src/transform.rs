//! Lossless remapping of annotations across derived copies of a text.
//!
//! Three procedures copy a source document's view constituents and
//! relations into a target document with token-index remapping, then
//! reconstruct the matching view subtype so kind-specific derived state
//! (tree caches, predicate discovery) can rebuild:
//!
//! - [`document_for_sentence`] — a standalone document for exactly one
//!   sentence, offsets rebased to zero;
//! - [`map_sentence_annotations_to_document`] — a sentence document's
//!   annotations mapped onto the containing document at the sentence's
//!   absolute offset;
//! - [`map_to_source_text`] — a document built over transformed text moved
//!   back onto the original text through a recorded
//!   [`StringTransformation`], token indices unchanged.
//!
//! Copy maps are keyed by constituent handle — object identity, not
//! content equality — because a view may legitimately hold
//! duplicate-content constituents as distinct entities. A relation is
//! copied iff both of its endpoints were.

use crate::constituent::NodeId;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::span::{Span, TextSpan};
use crate::string_transformation::StringTransformation;
use crate::view_names;
use crate::views::ViewVariant;
use std::collections::HashMap;

/// Copy a view into `target`: constituents restricted to `range` (when
/// given), spans shifted by `shift` tokens, relations carried iff both
/// endpoints survived, same concrete view kind, derived state rebuilt.
pub fn copy_view(
    source_doc: &Document,
    source: &ViewVariant,
    target_doc: &Document,
    range: Option<Span>,
    shift: isize,
) -> Result<ViewVariant> {
    let mut target = source.empty_like(target_doc);
    copy_into(source_doc, source, target_doc, &mut target, range, shift)?;
    Ok(target)
}

/// The copy workhorse: appends `source`'s (filtered, shifted) constituents
/// and surviving relations into an existing target view, then rebuilds the
/// target's derived state.
fn copy_into(
    source_doc: &Document,
    source: &ViewVariant,
    target_doc: &Document,
    target: &mut ViewVariant,
    range: Option<Span>,
    shift: isize,
) -> Result<()> {
    let base = source.base();
    let view_name = target.name().to_string();

    // identity-keyed copy map: handles, not content
    let mut copied: HashMap<NodeId, NodeId> = HashMap::new();
    for (id, constituent) in base.constituents() {
        if let Some(range) = range {
            if !constituent.in_range(range) {
                continue;
            }
        }
        let span = constituent.span().shifted(shift);
        let rebuilt = constituent.rebuilt_for(source_doc, target_doc, &view_name, None, span)?;
        copied.insert(id, target.base_mut().add_unsorted(rebuilt));
    }

    for (_, relation) in base.relations() {
        let (Some(&source_id), Some(&target_id)) =
            (copied.get(&relation.source()), copied.get(&relation.target()))
        else {
            continue;
        };
        let name = relation.name(source_doc);
        let edge = target.base_mut().add_relation(
            target_doc.symbols(),
            &name,
            source_id,
            target_id,
            relation.score(),
        )?;
        if let Some(attributes) = relation.attributes() {
            let copied_relation = target
                .base_mut()
                .relation_mut(edge)
                .expect("edge was just added");
            for (key, value) in attributes {
                copied_relation.set_attribute(key.clone(), value.clone());
            }
        }
    }

    target.base_mut().resort();
    target.rebuild_derived_state();
    Ok(())
}

/// A document's view restricted to a token range, unshifted. Backs the
/// per-sentence view cache.
pub(crate) fn restrict_view(
    doc: &Document,
    view: &ViewVariant,
    range: Span,
) -> Result<ViewVariant> {
    copy_view(doc, view, doc, Some(range), 0)
}

/// Build a standalone document for exactly one sentence: its tokens and
/// text with byte offsets rebased to zero, one sentence boundary, and
/// every non-reserved view restricted to the sentence and shifted to
/// sentence-local token indices.
///
/// # Errors
///
/// Fails when the sentence does not exist or a view copy fails.
pub fn document_for_sentence(doc: &Document, sentence_id: usize) -> Result<Document> {
    let sentence = doc
        .sentence(sentence_id)
        .ok_or_else(|| Error::invalid_input(format!("no sentence {sentence_id}")))?;
    let span = sentence.span();
    let first_byte = doc.token_offset(span.start).start;
    let last_byte = doc.token_offset(span.end - 1).end;

    let text = doc.text()[first_byte..last_byte].to_string();
    let tokens = doc.tokens_in_span(span).to_vec();
    let offsets: Vec<TextSpan> = (span.start..span.end)
        .map(|token| {
            let offset = doc.token_offset(token);
            TextSpan::new(offset.start - first_byte, offset.end - first_byte)
        })
        .collect();

    let mut sentence_doc = Document::new(
        doc.corpus_id(),
        doc.id(),
        text,
        tokens,
        offsets,
        &[span.len()],
    )?;

    let shift = -(span.start as isize);
    let mut names: Vec<String> = doc
        .available_views()
        .filter(|name| !view_names::is_reserved(name))
        .map(str::to_string)
        .collect();
    names.sort();
    for name in names {
        let copied = copy_view(doc, doc.view(&name)?, &sentence_doc, Some(span), shift)?;
        sentence_doc.add_view(copied);
    }
    Ok(sentence_doc)
}

/// Map a sentence document's annotations onto the containing document at
/// the sentence's absolute token offset. Every non-reserved view of
/// `sentence_doc` is copied into `doc` under its own name; a view the
/// document already has is merged into, so re-embedding one sentence after
/// another accumulates.
///
/// # Errors
///
/// Fails when the sentence does not exist, the token counts disagree, or a
/// view copy fails.
pub fn map_sentence_annotations_to_document(
    sentence_doc: &Document,
    doc: &mut Document,
    sentence_id: usize,
) -> Result<()> {
    let span = doc
        .sentence(sentence_id)
        .ok_or_else(|| Error::invalid_input(format!("no sentence {sentence_id}")))?
        .span();
    if span.len() != sentence_doc.token_count() {
        return Err(Error::invalid_input(format!(
            "sentence {sentence_id} has {} tokens, the sentence document {}",
            span.len(),
            sentence_doc.token_count()
        )));
    }

    let shift = span.start as isize;
    let mut names: Vec<String> = sentence_doc
        .available_views()
        .filter(|name| !view_names::is_reserved(name))
        .map(str::to_string)
        .collect();
    names.sort();
    for name in names {
        let source = sentence_doc.view(&name)?;
        if doc.has_view(&name) {
            let mut ranked = doc.remove_view(&name).expect("view is present");
            let target = ranked.first_mut().expect("ranked views are never empty");
            copy_into(sentence_doc, source, doc, target, None, shift)?;
            doc.add_top_k_views(name, ranked)?;
        } else {
            let copied = copy_view(sentence_doc, source, doc, None, shift)?;
            doc.add_view(copied);
        }
    }
    Ok(())
}

/// Rebuild a document over the original text of a recorded transformation:
/// every token's byte offsets are mapped back through the correspondence,
/// token indices and views carry over unchanged.
///
/// # Errors
///
/// Fails when the document text is not the transformation's transformed
/// text, or when a view copy fails.
pub fn map_to_source_text(
    doc: &Document,
    transformation: &StringTransformation,
) -> Result<Document> {
    if doc.text() != transformation.transformed_text() {
        return Err(Error::invalid_input(
            "document text does not match the transformation's transformed text",
        ));
    }

    let offsets: Vec<TextSpan> = (0..doc.token_count())
        .map(|token| transformation.original_offsets(doc.token_offset(token)))
        .collect();
    let sentence_ends: Vec<usize> = doc.sentences().iter().map(|s| s.end_span()).collect();

    let mut source_doc = Document::new(
        doc.corpus_id(),
        doc.id(),
        transformation.original_text(),
        doc.tokens().to_vec(),
        offsets,
        &sentence_ends,
    )?;

    let mut names: Vec<String> = doc
        .available_views()
        .filter(|name| !view_names::is_reserved(name))
        .map(str::to_string)
        .collect();
    names.sort();
    for name in names {
        let copied = copy_view(doc, doc.view(&name)?, &source_doc, None, 0)?;
        source_doc.add_view(copied);
    }
    Ok(source_doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::{CoreferenceView, SpanLabelView};

    fn two_sentence_doc() -> Document {
        Document::from_sentences("c", "d", &["The cat sat .", "It purred ."]).unwrap()
    }

    #[test]
    fn sentence_extraction_rebases_offsets() {
        let mut d = two_sentence_doc();
        let mut ner = SpanLabelView::new(&d, "NER", "tagger", 1.0);
        ner.add_span_label(&d, Span::new(1, 2), "ANIMAL", 0.9).unwrap();
        ner.add_span_label(&d, Span::new(4, 5), "PRONOUN", 0.8).unwrap();
        d.add_view(ner);

        let sent = document_for_sentence(&d, 1).unwrap();
        assert_eq!(sent.text(), "It purred .");
        assert_eq!(sent.token_count(), 3);
        assert_eq!(sent.token_offset(0), TextSpan::new(0, 2));
        assert_eq!(sent.sentence_count(), 1);

        let ner = sent.view("NER").unwrap();
        assert_eq!(ner.base().len(), 1);
        let (_, c) = ner.base().constituents().next().unwrap();
        assert_eq!(c.span(), Span::new(0, 1));
        assert_eq!(&*c.label(&sent), "PRONOUN");
        assert_eq!(c.score(), 0.8);
        assert_eq!(c.surface_form(&sent), "It");
    }

    #[test]
    fn relations_copy_iff_both_endpoints_do() {
        let mut d = two_sentence_doc();
        let mut coref = CoreferenceView::new(&d, "COREF", "test", 1.0);
        let cat = coref.add(
            crate::Constituent::new(&d, "COREF", "mention", 1.0, Span::new(1, 2)).unwrap(),
        );
        let it = coref.add(
            crate::Constituent::new(&d, "COREF", "mention", 1.0, Span::new(4, 5)).unwrap(),
        );
        coref.add_coref_edges(cat, &[it]).unwrap();
        d.add_view(coref);

        // the cross-sentence edge cannot survive a single-sentence copy
        let sent = document_for_sentence(&d, 1).unwrap();
        let copied = sent.view("COREF").unwrap();
        assert_eq!(copied.base().len(), 1);
        assert_eq!(copied.base().relation_count(), 0);

        // a full-range copy keeps it
        let full = copy_view(&d, d.view("COREF").unwrap(), &d, None, 0).unwrap();
        assert_eq!(full.base().relation_count(), 1);
    }

    #[test]
    fn duplicate_content_constituents_stay_distinct() {
        let mut d = two_sentence_doc();
        let mut view = SpanLabelView::new(&d, "DUP", "test", 1.0).allowing_overlap();
        let a = view
            .add(crate::Constituent::new(&d, "DUP", "X", 1.0, Span::new(0, 1)).unwrap())
            .unwrap();
        let b = view
            .add(crate::Constituent::new(&d, "DUP", "X", 1.0, Span::new(0, 1)).unwrap())
            .unwrap();
        view.add_relation(d.symbols(), "self", a, b, 1.0).unwrap();
        d.add_view(view);

        let copied = copy_view(&d, d.view("DUP").unwrap(), &d, None, 0).unwrap();
        // both duplicates copied as distinct entities, edge intact
        assert_eq!(copied.base().len(), 2);
        assert_eq!(copied.base().relation_count(), 1);
    }

    #[test]
    fn round_trip_sentence_to_document() {
        let mut d = two_sentence_doc();
        let mut ner = SpanLabelView::new(&d, "NER", "tagger", 1.0);
        ner.add_span_label(&d, Span::new(4, 5), "PRONOUN", 0.8).unwrap();
        d.add_view(ner);

        let sent = document_for_sentence(&d, 1).unwrap();

        // an equivalent full document with no NER view yet
        let mut fresh = two_sentence_doc();
        map_sentence_annotations_to_document(&sent, &mut fresh, 1).unwrap();

        let view = fresh.view("NER").unwrap();
        assert_eq!(view.base().len(), 1);
        let (_, c) = view.base().constituents().next().unwrap();
        assert_eq!(c.span(), Span::new(4, 5));
        assert_eq!(&*c.label(&fresh), "PRONOUN");
        assert_eq!(c.surface_form(&fresh), "It");
    }
}
