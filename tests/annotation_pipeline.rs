//! End-to-end pipeline tests: several producers layering heterogeneous
//! views over one document, sentence restriction, and the persisted form.

use palimpsest::{
    queries, view_names, Constituent, CoreferenceView, Document, PredicateArgumentView, Span,
    SpanLabelView, TokenLabelView, ViewVariant,
};
use std::thread;

fn base_doc() -> Document {
    Document::from_sentences(
        "test-corpus",
        "doc0",
        &["John saw the cat .", "He waved ."],
    )
    .unwrap()
}

#[test]
fn heterogeneous_layers_coexist_over_one_text() {
    let mut doc = base_doc();

    let mut pos = TokenLabelView::new(&doc, view_names::POS, "tagger", 1.0);
    for (i, tag) in ["NNP", "VBD", "DT", "NN", ".", "PRP", "VBD", "."]
        .iter()
        .enumerate()
    {
        pos.add_token_label(&doc, i, tag, 1.0).unwrap();
    }
    doc.add_view(pos);

    let mut ner = SpanLabelView::new(&doc, view_names::NER, "tagger", 1.0);
    ner.add_span_label(&doc, Span::new(0, 1), "PER", 0.95).unwrap();
    doc.add_view(ner);

    let mut coref = CoreferenceView::new(&doc, view_names::COREF, "resolver", 1.0);
    let john = coref.add(Constituent::new(&doc, view_names::COREF, "mention", 1.0, Span::new(0, 1)).unwrap());
    let he = coref.add(Constituent::new(&doc, view_names::COREF, "mention", 1.0, Span::new(5, 6)).unwrap());
    coref.add_coref_edges(john, &[he]).unwrap();
    doc.add_view(coref);

    let mut srl = PredicateArgumentView::new(&doc, view_names::SRL_VERB, "labeler", 1.0);
    let saw = srl.add(Constituent::new(&doc, view_names::SRL_VERB, "saw", 1.0, Span::new(1, 2)).unwrap());
    let agent = srl.add(Constituent::new(&doc, view_names::SRL_VERB, "John", 1.0, Span::new(0, 1)).unwrap());
    let theme = srl.add(Constituent::new(&doc, view_names::SRL_VERB, "the cat", 1.0, Span::new(2, 4)).unwrap());
    srl.add_frame(doc.symbols(), saw, &[agent, theme], &["ARG0", "ARG1"], &[0.9, 0.85])
        .unwrap();
    doc.add_view(srl);

    assert_eq!(doc.available_views().count(), 6); // 4 + SENTENCE + TOKENS

    // the same token participates in several layers at once
    let over_john = |name: &str| doc.select(name).matching(queries::covering(Span::new(0, 1)));
    assert_eq!(over_john(view_names::POS).len(), 1);
    assert_eq!(over_john(view_names::NER).len(), 1);
    assert_eq!(over_john(view_names::COREF).len(), 1);
    assert_eq!(over_john(view_names::SRL_VERB).len(), 1);

    // coref resolves across sentences
    let ViewVariant::Coreference(coref) = doc.view(view_names::COREF).unwrap() else {
        panic!("wrong view kind");
    };
    assert_eq!(coref.canonical_mention(he).unwrap(), john);

    // srl frame is queryable through the graph predicates
    let ViewVariant::PredicateArgument(srl) = doc.view(view_names::SRL_VERB).unwrap() else {
        panic!("wrong view kind");
    };
    assert_eq!(srl.predicates(), vec![saw]);
    assert_eq!(srl.arguments(saw).unwrap().len(), 2);
}

#[test]
fn sentence_restriction_serves_from_cache_and_keeps_absolute_indices() {
    let mut doc = base_doc();
    let mut ner = SpanLabelView::new(&doc, view_names::NER, "tagger", 1.0);
    ner.add_span_label(&doc, Span::new(0, 1), "PER", 0.95).unwrap();
    ner.add_span_label(&doc, Span::new(5, 6), "PER", 0.90).unwrap();
    doc.add_view(ner);

    let second = doc.sentence(1).unwrap();
    assert_eq!(second.text(&doc), "He waved .");

    let restricted = second.view(&doc, view_names::NER).unwrap();
    assert_eq!(restricted.base().len(), 1);
    let (_, mention) = restricted.base().constituents().next().unwrap();
    assert_eq!(mention.span(), Span::new(5, 6));
    assert_eq!(mention.surface_form(&doc), "He");

    let again = second.view(&doc, view_names::NER).unwrap();
    assert!(std::sync::Arc::ptr_eq(&restricted, &again));
}

#[test]
fn distinct_views_can_be_produced_in_parallel() {
    let doc = base_doc();

    // one writer per view name, all against &Document; the interner is the
    // only shared state
    let (pos, ner) = thread::scope(|scope| {
        let pos_handle = scope.spawn(|| {
            let mut pos = TokenLabelView::new(&doc, view_names::POS, "tagger", 1.0);
            for token in 0..doc.token_count() {
                pos.add_token_label(&doc, token, "TAG", 1.0).unwrap();
            }
            pos
        });
        let ner_handle = scope.spawn(|| {
            let mut ner = SpanLabelView::new(&doc, view_names::NER, "tagger", 1.0);
            ner.add_span_label(&doc, Span::new(0, 1), "PER", 0.9).unwrap();
            ner
        });
        (pos_handle.join().unwrap(), ner_handle.join().unwrap())
    });

    let mut doc = doc;
    doc.add_view(pos);
    doc.add_view(ner);
    assert_eq!(doc.view(view_names::POS).unwrap().base().len(), 8);
    assert_eq!(doc.view(view_names::NER).unwrap().base().len(), 1);
    assert!(doc.symbols().get_id("PER").is_some());
}

#[test]
fn persisted_form_round_trips_the_object_graph() {
    let mut doc = base_doc();
    let mut coref = CoreferenceView::new(&doc, view_names::COREF, "resolver", 1.0);
    let john = coref.add(Constituent::new(&doc, view_names::COREF, "mention", 1.0, Span::new(0, 1)).unwrap());
    let he = coref.add(Constituent::new(&doc, view_names::COREF, "mention", 1.0, Span::new(5, 6)).unwrap());
    coref.add_coref_edges(john, &[he]).unwrap();
    doc.add_view(coref);

    let json = doc.to_json().unwrap();
    let back = Document::from_json(&json).unwrap();
    assert_eq!(back, doc);

    let ViewVariant::Coreference(coref) = back.view(view_names::COREF).unwrap() else {
        panic!("view kind lost in serialization");
    };
    assert_eq!(coref.base().relation_count(), 1);
    assert_eq!(coref.canonical_mention(he).unwrap(), john);
    // sentences rebuild lazily after deserialization
    assert_eq!(back.sentence_count(), 2);
}

#[test]
fn virtual_marker_constituents_are_queryable() {
    let doc = base_doc();
    let n = doc.token_count();
    let marker = Constituent::new(&doc, "MARKS", "EOF", 1.0, Span::new(n, n)).unwrap();
    assert_eq!(marker.start_char_offset(), doc.text().len());
    assert_eq!(marker.sentence_id(&doc), None);
    assert_eq!(marker.surface_form(&doc), "");
}
