//! Property tests over spans, offsets and view ordering.

use palimpsest::{queries, Constituent, Document, Span, SpanLabelView, View};
use proptest::prelude::*;

/// Strategy: a token span within an `n`-token document, possibly empty.
fn span_in(n: usize) -> impl Strategy<Value = Span> {
    (0..n).prop_flat_map(move |start| (start..=n).prop_map(move |end| Span::new(start, end)))
}

fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

proptest! {
    #[test]
    fn overlap_is_symmetric(a in span_in(24), b in span_in(24)) {
        prop_assert_eq!(a.overlaps(b), b.overlaps(a));
    }

    #[test]
    fn overlap_symmetry_holds_for_constituent_pairs(a in span_in(12), b in span_in(12)) {
        let doc = Document::from_tokenized_text(&words(12)).unwrap();
        let mut view = SpanLabelView::new(&doc, "TEST", "prop", 1.0).allowing_overlap();
        let ca = view.add(Constituent::new(&doc, "TEST", "A", 1.0, a).unwrap()).unwrap();
        let cb = view.add(Constituent::new(&doc, "TEST", "B", 1.0, b).unwrap()).unwrap();

        let a_overlaps_b = queries::overlapping(view.base().constituent(ca).span())
            .eval(&doc, view.base(), cb);
        let b_overlaps_a = queries::overlapping(view.base().constituent(cb).span())
            .eval(&doc, view.base(), ca);
        prop_assert_eq!(a_overlaps_b, b_overlaps_a);
    }

    #[test]
    fn constituent_offsets_respect_span_order(span in span_in(16)) {
        let doc = Document::from_tokenized_text(&words(16)).unwrap();
        let c = Constituent::new(&doc, "TEST", "X", 1.0, span).unwrap();
        prop_assert!(c.start_span() <= c.end_span());
        prop_assert!(c.end_char_offset() >= c.start_char_offset());
        // the surface form is sliceable text
        let _ = c.surface_form(&doc);
    }

    #[test]
    fn virtual_markers_clamp(offset in 0usize..8) {
        let doc = Document::from_tokenized_text(&words(8)).unwrap();
        let n = doc.token_count();
        let c = Constituent::new(&doc, "TEST", "MARK", 1.0, Span::new(n + offset, n + offset))
            .unwrap();
        prop_assert_eq!(c.start_char_offset(), doc.text().len());
        prop_assert_eq!(c.end_char_offset(), doc.text().len());
    }

    #[test]
    fn view_order_is_start_sorted_after_arbitrary_adds(spans in prop::collection::vec(span_in(10), 1..24)) {
        let doc = Document::from_tokenized_text(&words(10)).unwrap();
        let mut view = View::new(&doc, "TEST", "prop", 1.0);
        for span in spans {
            view.add(Constituent::new(&doc, "TEST", "X", 1.0, span).unwrap());
        }
        let keys: Vec<(usize, usize)> = view
            .constituents()
            .map(|(_, c)| (c.start_span(), c.end_span()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        prop_assert_eq!(keys, sorted);
    }

    #[test]
    fn covering_token_agrees_with_span_math(spans in prop::collection::vec(span_in(10), 1..16), token in 0usize..10) {
        let doc = Document::from_tokenized_text(&words(10)).unwrap();
        let mut view = View::new(&doc, "TEST", "prop", 1.0);
        for span in spans {
            view.add(Constituent::new(&doc, "TEST", "X", 1.0, span).unwrap());
        }
        let by_lookup: Vec<_> = view.covering_token(token).collect();
        let by_predicate: Vec<_> = view
            .matching(&doc, queries::covering(Span::new(token, token + 1)))
            .collect();
        prop_assert_eq!(by_lookup, by_predicate);
    }
}
