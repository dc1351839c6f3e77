//! View specializations and the closed kind dispatch.
//!
//! Every concrete view kind wraps the base [`View`] and adds its own
//! constraints or derived structure. [`ViewVariant`] is the closed tagged
//! variant over the known kinds: transformation copies dispatch on it to
//! reconstruct the matching subtype and invoke its uniform
//! rebuild-derived-state hook after copying.

mod coreference;
mod graph;
mod predicate_argument;
mod span_label;
mod token_label;
mod tree;

pub use coreference::CoreferenceView;
pub use graph::GraphView;
pub use predicate_argument::{PredicateArgumentView, LEMMA_ATTRIBUTE, SENSE_ATTRIBUTE};
pub use span_label::SpanLabelView;
pub use token_label::TokenLabelView;
pub use tree::{DependencyNode, Tree, TreeView, PARENT_OF};

use crate::constituent::NodeId;
use crate::document::Document;
use crate::relation::EdgeId;
use crate::view::View;
use serde::{Deserialize, Serialize};

/// One concrete view of any known kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ViewVariant {
    /// A plain base view with no extra constraints.
    Basic(View),
    /// Flat labeled spans, optionally overlap-free.
    SpanLabel(SpanLabelView),
    /// One label per token, no relations.
    TokenLabel(TokenLabelView),
    /// Phrase or dependency trees, one per sentence.
    Tree(TreeView),
    /// A general directed graph with distance queries.
    Graph(GraphView),
    /// Coreference clusters.
    Coreference(CoreferenceView),
    /// Predicate-argument frames.
    PredicateArgument(PredicateArgumentView),
}

impl ViewVariant {
    /// The underlying base view.
    #[must_use]
    pub fn base(&self) -> &View {
        match self {
            ViewVariant::Basic(v) => v,
            ViewVariant::SpanLabel(v) => v.base(),
            ViewVariant::TokenLabel(v) => v.base(),
            ViewVariant::Tree(v) => v.base(),
            ViewVariant::Graph(v) => v.base(),
            ViewVariant::Coreference(v) => v.base(),
            ViewVariant::PredicateArgument(v) => v.base(),
        }
    }

    pub(crate) fn base_mut(&mut self) -> &mut View {
        match self {
            ViewVariant::Basic(v) => v,
            ViewVariant::SpanLabel(v) => v.base_mut(),
            ViewVariant::TokenLabel(v) => v.base_mut(),
            ViewVariant::Tree(v) => v.base_mut(),
            ViewVariant::Graph(v) => v.base_mut(),
            ViewVariant::Coreference(v) => v.base_mut(),
            ViewVariant::PredicateArgument(v) => v.base_mut(),
        }
    }

    /// The view name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.base().name()
    }

    /// The name of whatever produced this view.
    #[must_use]
    pub fn generator(&self) -> &str {
        self.base().generator()
    }

    /// The view-level score.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.base().score()
    }

    /// A short name of the concrete kind, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ViewVariant::Basic(_) => "view",
            ViewVariant::SpanLabel(_) => "span-label",
            ViewVariant::TokenLabel(_) => "token-label",
            ViewVariant::Tree(_) => "tree",
            ViewVariant::Graph(_) => "graph",
            ViewVariant::Coreference(_) => "coreference",
            ViewVariant::PredicateArgument(_) => "predicate-argument",
        }
    }

    /// Remove one relation, then rebuild kind-specific derived state.
    pub fn remove_relation(&mut self, id: EdgeId) {
        self.base_mut().remove_relation(id);
        self.rebuild_derived_state();
    }

    /// Remove every relation, then rebuild kind-specific derived state.
    pub fn remove_all_relations(&mut self) {
        self.base_mut().remove_all_relations();
        self.rebuild_derived_state();
    }

    /// Remove every constituent (and relation), then rebuild kind-specific
    /// derived state.
    pub fn remove_all_constituents(&mut self) {
        self.base_mut().remove_all_constituents();
        self.rebuild_derived_state();
    }

    /// Rebuild whatever the concrete kind derives from its graph: clears
    /// tree/graph caches, rediscovers predicates. Invoked after copies and
    /// removals.
    pub(crate) fn rebuild_derived_state(&mut self) {
        match self {
            ViewVariant::Tree(v) => v.clear_caches(),
            ViewVariant::Graph(v) => v.clear_caches(),
            ViewVariant::PredicateArgument(v) => v.find_predicates(),
            _ => {}
        }
    }

    /// An empty view of the same concrete kind, name, generator, score and
    /// configuration, built against `doc`.
    pub(crate) fn empty_like(&self, doc: &Document) -> ViewVariant {
        let base = self.base();
        let (name, generator, score) = (base.name(), base.generator(), base.score());
        match self {
            ViewVariant::Basic(_) => ViewVariant::Basic(View::new(doc, name, generator, score)),
            ViewVariant::SpanLabel(v) => {
                let mut new = SpanLabelView::new(doc, name, generator, score);
                if v.allows_overlap() {
                    new = new.allowing_overlap();
                }
                ViewVariant::SpanLabel(new)
            }
            ViewVariant::TokenLabel(_) => {
                ViewVariant::TokenLabel(TokenLabelView::new(doc, name, generator, score))
            }
            ViewVariant::Tree(_) => ViewVariant::Tree(TreeView::new(doc, name, generator, score)),
            ViewVariant::Graph(_) => {
                ViewVariant::Graph(GraphView::new(doc, name, generator, score))
            }
            ViewVariant::Coreference(_) => {
                ViewVariant::Coreference(CoreferenceView::new(doc, name, generator, score))
            }
            ViewVariant::PredicateArgument(_) => ViewVariant::PredicateArgument(
                PredicateArgumentView::new(doc, name, generator, score),
            ),
        }
    }
}

impl From<View> for ViewVariant {
    fn from(v: View) -> Self {
        ViewVariant::Basic(v)
    }
}

impl From<SpanLabelView> for ViewVariant {
    fn from(v: SpanLabelView) -> Self {
        ViewVariant::SpanLabel(v)
    }
}

impl From<TokenLabelView> for ViewVariant {
    fn from(v: TokenLabelView) -> Self {
        ViewVariant::TokenLabel(v)
    }
}

impl From<TreeView> for ViewVariant {
    fn from(v: TreeView) -> Self {
        ViewVariant::Tree(v)
    }
}

impl From<GraphView> for ViewVariant {
    fn from(v: GraphView) -> Self {
        ViewVariant::Graph(v)
    }
}

impl From<CoreferenceView> for ViewVariant {
    fn from(v: CoreferenceView) -> Self {
        ViewVariant::Coreference(v)
    }
}

impl From<PredicateArgumentView> for ViewVariant {
    fn from(v: PredicateArgumentView) -> Self {
        ViewVariant::PredicateArgument(v)
    }
}

/// First zero-incoming constituent inside each sentence's token range.
pub(crate) fn find_sentence_roots(view: &View, doc: &Document) -> Vec<Option<NodeId>> {
    doc.sentences()
        .iter()
        .map(|sentence| {
            view.in_span(sentence.span())
                .find(|&id| view.constituent(id).incoming().is_empty())
        })
        .collect()
}
