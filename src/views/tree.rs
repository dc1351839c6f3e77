//! Tree views: phrase-structure and dependency trees, one per sentence.

use crate::constituent::{Constituent, NodeId};
use crate::document::Document;
use crate::error::{Error, Result};
use crate::relation::EdgeId;
use crate::span::Span;
use crate::symtab::SymbolTable;
use crate::view::View;
use crate::views::find_sentence_roots;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::ops::Deref;

/// The relation name that marks a phrase-structure edge. A tree whose
/// root's first outgoing relation carries any other name is read as a
/// dependency tree.
pub const PARENT_OF: &str = "ParentOf";

/// An n-ary labeled tree with optional edge labels, the materialized form
/// of a [`TreeView`]'s per-sentence structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    label: String,
    edge_label: Option<String>,
    children: Vec<Tree>,
}

impl Tree {
    /// Create a leaf node.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            edge_label: None,
            children: Vec::new(),
        }
    }

    /// Create a node with children.
    #[must_use]
    pub fn with_children(label: impl Into<String>, children: Vec<Tree>) -> Self {
        Self {
            label: label.into(),
            edge_label: None,
            children,
        }
    }

    /// Append a child subtree.
    pub fn add_child(&mut self, child: Tree) {
        self.children.push(child);
    }

    /// Append a child subtree reached over a labeled edge.
    pub fn add_child_with_edge(&mut self, mut child: Tree, edge_label: impl Into<String>) {
        child.edge_label = Some(edge_label.into());
        self.children.push(child);
    }

    /// The node label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The label of the edge from this node's parent, if any.
    #[must_use]
    pub fn edge_label(&self) -> Option<&str> {
        self.edge_label.as_deref()
    }

    /// Child subtrees, in order.
    #[must_use]
    pub fn children(&self) -> &[Tree] {
        &self.children
    }

    /// Whether this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of leaves under (and including) this node.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(Tree::leaf_count).sum()
        }
    }

    /// Total number of nodes.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Tree::size).sum::<usize>()
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(edge) = &self.edge_label {
            write!(f, "{edge}:")?;
        }
        if self.is_leaf() {
            return write!(f, "{}", self.label);
        }
        write!(f, "({}", self.label)?;
        for child in &self.children {
            write!(f, " {child}")?;
        }
        write!(f, ")")
    }
}

/// A dependency tree node for [`TreeView::set_dependency_tree`]: a
/// sentence-relative token index plus labeled children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyNode {
    /// Token index relative to the sentence start.
    pub token: usize,
    /// Children as (relation label, subtree) pairs.
    pub children: Vec<(String, DependencyNode)>,
}

impl DependencyNode {
    /// Create a childless node over the given sentence-relative token.
    #[must_use]
    pub fn new(token: usize) -> Self {
        Self {
            token,
            children: Vec::new(),
        }
    }

    /// Append a child reached over a labeled dependency.
    pub fn add_child(&mut self, relation: impl Into<String>, child: DependencyNode) {
        self.children.push((relation.into(), child));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum TreeKind {
    Phrase,
    Dependency,
}

/// A view holding one tree per sentence.
///
/// Roots (constituents with no incoming relation) and materialized trees
/// are discovered per sentence on first query and cached; any structural
/// mutation through this type clears the caches, so they can never serve
/// stale structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeView {
    view: View,
    mode: Option<TreeKind>,
    #[serde(skip)]
    roots: OnceCell<Vec<Option<NodeId>>>,
    #[serde(skip)]
    trees: OnceCell<Vec<Option<Tree>>>,
}

impl TreeView {
    /// Create an empty tree view.
    #[must_use]
    pub fn new(
        doc: &Document,
        name: impl Into<String>,
        generator: impl Into<String>,
        score: f64,
    ) -> Self {
        Self {
            view: View::new(doc, name, generator, score),
            mode: None,
            roots: OnceCell::new(),
            trees: OnceCell::new(),
        }
    }

    /// Whether a constituent is a root (no incoming relations).
    #[must_use]
    pub fn is_root(c: &Constituent) -> bool {
        c.incoming().is_empty()
    }

    /// Whether a constituent is a leaf (no outgoing relations).
    #[must_use]
    pub fn is_leaf(c: &Constituent) -> bool {
        c.outgoing().is_empty()
    }

    /// Add a constituent.
    pub fn add(&mut self, constituent: Constituent) -> NodeId {
        self.clear_caches();
        self.view.add(constituent)
    }

    /// Add a tree edge.
    ///
    /// # Errors
    ///
    /// Fails if either endpoint handle is not from this view.
    pub fn add_relation(
        &mut self,
        symbols: &SymbolTable,
        name: &str,
        source: NodeId,
        target: NodeId,
        score: f64,
    ) -> Result<EdgeId> {
        self.clear_caches();
        self.view.add_relation(symbols, name, source, target, score)
    }

    pub(crate) fn clear_caches(&mut self) {
        self.roots.take();
        self.trees.take();
    }

    /// The parent of a constituent, following its first incoming relation.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let &edge = self.view.constituent(id).incoming().first()?;
        Some(self.view.relation(edge)?.source())
    }

    /// The root constituent of the tree covering the given sentence, if the
    /// sentence has one.
    #[must_use]
    pub fn root_constituent(&self, doc: &Document, sentence_id: usize) -> Option<NodeId> {
        self.roots
            .get_or_init(|| find_sentence_roots(&self.view, doc))
            .get(sentence_id)
            .copied()
            .flatten()
    }

    /// The materialized tree for the given sentence. Phrase mode labels
    /// nodes with constituent labels; dependency mode labels nodes with
    /// token strings and edges with relation names. The mode is decided by
    /// whether the root's first outgoing relation is named
    /// [`PARENT_OF`].
    #[must_use]
    pub fn tree(&self, doc: &Document, sentence_id: usize) -> Option<&Tree> {
        self.trees
            .get_or_init(|| {
                (0..doc.sentence_count())
                    .map(|sid| {
                        self.root_constituent(doc, sid)
                            .map(|root| self.build_tree(doc, root))
                    })
                    .collect()
            })
            .get(sentence_id)?
            .as_ref()
    }

    fn build_tree(&self, doc: &Document, root: NodeId) -> Tree {
        let dependency = match self
            .view
            .constituent(root)
            .outgoing()
            .first()
            .and_then(|&e| self.view.relation(e))
        {
            Some(r) => &*r.name(doc) != PARENT_OF,
            None => false,
        };
        let mut visited = HashSet::from([root]);
        self.build_subtree(doc, root, None, dependency, &mut visited)
    }

    fn build_subtree(
        &self,
        doc: &Document,
        node: NodeId,
        edge_label: Option<String>,
        dependency: bool,
        visited: &mut HashSet<NodeId>,
    ) -> Tree {
        let c = self.view.constituent(node);
        let label = if dependency {
            c.tokenized_surface_form(doc)
        } else {
            c.label(doc).to_string()
        };
        let mut tree = Tree::new(label);
        tree.edge_label = edge_label;
        for &edge in c.outgoing() {
            let Some(relation) = self.view.relation(edge) else {
                continue;
            };
            let child = relation.target();
            if !visited.insert(child) {
                log::warn!(
                    "cycle through constituent {:?} in view '{}'; subtree skipped",
                    child,
                    self.view.name()
                );
                continue;
            }
            let child_edge = dependency.then(|| relation.name(doc).to_string());
            tree.children
                .push(self.build_subtree(doc, child, child_edge, dependency, visited));
        }
        tree
    }

    /// Install a phrase-structure tree for one sentence. Leaves consume one
    /// token each, left to right; every node becomes a constituent and
    /// every parent-child pair a [`PARENT_OF`] relation.
    ///
    /// # Errors
    ///
    /// Fails if the view already holds dependency trees, the sentence does
    /// not exist, or the tree has more leaves than the sentence has tokens.
    pub fn set_parse_tree(
        &mut self,
        doc: &Document,
        sentence_id: usize,
        tree: &Tree,
    ) -> Result<()> {
        if self.mode == Some(TreeKind::Dependency) {
            return Err(Error::tree_mode(
                "view already holds dependency trees, cannot add a phrase tree",
            ));
        }
        self.mode = Some(TreeKind::Phrase);
        let sentence = doc
            .sentence(sentence_id)
            .ok_or_else(|| Error::invalid_input(format!("no sentence {sentence_id}")))?;
        let mut next_token = sentence.start_span();
        self.install_phrase_node(doc, tree, &mut next_token)?;
        self.view.resort();
        self.clear_caches();
        Ok(())
    }

    fn install_phrase_node(
        &mut self,
        doc: &Document,
        tree: &Tree,
        next_token: &mut usize,
    ) -> Result<NodeId> {
        let span = Span::new(*next_token, *next_token + tree.leaf_count());
        let c = Constituent::new(doc, self.view.name(), tree.label(), 1.0, span)?;
        let id = self.view.add_unsorted(c);
        if tree.is_leaf() {
            if doc.token(span.start) != tree.label() {
                log::debug!(
                    "leaf '{}' differs from token '{}' at {} in view '{}'",
                    tree.label(),
                    doc.token(span.start),
                    span.start,
                    self.view.name()
                );
            }
            *next_token += 1;
        } else {
            for child in tree.children() {
                let child_id = self.install_phrase_node(doc, child, next_token)?;
                self.view
                    .add_relation(doc.symbols(), PARENT_OF, id, child_id, 0.0)?;
            }
        }
        Ok(id)
    }

    /// Install a dependency tree for one sentence. Every node spans its one
    /// token; child constituents are labeled with the relation that reaches
    /// them and the root with `"ROOT"`.
    ///
    /// # Errors
    ///
    /// Fails if the view already holds phrase trees, the sentence does not
    /// exist, or a token index reaches outside the sentence.
    pub fn set_dependency_tree(
        &mut self,
        doc: &Document,
        sentence_id: usize,
        root: &DependencyNode,
        score: f64,
    ) -> Result<()> {
        if self.mode == Some(TreeKind::Phrase) {
            return Err(Error::tree_mode(
                "view already holds phrase trees, cannot add a dependency tree",
            ));
        }
        self.mode = Some(TreeKind::Dependency);
        let sentence = doc
            .sentence(sentence_id)
            .ok_or_else(|| Error::invalid_input(format!("no sentence {sentence_id}")))?;
        let span = sentence.span();
        self.install_dependency_node(doc, span, root, "ROOT", score)?;
        self.view.resort();
        self.clear_caches();
        Ok(())
    }

    fn install_dependency_node(
        &mut self,
        doc: &Document,
        sentence: Span,
        node: &DependencyNode,
        label: &str,
        score: f64,
    ) -> Result<NodeId> {
        let token = sentence.start + node.token;
        if !sentence.covers_token(token) {
            return Err(Error::invalid_span(
                Span::new(token, token + 1),
                format!("dependency node outside sentence {sentence}"),
            ));
        }
        let c = Constituent::new(
            doc,
            self.view.name(),
            label,
            score,
            Span::new(token, token + 1),
        )?;
        let id = self.view.add_unsorted(c);
        for (relation, child) in &node.children {
            let child_id = self.install_dependency_node(doc, sentence, child, relation, 1.0)?;
            self.view
                .add_relation(doc.symbols(), relation, id, child_id, 1.0)?;
        }
        Ok(id)
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

impl Deref for TreeView {
    type Target = View;

    fn deref(&self) -> &View {
        &self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc() -> Document {
        Document::from_tokenized_text("The cat sat .").unwrap()
    }

    /// Root with two children, built by hand.
    fn hand_built(d: &Document, relation_name: &str) -> TreeView {
        let mut v = TreeView::new(d, "PARSE", "test", 1.0);
        let root = v.add(Constituent::new(d, "PARSE", "S", 1.0, Span::new(0, 4)).unwrap());
        let np = v.add(Constituent::new(d, "PARSE", "NP", 1.0, Span::new(0, 2)).unwrap());
        let vp = v.add(Constituent::new(d, "PARSE", "VP", 1.0, Span::new(2, 4)).unwrap());
        v.add_relation(d.symbols(), relation_name, root, np, 1.0).unwrap();
        v.add_relation(d.symbols(), relation_name, root, vp, 1.0).unwrap();
        v
    }

    #[test]
    fn parent_of_relations_build_phrase_mode() {
        let d = doc();
        let v = hand_built(&d, PARENT_OF);
        let tree = v.tree(&d, 0).unwrap();
        assert_eq!(tree.label(), "S");
        let labels: Vec<&str> = tree.children().iter().map(Tree::label).collect();
        assert_eq!(labels, vec!["NP", "VP"]);
        assert!(tree.children()[0].edge_label().is_none());
    }

    #[test]
    fn other_relation_names_build_dependency_mode() {
        let d = doc();
        let v = hand_built(&d, "nsubj");
        let tree = v.tree(&d, 0).unwrap();
        // dependency mode labels nodes by token strings
        assert_eq!(tree.label(), "The cat sat .");
        let labels: Vec<&str> = tree.children().iter().map(Tree::label).collect();
        assert_eq!(labels, vec!["The cat", "sat ."]);
        assert_eq!(tree.children()[0].edge_label(), Some("nsubj"));
    }

    #[test]
    fn root_is_the_zero_incoming_constituent() {
        let d = doc();
        let v = hand_built(&d, PARENT_OF);
        let root = v.root_constituent(&d, 0).unwrap();
        assert_eq!(&*v.base().constituent(root).label(&d), "S");
        assert!(TreeView::is_root(v.base().constituent(root)));
    }

    #[test]
    fn set_parse_tree_installs_constituents_and_relations() {
        let d = doc();
        let mut v = TreeView::new(&d, "PARSE", "test", 1.0);
        let tree = Tree::with_children(
            "S",
            vec![
                Tree::with_children(
                    "NP",
                    vec![Tree::new("The"), Tree::new("cat")],
                ),
                Tree::with_children("VP", vec![Tree::new("sat")]),
                Tree::new("."),
            ],
        );
        v.set_parse_tree(&d, 0, &tree).unwrap();

        // S, NP, The, cat, VP, sat, . => 7 constituents
        assert_eq!(v.base().len(), 7);
        let rebuilt = v.tree(&d, 0).unwrap();
        assert_eq!(rebuilt.label(), "S");
        assert_eq!(rebuilt.leaf_count(), 4);
        assert_eq!(rebuilt.to_string(), "(S (NP The cat) (VP sat) .)");

        // mixing modes fails
        assert!(
            v.set_dependency_tree(&d, 0, &DependencyNode::new(2), 1.0).is_err()
        );
    }

    #[test]
    fn set_dependency_tree_installs_token_nodes() {
        let d = doc();
        let mut v = TreeView::new(&d, "DEPENDENCY", "test", 1.0);
        let mut root = DependencyNode::new(2); // "sat"
        root.add_child("nsubj", {
            let mut cat = DependencyNode::new(1);
            cat.add_child("det", DependencyNode::new(0));
            cat
        });
        root.add_child("punct", DependencyNode::new(3));
        v.set_dependency_tree(&d, 0, &root, 1.0).unwrap();

        assert_eq!(v.base().len(), 4);
        let tree = v.tree(&d, 0).unwrap();
        assert_eq!(tree.label(), "sat");
        assert_eq!(tree.children()[0].label(), "cat");
        assert_eq!(tree.children()[0].edge_label(), Some("nsubj"));
        assert_eq!(tree.children()[0].children()[0].label(), "The");
    }

    #[test]
    fn mutation_clears_the_tree_cache() {
        let d = doc();
        let mut v = hand_built(&d, PARENT_OF);
        assert_eq!(v.tree(&d, 0).unwrap().children().len(), 2);
        let pp = v.add(Constituent::new(&d, "PARSE", "PP", 1.0, Span::new(3, 4)).unwrap());
        let root = v.root_constituent(&d, 0).unwrap();
        v.add_relation(d.symbols(), PARENT_OF, root, pp, 1.0).unwrap();
        assert_eq!(v.tree(&d, 0).unwrap().children().len(), 3);
    }
}
