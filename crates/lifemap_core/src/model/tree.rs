//! Immutable node arena and its builder.
//!
//! # Responsibility
//! - Place loader drafts into one arena with parent pointers and depth.
//! - Enforce id uniqueness at insertion time and surface collisions.
//!
//! # Invariants
//! - Ids are indexed first-seen; later duplicates stay in the arena and in
//!   their parent's child list but are never returned by id lookup.
//! - Reserved ids are never indexed.
//! - Arena order equals pre-order discovery order.

use crate::model::diagnostic::Diagnostic;
use crate::model::node::{
    is_reserved_id, is_safe_page_id, Node, NodeDraft, NodeIndex, ROOT_TITLE,
};
use std::collections::{BTreeMap, HashMap};

/// Loaded knowledge tree, held immutably for one generation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeTree {
    nodes: Vec<Node>,
    roots: Vec<NodeIndex>,
    index: HashMap<String, NodeIndex>,
    metadata: BTreeMap<String, String>,
}

impl NodeTree {
    /// Number of nodes in the arena, duplicates included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the tree has no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level nodes in source order.
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Node at an arena position.
    ///
    /// Positions come from this tree; an index from another tree panics.
    pub fn node(&self, index: NodeIndex) -> &Node {
        &self.nodes[index]
    }

    /// Resolves an id to its arena position.
    pub fn find(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Resolves an id to its node.
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.find(id).map(|index| &self.nodes[index])
    }

    /// All nodes in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes.iter().enumerate()
    }

    /// Direct children of a node in source order.
    pub fn children(&self, index: NodeIndex) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes[index]
            .children
            .iter()
            .map(move |&child| (child, &self.nodes[child]))
    }

    /// Ancestors of a node from the top level down, excluding the node.
    pub fn ancestors(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut chain = Vec::new();
        let mut cursor = self.nodes[index].parent;
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.nodes[current].parent;
        }
        chain.reverse();
        chain
    }

    /// Titles of the ancestors of a node, top level first.
    pub fn ancestor_titles(&self, index: NodeIndex) -> Vec<String> {
        self.ancestors(index)
            .into_iter()
            .map(|ancestor| self.nodes[ancestor].title.clone())
            .collect()
    }

    /// Source location of a node as `key/key/key`.
    pub fn key_path(&self, index: NodeIndex) -> String {
        let mut keys = self
            .ancestors(index)
            .into_iter()
            .map(|ancestor| self.nodes[ancestor].key.as_str())
            .collect::<Vec<_>>();
        keys.push(self.nodes[index].key.as_str());
        keys.join("/")
    }

    /// Returns whether a node owns its id (is the first-seen holder).
    pub fn is_indexed(&self, index: NodeIndex) -> bool {
        self.find(&self.nodes[index].id) == Some(index)
    }

    /// Returns whether a node gets its own page: it holds its id and the
    /// id is usable as a file name.
    pub fn owns_page(&self, index: NodeIndex) -> bool {
        self.is_indexed(index) && is_safe_page_id(&self.nodes[index].id)
    }

    /// Indexed ids in discovery order.
    pub fn indexed_ids(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(move |(index, _)| self.is_indexed(*index))
            .map(|(_, node)| node.id.as_str())
    }

    /// Document-level metadata (title, description, version, ...).
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Display title of the implicit root.
    pub fn root_title(&self) -> &str {
        self.metadata
            .get("title")
            .map(String::as_str)
            .unwrap_or(ROOT_TITLE)
    }

    /// Counts nodes per level for diagnostics output.
    pub fn summary(&self) -> TreeSummary {
        let mut per_depth = BTreeMap::new();
        let mut with_due = 0;
        for node in &self.nodes {
            *per_depth.entry(node.depth).or_insert(0) += 1;
            if node.due.is_some() {
                with_due += 1;
            }
        }
        TreeSummary {
            total: self.nodes.len(),
            max_depth: per_depth.keys().next_back().copied().unwrap_or(0),
            per_depth,
            with_due,
        }
    }
}

/// Node counts of one tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeSummary {
    /// All nodes, duplicates included.
    pub total: usize,
    /// Node count keyed by depth (1 = top level).
    pub per_depth: BTreeMap<usize, usize>,
    /// Deepest populated level.
    pub max_depth: usize,
    /// Nodes declaring any due value.
    pub with_due: usize,
}

/// Incremental builder used by the loaders.
#[derive(Debug, Default)]
pub struct NodeTreeBuilder {
    tree: NodeTree,
    diagnostics: Vec<Diagnostic>,
}

impl NodeTreeBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces document-level metadata.
    pub fn set_metadata(&mut self, metadata: BTreeMap<String, String>) {
        self.tree.metadata = metadata;
    }

    /// Records a diagnostic found by the loader.
    pub fn record(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Appends a node under `parent` (or at the top level) and returns its
    /// arena position.
    ///
    /// # Invariants
    /// - `parent` must be a position previously returned by this builder.
    /// - Duplicate and reserved ids are recorded, never rejected.
    pub fn push(&mut self, parent: Option<NodeIndex>, draft: NodeDraft) -> NodeIndex {
        let index = self.tree.nodes.len();
        let depth = parent.map_or(1, |parent| self.tree.nodes[parent].depth + 1);
        self.tree.nodes.push(Node {
            id: draft.id,
            key: draft.key,
            title: draft.title,
            context: draft.context,
            due: draft.due,
            progress: draft.progress,
            source_ref: draft.source_ref,
            file: draft.file,
            parent,
            children: Vec::new(),
            depth,
        });
        match parent {
            Some(parent) => self.tree.nodes[parent].children.push(index),
            None => self.tree.roots.push(index),
        }

        let id = self.tree.nodes[index].id.clone();
        if is_reserved_id(&id) {
            let location = self.tree.key_path(index);
            self.record(Diagnostic::ReservedId { id, location });
        } else if let Some(&first) = self.tree.index.get(&id) {
            let diagnostic = Diagnostic::DuplicateId {
                id,
                first: self.tree.key_path(first),
                duplicate: self.tree.key_path(index),
            };
            self.record(diagnostic);
        } else {
            self.tree.index.insert(id, index);
        }
        index
    }

    /// Id of an already placed node.
    pub fn id_of(&self, index: NodeIndex) -> &str {
        &self.tree.nodes[index].id
    }

    /// Finishes the build.
    pub fn finish(self) -> (NodeTree, Vec<Diagnostic>) {
        (self.tree, self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::NodeTreeBuilder;
    use crate::model::diagnostic::Diagnostic;
    use crate::model::node::NodeDraft;

    fn draft(key: &str, id: &str) -> NodeDraft {
        NodeDraft {
            key: key.to_string(),
            id: id.to_string(),
            title: key.to_string(),
            ..NodeDraft::default()
        }
    }

    #[test]
    fn push_sets_parent_pointer_and_depth() {
        let mut builder = NodeTreeBuilder::new();
        let body = builder.push(None, draft("body", "body"));
        let habit = builder.push(Some(body), draft("habit", "body_habit"));
        let (tree, diagnostics) = builder.finish();

        assert!(diagnostics.is_empty());
        assert_eq!(tree.node(habit).parent, Some(body));
        assert_eq!(tree.node(habit).depth, 2);
        assert_eq!(tree.node(body).children, vec![habit]);
        assert_eq!(tree.roots(), &[body]);
        assert_eq!(tree.key_path(habit), "body/habit");
    }

    #[test]
    fn duplicate_id_keeps_first_seen_and_reports() {
        let mut builder = NodeTreeBuilder::new();
        let level = builder.push(None, draft("level", "level"));
        let first = builder.push(Some(level), draft("task", "level_task"));
        let second = builder.push(Some(level), draft("task-copy", "level_task"));
        let (tree, diagnostics) = builder.finish();

        assert_eq!(tree.find("level_task"), Some(first));
        assert!(tree.is_indexed(first));
        assert!(!tree.is_indexed(second));
        assert_eq!(tree.node(level).children.len(), 2);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::DuplicateId {
                id: "level_task".to_string(),
                first: "level/task".to_string(),
                duplicate: "level/task-copy".to_string(),
            }]
        );
    }

    #[test]
    fn reserved_ids_are_not_indexed() {
        let mut builder = NodeTreeBuilder::new();
        let index = builder.push(None, draft("data", "data"));
        let (tree, diagnostics) = builder.finish();

        assert_eq!(tree.find("data"), None);
        assert_eq!(tree.len(), 1);
        assert!(!tree.is_indexed(index));
        assert_eq!(diagnostics[0].code(), "reserved_id");
        assert!(!tree.owns_page(index));
    }

    #[test]
    fn summary_counts_levels() {
        let mut builder = NodeTreeBuilder::new();
        let a = builder.push(None, draft("a", "a"));
        builder.push(Some(a), draft("b", "a_b"));
        builder.push(Some(a), draft("c", "a_c"));
        builder.push(None, draft("d", "d"));
        let (tree, _) = builder.finish();

        let summary = tree.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.per_depth.get(&1), Some(&2));
        assert_eq!(summary.per_depth.get(&2), Some(&2));
        assert_eq!(summary.max_depth, 2);
        assert_eq!(summary.with_due, 0);
    }
}
