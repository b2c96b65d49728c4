//! Case-insensitive substring search.
//!
//! # Responsibility
//! - Match a query against node title, context and id.
//! - Return typed hits in discovery order.
//!
//! # Invariants
//! - Blank queries and a zero limit return no hits.
//! - Duplicate-id nodes are reported; each hit names the field that matched.

use crate::model::tree::NodeTree;

/// Search options for substring query behavior.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// User query text.
    pub text: String,
    /// Maximum number of hits to return.
    pub limit: u32,
}

impl SearchQuery {
    /// Creates a query with the default limit.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: 50,
        }
    }
}

/// Node field a query matched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedField {
    Title,
    Context,
    Id,
}

impl MatchedField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Context => "context",
            Self::Id => "id",
        }
    }
}

/// Single search hit returned by [`search_nodes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub id: String,
    pub title: String,
    pub depth: usize,
    pub matched: MatchedField,
}

/// Searches every node and returns hits in discovery order.
pub fn search_nodes(tree: &NodeTree, query: &SearchQuery) -> Vec<SearchHit> {
    let needle = query.text.trim().to_lowercase();
    if needle.is_empty() || query.limit == 0 {
        return Vec::new();
    }

    tree.iter()
        .filter_map(|(_, node)| {
            let matched = if node.title.to_lowercase().contains(&needle) {
                MatchedField::Title
            } else if node
                .context
                .as_deref()
                .is_some_and(|context| context.to_lowercase().contains(&needle))
            {
                MatchedField::Context
            } else if node.id.to_lowercase().contains(&needle) {
                MatchedField::Id
            } else {
                return None;
            };
            Some(SearchHit {
                id: node.id.clone(),
                title: node.title.clone(),
                depth: node.depth,
                matched,
            })
        })
        .take(query.limit as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{search_nodes, MatchedField, SearchQuery};
    use crate::model::node::NodeDraft;
    use crate::model::tree::{NodeTree, NodeTreeBuilder};

    fn tree() -> NodeTree {
        let mut builder = NodeTreeBuilder::new();
        let body = builder.push(
            None,
            NodeDraft {
                key: "body".to_string(),
                id: "body".to_string(),
                title: "Body".to_string(),
                ..NodeDraft::default()
            },
        );
        builder.push(
            Some(body),
            NodeDraft {
                key: "habit".to_string(),
                id: "body_habit".to_string(),
                title: "Morning Habit".to_string(),
                context: Some("Stretch before coffee".to_string()),
                ..NodeDraft::default()
            },
        );
        builder.finish().0
    }

    #[test]
    fn matches_title_context_and_id_case_insensitively() {
        let tree = tree();
        let hits = search_nodes(&tree, &SearchQuery::new("HABIT"));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].matched, MatchedField::Title);
        assert_eq!(hits[0].depth, 2);

        let hits = search_nodes(&tree, &SearchQuery::new("coffee"));
        assert_eq!(hits[0].matched, MatchedField::Context);

        let hits = search_nodes(&tree, &SearchQuery::new("body_"));
        assert_eq!(hits[0].id, "body_habit");
        assert_eq!(hits[0].matched, MatchedField::Id);
    }

    #[test]
    fn blank_query_and_zero_limit_return_nothing() {
        let tree = tree();
        assert!(search_nodes(&tree, &SearchQuery::new("   ")).is_empty());
        let mut query = SearchQuery::new("body");
        query.limit = 0;
        assert!(search_nodes(&tree, &query).is_empty());
        query.limit = 1;
        assert_eq!(search_nodes(&tree, &query).len(), 1);
    }
}
