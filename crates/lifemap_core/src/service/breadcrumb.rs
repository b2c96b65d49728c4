//! Ancestor chain for back-navigation.
//!
//! # Invariants
//! - The chain starts at the implicit root and stops before the node.
//! - The root page itself and unknown ids have no breadcrumb.

use crate::model::due::DueBucket;
use crate::model::node::ROOT_ID;
use crate::model::tree::NodeTree;

/// One navigable ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crumb {
    pub title: String,
    pub href: String,
}

/// File name of the page generated for `id`.
pub fn page_href(id: &str) -> String {
    format!("{id}.html")
}

/// Returns the ancestor chain of `id`, root first.
pub fn breadcrumb(tree: &NodeTree, id: &str) -> Vec<Crumb> {
    if id == ROOT_ID {
        return Vec::new();
    }
    let root = Crumb {
        title: tree.root_title().to_string(),
        href: page_href(ROOT_ID),
    };
    if DueBucket::from_id(id).is_some() {
        return vec![root];
    }
    let Some(index) = tree.find(id) else {
        return Vec::new();
    };

    let mut crumbs = vec![root];
    crumbs.extend(tree.ancestors(index).into_iter().map(|ancestor| {
        let node = tree.node(ancestor);
        Crumb {
            title: node.title.clone(),
            href: page_href(&node.id),
        }
    }));
    crumbs
}
