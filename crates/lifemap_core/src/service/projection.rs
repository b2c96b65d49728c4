//! Depth-bounded tree projection.
//!
//! # Responsibility
//! - Materialize the slice of the tree one page shows: the start node's
//!   subtree truncated after a fixed number of levels.
//! - Expand reserved bucket ids into classified entries.
//!
//! # Invariants
//! - The start node (or implicit root) is level 0; items are levels
//!   `1..=depth`. Deeper descendants are omitted without a marker.
//! - `is_leaf` reflects the full tree, not the projection horizon.
//! - Only entries that own a page are clickable; later duplicates and
//!   reserved or unsafe ids render inert.
//! - Unknown ids never fail; they fall back to the root projection.
//! - Bucket entries are synthesized per call and never written back.

use crate::model::due::{Due, DueBucket};
use crate::model::node::{NodeIndex, ROOT_ID};
use crate::model::tree::NodeTree;
use crate::service::classify::{classify, ClassifiedEntry};
use chrono::NaiveDate;
use log::warn;

/// Default number of levels below the start node.
pub const DEFAULT_DEPTH: usize = 3;

/// Separator used for the location line of bucket entries.
pub const PATH_SEPARATOR: &str = " > ";

/// Projection knobs shared by every page of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Levels shown below the start node.
    pub depth: usize,
    /// Prepend non-empty time buckets to the root projection.
    pub include_time_buckets: bool,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            include_time_buckets: false,
        }
    }
}

/// What a projection is rooted at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionFocus {
    /// Implicit root: every top-level node.
    Root,
    /// A real node.
    Node(NodeIndex),
    /// A virtual time bucket.
    Bucket(DueBucket),
}

/// One materialized entry of a projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedNode {
    pub id: String,
    pub title: String,
    pub context: Option<String>,
    pub due: Option<Due>,
    pub progress: Option<f64>,
    /// No children in the full tree.
    pub is_leaf: bool,
    /// Synthesized bucket group, not a tree node.
    pub is_virtual: bool,
    /// A page named after `id` exists for this entry.
    pub navigable: bool,
    /// Ancestor titles joined by ` > ` (bucket entries only).
    pub path: Option<String>,
    pub children: Vec<ProjectedNode>,
}

impl ProjectedNode {
    /// Whether a page exists one level further down.
    pub fn is_clickable(&self) -> bool {
        self.navigable && !self.is_leaf
    }

    /// Levels in this entry's projected subtree, itself included.
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ProjectedNode::depth)
            .max()
            .unwrap_or(0)
    }
}

/// Materialized view for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// Id the caller asked for, even after a fallback.
    pub requested_id: String,
    pub focus: ProjectionFocus,
    pub title: String,
    pub context: Option<String>,
    /// The requested id did not resolve and the root was used instead.
    pub fell_back: bool,
    pub items: Vec<ProjectedNode>,
}

impl Projection {
    /// Longest projected path below the focus.
    pub fn max_depth(&self) -> usize {
        self.items
            .iter()
            .map(ProjectedNode::depth)
            .max()
            .unwrap_or(0)
    }

    /// Depth-first lookup of a projected entry by id.
    pub fn find(&self, id: &str) -> Option<&ProjectedNode> {
        fn walk<'a>(items: &'a [ProjectedNode], id: &str) -> Option<&'a ProjectedNode> {
            items.iter().find_map(|item| {
                if item.id == id {
                    Some(item)
                } else {
                    walk(&item.children, id)
                }
            })
        }
        walk(&self.items, id)
    }
}

/// Resolves the projection rooted at `id`.
///
/// `data` selects the implicit root and bucket ids select a time bucket.
/// Any other id that is not indexed falls back to the root projection.
pub fn resolve(
    tree: &NodeTree,
    id: &str,
    options: &ProjectionOptions,
    today: NaiveDate,
) -> Projection {
    if id == ROOT_ID {
        return root_projection(tree, id, options, today, false);
    }
    if let Some(bucket) = DueBucket::from_id(id) {
        return bucket_projection(tree, bucket, options, today);
    }
    match tree.find(id) {
        Some(index) => {
            let node = tree.node(index);
            Projection {
                requested_id: id.to_string(),
                focus: ProjectionFocus::Node(index),
                title: node.title.clone(),
                context: node.context.clone(),
                fell_back: false,
                items: materialize_children(tree, index, options.depth),
            }
        }
        None => {
            warn!(
                "event=projection_resolve module=service status=fallback requested_id={id}"
            );
            root_projection(tree, id, options, today, true)
        }
    }
}

fn root_projection(
    tree: &NodeTree,
    requested_id: &str,
    options: &ProjectionOptions,
    today: NaiveDate,
    fell_back: bool,
) -> Projection {
    let mut items = Vec::new();
    if options.depth > 0 {
        if options.include_time_buckets {
            let classification = classify(tree, today);
            for bucket in DueBucket::ALL {
                let entries = classification.bucket(bucket);
                if entries.is_empty() {
                    continue;
                }
                let children = if options.depth > 1 {
                    entries.iter().map(|entry| bucket_entry(tree, entry)).collect()
                } else {
                    Vec::new()
                };
                items.push(ProjectedNode {
                    id: bucket.id().to_string(),
                    title: bucket.title().to_string(),
                    context: None,
                    due: None,
                    progress: None,
                    is_leaf: false,
                    is_virtual: true,
                    navigable: true,
                    path: None,
                    children,
                });
            }
        }
        items.extend(
            tree.roots()
                .iter()
                .map(|&root| materialize(tree, root, options.depth)),
        );
    }

    Projection {
        requested_id: requested_id.to_string(),
        focus: ProjectionFocus::Root,
        title: tree.root_title().to_string(),
        context: tree.metadata().get("description").cloned(),
        fell_back,
        items,
    }
}

fn bucket_projection(
    tree: &NodeTree,
    bucket: DueBucket,
    options: &ProjectionOptions,
    today: NaiveDate,
) -> Projection {
    let items = if options.depth > 0 {
        classify(tree, today)
            .bucket(bucket)
            .iter()
            .map(|entry| bucket_entry(tree, entry))
            .collect()
    } else {
        Vec::new()
    };
    Projection {
        requested_id: bucket.id().to_string(),
        focus: ProjectionFocus::Bucket(bucket),
        title: bucket.title().to_string(),
        context: None,
        fell_back: false,
        items,
    }
}

fn bucket_entry(tree: &NodeTree, entry: &ClassifiedEntry) -> ProjectedNode {
    let node = tree.node(entry.node);
    ProjectedNode {
        id: node.id.clone(),
        title: node.title.clone(),
        context: node.context.clone(),
        due: node.due.clone(),
        progress: node.progress,
        is_leaf: node.is_leaf(),
        is_virtual: false,
        navigable: tree.owns_page(entry.node),
        path: Some(entry.path.join(PATH_SEPARATOR)),
        children: Vec::new(),
    }
}

fn materialize_children(tree: &NodeTree, index: NodeIndex, levels: usize) -> Vec<ProjectedNode> {
    if levels == 0 {
        return Vec::new();
    }
    tree.children(index)
        .map(|(child, _)| materialize(tree, child, levels))
        .collect()
}

/// Materializes `index` with `levels` levels counting itself.
fn materialize(tree: &NodeTree, index: NodeIndex, levels: usize) -> ProjectedNode {
    let node = tree.node(index);
    ProjectedNode {
        id: node.id.clone(),
        title: node.title.clone(),
        context: node.context.clone(),
        due: node.due.clone(),
        progress: node.progress,
        is_leaf: node.is_leaf(),
        is_virtual: false,
        navigable: tree.owns_page(index),
        path: None,
        children: materialize_children(tree, index, levels - 1),
    }
}
