//! Node record and naming helpers.
//!
//! # Responsibility
//! - Define the single node shape produced by both source variants.
//! - Provide the id/title derivations loaders share.
//!
//! # Invariants
//! - `id` is the lookup key; `key` is only unique among siblings.
//! - `children` order is the source order (insertion or filename order).

use crate::model::due::{Due, DueBucket};
use std::path::{Path, PathBuf};

/// Reserved id of the implicit root page.
pub const ROOT_ID: &str = "data";
/// Display title of the implicit root.
pub const ROOT_TITLE: &str = "Home";

/// Position of a node inside its tree arena.
///
/// Arena order is pre-order discovery order.
pub type NodeIndex = usize;

/// One entry of the knowledge hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Globally unique id (first-seen wins on collisions).
    pub id: String,
    /// Local key under the parent (mapping key or file/heading name).
    pub key: String,
    /// Display string.
    pub title: String,
    /// Optional free-text annotation.
    pub context: Option<String>,
    /// Optional due value.
    pub due: Option<Due>,
    /// Optional completion percentage in `[0, 100]`.
    pub progress: Option<f64>,
    /// Directory that holds this node's children (markdown sources).
    pub source_ref: Option<PathBuf>,
    /// File that defines this node itself.
    pub file: Option<PathBuf>,
    /// Parent node. `None` means top-level.
    pub parent: Option<NodeIndex>,
    /// Child nodes in source order.
    pub children: Vec<NodeIndex>,
    /// 1 for top-level nodes.
    pub depth: usize,
}

impl Node {
    /// Returns whether this node has no children entries.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Loader-side input for one node before it is placed in the tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeDraft {
    pub key: String,
    pub id: String,
    pub title: String,
    pub context: Option<String>,
    pub due: Option<Due>,
    pub progress: Option<f64>,
    pub source_ref: Option<PathBuf>,
    pub file: Option<PathBuf>,
}

/// Returns whether `id` names a page the generator owns (root or bucket).
pub fn is_reserved_id(id: &str) -> bool {
    id == ROOT_ID || DueBucket::from_id(id).is_some()
}

/// Returns whether `id` maps to a file directly inside the output dir.
pub fn is_safe_page_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && !id.contains("..")
        && !id.contains(['/', '\\'])
        && Path::new(id).components().count() == 1
}

/// Lower-cases a name and joins whitespace runs with `-` for use in ids.
pub fn slug_component(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Joins an id component under an optional parent id with `_`.
pub fn child_id(parent_id: Option<&str>, component: &str) -> String {
    match parent_id {
        Some(parent_id) => format!("{parent_id}_{component}"),
        None => component.to_string(),
    }
}

/// Turns a file-ish name into a display title (`go-melt` -> `Go Melt`).
pub fn title_from_name(name: &str) -> String {
    name.replace(['-', '_'], " ")
        .split_whitespace()
        .map(capitalize_word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalizes a name for header/filesystem matching.
///
/// Case, `-`, `_` and whitespace runs are ignored.
pub fn match_key(name: &str) -> String {
    name.replace(['-', '_'], " ")
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Validates a progress value against the `[0, 100]` range.
pub fn checked_progress(value: f64) -> Option<f64> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Some(value)
    } else {
        None
    }
}

fn capitalize_word(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
