//! Flat listing of markdown files that define nodes.

use super::{format_timestamp, ExportResult};
use crate::model::tree::NodeTree;
use chrono::NaiveDateTime;
use serde::Serialize;

/// One defining file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMappingEntry {
    pub file_path: String,
    /// Node location as `key/key/key`.
    pub relative_path: String,
    pub hierarchy_level: usize,
    pub exists: bool,
    pub context: Option<String>,
}

/// File mapping document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileMapping {
    pub generated_at: String,
    pub total_files: usize,
    pub files: Vec<FileMappingEntry>,
}

impl FileMapping {
    pub fn to_json_string(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Lists every node with a defining file, sorted by file path.
///
/// `exists` is checked at call time; a file removed after the load reports
/// `false`.
pub fn file_mapping(tree: &NodeTree, generated_at: NaiveDateTime) -> FileMapping {
    let mut files = tree
        .iter()
        .filter_map(|(index, node)| {
            let file = node.file.as_ref()?;
            Some(FileMappingEntry {
                file_path: file.display().to_string(),
                relative_path: tree.key_path(index),
                hierarchy_level: node.depth,
                exists: file.is_file(),
                context: node.context.clone(),
            })
        })
        .collect::<Vec<_>>();
    files.sort_by(|left, right| left.file_path.cmp(&right.file_path));

    FileMapping {
        generated_at: format_timestamp(generated_at),
        total_files: files.len(),
        files,
    }
}
