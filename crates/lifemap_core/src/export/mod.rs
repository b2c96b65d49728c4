//! Derived exports of a loaded tree.
//!
//! # Responsibility
//! - Serialize the resolved tree back into the YAML input shape (and JSON).
//! - List every markdown file that defines a node.
//! - Write both next to each other in one output directory.
//!
//! # Invariants
//! - A YAML export reloads into an isomorphic tree.
//! - Export never mutates the tree.

use crate::model::tree::NodeTree;
use chrono::NaiveDateTime;
use log::{error, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub mod file_mapping;
pub mod structure;

pub use file_mapping::{file_mapping, FileMapping, FileMappingEntry};
pub use structure::{export_document, ExportNode, ExportNodes, StructureDocument};

/// Result type for export APIs.
pub type ExportResult<T> = Result<T, ExportError>;

/// Export-layer error for serialization and file output.
#[derive(Debug)]
pub enum ExportError {
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Yaml(err) => write!(f, "yaml export failed: {err}"),
            Self::Json(err) => write!(f, "json export failed: {err}"),
            Self::Io { path, source } => {
                write!(f, "cannot write export `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Yaml(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<serde_yaml::Error> for ExportError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// File names written by [`write_exports`].
pub const STRUCTURE_YAML: &str = "structure.yaml";
pub const STRUCTURE_JSON: &str = "structure.json";
pub const FILE_MAPPING_JSON: &str = "file_mapping.json";

/// Writes `structure.yaml`, `structure.json` and `file_mapping.json` into
/// `dir`, creating it when absent. Returns the written paths.
pub fn write_exports(
    tree: &NodeTree,
    dir: &Path,
    generated_at: NaiveDateTime,
) -> ExportResult<Vec<PathBuf>> {
    let result = write_all(tree, dir, generated_at);
    match &result {
        Ok(paths) => info!(
            "event=export_write module=export status=ok dir={} files={}",
            dir.display(),
            paths.len()
        ),
        Err(err) => error!(
            "event=export_write module=export status=error dir={} error={}",
            dir.display(),
            err
        ),
    }
    result
}

fn write_all(
    tree: &NodeTree,
    dir: &Path,
    generated_at: NaiveDateTime,
) -> ExportResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let document = export_document(tree, generated_at);
    let mapping = file_mapping(tree, generated_at);
    let outputs = [
        (STRUCTURE_YAML, document.to_yaml_string()?),
        (STRUCTURE_JSON, document.to_json_string()?),
        (FILE_MAPPING_JSON, mapping.to_json_string()?),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (name, contents) in outputs {
        let path = dir.join(name);
        std::fs::write(&path, contents).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    Ok(written)
}

/// Timestamp format used in export metadata.
pub(crate) fn format_timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M:%S").to_string()
}
