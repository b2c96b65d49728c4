//! Tree loader entry points.
//!
//! # Responsibility
//! - Turn one declarative source (YAML document or markdown directories)
//!   into a [`NodeTree`].
//! - Separate fatal structural failures from per-node diagnostics.
//!
//! # Invariants
//! - A structural failure returns `Err` and no partial tree.
//! - Both variants return the same [`LoadOutcome`] shape; callers never
//!   branch on which variant produced a tree.

use crate::model::diagnostic::Diagnostic;
use crate::model::tree::NodeTree;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

pub mod markdown;
pub mod yaml;

pub use markdown::{load_markdown_roots, MarkdownRoot};
pub use yaml::{load_yaml_file, load_yaml_str};

/// Result type used by tree loaders.
pub type SourceResult<T> = Result<T, SourceError>;

/// Fatal loader errors. Any of these aborts the generation pass.
#[derive(Debug)]
pub enum SourceError {
    /// The YAML source file does not exist.
    NotFound(PathBuf),
    /// The source exists but cannot be parsed into a tree.
    MalformedSource { origin: String, message: String },
    /// A required markdown root is absent, or every configured root is.
    MissingRootDirectory(Vec<PathBuf>),
    /// Reading the source failed for another reason.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "structure file not found: {}", path.display()),
            Self::MalformedSource { origin, message } => {
                write!(f, "malformed source `{origin}`: {message}")
            }
            Self::MissingRootDirectory(paths) => {
                let joined = paths
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                write!(f, "missing root directory: {joined}")
            }
            Self::Io { path, source } => write!(f, "cannot read `{}`: {source}", path.display()),
        }
    }
}

impl Error for SourceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::NotFound(_) => None,
            Self::MalformedSource { .. } => None,
            Self::MissingRootDirectory(_) => None,
        }
    }
}

/// Loaded tree plus the per-node anomalies found on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub tree: NodeTree,
    pub diagnostics: Vec<Diagnostic>,
}

/// Backing representation of a knowledge tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// One YAML document with a top-level `structure` mapping.
    Yaml { path: PathBuf },
    /// One or more directories of nested markdown files.
    Markdown { roots: Vec<MarkdownRoot> },
}

impl SourceKind {
    fn label(&self) -> &'static str {
        match self {
            Self::Yaml { .. } => "yaml",
            Self::Markdown { .. } => "markdown",
        }
    }
}

/// Loads a tree from the configured source.
///
/// # Side effects
/// - Emits `tree_load` logging events with duration, node and diagnostic
///   counts.
pub fn load_tree(source: &SourceKind) -> SourceResult<LoadOutcome> {
    let started_at = Instant::now();
    info!(
        "event=tree_load module=source status=start mode={}",
        source.label()
    );

    let result = match source {
        SourceKind::Yaml { path } => load_yaml_file(path),
        SourceKind::Markdown { roots } => load_markdown_roots(roots),
    };

    match &result {
        Ok(outcome) => {
            info!(
                "event=tree_load module=source status=ok mode={} duration_ms={} nodes={} diagnostics={}",
                source.label(),
                started_at.elapsed().as_millis(),
                outcome.tree.len(),
                outcome.diagnostics.len()
            );
            for diagnostic in &outcome.diagnostics {
                warn!(
                    "event=tree_diagnostic module=source status=warn code={} detail={}",
                    diagnostic.code(),
                    diagnostic
                );
            }
        }
        Err(err) => {
            error!(
                "event=tree_load module=source status=error mode={} duration_ms={} error={}",
                source.label(),
                started_at.elapsed().as_millis(),
                err
            );
        }
    }
    result
}
