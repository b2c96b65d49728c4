//! Non-fatal load diagnostics.
//!
//! Per-node anomalies degrade that node's view and are collected here
//! instead of aborting the load.

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// One anomaly found while building a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Two nodes declare the same id. The first one keeps the id.
    DuplicateId {
        id: String,
        first: String,
        duplicate: String,
    },
    /// A node uses an id reserved for generated pages.
    ReservedId { id: String, location: String },
    /// A declared child could not be turned into a node and was omitted.
    UnresolvedReference {
        parent: String,
        name: String,
        reason: String,
    },
    /// A node has no usable title; a derived one was used.
    MissingTitle { id: String },
    /// A node has no usable id; a path-derived one was assigned.
    MissingId { location: String, assigned: String },
    /// A due value could not be parsed as a date.
    InvalidDue { id: String, value: String },
    /// A progress value is not a number in `[0, 100]`.
    InvalidProgress { id: String, value: String },
    /// A source file exists but could not be read as text.
    UnreadableFile { path: PathBuf, message: String },
    /// An optional markdown root directory is absent.
    MissingOptionalRoot { path: PathBuf },
}

impl Diagnostic {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateId { .. } => "duplicate_id",
            Self::ReservedId { .. } => "reserved_id",
            Self::UnresolvedReference { .. } => "unresolved_reference",
            Self::MissingTitle { .. } => "missing_title",
            Self::MissingId { .. } => "missing_id",
            Self::InvalidDue { .. } => "invalid_due",
            Self::InvalidProgress { .. } => "invalid_progress",
            Self::UnreadableFile { .. } => "unreadable_file",
            Self::MissingOptionalRoot { .. } => "missing_optional_root",
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId {
                id,
                first,
                duplicate,
            } => write!(
                f,
                "duplicate id `{id}` at `{duplicate}` (first declared at `{first}`)"
            ),
            Self::ReservedId { id, location } => {
                write!(f, "id `{id}` at `{location}` is reserved for generated pages")
            }
            Self::UnresolvedReference {
                parent,
                name,
                reason,
            } => write!(f, "unresolved child `{name}` under `{parent}`: {reason}"),
            Self::MissingTitle { id } => write!(f, "missing title for id `{id}`"),
            Self::MissingId { location, assigned } => {
                write!(f, "missing id at `{location}`; assigned `{assigned}`")
            }
            Self::InvalidDue { id, value } => {
                write!(f, "due value `{value}` of `{id}` is not a date")
            }
            Self::InvalidProgress { id, value } => {
                write!(f, "progress value `{value}` of `{id}` is not within 0..=100")
            }
            Self::UnreadableFile { path, message } => {
                write!(f, "cannot read `{}`: {message}", path.display())
            }
            Self::MissingOptionalRoot { path } => {
                write!(f, "optional root directory `{}` is absent", path.display())
            }
        }
    }
}
