//! Structure document repository contracts and YAML file implementation.
//!
//! # Responsibility
//! - Load and persist the whole YAML structure document.
//! - Keep file replacement details inside the repository boundary.
//!
//! # Invariants
//! - A loaded document always has a top-level `structure` mapping.
//! - Saves replace the file atomically: write a sibling temp file, then
//!   rename it over the original.

use serde_yaml::{Mapping, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Result type used by structure repository operations.
pub type StructureRepoResult<T> = Result<T, StructureRepoError>;

/// Errors from structure repository operations.
#[derive(Debug)]
pub enum StructureRepoError {
    /// Backing file does not exist.
    NotFound(PathBuf),
    /// File content is not a structure document.
    InvalidDocument(String),
    /// YAML encode/decode failure.
    Yaml(serde_yaml::Error),
    /// Filesystem failure.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for StructureRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "structure file not found: {}", path.display()),
            Self::InvalidDocument(message) => write!(f, "invalid structure document: {message}"),
            Self::Yaml(err) => write!(f, "{err}"),
            Self::Io { path, source } => write!(f, "structure file `{}`: {source}", path.display()),
        }
    }
}

impl Error for StructureRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::InvalidDocument(_) => None,
            Self::Yaml(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

impl From<serde_yaml::Error> for StructureRepoError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Yaml(value)
    }
}

/// Persistence contract for the structure document.
pub trait StructureRepository {
    /// Loads the whole document.
    fn load_document(&self) -> StructureRepoResult<Mapping>;

    /// Replaces the whole document.
    fn save_document(&self, document: &Mapping) -> StructureRepoResult<()>;
}

/// Structure document stored in one YAML file.
#[derive(Debug, Clone)]
pub struct YamlStructureRepository {
    path: PathBuf,
}

impl YamlStructureRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StructureRepoError {
        StructureRepoError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("structure.yaml");
        self.path
            .with_file_name(format!(".{file_name}.{}.tmp", std::process::id()))
    }
}

impl StructureRepository for YamlStructureRepository {
    fn load_document(&self) -> StructureRepoResult<Mapping> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StructureRepoError::NotFound(self.path.clone()));
            }
            Err(err) => return Err(self.io_error(err)),
        };

        let Value::Mapping(document) = serde_yaml::from_str::<Value>(&text)? else {
            return Err(StructureRepoError::InvalidDocument(
                "top-level document must be a mapping".to_string(),
            ));
        };
        if !matches!(document.get("structure"), Some(Value::Mapping(_))) {
            return Err(StructureRepoError::InvalidDocument(
                "missing top-level `structure` mapping".to_string(),
            ));
        }
        Ok(document)
    }

    fn save_document(&self, document: &Mapping) -> StructureRepoResult<()> {
        let text = serde_yaml::to_string(document)?;
        let temp_path = self.temp_path();
        if let Err(err) = std::fs::write(&temp_path, text) {
            return Err(StructureRepoError::Io {
                path: temp_path,
                source: err,
            });
        }
        if let Err(err) = std::fs::rename(&temp_path, &self.path) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(self.io_error(err));
        }
        Ok(())
    }
}
