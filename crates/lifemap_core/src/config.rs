//! Site configuration.
//!
//! # Responsibility
//! - Load generation settings from a YAML file.
//! - Turn them into loader, projection and site options.
//!
//! # Invariants
//! - Relative paths in a config file resolve against the file's directory.
//! - A validated config has a depth in `1..=MAX_DEPTH` and at least one
//!   markdown root when the markdown source is selected.

use crate::service::projection::{ProjectionOptions, DEFAULT_DEPTH};
use crate::service::site::SiteOptions;
use crate::source::{MarkdownRoot, SourceKind};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Deepest projection a config may request.
pub const MAX_DEPTH: usize = 12;

/// Result type for configuration APIs.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading and validation errors.
#[derive(Debug)]
pub enum ConfigError {
    NotFound(PathBuf),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(serde_yaml::Error),
    InvalidDepth(usize),
    EmptyMarkdownRoots,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "config file not found: {}", path.display()),
            Self::Io { path, source } => {
                write!(f, "cannot read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::InvalidDepth(depth) => {
                write!(f, "depth must be within 1..={MAX_DEPTH}, got {depth}")
            }
            Self::EmptyMarkdownRoots => write!(f, "markdown source needs at least one root"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidDepth(_) => None,
            Self::EmptyMarkdownRoots => None,
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Parse(value)
    }
}

/// Source section of the config file.
///
/// ```yaml
/// source:
///   markdown:
///     - path: notes
///       required: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceConfig {
    Yaml(PathBuf),
    Markdown(Vec<MarkdownRoot>),
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Yaml(PathBuf::from("structure.yaml"))
    }
}

/// Generation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_depth")]
    pub depth: usize,
    #[serde(default = "default_time_buckets")]
    pub time_buckets: bool,
    #[serde(default)]
    pub log_level: Option<String>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("html")
}

fn default_depth() -> usize {
    DEFAULT_DEPTH
}

fn default_time_buckets() -> bool {
    true
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            output_dir: default_output_dir(),
            depth: default_depth(),
            time_buckets: default_time_buckets(),
            log_level: None,
            log_dir: None,
        }
    }
}

impl SiteConfig {
    /// Loads, resolves and validates a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Err(err) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };
        let mut config: Self = serde_yaml::from_str(&text)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates config text without path resolution.
    pub fn from_yaml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Rewrites relative paths as `base`-relative.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        match &mut self.source {
            SourceConfig::Yaml(path) => resolve(path),
            SourceConfig::Markdown(roots) => {
                for root in roots {
                    resolve(&mut root.path);
                }
            }
        }
        resolve(&mut self.output_dir);
        if let Some(log_dir) = &mut self.log_dir {
            resolve(log_dir);
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !(1..=MAX_DEPTH).contains(&self.depth) {
            return Err(ConfigError::InvalidDepth(self.depth));
        }
        if matches!(&self.source, SourceConfig::Markdown(roots) if roots.is_empty()) {
            return Err(ConfigError::EmptyMarkdownRoots);
        }
        Ok(())
    }

    pub fn source_kind(&self) -> SourceKind {
        match &self.source {
            SourceConfig::Yaml(path) => SourceKind::Yaml { path: path.clone() },
            SourceConfig::Markdown(roots) => SourceKind::Markdown {
                roots: roots.clone(),
            },
        }
    }

    pub fn projection_options(&self) -> ProjectionOptions {
        ProjectionOptions {
            depth: self.depth,
            include_time_buckets: self.time_buckets,
        }
    }

    pub fn site_options(&self) -> SiteOptions {
        SiteOptions {
            output_dir: self.output_dir.clone(),
            projection: self.projection_options(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, SiteConfig, SourceConfig};
    use crate::source::{MarkdownRoot, SourceKind};
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    #[test]
    fn empty_document_uses_defaults() {
        let config = SiteConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, SiteConfig::default());
        assert_eq!(config.depth, 3);
        assert!(config.time_buckets);
        assert_eq!(config.output_dir, PathBuf::from("html"));
    }

    #[test]
    fn markdown_roots_parse_with_required_flag() {
        let config = SiteConfig::from_yaml_str(
            "source:\n  markdown:\n    - path: notes\n      required: true\n    - path: archive\ndepth: 2\n",
        )
        .unwrap();
        assert_eq!(
            config.source,
            SourceConfig::Markdown(vec![
                MarkdownRoot::required("notes"),
                MarkdownRoot::optional("archive"),
            ])
        );
        assert_eq!(config.projection_options().depth, 2);
    }

    #[test]
    fn validate_rejects_bad_depth_and_empty_roots() {
        let err = SiteConfig::from_yaml_str("depth: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDepth(0)));
        let err = SiteConfig::from_yaml_str("source:\n  markdown: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyMarkdownRoots));
        let err = SiteConfig::from_yaml_str("colour: red\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_resolves_paths_against_config_dir() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lifemap.yaml");
        std::fs::write(&path, "source:\n  yaml: data/structure.yaml\noutput_dir: site\n").unwrap();

        let config = SiteConfig::load(&path).unwrap();
        assert_eq!(
            config.source_kind(),
            SourceKind::Yaml {
                path: dir.path().join("data/structure.yaml"),
            }
        );
        assert_eq!(config.site_options().output_dir, dir.path().join("site"));

        let missing = SiteConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::NotFound(_)));
    }
}
