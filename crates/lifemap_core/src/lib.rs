//! Core logic for lifemap: a personal knowledge tree rendered as static pages.
//!
//! Loaders build one immutable [`NodeTree`] per pass; every page, export and
//! search result is derived from that tree.

pub mod config;
pub mod export;
pub mod logging;
pub mod model;
pub mod render;
pub mod repo;
pub mod search;
pub mod service;
pub mod source;

pub use config::{ConfigError, ConfigResult, SiteConfig, SourceConfig};
pub use export::{export_document, file_mapping, write_exports, ExportError, ExportResult};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::diagnostic::Diagnostic;
pub use model::due::{Due, DueBucket};
pub use model::node::{Node, NodeIndex, ROOT_ID};
pub use model::tree::{NodeTree, NodeTreeBuilder, TreeSummary};
pub use repo::structure_repo::{
    StructureRepoError, StructureRepoResult, StructureRepository, YamlStructureRepository,
};
pub use search::substring::{search_nodes, SearchHit, SearchQuery};
pub use service::breadcrumb::{breadcrumb, Crumb};
pub use service::classify::{classify, Classification, ClassifiedEntry};
pub use service::projection::{resolve, Projection, ProjectionOptions, DEFAULT_DEPTH};
pub use service::site::{
    GeneratedPage, GenerationReport, SiteError, SiteGenerator, SiteOptions, SiteResult,
};
pub use service::structure_service::{NewNode, NodeUpdate, StructureService, StructureServiceError};
pub use source::{load_tree, LoadOutcome, MarkdownRoot, SourceError, SourceKind, SourceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
