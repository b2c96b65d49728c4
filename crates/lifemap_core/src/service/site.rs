//! Static site generation pass.
//!
//! # Responsibility
//! - Resolve, render and write one page per indexed id, plus the implicit
//!   root page and the four bucket pages.
//! - Regenerate a single page on demand.
//!
//! # Invariants
//! - Page files are named `<id>.html` directly under the output directory.
//! - Ids that would escape the output directory are skipped, not written.
//! - A write failure aborts the pass; pages already written stay on disk.

use crate::model::due::DueBucket;
use crate::model::node::{is_safe_page_id, ROOT_ID};
use crate::model::tree::NodeTree;
use crate::render::html::{render_page, PageView};
use crate::service::breadcrumb::{breadcrumb, page_href};
use crate::service::projection::{resolve, ProjectionOptions};
use chrono::NaiveDate;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

/// Result type for site generation.
pub type SiteResult<T> = Result<T, SiteError>;

/// Errors from the generation pass.
#[derive(Debug)]
pub enum SiteError {
    /// Output directory or page file could not be written.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Requested id cannot be used as a file name.
    InvalidPageId(String),
}

impl Display for SiteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot write `{}`: {source}", path.display()),
            Self::InvalidPageId(id) => write!(f, "id `{id}` cannot be used as a page name"),
        }
    }
}

impl Error for SiteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::InvalidPageId(_) => None,
        }
    }
}

/// Output settings for one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteOptions {
    pub output_dir: PathBuf,
    pub projection: ProjectionOptions,
}

/// One written page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPage {
    pub id: String,
    pub path: PathBuf,
}

/// Outcome of [`SiteGenerator::generate_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub pages: Vec<GeneratedPage>,
    /// Indexed ids skipped because they are not usable as file names.
    pub skipped_ids: Vec<String>,
}

/// Writes rendered pages for one tree.
pub struct SiteGenerator {
    options: SiteOptions,
}

impl SiteGenerator {
    pub fn new(options: SiteOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SiteOptions {
        &self.options
    }

    /// Writes the root page, every indexed id and the bucket pages.
    pub fn generate_all(&self, tree: &NodeTree, today: NaiveDate) -> SiteResult<GenerationReport> {
        let started_at = Instant::now();
        let result = self.write_every_page(tree, today);
        match &result {
            Ok(report) => info!(
                "event=site_generate module=service status=ok duration_ms={} pages={} skipped={} out={}",
                started_at.elapsed().as_millis(),
                report.pages.len(),
                report.skipped_ids.len(),
                self.options.output_dir.display()
            ),
            Err(err) => error!(
                "event=site_generate module=service status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    /// Regenerates one page. Unknown ids render the root fallback under the
    /// requested file name.
    pub fn generate_item(
        &self,
        tree: &NodeTree,
        id: &str,
        today: NaiveDate,
    ) -> SiteResult<GeneratedPage> {
        if !is_safe_page_id(id) {
            return Err(SiteError::InvalidPageId(id.to_string()));
        }
        self.ensure_output_dir()?;
        let page = self.write_page(tree, id, today)?;
        info!(
            "event=site_generate_item module=service status=ok id={} path={}",
            id,
            page.path.display()
        );
        Ok(page)
    }

    fn write_every_page(&self, tree: &NodeTree, today: NaiveDate) -> SiteResult<GenerationReport> {
        self.ensure_output_dir()?;
        let mut report = GenerationReport::default();

        report.pages.push(self.write_page(tree, ROOT_ID, today)?);
        for id in tree.indexed_ids() {
            if !is_safe_page_id(id) {
                warn!("event=site_generate module=service status=skip id={id} reason=unsafe_id");
                report.skipped_ids.push(id.to_string());
                continue;
            }
            report.pages.push(self.write_page(tree, id, today)?);
        }
        for bucket in DueBucket::ALL {
            report.pages.push(self.write_page(tree, bucket.id(), today)?);
        }
        Ok(report)
    }

    fn write_page(&self, tree: &NodeTree, id: &str, today: NaiveDate) -> SiteResult<GeneratedPage> {
        let projection = resolve(tree, id, &self.options.projection, today);
        let crumbs = breadcrumb(tree, id);
        let html = render_page(
            &PageView {
                projection: &projection,
                breadcrumb: &crumbs,
            },
            today,
        );

        let path = self.options.output_dir.join(page_href(id));
        std::fs::write(&path, html).map_err(|source| SiteError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(GeneratedPage {
            id: id.to_string(),
            path,
        })
    }

    fn ensure_output_dir(&self) -> SiteResult<()> {
        let dir = self.options.output_dir.as_path();
        std::fs::create_dir_all(dir).map_err(|source| SiteError::Io {
            path: dir.to_path_buf(),
            source,
        })
    }
}
