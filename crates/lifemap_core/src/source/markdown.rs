//! Markdown directory loader.
//!
//! # Responsibility
//! - Discover nodes from `X.md` files and `X/` directories under one or
//!   more root directories.
//! - Merge heading-declared children with filesystem children.
//! - Extract `<!-- key: value -->` annotations as node metadata.
//!
//! # Invariants
//! - `X.md` and `X/` at the same relative path form one node, whichever
//!   roots they live in; siblings are ordered by file name.
//! - When several roots hold `X.md` at one path, the first root's file
//!   defines the node.
//! - A heading whose name matches a filesystem sibling is dropped together
//!   with its nested headings.
//! - Header-only children never carry `file` or `source_ref`.
//!
//! # See also
//! - `crate::source::yaml` for the single-document variant.

use super::{LoadOutcome, SourceError, SourceResult};
use crate::model::diagnostic::Diagnostic;
use crate::model::due::Due;
use crate::model::node::{
    checked_progress, child_id, match_key, slug_component, title_from_name, NodeDraft, NodeIndex,
};
use crate::model::tree::NodeTreeBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

static ANNOTATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<!--\s*(deadline|due|context|progress)\s*:\s*(.*?)\s*-->")
        .expect("valid annotation regex")
});

/// One configured search root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownRoot {
    pub path: PathBuf,
    /// A missing required root aborts the load.
    #[serde(default)]
    pub required: bool,
}

impl MarkdownRoot {
    pub fn required(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: true,
        }
    }

    pub fn optional(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            required: false,
        }
    }
}

/// Loads every present root into one tree.
///
/// # Errors
/// - [`SourceError::MissingRootDirectory`] when a required root is absent
///   or when no configured root exists at all.
pub fn load_markdown_roots(roots: &[MarkdownRoot]) -> SourceResult<LoadOutcome> {
    let mut builder = NodeTreeBuilder::new();
    let mut present = Vec::new();
    let mut missing_required = Vec::new();

    for root in roots {
        if root.path.is_dir() {
            present.push(root.path.clone());
        } else if root.required {
            missing_required.push(root.path.clone());
        } else {
            builder.record(Diagnostic::MissingOptionalRoot {
                path: root.path.clone(),
            });
        }
    }

    if !missing_required.is_empty() {
        return Err(SourceError::MissingRootDirectory(missing_required));
    }
    if present.is_empty() {
        let all = roots.iter().map(|root| root.path.clone()).collect();
        return Err(SourceError::MissingRootDirectory(all));
    }

    for entry in list_entries(&mut builder, &present) {
        load_entry(&mut builder, None, &entry);
    }

    let (tree, diagnostics) = builder.finish();
    Ok(LoadOutcome { tree, diagnostics })
}

/// `X.md` and/or `X/` found at one relative path across the roots.
#[derive(Debug, Default)]
struct Entry {
    name: String,
    file: Option<PathBuf>,
    /// Every `X/` directory, in root order.
    dirs: Vec<PathBuf>,
}

/// Lists the entries of several directories that share one relative path,
/// merged by name.
fn list_entries(builder: &mut NodeTreeBuilder, dirs: &[PathBuf]) -> Vec<Entry> {
    let mut entries: BTreeMap<String, Entry> = BTreeMap::new();
    for dir in dirs {
        collect_entries(builder, dir, &mut entries);
    }
    entries.into_values().collect()
}

fn collect_entries(
    builder: &mut NodeTreeBuilder,
    dir: &Path,
    entries: &mut BTreeMap<String, Entry>,
) {
    let read = match std::fs::read_dir(dir) {
        Ok(read) => read,
        Err(err) => {
            builder.record(Diagnostic::UnreadableFile {
                path: dir.to_path_buf(),
                message: err.to_string(),
            });
            return;
        }
    };

    for item in read.flatten() {
        let Ok(file_type) = item.file_type() else {
            continue;
        };
        let path = item.path();
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if file_name.starts_with('.') {
            continue;
        }

        if file_type.is_dir() {
            let name = file_name.to_string();
            let entry = entries.entry(name.clone()).or_default();
            entry.name = name;
            entry.dirs.push(path);
        } else if file_type.is_file() && path.extension().is_some_and(|ext| ext == "md") {
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let name = stem.to_string();
            let entry = entries.entry(name.clone()).or_default();
            entry.name = name;
            entry.file.get_or_insert(path);
        }
    }
}

fn load_entry(builder: &mut NodeTreeBuilder, parent: Option<NodeIndex>, entry: &Entry) {
    let parent_id = parent.map(|parent| builder.id_of(parent).to_string());
    let id = child_id(parent_id.as_deref(), &slug_component(&entry.name));

    let document = match &entry.file {
        Some(file) => match read_markdown(file) {
            Ok(Some(text)) => parse_markdown(&text),
            Ok(None) => MarkdownDocument::default(),
            Err(err) => {
                builder.record(Diagnostic::UnreadableFile {
                    path: file.clone(),
                    message: err.to_string(),
                });
                MarkdownDocument::default()
            }
        },
        None => MarkdownDocument::default(),
    };

    let mut draft = NodeDraft {
        key: entry.name.clone(),
        id: id.clone(),
        title: title_from_name(&entry.name),
        source_ref: entry.dirs.first().cloned(),
        file: entry.file.clone(),
        ..NodeDraft::default()
    };
    apply_annotations(builder, &mut draft, &document.annotations);
    let index = builder.push(parent, draft);

    let children = list_entries(builder, &entry.dirs);
    let taken = children
        .iter()
        .map(|child| match_key(&child.name))
        .collect::<HashSet<_>>();
    for child in &children {
        load_entry(builder, Some(index), child);
    }
    for heading in &document.headings {
        if taken.contains(&match_key(&heading.name)) {
            continue;
        }
        load_heading(builder, index, &id, heading);
    }
}

fn load_heading(
    builder: &mut NodeTreeBuilder,
    parent: NodeIndex,
    parent_id: &str,
    heading: &Heading,
) {
    if heading.name.is_empty() {
        builder.record(Diagnostic::UnresolvedReference {
            parent: parent_id.to_string(),
            name: String::new(),
            reason: "heading has no text".to_string(),
        });
        return;
    }

    let id = child_id(Some(parent_id), &slug_component(&heading.name));
    let mut draft = NodeDraft {
        key: heading.name.clone(),
        id: id.clone(),
        title: heading.name.clone(),
        ..NodeDraft::default()
    };
    apply_annotations(builder, &mut draft, &heading.annotations);
    let index = builder.push(Some(parent), draft);

    for child in &heading.children {
        load_heading(builder, index, &id, child);
    }
}

fn apply_annotations(
    builder: &mut NodeTreeBuilder,
    draft: &mut NodeDraft,
    annotations: &[Annotation],
) {
    for annotation in annotations {
        match annotation.key {
            AnnotationKey::Due => {
                let due = Due::parse(annotation.value.clone());
                if due.date().is_none() {
                    builder.record(Diagnostic::InvalidDue {
                        id: draft.id.clone(),
                        value: due.raw().to_string(),
                    });
                }
                draft.due = Some(due);
            }
            AnnotationKey::Context => {
                if !annotation.value.is_empty() {
                    draft.context = Some(annotation.value.clone());
                }
            }
            AnnotationKey::Progress => {
                let parsed = annotation
                    .value
                    .trim_end_matches('%')
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(checked_progress);
                match parsed {
                    Some(progress) => draft.progress = Some(progress),
                    None => builder.record(Diagnostic::InvalidProgress {
                        id: draft.id.clone(),
                        value: annotation.value.clone(),
                    }),
                }
            }
        }
    }
}

/// Reads a markdown file as UTF-8.
///
/// `Ok(None)` means the file vanished; present-but-unreadable is an error.
fn read_markdown(path: &Path) -> io::Result<Option<String>> {
    match std::fs::read(path) {
        Ok(bytes) => String::from_utf8(bytes)
            .map(Some)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AnnotationKey {
    Due,
    Context,
    Progress,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Annotation {
    key: AnnotationKey,
    value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Heading {
    level: usize,
    name: String,
    annotations: Vec<Annotation>,
    children: Vec<Heading>,
}

/// File-level annotations plus the nested heading outline.
#[derive(Debug, Default, PartialEq, Eq)]
struct MarkdownDocument {
    annotations: Vec<Annotation>,
    headings: Vec<Heading>,
}

fn parse_markdown(text: &str) -> MarkdownDocument {
    let mut document = MarkdownDocument::default();
    let mut flat = Vec::new();
    let mut in_fence = false;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }

        match heading_parts(trimmed) {
            Some((level, rest)) => {
                let name = ANNOTATION_RE.replace_all(rest, "");
                let name = name.trim().trim_end_matches('#').trim().to_string();
                flat.push(Heading {
                    level,
                    name,
                    annotations: annotations_in(rest),
                    children: Vec::new(),
                });
            }
            None => document.annotations.extend(annotations_in(line)),
        }
    }

    document.headings = nest(flat);
    document
}

/// Splits `## Name` into `(2, "Name")`; `#tag` is not a heading.
fn heading_parts(line: &str) -> Option<(usize, &str)> {
    let level = line.chars().take_while(|ch| *ch == '#').count();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some((level, rest))
}

fn annotations_in(text: &str) -> Vec<Annotation> {
    ANNOTATION_RE
        .captures_iter(text)
        .filter_map(|captures| {
            let key = match captures[1].to_ascii_lowercase().as_str() {
                "deadline" | "due" => AnnotationKey::Due,
                "context" => AnnotationKey::Context,
                "progress" => AnnotationKey::Progress,
                _ => return None,
            };
            Some(Annotation {
                key,
                value: captures[2].trim().to_string(),
            })
        })
        .collect()
}

/// Builds the outline from a flat heading list. The first heading of a run
/// sets the sibling level, so skipped levels still nest.
fn nest(flat: Vec<Heading>) -> Vec<Heading> {
    let mut result = Vec::new();
    let mut iter = flat.into_iter().peekable();
    while let Some(mut heading) = iter.next() {
        let mut nested = Vec::new();
        while let Some(next) = iter.next_if(|next| next.level > heading.level) {
            nested.push(next);
        }
        heading.children = nest(nested);
        result.push(heading);
    }
    result
}
