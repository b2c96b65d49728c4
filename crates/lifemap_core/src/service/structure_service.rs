//! Structure document edit service.
//!
//! # Responsibility
//! - Validate node edits above the repository layer.
//! - Provide node update, add and remove operations plus document metadata
//!   updates on the YAML source.
//!
//! # Invariants
//! - Titles are trimmed and must not be blank.
//! - New ids must be non-blank, unreserved and unique in the document.
//! - Due values must parse as dates; progress must be within `[0, 100]`.
//! - Every successful edit rewrites the whole document once.

use crate::model::due::parse_due_date;
use crate::model::node::{checked_progress, is_reserved_id, ROOT_ID};
use crate::repo::structure_repo::{StructureRepoError, StructureRepository};
use log::info;
use serde_yaml::{Mapping, Value};
use std::collections::{BTreeMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from structure edit operations.
#[derive(Debug)]
pub enum StructureServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Local key is blank after trim.
    InvalidKey,
    /// Id is blank after trim.
    InvalidId,
    /// Id is reserved for generated pages.
    ReservedId(String),
    /// Id already exists somewhere in the document.
    DuplicateId(String),
    /// Parent already has a child with this key.
    DuplicateKey { parent: String, key: String },
    /// Due text is not a date.
    InvalidDue(String),
    /// Progress is outside `[0, 100]`.
    InvalidProgress(f64),
    /// Target node does not exist.
    NodeNotFound(String),
    /// Parent node does not exist.
    ParentNotFound(String),
    /// Repository-level failure.
    Repo(StructureRepoError),
}

impl Display for StructureServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "title must not be blank"),
            Self::InvalidKey => write!(f, "key must not be blank"),
            Self::InvalidId => write!(f, "id must not be blank"),
            Self::ReservedId(id) => write!(f, "id is reserved: {id}"),
            Self::DuplicateId(id) => write!(f, "id already exists: {id}"),
            Self::DuplicateKey { parent, key } => {
                write!(f, "`{parent}` already has a child named `{key}`")
            }
            Self::InvalidDue(value) => write!(f, "due value is not a date: {value}"),
            Self::InvalidProgress(value) => write!(f, "progress must be within 0..=100: {value}"),
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StructureServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StructureRepoError> for StructureServiceError {
    fn from(value: StructureRepoError) -> Self {
        Self::Repo(value)
    }
}

/// Field changes for one node.
///
/// `None` leaves a field untouched; `Some(None)` removes an optional field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub title: Option<String>,
    pub context: Option<Option<String>>,
    pub due: Option<Option<String>>,
    pub progress: Option<Option<f64>>,
}

/// Input for a new node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewNode {
    /// Mapping key under the parent.
    pub key: String,
    pub id: String,
    pub title: String,
    pub context: Option<String>,
    pub due: Option<String>,
    pub progress: Option<f64>,
}

/// Structure edit service facade.
pub struct StructureService<R: StructureRepository> {
    repo: R,
}

impl<R: StructureRepository> StructureService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Applies field changes to the node with `id`.
    pub fn update_node(&self, id: &str, update: NodeUpdate) -> Result<(), StructureServiceError> {
        let title = update.title.map(normalize_title).transpose()?;
        let due = update.due.map(|due| due.map(validate_due).transpose()).transpose()?;
        let progress = update
            .progress
            .map(|progress| progress.map(validate_progress).transpose())
            .transpose()?;

        let mut document = self.repo.load_document()?;
        let fields = find_node_mut(structure_mut(&mut document)?, id)
            .ok_or_else(|| StructureServiceError::NodeNotFound(id.to_string()))?;

        if let Some(title) = title {
            fields.insert("title".into(), Value::String(title));
        }
        if let Some(context) = update.context {
            set_optional(fields, "context", context.and_then(non_blank).map(Value::String));
        }
        if let Some(due) = due {
            set_optional(fields, "due", due.map(Value::String));
        }
        if let Some(progress) = progress {
            set_optional(fields, "progress", progress.map(Value::from));
        }

        self.repo.save_document(&document)?;
        info!("event=structure_update module=service status=ok id={id}");
        Ok(())
    }

    /// Adds a node under `parent_id`; `data` adds a top-level node.
    pub fn add_node(&self, parent_id: &str, node: NewNode) -> Result<(), StructureServiceError> {
        let key = non_blank(node.key).ok_or(StructureServiceError::InvalidKey)?;
        let id = non_blank(node.id).ok_or(StructureServiceError::InvalidId)?;
        if is_reserved_id(&id) {
            return Err(StructureServiceError::ReservedId(id));
        }
        let title = normalize_title(node.title)?;
        let due = node.due.map(validate_due).transpose()?;
        let progress = node.progress.map(validate_progress).transpose()?;

        let mut document = self.repo.load_document()?;
        let structure = structure_mut(&mut document)?;
        let mut existing = HashSet::new();
        collect_ids(structure, &mut existing);
        if existing.contains(&id) {
            return Err(StructureServiceError::DuplicateId(id));
        }

        let siblings = if parent_id == ROOT_ID {
            structure
        } else {
            find_node_mut(structure, parent_id)
                .and_then(children_mut)
                .ok_or_else(|| StructureServiceError::ParentNotFound(parent_id.to_string()))?
        };
        if siblings.contains_key(key.as_str()) {
            return Err(StructureServiceError::DuplicateKey {
                parent: parent_id.to_string(),
                key,
            });
        }

        let mut fields = Mapping::new();
        fields.insert("id".into(), Value::String(id.clone()));
        fields.insert("title".into(), Value::String(title));
        if let Some(context) = node.context.and_then(non_blank) {
            fields.insert("context".into(), Value::String(context));
        }
        if let Some(due) = due {
            fields.insert("due".into(), Value::String(due));
        }
        if let Some(progress) = progress {
            fields.insert("progress".into(), Value::from(progress));
        }
        siblings.insert(Value::String(key), Value::Mapping(fields));

        self.repo.save_document(&document)?;
        info!("event=structure_add module=service status=ok id={id} parent_id={parent_id}");
        Ok(())
    }

    /// Sets document-level metadata values; other metadata keys are kept.
    pub fn update_metadata(
        &self,
        entries: BTreeMap<String, String>,
    ) -> Result<(), StructureServiceError> {
        let entries = entries
            .into_iter()
            .map(|(key, value)| {
                let key = non_blank(key).ok_or(StructureServiceError::InvalidKey)?;
                Ok((key, value))
            })
            .collect::<Result<Vec<_>, StructureServiceError>>()?;

        let mut document = self.repo.load_document()?;
        if !matches!(document.get("metadata"), Some(Value::Mapping(_))) {
            document.insert("metadata".into(), Value::Mapping(Mapping::new()));
        }
        if let Some(Value::Mapping(metadata)) = document.get_mut("metadata") {
            for (key, value) in &entries {
                metadata.insert(Value::String(key.clone()), Value::String(value.clone()));
            }
        }

        self.repo.save_document(&document)?;
        info!(
            "event=structure_metadata module=service status=ok keys={}",
            entries.len()
        );
        Ok(())
    }

    /// Removes the node with `id` and its whole subtree.
    pub fn remove_node(&self, id: &str) -> Result<(), StructureServiceError> {
        let mut document = self.repo.load_document()?;
        if !remove_from(structure_mut(&mut document)?, id) {
            return Err(StructureServiceError::NodeNotFound(id.to_string()));
        }
        self.repo.save_document(&document)?;
        info!("event=structure_remove module=service status=ok id={id}");
        Ok(())
    }
}

fn normalize_title(value: String) -> Result<String, StructureServiceError> {
    non_blank(value).ok_or(StructureServiceError::InvalidTitle)
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn validate_due(value: String) -> Result<String, StructureServiceError> {
    let trimmed = value.trim().to_string();
    match parse_due_date(&trimmed) {
        Some(_) => Ok(trimmed),
        None => Err(StructureServiceError::InvalidDue(value)),
    }
}

fn validate_progress(value: f64) -> Result<f64, StructureServiceError> {
    checked_progress(value).ok_or(StructureServiceError::InvalidProgress(value))
}

fn structure_mut(document: &mut Mapping) -> Result<&mut Mapping, StructureServiceError> {
    match document.get_mut("structure") {
        Some(Value::Mapping(structure)) => Ok(structure),
        _ => Err(StructureRepoError::InvalidDocument(
            "missing top-level `structure` mapping".to_string(),
        )
        .into()),
    }
}

fn node_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}

fn set_optional(fields: &mut Mapping, key: &str, value: Option<Value>) {
    match value {
        Some(value) => {
            fields.insert(key.into(), value);
        }
        None => {
            fields.remove(key);
        }
    }
}

fn children_mut(fields: &mut Mapping) -> Option<&mut Mapping> {
    if !matches!(fields.get("children"), Some(Value::Mapping(_))) {
        fields.insert("children".into(), Value::Mapping(Mapping::new()));
    }
    match fields.get_mut("children") {
        Some(Value::Mapping(children)) => Some(children),
        _ => None,
    }
}

fn find_node_mut<'a>(entries: &'a mut Mapping, id: &str) -> Option<&'a mut Mapping> {
    for (_, value) in entries.iter_mut() {
        let Value::Mapping(fields) = value else {
            continue;
        };
        if fields.get("id").and_then(Value::as_str) == Some(id) {
            return Some(fields);
        }
        if let Some(Value::Mapping(children)) = fields.get_mut("children") {
            if let Some(found) = find_node_mut(children, id) {
                return Some(found);
            }
        }
    }
    None
}

fn collect_ids(entries: &Mapping, ids: &mut HashSet<String>) {
    for (_, value) in entries.iter() {
        if let Some(id) = node_id(value) {
            ids.insert(id.to_string());
        }
        if let Some(Value::Mapping(children)) = value.get("children") {
            collect_ids(children, ids);
        }
    }
}

fn remove_from(entries: &mut Mapping, id: &str) -> bool {
    let target = entries
        .iter()
        .find(|(_, value)| node_id(value) == Some(id))
        .map(|(key, _)| key.clone());
    if let Some(target) = target {
        // Rebuild to keep the remaining siblings in their original order.
        *entries = std::mem::take(entries)
            .into_iter()
            .filter(|(key, _)| *key != target)
            .collect();
        return true;
    }

    for (_, value) in entries.iter_mut() {
        if let Some(Value::Mapping(children)) = value.get_mut("children") {
            if remove_from(children, id) {
                return true;
            }
        }
    }
    false
}
