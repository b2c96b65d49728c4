//! YAML structure loader.
//!
//! # Responsibility
//! - Parse a document with a top-level `structure` mapping of arbitrarily
//!   nested `children` mappings.
//! - Keep the optional top-level `metadata` mapping.
//!
//! # Invariants
//! - Sibling order is mapping insertion order.
//! - A missing `structure` mapping is fatal; bad field values are not.

use super::{LoadOutcome, SourceError, SourceResult};
use crate::model::diagnostic::Diagnostic;
use crate::model::due::Due;
use crate::model::node::{
    checked_progress, child_id, slug_component, title_from_name, NodeDraft, NodeIndex, ROOT_ID,
};
use crate::model::tree::NodeTreeBuilder;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt::Formatter;
use std::path::{Path, PathBuf};

/// Parsed YAML that keeps every mapping entry in document order, repeated
/// keys included. Repeated sibling keys reach the tree builder, which
/// applies the duplicate id policy.
#[derive(Debug, Clone, PartialEq)]
enum RawValue {
    Plain(Value),
    Mapping(Vec<(Value, RawValue)>),
}

impl RawValue {
    /// First entry named `name` of a mapping.
    fn field(&self, name: &str) -> Option<&RawValue> {
        match self {
            Self::Mapping(entries) => entries
                .iter()
                .find(|(key, _)| key.as_str() == Some(name))
                .map(|(_, value)| value),
            Self::Plain(_) => None,
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Self::Plain(Value::Null))
    }

    fn scalar(&self) -> Option<String> {
        match self {
            Self::Plain(value) => scalar_text(value),
            Self::Mapping(_) => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Plain(value) => value.as_f64(),
            Self::Mapping(_) => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Self::Plain(value) => render_value(value),
            Self::Mapping(_) => "<mapping>".to_string(),
        }
    }
}

impl<'de> Deserialize<'de> for RawValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawValueVisitor)
    }
}

struct RawValueVisitor;

impl<'de> Visitor<'de> for RawValueVisitor {
    type Value = RawValue;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("any YAML value")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<RawValue, E> {
        Ok(RawValue::Plain(Value::Bool(value)))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<RawValue, E> {
        Ok(RawValue::Plain(Value::from(value)))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<RawValue, E> {
        Ok(RawValue::Plain(Value::from(value)))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<RawValue, E> {
        Ok(RawValue::Plain(Value::from(value)))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<RawValue, E> {
        Ok(RawValue::Plain(Value::String(value.to_string())))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<RawValue, E> {
        Ok(RawValue::Plain(Value::String(value)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Plain(Value::Null))
    }

    fn visit_none<E: de::Error>(self) -> Result<RawValue, E> {
        Ok(RawValue::Plain(Value::Null))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<RawValue, D::Error> {
        RawValue::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<RawValue, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(RawValue::Plain(Value::Sequence(items)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<RawValue, A::Error> {
        let mut entries = Vec::new();
        while let Some(entry) = map.next_entry::<Value, RawValue>()? {
            entries.push(entry);
        }
        Ok(RawValue::Mapping(entries))
    }
}

/// Reads and loads a YAML structure file.
pub fn load_yaml_file(path: &Path) -> SourceResult<LoadOutcome> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        Err(err) => {
            return Err(SourceError::Io {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };
    parse_document(&text, &path.display().to_string())
}

/// Loads a YAML structure from in-memory text.
pub fn load_yaml_str(text: &str) -> SourceResult<LoadOutcome> {
    parse_document(text, "<inline>")
}

fn parse_document(text: &str, origin: &str) -> SourceResult<LoadOutcome> {
    let malformed = |message: String| SourceError::MalformedSource {
        origin: origin.to_string(),
        message,
    };

    let document: RawValue =
        serde_yaml::from_str(text).map_err(|err| malformed(err.to_string()))?;
    if !matches!(document, RawValue::Mapping(_)) {
        return Err(malformed("top-level document must be a mapping".to_string()));
    }
    let structure = match document.field("structure") {
        Some(RawValue::Mapping(structure)) => structure,
        Some(RawValue::Plain(Value::Null)) | None => {
            return Err(malformed("missing top-level `structure` mapping".to_string()));
        }
        Some(_) => return Err(malformed("`structure` must be a mapping".to_string())),
    };

    let mut builder = NodeTreeBuilder::new();
    if let Some(RawValue::Mapping(metadata)) = document.field("metadata") {
        builder.set_metadata(scalar_entries(metadata));
    }
    visit_entries(&mut builder, None, structure);

    let (tree, diagnostics) = builder.finish();
    Ok(LoadOutcome { tree, diagnostics })
}

fn visit_entries(
    builder: &mut NodeTreeBuilder,
    parent: Option<NodeIndex>,
    entries: &[(Value, RawValue)],
) {
    for (key, value) in entries {
        let key = scalar_text(key).unwrap_or_default();
        visit_entry(builder, parent, key, value);
    }
}

fn visit_entry(
    builder: &mut NodeTreeBuilder,
    parent: Option<NodeIndex>,
    key: String,
    fields: &RawValue,
) {
    let parent_id = parent.map(|parent| builder.id_of(parent).to_string());
    if !matches!(fields, RawValue::Mapping(_)) {
        builder.record(Diagnostic::UnresolvedReference {
            parent: parent_id.unwrap_or_else(|| ROOT_ID.to_string()),
            name: key,
            reason: "entry is not a mapping".to_string(),
        });
        return;
    }

    let location = match &parent_id {
        Some(parent_id) => format!("{parent_id}/{key}"),
        None => key.clone(),
    };

    let id = match non_blank(fields.field("id")) {
        Some(id) => id,
        None => {
            let assigned = child_id(parent_id.as_deref(), &slug_component(&key));
            builder.record(Diagnostic::MissingId {
                location,
                assigned: assigned.clone(),
            });
            assigned
        }
    };

    let title = match non_blank(fields.field("title")) {
        Some(title) => title,
        None => {
            builder.record(Diagnostic::MissingTitle { id: id.clone() });
            title_from_name(&key)
        }
    };

    let due = match fields.field("due").filter(|value| !value.is_null()) {
        None => None,
        Some(value) => {
            let raw = value.scalar().unwrap_or_else(|| value.describe());
            let due = Due::parse(raw);
            if due.date().is_none() {
                builder.record(Diagnostic::InvalidDue {
                    id: id.clone(),
                    value: due.raw().to_string(),
                });
            }
            Some(due)
        }
    };

    let progress = match fields.field("progress").filter(|value| !value.is_null()) {
        None => None,
        Some(value) => {
            let checked = value.as_f64().and_then(checked_progress);
            if checked.is_none() {
                builder.record(Diagnostic::InvalidProgress {
                    id: id.clone(),
                    value: value.describe(),
                });
            }
            checked
        }
    };

    let draft = NodeDraft {
        key,
        id: id.clone(),
        title,
        context: non_blank(fields.field("context")),
        due,
        progress,
        source_ref: None,
        file: non_blank(fields.field("file")).map(PathBuf::from),
    };
    let index = builder.push(parent, draft);

    match fields.field("children") {
        None | Some(RawValue::Plain(Value::Null)) => {}
        Some(RawValue::Mapping(children)) => visit_entries(builder, Some(index), children),
        Some(RawValue::Plain(_)) => builder.record(Diagnostic::UnresolvedReference {
            parent: id,
            name: "children".to_string(),
            reason: "`children` must be a mapping".to_string(),
        }),
    }
}

fn scalar_entries(entries: &[(Value, RawValue)]) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();
    for (key, value) in entries {
        if let (Some(key), Some(value)) = (scalar_text(key), value.scalar()) {
            metadata.entry(key).or_insert(value);
        }
    }
    metadata
}

fn non_blank(value: Option<&RawValue>) -> Option<String> {
    value
        .and_then(RawValue::scalar)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

fn render_value(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|text| text.trim().to_string())
        .unwrap_or_else(|_| "<unprintable>".to_string())
}

#[cfg(test)]
mod tests {
    use super::load_yaml_str;
    use crate::source::SourceError;

    #[test]
    fn rejects_document_without_structure() {
        let err = load_yaml_str("metadata:\n  title: x\n").unwrap_err();
        assert!(matches!(err, SourceError::MalformedSource { .. }));
        assert!(err.to_string().contains("structure"));
    }

    #[test]
    fn rejects_unparseable_yaml() {
        let err = load_yaml_str("structure: [unclosed").unwrap_err();
        assert!(matches!(err, SourceError::MalformedSource { .. }));
    }

    #[test]
    fn non_mapping_child_is_omitted_with_diagnostic() {
        let outcome = load_yaml_str(
            "structure:\n  body:\n    id: body\n    title: Body\n    children:\n      stray: just text\n",
        )
        .unwrap();
        let body = outcome.tree.get("body").unwrap();
        assert!(body.is_leaf());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].code(), "unresolved_reference");
    }

    #[test]
    fn repeated_sibling_keys_are_all_kept() {
        let outcome = load_yaml_str(
            "structure:\n  level:\n    id: level\n    title: Level\n    children:\n      task:\n        id: level_task\n        title: First\n      task:\n        id: level_task\n        title: Second\n",
        )
        .unwrap();
        let tree = &outcome.tree;
        let level = tree.find("level").unwrap();
        assert_eq!(tree.node(level).children.len(), 2);
        assert_eq!(tree.get("level_task").unwrap().title, "First");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert_eq!(outcome.diagnostics[0].code(), "duplicate_id");
    }

    #[test]
    fn missing_id_and_title_are_derived() {
        let outcome =
            load_yaml_str("structure:\n  body:\n    children:\n      deep-work: {}\n").unwrap();
        let child = outcome.tree.get("body_deep-work").unwrap();
        assert_eq!(child.title, "Deep Work");
        let codes = outcome
            .diagnostics
            .iter()
            .map(|diagnostic| diagnostic.code())
            .collect::<Vec<_>>();
        assert_eq!(
            codes,
            vec!["missing_id", "missing_title", "missing_id", "missing_title"]
        );
    }
}
