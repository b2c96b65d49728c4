//! Structure document export.
//!
//! The document mirrors the YAML input: a `metadata` mapping plus a
//! `structure` mapping of nodes with nested `children`.

use super::{format_timestamp, ExportResult};
use crate::model::node::NodeIndex;
use crate::model::tree::NodeTree;
use chrono::NaiveDateTime;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashSet};

/// Whole-tree export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructureDocument {
    pub metadata: BTreeMap<String, String>,
    pub structure: ExportNodes,
}

impl StructureDocument {
    pub fn to_yaml_string(&self) -> ExportResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn to_json_string(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Sibling nodes keyed by local key, serialized as an ordered mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportNodes(pub Vec<(String, ExportNode)>);

impl ExportNodes {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ExportNodes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, node) in &self.0 {
            map.serialize_entry(key, node)?;
        }
        map.end()
    }
}

/// One exported node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportNode {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "ExportNodes::is_empty")]
    pub children: ExportNodes,
}

/// Builds the export document. `generated_at` overrides any loaded value.
pub fn export_document(tree: &NodeTree, generated_at: NaiveDateTime) -> StructureDocument {
    let mut metadata = tree.metadata().clone();
    metadata
        .entry("title".to_string())
        .or_insert_with(|| tree.root_title().to_string());
    metadata.insert("generated_at".to_string(), format_timestamp(generated_at));

    StructureDocument {
        metadata,
        structure: export_siblings(tree, tree.roots()),
    }
}

fn export_siblings(tree: &NodeTree, indices: &[NodeIndex]) -> ExportNodes {
    let mut used = HashSet::new();
    let mut nodes = Vec::with_capacity(indices.len());
    for &index in indices {
        let node = tree.node(index);
        let key = unique_key(&mut used, &node.key);
        nodes.push((
            key,
            ExportNode {
                id: node.id.clone(),
                title: node.title.clone(),
                context: node.context.clone(),
                due: node.due.as_ref().map(|due| due.raw().to_string()),
                progress: node.progress,
                file: node.file.as_ref().map(|file| file.display().to_string()),
                children: export_siblings(tree, &node.children),
            },
        ));
    }
    ExportNodes(nodes)
}

/// Sibling keys must stay distinct for the document to reload.
fn unique_key(used: &mut HashSet<String>, key: &str) -> String {
    let mut candidate = key.to_string();
    let mut suffix = 2;
    while !used.insert(candidate.clone()) {
        candidate = format!("{key}-{suffix}");
        suffix += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::export_document;
    use crate::model::node::NodeDraft;
    use crate::model::tree::NodeTreeBuilder;
    use chrono::NaiveDate;

    #[test]
    fn repeated_sibling_keys_are_suffixed() {
        let mut builder = NodeTreeBuilder::new();
        let parent = builder.push(
            None,
            NodeDraft {
                key: "notes".to_string(),
                id: "notes".to_string(),
                title: "Notes".to_string(),
                ..NodeDraft::default()
            },
        );
        for id in ["notes_run", "notes_run-again"] {
            builder.push(
                Some(parent),
                NodeDraft {
                    key: "Run".to_string(),
                    id: id.to_string(),
                    title: "Run".to_string(),
                    ..NodeDraft::default()
                },
            );
        }
        let (tree, _) = builder.finish();
        let generated_at = NaiveDate::from_ymd_opt(2024, 6, 10)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();

        let document = export_document(&tree, generated_at);
        let children = &document.structure.0[0].1.children.0;
        assert_eq!(children[0].0, "Run");
        assert_eq!(children[1].0, "Run-2");
        assert_eq!(
            document.metadata.get("generated_at").map(String::as_str),
            Some("2024-06-10T08:00:00")
        );
        assert_eq!(document.metadata.get("title").map(String::as_str), Some("Home"));
    }
}
