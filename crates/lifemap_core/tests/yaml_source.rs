use lifemap_core::source::load_yaml_str;
use lifemap_core::{load_tree, Diagnostic, SourceError, SourceKind};
use std::path::PathBuf;
use tempfile::TempDir;

const LIFE: &str = r#"
metadata:
  title: My Life
  version: "2"
structure:
  body:
    id: body
    title: Body
    context: Physical health
    children:
      habit:
        id: body_habit
        title: Habit
        due: 2024-06-10
        progress: 40
      nutrition:
        id: body_nutrition
        title: Nutrition
        due: "2024/06/13"
  level:
    id: level
    title: Level
    children:
      task:
        id: level_task
        title: First task
      other:
        id: level_task
        title: Second task
        due: next tuesday
"#;

#[test]
fn loads_nested_structure_in_insertion_order() {
    let outcome = load_yaml_str(LIFE).unwrap();
    let tree = &outcome.tree;

    let top = tree
        .roots()
        .iter()
        .map(|&index| tree.node(index).id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(top, vec!["body", "level"]);

    let body = tree.find("body").unwrap();
    let children = tree
        .children(body)
        .map(|(_, node)| node.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(children, vec!["body_habit", "body_nutrition"]);

    let habit = tree.get("body_habit").unwrap();
    assert!(habit.is_leaf());
    assert_eq!(habit.depth, 2);
    assert_eq!(habit.progress, Some(40.0));
    assert_eq!(
        habit.due.as_ref().unwrap().date().unwrap().to_string(),
        "2024-06-10"
    );
    assert_eq!(
        tree.get("body_nutrition").unwrap().due.as_ref().unwrap().date().unwrap().to_string(),
        "2024-06-13"
    );
    assert_eq!(tree.get("body").unwrap().context.as_deref(), Some("Physical health"));
    assert_eq!(tree.root_title(), "My Life");
}

#[test]
fn duplicate_id_is_reported_and_first_seen_wins() {
    let outcome = load_yaml_str(LIFE).unwrap();
    let tree = &outcome.tree;

    assert_eq!(tree.get("level_task").unwrap().title, "First task");
    let level = tree.find("level").unwrap();
    assert_eq!(tree.node(level).children.len(), 2);

    assert!(outcome.diagnostics.contains(&Diagnostic::DuplicateId {
        id: "level_task".to_string(),
        first: "level/task".to_string(),
        duplicate: "level/other".to_string(),
    }));
    assert!(outcome.diagnostics.contains(&Diagnostic::InvalidDue {
        id: "level_task".to_string(),
        value: "next tuesday".to_string(),
    }));
}

#[test]
fn out_of_range_progress_is_dropped_with_diagnostic() {
    let outcome = load_yaml_str(
        "structure:\n  a:\n    id: a\n    title: A\n    progress: 140\n  b:\n    id: b\n    title: B\n    progress: lots\n",
    )
    .unwrap();
    assert_eq!(outcome.tree.get("a").unwrap().progress, None);
    assert_eq!(outcome.tree.get("b").unwrap().progress, None);
    let codes = outcome
        .diagnostics
        .iter()
        .map(Diagnostic::code)
        .collect::<Vec<_>>();
    assert_eq!(codes, vec!["invalid_progress", "invalid_progress"]);
}

#[test]
fn reserved_id_stays_visible_but_unindexed() {
    let outcome =
        load_yaml_str("structure:\n  late:\n    id: overdue\n    title: Late things\n").unwrap();
    assert_eq!(outcome.tree.len(), 1);
    assert!(outcome.tree.get("overdue").is_none());
    assert_eq!(outcome.diagnostics[0].code(), "reserved_id");
}

#[test]
fn load_tree_reports_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("structure.yaml");
    let err = load_tree(&SourceKind::Yaml { path: path.clone() }).unwrap_err();
    match err {
        SourceError::NotFound(missing) => assert_eq!(missing, path),
        other => panic!("unexpected error: {other}"),
    }

    std::fs::write(&path, LIFE).unwrap();
    let outcome = load_tree(&SourceKind::Yaml {
        path: PathBuf::from(&path),
    })
    .unwrap();
    assert_eq!(outcome.tree.len(), 6);
}

#[test]
fn repeated_key_under_one_parent_loads_with_duplicate_id() {
    let outcome = load_yaml_str(
        r#"
structure:
  level:
    id: level
    title: Level
    children:
      task:
        id: level_task
        title: First task
        due: 2024-06-01
      task:
        id: level_task
        title: Second task
        due: 2024-06-02
"#,
    )
    .unwrap();
    let tree = &outcome.tree;

    let level = tree.find("level").unwrap();
    let titles = tree
        .children(level)
        .map(|(_, node)| node.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["First task", "Second task"]);
    assert_eq!(tree.get("level_task").unwrap().title, "First task");
    assert_eq!(
        outcome.diagnostics,
        vec![Diagnostic::DuplicateId {
            id: "level_task".to_string(),
            first: "level/task".to_string(),
            duplicate: "level/task".to_string(),
        }]
    );
}
