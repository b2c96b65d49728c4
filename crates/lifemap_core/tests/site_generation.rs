use chrono::NaiveDate;
use lifemap_core::source::load_yaml_str;
use lifemap_core::{ProjectionOptions, SiteError, SiteGenerator, SiteOptions};
use std::fs;
use tempfile::TempDir;

const LIFE: &str = r#"
structure:
  body:
    id: body
    title: Body <& Soul>
    children:
      habit:
        id: body_habit
        title: Habit
        due: 2024-06-10
  escape:
    id: ../escape
    title: Sneaky
"#;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn generator(dir: &TempDir) -> SiteGenerator {
    SiteGenerator::new(SiteOptions {
        output_dir: dir.path().join("html"),
        projection: ProjectionOptions {
            depth: 3,
            include_time_buckets: true,
        },
    })
}

#[test]
fn generate_all_writes_root_nodes_and_buckets() {
    let tree = load_yaml_str(LIFE).unwrap().tree;
    let dir = TempDir::new().unwrap();
    let report = generator(&dir).generate_all(&tree, today()).unwrap();

    let mut names = fs::read_dir(dir.path().join("html"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().into_string().unwrap())
        .collect::<Vec<_>>();
    names.sort();
    assert_eq!(
        names,
        vec![
            "body.html",
            "body_habit.html",
            "data.html",
            "due_this_month.html",
            "due_this_week.html",
            "due_today.html",
            "overdue.html",
        ]
    );
    assert_eq!(report.pages.len(), 7);
    assert_eq!(report.skipped_ids, vec!["../escape".to_string()]);
    assert!(!dir.path().join("escape.html").exists());

    let root = fs::read_to_string(dir.path().join("html/data.html")).unwrap();
    assert!(root.contains("Body &lt;&amp; Soul&gt;"));
    assert!(root.contains("data-id=\"due_today\""));
    assert!(!root.contains("<nav class=\"breadcrumb\">"));

    let habit = fs::read_to_string(dir.path().join("html/body_habit.html")).unwrap();
    assert!(habit.contains("<a href=\"data.html\">Home</a>"));
    assert!(habit.contains("<a href=\"body.html\">Body &lt;&amp; Soul&gt;</a>"));
    assert!(habit.contains("Nothing here yet."));

    let today_page = fs::read_to_string(dir.path().join("html/due_today.html")).unwrap();
    assert!(today_page.contains("data-id=\"body_habit\""));
    assert!(today_page.contains("<div class=\"path\">Body &lt;&amp; Soul&gt;</div>"));
}

#[test]
fn generate_item_writes_one_page_and_falls_back_for_unknown_ids() {
    let tree = load_yaml_str(LIFE).unwrap().tree;
    let dir = TempDir::new().unwrap();
    let generator = generator(&dir);

    let page = generator.generate_item(&tree, "body", today()).unwrap();
    assert_eq!(page.path, dir.path().join("html/body.html"));
    assert!(page.path.is_file());

    let missing = generator.generate_item(&tree, "ghost", today()).unwrap();
    let html = fs::read_to_string(missing.path).unwrap();
    assert!(html.contains("No entry named <code>ghost</code>"));
    assert!(html.contains("data-id=\"body\""));

    let err = generator
        .generate_item(&tree, "../escape", today())
        .unwrap_err();
    assert!(matches!(err, SiteError::InvalidPageId(_)));
}

#[test]
fn write_failure_aborts_the_pass() {
    let tree = load_yaml_str(LIFE).unwrap().tree;
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("html");
    fs::write(&blocker, "not a directory").unwrap();

    let err = generator(&dir).generate_all(&tree, today()).unwrap_err();
    assert!(matches!(err, SiteError::Io { .. }));
}
