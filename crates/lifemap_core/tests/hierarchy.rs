use chrono::{Days, NaiveDate};
use lifemap_core::service::projection::ProjectionFocus;
use lifemap_core::source::load_yaml_str;
use lifemap_core::{breadcrumb, classify, resolve, DueBucket, NodeTree, ProjectionOptions};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

fn plus(days: u64) -> String {
    today()
        .checked_add_days(Days::new(days))
        .unwrap()
        .format("%Y-%m-%d")
        .to_string()
}

fn body_tree() -> NodeTree {
    let text = format!(
        r#"
structure:
  body:
    id: body
    title: Body
    children:
      habit:
        id: body_habit
        title: Habit
        due: {today}
      nutrition:
        id: body_nutrition
        title: Nutrition
        due: {soon}
  mind:
    id: mind
    title: Mind
    children:
      later:
        id: mind_later
        title: Someday
        due: {later}
      reading:
        id: mind_reading
        title: Reading
        due: 2024-05-01
        children:
          novel:
            id: mind_reading_novel
            title: Novel
            children:
              chapter:
                id: mind_reading_novel_chapter
                title: Chapter One
"#,
        today = plus(0),
        soon = plus(3),
        later = plus(45),
    );
    load_yaml_str(&text).unwrap().tree
}

#[test]
fn body_scenario_classifies_and_projects() {
    let tree = body_tree();

    let classification = classify(&tree, today());
    assert_eq!(
        classification.bucket_of(tree.find("body_habit").unwrap()),
        Some(DueBucket::Today)
    );
    assert_eq!(
        classification.bucket_of(tree.find("body_nutrition").unwrap()),
        Some(DueBucket::ThisWeek)
    );
    assert_eq!(
        classification.bucket_of(tree.find("mind_later").unwrap()),
        None
    );
    assert_eq!(
        classification.bucket_of(tree.find("mind_reading").unwrap()),
        Some(DueBucket::Overdue)
    );
    assert_eq!(classification.len(), 3);

    let options = ProjectionOptions {
        depth: 1,
        include_time_buckets: false,
    };
    let projection = resolve(&tree, "body", &options, today());
    let ids = projection
        .items
        .iter()
        .map(|item| item.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["body_habit", "body_nutrition"]);
    assert!(projection.items.iter().all(|item| item.children.is_empty()));
    assert!(projection.items.iter().all(|item| !item.is_clickable()));
}

#[test]
fn body_at_depth_two_has_exactly_two_leaf_children() {
    let tree = body_tree();
    let options = ProjectionOptions {
        depth: 2,
        include_time_buckets: false,
    };

    let projection = resolve(&tree, "body", &options, today());
    assert_eq!(projection.focus, ProjectionFocus::Node(tree.find("body").unwrap()));
    let ids = projection
        .items
        .iter()
        .map(|item| item.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["body_habit", "body_nutrition"]);
    assert!(projection.items.iter().all(|item| item.children.is_empty()));
    assert_eq!(projection.max_depth(), 1);
}

#[test]
fn max_depth_is_min_of_requested_and_remaining() {
    let tree = body_tree();
    for depth in 1..=5 {
        let options = ProjectionOptions {
            depth,
            include_time_buckets: false,
        };
        assert_eq!(resolve(&tree, "data", &options, today()).max_depth(), depth.min(4));
        assert_eq!(resolve(&tree, "mind", &options, today()).max_depth(), depth.min(3));
        assert_eq!(
            resolve(&tree, "mind_reading_novel_chapter", &options, today()).max_depth(),
            0
        );
    }
}

#[test]
fn unknown_id_falls_back_to_root() {
    let tree = body_tree();
    let projection = resolve(&tree, "no_such_node", &ProjectionOptions::default(), today());
    assert!(projection.fell_back);
    assert_eq!(projection.focus, ProjectionFocus::Root);
    assert_eq!(projection.requested_id, "no_such_node");
    assert_eq!(projection.items.len(), 2);
}

#[test]
fn bucket_page_lists_entries_with_paths() {
    let tree = body_tree();
    let projection = resolve(&tree, "overdue", &ProjectionOptions::default(), today());
    assert_eq!(projection.focus, ProjectionFocus::Bucket(DueBucket::Overdue));
    assert_eq!(projection.title, "Overdue");
    assert_eq!(projection.items.len(), 1);

    let entry = &projection.items[0];
    assert_eq!(entry.id, "mind_reading");
    assert_eq!(entry.path.as_deref(), Some("Mind"));
    assert!(entry.children.is_empty());
    assert!(entry.is_clickable());

    let week = resolve(&tree, "due_this_week", &ProjectionOptions::default(), today());
    assert_eq!(week.items[0].id, "body_nutrition");
    assert_eq!(week.items[0].path.as_deref(), Some("Body"));
}

#[test]
fn breadcrumb_lists_ancestors_from_root() {
    let tree = body_tree();
    assert!(breadcrumb(&tree, "data").is_empty());

    let crumbs = breadcrumb(&tree, "mind_reading_novel");
    let hrefs = crumbs
        .iter()
        .map(|crumb| crumb.href.as_str())
        .collect::<Vec<_>>();
    assert_eq!(hrefs, vec!["data.html", "mind.html", "mind_reading.html"]);
    assert!(crumbs.iter().all(|crumb| crumb.title != "Novel"));
}
