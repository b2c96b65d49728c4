//! Due-date classification.
//!
//! # Responsibility
//! - Partition every node with a parseable due date into one time bucket
//!   relative to an injected "today".
//! - Produce the due badge shown next to a node.
//!
//! # Invariants
//! - Buckets are disjoint; nodes due more than 30 days out or with an
//!   unparseable due value land in none.
//! - Entries are ordered by due date, ties by discovery order.

use crate::model::due::DueBucket;
use crate::model::node::NodeIndex;
use crate::model::tree::NodeTree;
use chrono::NaiveDate;

/// One node placed in a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEntry {
    pub node: NodeIndex,
    pub due: NaiveDate,
    /// Ancestor titles from the top level down, excluding the node.
    pub path: Vec<String>,
}

/// Result of one classification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub overdue: Vec<ClassifiedEntry>,
    pub today: Vec<ClassifiedEntry>,
    pub this_week: Vec<ClassifiedEntry>,
    pub this_month: Vec<ClassifiedEntry>,
}

impl Classification {
    /// Entries of one bucket.
    pub fn bucket(&self, bucket: DueBucket) -> &[ClassifiedEntry] {
        match bucket {
            DueBucket::Overdue => &self.overdue,
            DueBucket::Today => &self.today,
            DueBucket::ThisWeek => &self.this_week,
            DueBucket::ThisMonth => &self.this_month,
        }
    }

    /// Bucket holding `node`, if any.
    pub fn bucket_of(&self, node: NodeIndex) -> Option<DueBucket> {
        DueBucket::ALL
            .into_iter()
            .find(|bucket| self.bucket(*bucket).iter().any(|entry| entry.node == node))
    }

    /// Total entries across all buckets.
    pub fn len(&self) -> usize {
        DueBucket::ALL
            .into_iter()
            .map(|bucket| self.bucket(bucket).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn bucket_mut(&mut self, bucket: DueBucket) -> &mut Vec<ClassifiedEntry> {
        match bucket {
            DueBucket::Overdue => &mut self.overdue,
            DueBucket::Today => &mut self.today,
            DueBucket::ThisWeek => &mut self.this_week,
            DueBucket::ThisMonth => &mut self.this_month,
        }
    }
}

/// Classifies every node of the tree against `today`.
pub fn classify(tree: &NodeTree, today: NaiveDate) -> Classification {
    let mut classification = Classification::default();
    for (index, node) in tree.iter() {
        let Some(due) = node.due.as_ref().and_then(|due| due.date()) else {
            continue;
        };
        let offset = (due - today).num_days();
        if let Some(bucket) = DueBucket::for_offset(offset) {
            classification.bucket_mut(bucket).push(ClassifiedEntry {
                node: index,
                due,
                path: tree.ancestor_titles(index),
            });
        }
    }
    for bucket in DueBucket::ALL {
        // Stable sort keeps discovery order among equal dates.
        classification.bucket_mut(bucket).sort_by_key(|entry| entry.due);
    }
    classification
}

/// Badge text and style class for one due date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueLabel {
    pub text: String,
    pub css_class: &'static str,
}

/// Formats a due date relative to `today`.
///
/// `OVERDUE`, `TODAY`, `in Nd` within the week, `Mon DD` beyond.
pub fn due_label(due: NaiveDate, today: NaiveDate) -> DueLabel {
    let days = (due - today).num_days();
    match days {
        d if d < 0 => DueLabel {
            text: "OVERDUE".to_string(),
            css_class: "due-overdue",
        },
        0 => DueLabel {
            text: "TODAY".to_string(),
            css_class: "due-today",
        },
        1..=6 => DueLabel {
            text: format!("in {days}d"),
            css_class: "due-soon",
        },
        _ => DueLabel {
            text: due.format("%b %d").to_string(),
            css_class: "due-later",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{classify, due_label};
    use crate::model::due::{Due, DueBucket};
    use crate::model::node::NodeDraft;
    use crate::model::tree::NodeTreeBuilder;
    use chrono::{Days, NaiveDate};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn due_in(days: i64) -> Option<Due> {
        let date = if days >= 0 {
            today().checked_add_days(Days::new(days as u64))
        } else {
            today().checked_sub_days(Days::new(days.unsigned_abs()))
        };
        Some(Due::from_date(date.unwrap()))
    }

    fn draft(id: &str, due: Option<Due>) -> NodeDraft {
        NodeDraft {
            key: id.to_string(),
            id: id.to_string(),
            title: id.to_uppercase(),
            due,
            ..NodeDraft::default()
        }
    }

    #[test]
    fn boundaries_map_to_expected_buckets() {
        let mut builder = NodeTreeBuilder::new();
        for (id, days) in [
            ("past", -1),
            ("now", 0),
            ("one", 1),
            ("six", 6),
            ("seven", 7),
            ("thirty", 30),
            ("later", 31),
        ] {
            builder.push(None, draft(id, due_in(days)));
        }
        builder.push(None, draft("bad", Some(Due::parse("someday"))));
        builder.push(None, draft("none", None));
        let (tree, _) = builder.finish();

        let classification = classify(&tree, today());
        let bucket_of = |id: &str| classification.bucket_of(tree.find(id).unwrap());
        assert_eq!(bucket_of("past"), Some(DueBucket::Overdue));
        assert_eq!(bucket_of("now"), Some(DueBucket::Today));
        assert_eq!(bucket_of("one"), Some(DueBucket::ThisWeek));
        assert_eq!(bucket_of("six"), Some(DueBucket::ThisWeek));
        assert_eq!(bucket_of("seven"), Some(DueBucket::ThisMonth));
        assert_eq!(bucket_of("thirty"), Some(DueBucket::ThisMonth));
        assert_eq!(bucket_of("later"), None);
        assert_eq!(bucket_of("bad"), None);
        assert_eq!(bucket_of("none"), None);
        assert_eq!(classification.len(), 6);
    }

    #[test]
    fn entries_sort_by_date_then_discovery() {
        let mut builder = NodeTreeBuilder::new();
        let area = builder.push(None, draft("area", None));
        builder.push(Some(area), draft("b", due_in(5)));
        builder.push(Some(area), draft("a", due_in(2)));
        builder.push(Some(area), draft("c", due_in(2)));
        let (tree, _) = builder.finish();

        let classification = classify(&tree, today());
        let ids = classification
            .this_week
            .iter()
            .map(|entry| tree.node(entry.node).id.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["a", "c", "b"]);
        assert_eq!(classification.this_week[0].path, vec!["AREA".to_string()]);
    }

    #[test]
    fn labels_follow_distance() {
        let label = |days: i64| due_label(due_in(days).unwrap().date().unwrap(), today());
        assert_eq!(label(-3).text, "OVERDUE");
        assert_eq!(label(0).text, "TODAY");
        assert_eq!(label(4).text, "in 4d");
        assert_eq!(label(4).css_class, "due-soon");
        assert_eq!(label(12).text, "Jun 22");
    }
}
