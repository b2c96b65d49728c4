//! Due dates and time buckets.
//!
//! # Responsibility
//! - Normalize declared due text into one calendar-date representation.
//! - Name the derived time buckets used by classification and navigation.
//!
//! # Invariants
//! - The raw declared text is kept verbatim for export.
//! - Comparison against "today" only ever uses the normalized date.

use chrono::{DateTime, NaiveDate};

/// Declared due value of one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Due {
    raw: String,
    date: Option<NaiveDate>,
}

impl Due {
    /// Parses declared due text. Unparseable text keeps `date() == None`.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into().trim().to_string();
        let date = parse_due_date(&raw);
        Self { raw, date }
    }

    /// Builds a due value from an already-normalized date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            raw: date.format("%Y-%m-%d").to_string(),
            date: Some(date),
        }
    }

    /// Declared text as found in the source.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Normalized calendar date, when the declared text could be parsed.
    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// Parses `YYYY-MM-DD`, `YYYY/MM/DD`, or an RFC 3339 timestamp into a date.
///
/// Time-of-day and offset are dropped; the date is read in the offset the
/// timestamp was written in.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(trimmed, "%Y/%m/%d").ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|value| value.date_naive())
        })
}

/// Derived time bucket relative to the invocation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DueBucket {
    /// Due strictly before today.
    Overdue,
    /// Due today.
    Today,
    /// Due 1 to 6 days after today.
    ThisWeek,
    /// Due 7 to 30 days after today.
    ThisMonth,
}

impl DueBucket {
    /// Every bucket in display order.
    pub const ALL: [DueBucket; 4] = [
        DueBucket::Overdue,
        DueBucket::Today,
        DueBucket::ThisWeek,
        DueBucket::ThisMonth,
    ];

    /// Reserved page id for this bucket.
    pub fn id(self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Today => "due_today",
            Self::ThisWeek => "due_this_week",
            Self::ThisMonth => "due_this_month",
        }
    }

    /// Display title for this bucket.
    pub fn title(self) -> &'static str {
        match self {
            Self::Overdue => "Overdue",
            Self::Today => "Due Today",
            Self::ThisWeek => "Due This Week",
            Self::ThisMonth => "Due This Month",
        }
    }

    /// Maps a reserved page id back to its bucket.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.id() == id)
    }

    /// Bucket for a due date `days` after today (negative means past).
    ///
    /// Returns `None` for dates more than 30 days out.
    pub fn for_offset(days: i64) -> Option<Self> {
        match days {
            d if d < 0 => Some(Self::Overdue),
            0 => Some(Self::Today),
            1..=6 => Some(Self::ThisWeek),
            7..=30 => Some(Self::ThisMonth),
            _ => None,
        }
    }
}
