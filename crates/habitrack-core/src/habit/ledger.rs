//! Append-only completion ledger.
//!
//! Entries are immutable facts about a habit. Only two note classes drive
//! the state machine ([`LogNote::Completed`] and
//! [`LogNote::MarkedIncomplete`]); the rest are informational.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Note classes the eligibility gate and the streak projector look at.
pub const QUALIFYING_NOTES: [LogNote; 2] = [LogNote::Completed, LogNote::MarkedIncomplete];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogNote {
    Created,
    Restarted,
    Completed,
    MarkedIncomplete,
    UpdateFailedInactive,
    Deactivated,
    Deleted,
    /// Free-text entry recorded by hand
    Custom(String),
}

impl LogNote {
    pub fn as_str(&self) -> &str {
        match self {
            LogNote::Created => "Habit created and activated",
            LogNote::Restarted => "Habit restarted and activated",
            LogNote::Completed => "Habit completed successfully on time",
            LogNote::MarkedIncomplete => "Habit marked as incomplete",
            LogNote::UpdateFailedInactive => "Habit update failed - habit inactive",
            LogNote::Deactivated => "Habit deactivated - deadline exceeded",
            LogNote::Deleted => "Habit deleted",
            LogNote::Custom(text) => text,
        }
    }

    pub fn parse(text: &str) -> Self {
        match text {
            "Habit created and activated" => LogNote::Created,
            "Habit restarted and activated" => LogNote::Restarted,
            "Habit completed successfully on time" => LogNote::Completed,
            "Habit marked as incomplete" => LogNote::MarkedIncomplete,
            "Habit update failed - habit inactive" => LogNote::UpdateFailedInactive,
            "Habit deactivated - deadline exceeded" => LogNote::Deactivated,
            "Habit deleted" => LogNote::Deleted,
            other => LogNote::Custom(other.to_string()),
        }
    }

    pub fn is_qualifying(&self) -> bool {
        QUALIFYING_NOTES.contains(self)
    }
}

impl fmt::Display for LogNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for LogNote {
    fn from(text: String) -> Self {
        LogNote::parse(&text)
    }
}

impl From<LogNote> for String {
    fn from(note: LogNote) -> Self {
        note.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Failure,
    Success,
}

impl Outcome {
    pub fn as_flag(self) -> i64 {
        match self {
            Outcome::Failure => 0,
            Outcome::Success => 1,
        }
    }

    pub fn from_flag(flag: i64) -> Self {
        if flag != 0 {
            Outcome::Success
        } else {
            Outcome::Failure
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub habit_id: i64,
    pub timestamp: DateTime<Utc>,
    pub outcome: Outcome,
    pub note: LogNote,
}

/// Predicate for counting entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFilter {
    All,
    Outcome(Outcome),
    Note(LogNote),
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        match self {
            LogFilter::All => true,
            LogFilter::Outcome(outcome) => entry.outcome == *outcome,
            LogFilter::Note(note) => entry.note == *note,
        }
    }
}

/// A habit's entries in ledger order: timestamp, then insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<LogEntry>,
}

impl Ledger {
    pub fn from_entries(mut entries: Vec<LogEntry>) -> Self {
        entries.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then(a.id.cmp(&b.id)));
        Self { entries }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Latest entry whose note is one of `notes`.
    pub fn most_recent(&self, notes: &[LogNote]) -> Option<&LogEntry> {
        self.entries.iter().rev().find(|e| notes.contains(&e.note))
    }

    pub fn count(&self, filter: &LogFilter) -> u64 {
        self.entries.iter().filter(|e| filter.matches(e)).count() as u64
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a LogEntry;
    type IntoIter = std::slice::Iter<'a, LogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn entry(id: i64, minutes: i64, note: LogNote) -> LogEntry {
        let base = Utc.with_ymd_and_hms(2024, 6, 23, 16, 30, 0).unwrap();
        LogEntry {
            id,
            habit_id: 1,
            timestamp: base + Duration::minutes(minutes),
            outcome: if note == LogNote::MarkedIncomplete {
                Outcome::Failure
            } else {
                Outcome::Success
            },
            note,
        }
    }

    #[test]
    fn notes_round_trip_through_text() {
        for note in [
            LogNote::Created,
            LogNote::Restarted,
            LogNote::Completed,
            LogNote::MarkedIncomplete,
            LogNote::UpdateFailedInactive,
            LogNote::Deactivated,
            LogNote::Deleted,
        ] {
            assert_eq!(LogNote::parse(note.as_str()), note);
        }
        assert_eq!(
            LogNote::parse("went for a run"),
            LogNote::Custom("went for a run".into())
        );
    }

    #[test]
    fn only_two_notes_qualify() {
        assert!(LogNote::Completed.is_qualifying());
        assert!(LogNote::MarkedIncomplete.is_qualifying());
        assert!(!LogNote::Created.is_qualifying());
        assert!(!LogNote::Custom("Habit completed".into()).is_qualifying());
    }

    #[test]
    fn ledger_orders_by_time_then_insertion() {
        let ledger = Ledger::from_entries(vec![
            entry(3, 10, LogNote::Completed),
            entry(2, 5, LogNote::MarkedIncomplete),
            entry(1, 10, LogNote::Created),
        ]);
        let ids: Vec<i64> = ledger.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn most_recent_skips_informational_entries() {
        let ledger = Ledger::from_entries(vec![
            entry(1, 0, LogNote::Created),
            entry(2, 1, LogNote::Completed),
            entry(3, 2, LogNote::Custom("note".into())),
        ]);
        assert_eq!(ledger.most_recent(&QUALIFYING_NOTES).map(|e| e.id), Some(2));
        assert!(ledger.most_recent(&[LogNote::Deleted]).is_none());
    }

    #[test]
    fn count_by_filter() {
        let ledger = Ledger::from_entries(vec![
            entry(1, 0, LogNote::Created),
            entry(2, 1, LogNote::Completed),
            entry(3, 2, LogNote::MarkedIncomplete),
        ]);
        assert_eq!(ledger.count(&LogFilter::All), 3);
        assert_eq!(ledger.count(&LogFilter::Outcome(Outcome::Success)), 2);
        assert_eq!(ledger.count(&LogFilter::Note(LogNote::MarkedIncomplete)), 1);
    }
}
