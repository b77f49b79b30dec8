//! Waiting-list ordering for the administrative overview.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::WaitingListEntry;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitingListRow {
    #[serde(flatten)]
    pub entry: WaitingListEntry,
    pub waiting_days: i64,
}

/// Whole days between application and `today`, regardless of direction.
pub fn waiting_days(applied: NaiveDate, today: NaiveDate) -> i64 {
    (today - applied).num_days().abs()
}

/// Orders entries High priority first, then longest waiting, and keeps `limit` rows.
pub fn process_waiting_list(
    entries: &[WaitingListEntry],
    today: NaiveDate,
    limit: usize,
) -> Vec<WaitingListRow> {
    let mut rows: Vec<WaitingListRow> = entries
        .iter()
        .map(|entry| WaitingListRow {
            entry: entry.clone(),
            waiting_days: waiting_days(entry.applied_date, today),
        })
        .collect();
    rows.sort_by(|a, b| {
        a.entry
            .priority
            .cmp(&b.entry.priority)
            .then_with(|| b.waiting_days.cmp(&a.waiting_days))
    });
    rows.truncate(limit);
    rows
}

pub fn average_waiting_days(rows: &[WaitingListRow]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    let total: i64 = rows.iter().map(|row| row.waiting_days).sum();
    Some(total as f64 / rows.len() as f64)
}
