//! Visible range of calendar days for the Gantt timeline.

use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::OccupancyError;

const WEEK_LENGTH: usize = 7;

/// How much of the calendar the timeline shows.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WindowMode {
    /// Seven days starting at the reference date.
    #[default]
    Week,
    /// The reference month followed by the whole next month.
    Month,
}

impl FromStr for WindowMode {
    type Err = OccupancyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "week" => Ok(WindowMode::Week),
            "month" => Ok(WindowMode::Month),
            _ => Err(OccupancyError::UnknownMode(value.to_string())),
        }
    }
}

/// Ordered, gap-free, non-empty run of days rendered as timeline columns.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct TimelineWindow {
    days: Vec<NaiveDate>,
}

impl TimelineWindow {
    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn first(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn last(&self) -> NaiveDate {
        self.days[self.days.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// True when the window has no days. Windows from `build_window` never are.
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Column index of `day`, if the window shows it.
    pub fn index_of(&self, day: NaiveDate) -> Option<usize> {
        self.days.binary_search(&day).ok()
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.index_of(day).is_some()
    }

    /// Day-of-month numbers used as column headers.
    pub fn header_labels(&self) -> Vec<u32> {
        self.days.iter().map(Datelike::day).collect()
    }
}

/// Builds the visible window for `reference` in the given `mode`.
pub fn build_window(reference: NaiveDate, mode: WindowMode) -> TimelineWindow {
    let days = match mode {
        WindowMode::Week => reference.iter_days().take(WEEK_LENGTH).collect(),
        WindowMode::Month => {
            let start = month_start(reference);
            let end_exclusive = next_month_start(start).and_then(next_month_start);
            start
                .iter_days()
                .take_while(|day| end_exclusive.map_or(true, |end| *day < end))
                .collect()
        }
    };
    TimelineWindow { days }
}

fn month_start(day: NaiveDate) -> NaiveDate {
    day.checked_sub_days(Days::new(u64::from(day.day0())))
        .unwrap_or(day)
}

fn next_month_start(day: NaiveDate) -> Option<NaiveDate> {
    month_start(day).checked_add_months(Months::new(1))
}
