//! Maps a stay interval onto the columns of a timeline window.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{PatientStay, StayInterval, TimelineWindow};

/// Column span of a stay inside a window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Placement {
    NotVisible,
    /// Half-open `[start_index, end_index_exclusive)` range of window columns.
    Visible {
        start_index: usize,
        end_index_exclusive: usize,
    },
}

impl Placement {
    pub fn is_visible(&self) -> bool {
        matches!(self, Placement::Visible { .. })
    }

    pub fn span(&self) -> Option<Range<usize>> {
        match *self {
            Placement::Visible {
                start_index,
                end_index_exclusive,
            } => Some(start_index..end_index_exclusive),
            Placement::NotVisible => None,
        }
    }

    /// One-based CSS grid placement, e.g. `"4 / 8"`.
    pub fn grid_column(&self) -> Option<String> {
        self.span()
            .map(|span| format!("{} / {}", span.start + 1, span.end + 1))
    }
}

/// Clips `interval` to `window` and resolves the columns it covers.
pub fn place_interval(interval: &StayInterval, window: &TimelineWindow) -> Placement {
    let range_start = window.first();
    let range_end = window.last();

    if interval.end() < range_start || interval.start() > range_end {
        return Placement::NotVisible;
    }

    let effective_start = interval.start().max(range_start);
    let effective_end = interval.end().min(range_end);

    let start_index = match window.index_of(effective_start) {
        Some(index) => index,
        None if interval.start() < range_start && interval.end() >= range_start => 0,
        None => return Placement::NotVisible,
    };
    let end_index_exclusive = window
        .days()
        .partition_point(|day| *day <= effective_end);

    if start_index >= end_index_exclusive {
        return Placement::NotVisible;
    }

    Placement::Visible {
        start_index,
        end_index_exclusive,
    }
}

/// Places a stay, or returns `None` when it lacks dates or status.
pub fn place_stay(stay: &PatientStay, window: &TimelineWindow) -> Option<Placement> {
    let Some(interval) = stay.interval() else {
        debug!(stay = %stay.id, "skipping stay without a placeable interval");
        return None;
    };
    Some(place_interval(&interval, window))
}
