//! Row data for the Gantt chart: rooms, beds and their placed stay bars.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    bar_style, place_stay, stays_by_bed, BarStyle, Department, Municipality, PatientStay,
    StayStatus, TimelineWindow,
};

/// Capability tags longer than this render with the large tag style.
const LARGE_TAG_CHARS: usize = 10;

/// One stay drawn on a bed row.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GanttBar {
    pub stay_id: String,
    pub name: String,
    pub status: StayStatus,
    pub needs: Vec<String>,
    /// First window column covered.
    pub start_index: usize,
    /// Column after the last one covered.
    pub end_index_exclusive: usize,
    /// CSS `grid-column` value, one-based.
    pub grid_column: String,
    pub style: BarStyle,
    /// Multi-line hover text: name, status, dates and needs.
    pub tooltip: String,
}

/// A bed row and the bars placed on it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GanttBed {
    pub id: String,
    pub label: String,
    pub bars: Vec<GanttBar>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CapabilityTag {
    pub label: String,
    pub large: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GanttRoom {
    pub id: String,
    pub label: String,
    pub capabilities: Vec<CapabilityTag>,
    pub beds: Vec<GanttBed>,
}

/// A department's chart: column days, header labels and room rows.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GanttDepartment {
    pub id: String,
    pub name: String,
    pub days: Vec<NaiveDate>,
    /// Day-of-month header for each column.
    pub columns: Vec<u32>,
    pub rooms: Vec<GanttRoom>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GanttOrganisation {
    pub id: String,
    pub name: String,
    pub departments: Vec<GanttDepartment>,
}

/// Lays out every stay of `department` against `window`. Stays that are
/// unplaceable or outside the window produce no bar.
pub fn department_rows(
    department: &Department,
    stays: &[PatientStay],
    window: &TimelineWindow,
) -> GanttDepartment {
    let by_bed = stays_by_bed(stays);

    let rooms = department
        .rooms
        .iter()
        .map(|room| GanttRoom {
            id: room.id.clone(),
            label: room.label.clone(),
            capabilities: room
                .capabilities
                .iter()
                .map(|label| CapabilityTag {
                    label: label.clone(),
                    large: label.chars().count() > LARGE_TAG_CHARS,
                })
                .collect(),
            beds: room
                .beds
                .iter()
                .map(|bed| GanttBed {
                    id: bed.id.clone(),
                    label: bed.label.clone(),
                    bars: by_bed
                        .get(bed.id.as_str())
                        .map(|bed_stays| {
                            bed_stays
                                .iter()
                                .filter_map(|stay| bar_for(stay, window))
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect(),
        })
        .collect();

    GanttDepartment {
        id: department.id.clone(),
        name: department.name.clone(),
        days: window.days().to_vec(),
        columns: window.header_labels(),
        rooms,
    }
}

pub fn municipality_rows(
    municipality: &Municipality,
    stays: &[PatientStay],
    window: &TimelineWindow,
) -> Vec<GanttOrganisation> {
    municipality
        .organisations
        .iter()
        .map(|organisation| GanttOrganisation {
            id: organisation.id.clone(),
            name: organisation.name.clone(),
            departments: organisation
                .departments
                .iter()
                .map(|department| department_rows(department, stays, window))
                .collect(),
        })
        .collect()
}

fn bar_for(stay: &PatientStay, window: &TimelineWindow) -> Option<GanttBar> {
    let placement = place_stay(stay, window)?;
    let span = placement.span()?;
    let status = stay.status?;
    Some(GanttBar {
        stay_id: stay.id.clone(),
        name: stay.name.clone(),
        status,
        needs: stay.needs.clone(),
        start_index: span.start,
        end_index_exclusive: span.end,
        grid_column: placement.grid_column()?,
        style: bar_style(status),
        tooltip: tooltip(stay, status),
    })
}

fn tooltip(stay: &PatientStay, status: StayStatus) -> String {
    let format_day = |day: Option<NaiveDate>| day.map_or_else(|| "--".to_string(), |d| d.to_string());
    let mut text = format!(
        "{}\nStatus: {}\nFrom: {} To: {}",
        stay.name,
        status,
        format_day(stay.start),
        format_day(stay.end)
    );
    if !stay.needs.is_empty() {
        text.push_str(&format!("\nNeeds: {}", stay.needs.join(", ")));
    }
    text
}
