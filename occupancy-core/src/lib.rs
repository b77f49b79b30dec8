//! Core model and pure computations for the bed occupancy timeline.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod gantt;
pub mod matching;
pub mod placement;
pub mod stats;
pub mod style;
pub mod vacancy;
pub mod waiting;
pub mod window;

pub use gantt::{department_rows, municipality_rows, GanttDepartment, GanttOrganisation};
pub use matching::{
    rank_suggestions, rank_suggestions_where, score_candidate, CapabilityLink, MatchScore,
    RelatedCapabilities, Suggestion,
};
pub use placement::{place_interval, place_stay, Placement};
pub use stats::{
    municipality_stats, organisation_stats, OccupancyRate, OccupancySummary, OrganisationStats,
};
pub use style::{bar_style, BarStyle};
pub use vacancy::{rank_vacancies, Availability, VacancySuggestion};
pub use waiting::{average_waiting_days, process_waiting_list, WaitingListRow};
pub use window::{build_window, TimelineWindow, WindowMode};

/// Tunable limits and tables shared by the ranking operations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OccupancyConfig {
    /// Maximum number of match suggestions returned.
    pub suggestion_limit: usize,
    /// Days ahead (inclusive) a stay may end and still count as "available soon".
    pub vacancy_lookahead_days: u32,
    /// Number of "available now" beds kept in the vacancy list.
    pub vacancy_now_cap: usize,
    /// Number of "available soon" beds kept in the vacancy list.
    pub vacancy_soon_cap: usize,
    /// Number of rows kept in the processed waiting list.
    pub waiting_list_limit: usize,
    /// Needs that earn partial credit from a related room capability.
    pub related_capabilities: RelatedCapabilities,
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            suggestion_limit: 5,
            vacancy_lookahead_days: 2,
            vacancy_now_cap: 3,
            vacancy_soon_cap: 9,
            waiting_list_limit: 20,
            related_capabilities: RelatedCapabilities::default(),
        }
    }
}

/// Urgency of a waiting-list entry. Ordering puts `High` first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Score bonus added to every candidate room for this priority.
    pub fn bonus(self) -> i32 {
        match self {
            Priority::High => 3,
            Priority::Medium => 1,
            Priority::Low => 0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lifecycle state of a stay, driving the bar style on the timeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum StayStatus {
    Active,
    Planned,
    Paused,
    Reserved,
    /// Any status string the dashboard does not know about.
    #[serde(other)]
    Unknown,
}

impl StayStatus {
    /// Active and planned stays hold the bed for occupancy purposes.
    pub fn holds_bed(self) -> bool {
        matches!(self, StayStatus::Active | StayStatus::Planned)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StayStatus::Active => "active",
            StayStatus::Planned => "planned",
            StayStatus::Paused => "paused",
            StayStatus::Reserved => "reserved",
            StayStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for StayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed date range a patient occupies a bed. `start <= end` always holds.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
pub struct StayInterval {
    start: NaiveDate,
    end: NaiveDate,
}

impl StayInterval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, OccupancyError> {
        if start > end {
            return Err(OccupancyError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// True when `day` lies inside the interval, both ends inclusive.
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}

/// A patient assigned (or planned) to a bed over a date range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientStay {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub needs: Vec<String>,
    #[serde(default, alias = "currentBedId")]
    pub bed_id: Option<String>,
    #[serde(default, alias = "stayStartDate")]
    pub start: Option<NaiveDate>,
    #[serde(default, alias = "stayEndDate")]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<StayStatus>,
}

impl PatientStay {
    /// The stay's interval, or `None` when start, end or status is missing
    /// or the dates are reversed.
    pub fn interval(&self) -> Option<StayInterval> {
        self.status?;
        StayInterval::new(self.start?, self.end?).ok()
    }
}

/// A single bed; stays refer to it by `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bed {
    pub id: String,
    pub label: String,
}

/// A room with its equipment tags and beds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Room {
    pub id: String,
    pub label: String,
    /// Tags matched against waiting-list needs, e.g. `"Hoist"`.
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub beds: Vec<Bed>,
}

/// A ward inside an organisation; one Gantt chart per department.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rooms: Vec<Room>,
}

/// A care home or institution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organisation {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub departments: Vec<Department>,
}

/// Root of the organisation hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Municipality {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub organisations: Vec<Organisation>,
}

impl Municipality {
    /// Every bed together with the rooms and units it belongs to, in hierarchy order.
    pub fn beds(&self) -> impl Iterator<Item = BedLocation<'_>> {
        self.organisations.iter().flat_map(Organisation::beds)
    }

    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.organisations
            .iter()
            .flat_map(|org| org.departments.iter())
            .flat_map(|dept| dept.rooms.iter())
    }

    pub fn find_department(&self, department_id: &str) -> Option<(&Organisation, &Department)> {
        self.organisations.iter().find_map(|org| {
            org.departments
                .iter()
                .find(|dept| dept.id == department_id)
                .map(|dept| (org, dept))
        })
    }
}

impl Organisation {
    pub fn beds(&self) -> impl Iterator<Item = BedLocation<'_>> {
        self.departments.iter().flat_map(move |department| {
            department.rooms.iter().flat_map(move |room| {
                room.beds.iter().map(move |bed| BedLocation {
                    organisation: self,
                    department,
                    room,
                    bed,
                })
            })
        })
    }
}

/// A bed and its place in the hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct BedLocation<'a> {
    pub organisation: &'a Organisation,
    pub department: &'a Department,
    pub room: &'a Room,
    pub bed: &'a Bed,
}

/// A person waiting for a bed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WaitingListEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub age: Option<u32>,
    pub priority: Priority,
    #[serde(alias = "appliedDate")]
    pub applied_date: NaiveDate,
    #[serde(default)]
    pub needs: Vec<String>,
}

/// Groups stays by the bed they are assigned to, keeping input order per bed.
pub fn stays_by_bed(stays: &[PatientStay]) -> BTreeMap<&str, Vec<&PatientStay>> {
    let mut grouped: BTreeMap<&str, Vec<&PatientStay>> = BTreeMap::new();
    for stay in stays {
        if let Some(bed_id) = stay.bed_id.as_deref() {
            grouped.entry(bed_id).or_default().push(stay);
        }
    }
    grouped
}

/// Parses an ISO `YYYY-MM-DD` date.
pub fn parse_day(value: &str) -> Result<NaiveDate, OccupancyError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|err| OccupancyError::Parse(format!("invalid date {value:?}: {err}")))
}

/// Errors raised while building model values.
#[derive(Debug, thiserror::Error)]
pub enum OccupancyError {
    #[error("stay interval ends before it starts ({start} > {end})")]
    InvalidInterval { start: NaiveDate, end: NaiveDate },
    #[error("unknown timeline mode: {0}")]
    UnknownMode(String),
    #[error("could not parse input: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn interval_rejects_reversed_dates() {
        let err = StayInterval::new(day(2025, 5, 20), day(2025, 5, 19)).unwrap_err();
        assert!(matches!(err, OccupancyError::InvalidInterval { .. }));
        assert!(StayInterval::new(day(2025, 5, 20), day(2025, 5, 20)).is_ok());
    }

    #[test]
    fn stay_without_status_is_not_placeable() {
        let stay = PatientStay {
            id: "p1".into(),
            name: "Nora Berg".into(),
            needs: Vec::new(),
            bed_id: Some("bed-1".into()),
            start: Some(day(2025, 5, 1)),
            end: Some(day(2025, 5, 9)),
            status: None,
        };
        assert_eq!(stay.interval(), None);

        let with_status = PatientStay {
            status: Some(StayStatus::Active),
            ..stay
        };
        assert_eq!(
            with_status.interval(),
            Some(StayInterval::new(day(2025, 5, 1), day(2025, 5, 9)).unwrap())
        );
    }

    #[test]
    fn unknown_status_deserializes_to_fallback() {
        let status: StayStatus = serde_json::from_str("\"awaiting_placement\"").unwrap();
        assert_eq!(status, StayStatus::Unknown);
        let status: StayStatus = serde_json::from_str("\"reserved\"").unwrap();
        assert_eq!(status, StayStatus::Reserved);
    }

    #[test]
    fn stay_accepts_dashboard_field_names() {
        let stay: PatientStay = serde_json::from_str(
            r#"{"id":"p1","name":"Liam Hansen","needs":["Wound dressing"],
                "currentBedId":"bed-vs-ka-101-1","stayStartDate":"2025-05-15",
                "stayEndDate":"2025-05-24","status":"active"}"#,
        )
        .unwrap();
        assert_eq!(stay.bed_id.as_deref(), Some("bed-vs-ka-101-1"));
        assert_eq!(stay.interval().map(|i| i.end()), Some(day(2025, 5, 24)));
    }

    #[test]
    fn priority_orders_high_first() {
        let mut priorities = vec![Priority::Low, Priority::High, Priority::Medium];
        priorities.sort();
        assert_eq!(priorities, vec![Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn parse_day_reports_bad_input() {
        assert_eq!(parse_day(" 2025-06-02 ").unwrap(), day(2025, 6, 2));
        assert!(matches!(parse_day("02.06.2025"), Err(OccupancyError::Parse(_))));
    }
}
