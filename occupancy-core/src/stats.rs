//! Aggregate occupancy figures for the municipality and its organisations.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Municipality, Organisation, PatientStay, StayInterval};

/// Share of beds in use. Zero beds yield `NotAvailable` instead of a division.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "percent", rename_all = "snake_case")]
pub enum OccupancyRate {
    NotAvailable,
    Percent(f64),
}

impl OccupancyRate {
    pub fn from_counts(occupied: usize, total: usize) -> Self {
        if total == 0 {
            OccupancyRate::NotAvailable
        } else {
            OccupancyRate::Percent(occupied as f64 / total as f64 * 100.0)
        }
    }

    pub fn percent(&self) -> Option<f64> {
        match *self {
            OccupancyRate::Percent(value) => Some(value),
            OccupancyRate::NotAvailable => None,
        }
    }

    /// The complementary vacancy rate, floored at zero.
    pub fn vacancy(&self) -> OccupancyRate {
        match *self {
            OccupancyRate::Percent(value) => OccupancyRate::Percent((100.0 - value).max(0.0)),
            OccupancyRate::NotAvailable => OccupancyRate::NotAvailable,
        }
    }

    /// Width of a progress bar, capped at 100.
    pub fn bar_percent(&self) -> f64 {
        self.percent().map_or(0.0, |value| value.min(100.0))
    }
}

impl fmt::Display for OccupancyRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OccupancyRate::Percent(value) => write!(f, "{value:.1}%"),
            OccupancyRate::NotAvailable => f.write_str("N/A"),
        }
    }
}

/// Municipality-wide counts for the administrative overview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OccupancySummary {
    pub organisations: usize,
    pub departments: usize,
    pub rooms: usize,
    pub beds: usize,
    /// Beds whose current stay has not ended before the reference day.
    pub occupied_beds: usize,
    pub occupancy: OccupancyRate,
    pub vacancy: OccupancyRate,
    /// Number of entries on the waiting list.
    pub waiting_list: usize,
}

/// Per-organisation counts, same rules as [`OccupancySummary`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrganisationStats {
    pub id: String,
    pub name: String,
    pub departments: usize,
    pub rooms: usize,
    pub beds: usize,
    pub occupied_beds: usize,
    pub occupancy: OccupancyRate,
    pub vacancy: OccupancyRate,
}

/// The stay holding each bed on `today`: the active or planned stay with the
/// latest start on or before that day. The stay may already have ended.
pub fn current_occupants(stays: &[PatientStay], today: NaiveDate) -> HashMap<&str, StayInterval> {
    let mut occupants: HashMap<&str, StayInterval> = HashMap::new();
    for stay in stays {
        let (Some(bed_id), Some(status), Some(interval)) =
            (stay.bed_id.as_deref(), stay.status, stay.interval())
        else {
            continue;
        };
        if !status.holds_bed() || interval.start() > today {
            continue;
        }
        occupants
            .entry(bed_id)
            .and_modify(|current| {
                if interval.start() > current.start() {
                    *current = interval;
                }
            })
            .or_insert(interval);
    }
    occupants
}

/// Beds whose current occupant is still there on `today`.
pub fn occupied_beds(stays: &[PatientStay], today: NaiveDate) -> HashSet<&str> {
    current_occupants(stays, today)
        .into_iter()
        .filter(|(_, interval)| interval.end() >= today)
        .map(|(bed_id, _)| bed_id)
        .collect()
}

#[derive(Default)]
struct Counts {
    departments: usize,
    rooms: usize,
    beds: usize,
    occupied: usize,
}

fn count(organisation: &Organisation, occupied: &HashSet<&str>) -> Counts {
    let mut counts = Counts {
        departments: organisation.departments.len(),
        ..Counts::default()
    };
    for department in &organisation.departments {
        counts.rooms += department.rooms.len();
    }
    for location in organisation.beds() {
        counts.beds += 1;
        if occupied.contains(location.bed.id.as_str()) {
            counts.occupied += 1;
        }
    }
    counts
}

pub fn municipality_stats(
    municipality: &Municipality,
    stays: &[PatientStay],
    waiting_list: usize,
    today: NaiveDate,
) -> OccupancySummary {
    let occupied = occupied_beds(stays, today);
    let mut totals = Counts::default();
    for organisation in &municipality.organisations {
        let counts = count(organisation, &occupied);
        totals.departments += counts.departments;
        totals.rooms += counts.rooms;
        totals.beds += counts.beds;
        totals.occupied += counts.occupied;
    }

    let occupancy = OccupancyRate::from_counts(totals.occupied, totals.beds);
    OccupancySummary {
        organisations: municipality.organisations.len(),
        departments: totals.departments,
        rooms: totals.rooms,
        beds: totals.beds,
        occupied_beds: totals.occupied,
        occupancy,
        vacancy: occupancy.vacancy(),
        waiting_list,
    }
}

pub fn organisation_stats(
    municipality: &Municipality,
    stays: &[PatientStay],
    today: NaiveDate,
) -> Vec<OrganisationStats> {
    let occupied = occupied_beds(stays, today);
    municipality
        .organisations
        .iter()
        .map(|organisation| {
            let counts = count(organisation, &occupied);
            let occupancy = OccupancyRate::from_counts(counts.occupied, counts.beds);
            OrganisationStats {
                id: organisation.id.clone(),
                name: organisation.name.clone(),
                departments: counts.departments,
                rooms: counts.rooms,
                beds: counts.beds,
                occupied_beds: counts.occupied,
                occupancy,
                vacancy: occupancy.vacancy(),
            }
        })
        .collect()
}
