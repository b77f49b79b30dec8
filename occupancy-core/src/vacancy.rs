//! Beds that are free now or about to become free.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::stats::current_occupants;
use crate::{Municipality, OccupancyConfig, PatientStay};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "date", rename_all = "snake_case")]
pub enum Availability {
    Now,
    /// Free from the given day, the day after the current stay ends.
    Soon(NaiveDate),
}

impl Availability {
    pub fn label(&self) -> String {
        match self {
            Availability::Now => "Available Now".to_string(),
            Availability::Soon(date) => format!("Available from {date}"),
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        match self {
            Availability::Now => None,
            Availability::Soon(date) => Some(*date),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VacancySuggestion {
    pub id: String,
    pub organisation_name: String,
    pub department_name: String,
    pub room_label: String,
    pub bed_label: String,
    pub availability: Availability,
}

impl VacancySuggestion {
    fn compare(&self, other: &Self) -> Ordering {
        self.availability
            .date()
            .cmp(&other.availability.date())
            .then_with(|| compare_labels(&self.organisation_name, &other.organisation_name))
            .then_with(|| compare_labels(&self.department_name, &other.department_name))
            .then_with(|| compare_labels(&self.room_label, &other.room_label))
            .then_with(|| compare_labels(&self.bed_label, &other.bed_label))
    }
}

/// Case-insensitive label order, falling back to code points for labels that
/// differ only in case. No locale collation; `Æ`, `Ø` and `Å` sort after `Z`.
fn compare_labels(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Lists beds available on `today` followed by beds freed within the
/// configured look-ahead, each group sorted and capped.
#[instrument(level = "debug", skip_all, fields(%today))]
pub fn rank_vacancies(
    municipality: &Municipality,
    stays: &[PatientStay],
    today: NaiveDate,
    config: &OccupancyConfig,
) -> Vec<VacancySuggestion> {
    let occupants = current_occupants(stays, today);
    let mut now = Vec::new();
    let mut soon = Vec::new();

    for location in municipality.beds() {
        let key = format!(
            "{}-{}-{}-{}",
            location.organisation.id, location.department.id, location.room.id, location.bed.id
        );
        let suggestion = |suffix: &str, availability| VacancySuggestion {
            id: format!("{key}-{suffix}"),
            organisation_name: location.organisation.name.clone(),
            department_name: location.department.name.clone(),
            room_label: location.room.label.clone(),
            bed_label: location.bed.label.clone(),
            availability,
        };

        match occupants.get(location.bed.id.as_str()) {
            None => now.push(suggestion("now", Availability::Now)),
            Some(interval) if interval.end() < today => {
                now.push(suggestion("ended", Availability::Now))
            }
            Some(interval) => {
                let days_left = (interval.end() - today).num_days();
                if days_left <= i64::from(config.vacancy_lookahead_days) {
                    let free_from = interval.end().succ_opt().unwrap_or(interval.end());
                    soon.push(suggestion("soon", Availability::Soon(free_from)));
                }
            }
        }
    }

    now.sort_by(VacancySuggestion::compare);
    soon.sort_by(VacancySuggestion::compare);
    now.truncate(config.vacancy_now_cap);
    soon.truncate(config.vacancy_soon_cap);

    now.extend(soon);
    now
}
