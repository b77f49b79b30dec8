//! Framework-neutral WASM <-> JavaScript bridge for the occupancy timeline.

use std::fmt::Display;

use chrono::NaiveDate;
use occupancy_core::{
    average_waiting_days, build_window as build_timeline_window, municipality_rows,
    municipality_stats, organisation_stats, parse_day, process_waiting_list,
    rank_suggestions as rank_room_suggestions, rank_vacancies as rank_bed_vacancies,
    Municipality, OccupancyConfig, OccupancySummary, OrganisationStats, PatientStay,
    RelatedCapabilities, Room, WaitingListEntry, WindowMode,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod local_storage;

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageBackend;

#[derive(Debug, Default, Deserialize)]
struct JsOccupancyConfig {
    #[serde(default)]
    suggestion_limit: Option<usize>,
    #[serde(default)]
    vacancy_lookahead_days: Option<u32>,
    #[serde(default)]
    vacancy_now_cap: Option<usize>,
    #[serde(default)]
    vacancy_soon_cap: Option<usize>,
    #[serde(default)]
    waiting_list_limit: Option<usize>,
    #[serde(default)]
    related_capabilities: Option<RelatedCapabilities>,
}

impl From<JsOccupancyConfig> for OccupancyConfig {
    fn from(cfg: JsOccupancyConfig) -> Self {
        let mut base = OccupancyConfig::default();
        if let Some(limit) = cfg.suggestion_limit {
            base.suggestion_limit = limit;
        }
        if let Some(days) = cfg.vacancy_lookahead_days {
            base.vacancy_lookahead_days = days;
        }
        if let Some(cap) = cfg.vacancy_now_cap {
            base.vacancy_now_cap = cap;
        }
        if let Some(cap) = cfg.vacancy_soon_cap {
            base.vacancy_soon_cap = cap;
        }
        if let Some(limit) = cfg.waiting_list_limit {
            base.waiting_list_limit = limit;
        }
        if let Some(table) = cfg.related_capabilities {
            base.related_capabilities = table;
        }
        base
    }
}

#[derive(Serialize)]
struct StatsReport {
    summary: OccupancySummary,
    organisations: Vec<OrganisationStats>,
    average_waiting_days: Option<f64>,
}

/// Day sequence for a week (7 days from `reference`) or month view.
#[wasm_bindgen]
pub fn build_window(reference: &str, mode: Option<String>) -> Result<JsValue, JsValue> {
    init();
    let window = build_timeline_window(read_day(reference)?, read_mode(mode)?);
    write(&window)
}

/// Gantt rows for every department, with each stay placed on the window.
#[wasm_bindgen]
pub fn place_stays(
    municipality: JsValue,
    stays: JsValue,
    reference: &str,
    mode: Option<String>,
) -> Result<JsValue, JsValue> {
    init();
    let municipality: Municipality = read(municipality, "hierarchy")?;
    let stays: Vec<PatientStay> = read(stays, "stays")?;
    let window = build_timeline_window(read_day(reference)?, read_mode(mode)?);
    write(&municipality_rows(&municipality, &stays, &window))
}

#[wasm_bindgen]
pub fn rank_suggestions(
    entries: JsValue,
    rooms: JsValue,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    init();
    let entries: Vec<WaitingListEntry> = read(entries, "waiting list")?;
    let rooms: Vec<Room> = read(rooms, "rooms")?;
    let cfg = read_config(config)?;
    write(&rank_room_suggestions(
        &entries,
        &rooms,
        cfg.suggestion_limit,
        &cfg.related_capabilities,
    ))
}

#[wasm_bindgen]
pub fn rank_vacancies(
    municipality: JsValue,
    stays: JsValue,
    today: &str,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    init();
    let municipality: Municipality = read(municipality, "hierarchy")?;
    let stays: Vec<PatientStay> = read(stays, "stays")?;
    let cfg = read_config(config)?;
    write(&rank_bed_vacancies(&municipality, &stays, read_day(today)?, &cfg))
}

#[wasm_bindgen]
pub fn occupancy_stats(
    municipality: JsValue,
    stays: JsValue,
    waiting_list: JsValue,
    today: &str,
) -> Result<JsValue, JsValue> {
    init();
    let municipality: Municipality = read(municipality, "hierarchy")?;
    let stays: Vec<PatientStay> = read(stays, "stays")?;
    let waiting_list: Vec<WaitingListEntry> = read(waiting_list, "waiting list")?;
    let today = read_day(today)?;

    let rows = process_waiting_list(&waiting_list, today, waiting_list.len());
    write(&StatsReport {
        summary: municipality_stats(&municipality, &stays, waiting_list.len(), today),
        organisations: organisation_stats(&municipality, &stays, today),
        average_waiting_days: average_waiting_days(&rows),
    })
}

/// Waiting list ordered by priority and waiting time, capped by the config.
#[wasm_bindgen]
pub fn waiting_list(
    entries: JsValue,
    today: &str,
    config: Option<JsValue>,
) -> Result<JsValue, JsValue> {
    init();
    let entries: Vec<WaitingListEntry> = read(entries, "waiting list")?;
    let cfg = read_config(config)?;
    write(&process_waiting_list(&entries, read_day(today)?, cfg.waiting_list_limit))
}

#[cfg(target_arch = "wasm32")]
mod hierarchy {
    use occupancy_core::Organisation;
    use occupancy_store::{HierarchyStore, NewRoom};
    use wasm_bindgen::prelude::*;

    use super::{init, js_error, read, write, LocalStorageBackend};

    fn open(key: Option<String>) -> Result<HierarchyStore<LocalStorageBackend>, JsValue> {
        init();
        let backend = LocalStorageBackend::from_window().map_err(js_error)?;
        Ok(match key {
            Some(key) => HierarchyStore::with_key(backend, key),
            None => HierarchyStore::new(backend),
        })
    }

    /// Organisations from `localStorage`, seeded on first use.
    #[wasm_bindgen]
    pub fn load_hierarchy(key: Option<String>) -> Result<JsValue, JsValue> {
        let mut store = open(key)?;
        write(&store.load().map_err(js_error)?)
    }

    #[wasm_bindgen]
    pub fn save_hierarchy(organisations: JsValue, key: Option<String>) -> Result<(), JsValue> {
        let organisations: Vec<Organisation> = read(organisations, "organisations")?;
        open(key)?.save(&organisations).map_err(js_error)
    }

    #[wasm_bindgen]
    pub fn add_room(
        organisation_id: &str,
        department_id: &str,
        label: String,
        capabilities: String,
        beds: usize,
        key: Option<String>,
    ) -> Result<JsValue, JsValue> {
        let room = open(key)?
            .add_room(
                organisation_id,
                department_id,
                NewRoom {
                    label,
                    capabilities,
                    beds,
                },
            )
            .map_err(js_error)?;
        write(&room)
    }

    #[wasm_bindgen]
    pub fn delete_room(
        organisation_id: &str,
        department_id: &str,
        room_id: &str,
        key: Option<String>,
    ) -> Result<bool, JsValue> {
        open(key)?
            .delete_room(organisation_id, department_id, room_id)
            .map_err(js_error)
    }
}

fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

fn read<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    from_value(value).map_err(|err| JsValue::from_str(&format!("could not read {what}: {err}")))
}

fn write<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|err| JsValue::from_str(&format!("could not serialize result: {err}")))
}

fn read_config(config: Option<JsValue>) -> Result<OccupancyConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsOccupancyConfig = read(js_cfg, "config")?;
            Ok(OccupancyConfig::from(cfg))
        }
        _ => Ok(OccupancyConfig::default()),
    }
}

fn read_day(value: &str) -> Result<NaiveDate, JsValue> {
    parse_day(value).map_err(js_error)
}

fn read_mode(mode: Option<String>) -> Result<WindowMode, JsValue> {
    match mode.as_deref() {
        Some(mode) => mode.parse().map_err(js_error),
        None => Ok(WindowMode::default()),
    }
}

fn js_error(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
