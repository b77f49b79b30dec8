use occupancy_core::{Bed, Municipality, Organisation, Room};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{seed_municipality, StorageBackend, StoreError};

/// Key the dashboard has always stored its setup data under.
pub const DEFAULT_STORAGE_KEY: &str = "aidnEhrSetupData";

pub const MAX_BEDS_PER_ROOM: usize = 4;

/// Form input for a new room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub label: String,
    /// Comma-separated capability tags.
    pub capabilities: String,
    pub beds: usize,
}

impl NewRoom {
    fn capability_list(&self) -> Vec<String> {
        self.capabilities
            .split(',')
            .map(str::trim)
            .filter(|capability| !capability.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Whole-snapshot store for the editable organisation list.
///
/// Every write replaces the stored snapshot and drops the cached copy, so the
/// next `load` reads back exactly what was written.
#[derive(Debug)]
pub struct HierarchyStore<B> {
    backend: B,
    key: String,
    cache: Option<Vec<Organisation>>,
}

impl<B: StorageBackend> HierarchyStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, DEFAULT_STORAGE_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
            cache: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Returns the stored organisations, seeding and persisting the static
    /// hierarchy on first use.
    #[instrument(level = "debug", skip(self), fields(key = %self.key))]
    pub fn load(&mut self) -> Result<&[Organisation], StoreError> {
        let snapshot = match self.cache.take() {
            Some(cached) => cached,
            None => self.read_or_seed()?,
        };
        Ok(self.cache.insert(snapshot).as_slice())
    }

    /// The stored organisations wrapped in the seed municipality's identity.
    pub fn load_municipality(&mut self) -> Result<Municipality, StoreError> {
        let seed = seed_municipality()?;
        Ok(Municipality {
            organisations: self.load()?.to_vec(),
            ..seed
        })
    }

    /// Replaces the stored snapshot.
    #[instrument(level = "debug", skip_all, fields(key = %self.key, organisations = snapshot.len()))]
    pub fn save(&mut self, snapshot: &[Organisation]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(snapshot)?;
        self.backend.set(&self.key, &raw)?;
        self.cache = None;
        Ok(())
    }

    pub fn rooms(&mut self, organisation_id: &str, department_id: &str) -> Result<Vec<Room>, StoreError> {
        let organisations = self.load()?;
        let organisation = organisations
            .iter()
            .find(|org| org.id == organisation_id)
            .ok_or_else(|| not_found("organisation", organisation_id))?;
        let department = organisation
            .departments
            .iter()
            .find(|dept| dept.id == department_id)
            .ok_or_else(|| not_found("department", department_id))?;
        Ok(department.rooms.clone())
    }

    /// Appends a room to a department. Bed count is clamped to `1..=4`.
    pub fn add_room(
        &mut self,
        organisation_id: &str,
        department_id: &str,
        new_room: NewRoom,
    ) -> Result<Room, StoreError> {
        let label = new_room.label.trim();
        if label.is_empty() {
            return Err(StoreError::InvalidRoom("room label is required".to_string()));
        }

        let token = Uuid::new_v4().simple().to_string();
        let bed_count = new_room.beds.clamp(1, MAX_BEDS_PER_ROOM);
        let room = Room {
            id: format!("room-{department_id}-{token}"),
            label: label.to_string(),
            capabilities: new_room.capability_list(),
            beds: (1..=bed_count)
                .map(|n| Bed {
                    id: format!("bed-{department_id}-new-{token}-{n}"),
                    label: format!("Seng {n}"),
                })
                .collect(),
        };

        let added = room.clone();
        self.edit_department(organisation_id, department_id, move |rooms| rooms.push(room))?;
        info!(room = %added.id, beds = added.beds.len(), "added room");
        Ok(added)
    }

    /// Removes a room. Returns whether a room with that id existed.
    pub fn delete_room(
        &mut self,
        organisation_id: &str,
        department_id: &str,
        room_id: &str,
    ) -> Result<bool, StoreError> {
        let mut removed = false;
        self.edit_department(organisation_id, department_id, |rooms| {
            let before = rooms.len();
            rooms.retain(|room| room.id != room_id);
            removed = rooms.len() != before;
        })?;
        debug!(room = room_id, removed, "deleted room");
        Ok(removed)
    }

    fn edit_department(
        &mut self,
        organisation_id: &str,
        department_id: &str,
        edit: impl FnOnce(&mut Vec<Room>),
    ) -> Result<(), StoreError> {
        let mut snapshot = self.load()?.to_vec();
        let organisation = snapshot
            .iter_mut()
            .find(|org| org.id == organisation_id)
            .ok_or_else(|| not_found("organisation", organisation_id))?;
        let department = organisation
            .departments
            .iter_mut()
            .find(|dept| dept.id == department_id)
            .ok_or_else(|| not_found("department", department_id))?;
        edit(&mut department.rooms);
        self.save(&snapshot)
    }

    fn read_or_seed(&mut self) -> Result<Vec<Organisation>, StoreError> {
        if let Some(raw) = self.backend.get(&self.key)? {
            return Ok(serde_json::from_str(&raw)?);
        }
        let organisations = seed_municipality()?.organisations;
        info!(key = %self.key, "no stored hierarchy; seeding from static data");
        let raw = serde_json::to_string(&organisations)?;
        self.backend.set(&self.key, &raw)?;
        Ok(organisations)
    }
}

fn not_found(kind: &'static str, id: &str) -> StoreError {
    StoreError::NotFound {
        kind,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    const ORG: &str = "org-voss-sjukheim";
    const DEPT: &str = "dep-vs-korttid-a";

    fn new_room(label: &str, capabilities: &str, beds: usize) -> NewRoom {
        NewRoom {
            label: label.into(),
            capabilities: capabilities.into(),
            beds,
        }
    }

    #[test]
    fn first_load_seeds_and_persists() {
        let mut store = HierarchyStore::new(MemoryBackend::new());
        assert_eq!(store.load().unwrap().len(), 2);
        let raw = store.backend().get(DEFAULT_STORAGE_KEY).unwrap().unwrap();
        let stored: Vec<Organisation> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, store.load().unwrap());
    }

    #[test]
    fn add_room_normalises_form_input() {
        let mut store = HierarchyStore::new(MemoryBackend::new());
        let room = store
            .add_room(ORG, DEPT, new_room("  Rom 120 ", " Hoist, ,Oxygen ,", 9))
            .unwrap();

        assert_eq!(room.label, "Rom 120");
        assert_eq!(room.capabilities, vec!["Hoist", "Oxygen"]);
        assert_eq!(room.beds.len(), MAX_BEDS_PER_ROOM);
        assert_eq!(room.beds[3].label, "Seng 4");
        assert!(room.id.starts_with("room-dep-vs-korttid-a-"));
        assert!(room.beds[0].id.starts_with("bed-dep-vs-korttid-a-new-"));

        let rooms = store.rooms(ORG, DEPT).unwrap();
        assert_eq!(rooms.last(), Some(&room));
    }

    #[test]
    fn zero_beds_become_one() {
        let mut store = HierarchyStore::new(MemoryBackend::new());
        let room = store.add_room(ORG, DEPT, new_room("Rom 121", "", 0)).unwrap();
        assert_eq!(room.beds.len(), 1);
        assert!(room.capabilities.is_empty());
    }

    #[test]
    fn blank_label_is_rejected_without_writing() {
        let mut store = HierarchyStore::new(MemoryBackend::new());
        let before = store.rooms(ORG, DEPT).unwrap();
        let err = store.add_room(ORG, DEPT, new_room("   ", "Hoist", 2)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRoom(_)));
        assert_eq!(store.rooms(ORG, DEPT).unwrap(), before);
    }

    #[test]
    fn unknown_department_is_not_found() {
        let mut store = HierarchyStore::new(MemoryBackend::new());
        let err = store
            .add_room(ORG, "dep-missing", new_room("Rom 1", "", 1))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::NotFound { kind: "department", .. }
        ));
    }

    #[test]
    fn delete_room_reports_whether_it_removed_anything() {
        let mut store = HierarchyStore::new(MemoryBackend::new());
        let room = store.add_room(ORG, DEPT, new_room("Rom 130", "", 1)).unwrap();
        assert!(store.delete_room(ORG, DEPT, &room.id).unwrap());
        assert!(!store.delete_room(ORG, DEPT, &room.id).unwrap());
        assert!(store.rooms(ORG, DEPT).unwrap().iter().all(|r| r.id != room.id));
    }

    #[test]
    fn corrupted_snapshot_is_a_json_error() {
        let mut backend = MemoryBackend::new();
        backend.set(DEFAULT_STORAGE_KEY, "{not json").unwrap();
        let mut store = HierarchyStore::new(backend);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }
}
