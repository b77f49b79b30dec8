use std::fs;
use std::path::PathBuf;

use occupancy_store::{
    FileBackend, HierarchyStore, MemoryBackend, NewRoom, StorageBackend, DEFAULT_STORAGE_KEY,
};
use uuid::Uuid;

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("occupancy-store-{}", Uuid::new_v4().simple()))
}

#[test]
fn saved_snapshot_loads_back_unchanged() {
    let mut store = HierarchyStore::new(MemoryBackend::new());
    let mut organisations = store.load().unwrap().to_vec();
    organisations[1].name = "Heimatunet".to_string();
    organisations[0].departments.pop();

    store.save(&organisations).unwrap();
    assert_eq!(store.load().unwrap(), organisations.as_slice());
}

#[test]
fn file_backend_survives_a_new_store() {
    let dir = scratch_dir();

    let added = {
        let mut store = HierarchyStore::new(FileBackend::new(&dir));
        store
            .add_room(
                "org-heimatunet",
                "dep-ht-rehab",
                NewRoom {
                    label: "Rom 306".into(),
                    capabilities: "Rehab Equipment, Wi-Fi".into(),
                    beds: 2,
                },
            )
            .unwrap()
    };
    assert!(dir.join(format!("{DEFAULT_STORAGE_KEY}.json")).exists());

    let mut reopened = HierarchyStore::new(FileBackend::new(&dir));
    let rooms = reopened.rooms("org-heimatunet", "dep-ht-rehab").unwrap();
    assert_eq!(rooms.len(), 6);
    assert_eq!(rooms.last(), Some(&added));

    let municipality = reopened.load_municipality().unwrap();
    assert_eq!(municipality.name, "Voss Kommune");
    assert_eq!(municipality.beds().count(), 23);

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn custom_key_leaves_default_key_untouched() {
    let mut store = HierarchyStore::with_key(MemoryBackend::new(), "scratch");
    store.load().unwrap();

    let backend = store.into_backend();
    assert!(backend.get("scratch").unwrap().is_some());
    assert!(backend.get(DEFAULT_STORAGE_KEY).unwrap().is_none());
}
