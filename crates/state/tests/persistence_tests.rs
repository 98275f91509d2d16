//! Round-trip tests for the durable state record

use bookbox_state::StateStore;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_save_load_roundtrip_exact() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("state.json");

    let mut store = StateStore::load(&path);
    store.set_book(2);
    store.set_position(137.5);
    store.save().expect("save");

    let reloaded = StateStore::load(&path);
    assert_eq!(reloaded.book_index(), 2);
    assert_eq!(reloaded.position(), 137.5);
}

#[test]
fn test_roundtrip_many_values() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("state.json");

    for (index, position) in [(0usize, 0.0f64), (1, 0.25), (7, 3600.0), (42, 99999.125)] {
        let mut store = StateStore::load(&path);
        store.set_book(index);
        store.set_position(position);
        store.save().expect("save");

        let reloaded = StateStore::load(&path);
        assert_eq!(reloaded.book_index(), index);
        assert_eq!(reloaded.position(), position);
    }
}

#[test]
fn test_record_has_exactly_two_fields() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("state.json");

    let mut store = StateStore::load(&path);
    store.set_book(1);
    store.set_position(12.0);
    store.save().expect("save");

    let contents = fs::read_to_string(&path).expect("read");
    let value: serde_json::Value = serde_json::from_str(&contents).expect("json");
    let object = value.as_object().expect("object");
    assert_eq!(object.len(), 2);
    assert_eq!(object["book_index"], 1);
    assert_eq!(object["position"], 12.0);
}

#[test]
fn test_overwrite_never_leaves_partial_file() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("state.json");

    let mut store = StateStore::load(&path);
    store.set_book(3);
    store.save().expect("save");

    // Overwrite repeatedly; the file must parse after every save.
    for i in 0..20 {
        store.set_position(i as f64 * 1.5);
        store.save().expect("save");
        let contents = fs::read_to_string(&path).expect("read");
        assert!(serde_json::from_str::<serde_json::Value>(&contents).is_ok());
    }
}
