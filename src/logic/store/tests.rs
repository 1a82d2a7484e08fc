use super::*;
use crate::logic::config::{EngineConfig, StoreBackend};
use tempfile::tempdir;

/// Same contract for every backend
fn exercise(store: &dyn ModelStore) {
    assert!(store.list().unwrap().is_empty());
    assert!(!store.exists("fault-v1").unwrap());

    store.save("fault-v1", b"first").unwrap();
    store.save("alpha_2.0", b"second").unwrap();
    assert!(store.exists("fault-v1").unwrap());
    assert_eq!(store.load("fault-v1").unwrap(), b"first".to_vec());
    assert_eq!(store.list().unwrap(), vec!["alpha_2.0".to_string(), "fault-v1".to_string()]);

    // overwrite
    store.save("fault-v1", b"third").unwrap();
    assert_eq!(store.load("fault-v1").unwrap(), b"third".to_vec());

    assert!(store.delete("fault-v1").unwrap());
    assert!(!store.delete("fault-v1").unwrap());
    assert!(matches!(store.load("fault-v1"), Err(FaultError::Persistence(_))));
}

#[test]
fn test_memory_store() {
    exercise(&MemoryModelStore::new());
}

#[test]
fn test_file_store() {
    let dir = tempdir().unwrap();
    let store = FileModelStore::new(&dir.path().join("models")).unwrap();
    exercise(&store);
}

#[test]
fn test_sqlite_store() {
    exercise(&SqliteModelStore::open_in_memory().unwrap());
}

#[test]
fn test_sqlite_store_persists_across_connections() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("models.db");

    SqliteModelStore::open(&path).unwrap().save("kept", b"blob").unwrap();
    let reopened = SqliteModelStore::open(&path).unwrap();
    assert_eq!(reopened.load("kept").unwrap(), b"blob".to_vec());
}

#[test]
fn test_invalid_names_rejected() {
    let store = MemoryModelStore::new();
    let too_long = "x".repeat(MAX_NAME_LEN + 1);
    for name in ["", "../escape", "a/b", "with space", "..", too_long.as_str()] {
        assert!(
            matches!(store.save(name, b"x"), Err(FaultError::Persistence(_))),
            "name {:?} should be rejected",
            name
        );
    }
    assert!(validate_name(&"x".repeat(MAX_NAME_LEN)).is_ok());
}

#[test]
fn test_open_store_from_config() {
    let dir = tempdir().unwrap();
    for backend in [StoreBackend::File, StoreBackend::Sqlite] {
        let config = EngineConfig {
            model_dir: dir.path().join(format!("{:?}", backend)),
            store_backend: backend,
            ..EngineConfig::default()
        };
        let store = open_store(&config).unwrap();
        store.save("m", b"1").unwrap();
        assert_eq!(store.list().unwrap(), vec!["m".to_string()]);
    }
}
