//! Model Store - Named blob persistence
//!
//! Key = model name, value = opaque bytes produced by the classifier.
//! Backends: one file per model, a SQLite table, or memory (tests).

pub mod file;
pub mod sqlite;
pub mod memory;

#[cfg(test)]
mod tests;

pub use file::FileModelStore;
pub use sqlite::SqliteModelStore;
pub use memory::MemoryModelStore;

use crate::constants::MODEL_DB_FILE;
use crate::logic::config::{EngineConfig, StoreBackend};
use crate::logic::error::{FaultError, FaultResult};

pub const MAX_NAME_LEN: usize = 64;

pub trait ModelStore: Send + Sync {
    fn save(&self, name: &str, blob: &[u8]) -> FaultResult<()>;

    /// Missing name ⇒ `Persistence`
    fn load(&self, name: &str) -> FaultResult<Vec<u8>>;

    fn exists(&self, name: &str) -> FaultResult<bool>;

    /// `true` if something was removed
    fn delete(&self, name: &str) -> FaultResult<bool>;

    /// Sorted model names
    fn list(&self) -> FaultResult<Vec<String>>;
}

/// `[A-Za-z0-9_.-]{1,64}`, and not only dots
pub fn validate_name(name: &str) -> FaultResult<()> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));

    if name.is_empty() || name.len() > MAX_NAME_LEN || !valid_chars || name.chars().all(|c| c == '.') {
        return Err(FaultError::Persistence(format!("invalid model name '{}'", name)));
    }
    Ok(())
}

pub(crate) fn not_found(name: &str) -> FaultError {
    FaultError::Persistence(format!("model '{}' not found", name))
}

/// Open the store selected by the engine configuration
pub fn open_store(config: &EngineConfig) -> FaultResult<Box<dyn ModelStore>> {
    let store: Box<dyn ModelStore> = match config.store_backend {
        StoreBackend::File => Box::new(FileModelStore::new(&config.model_dir)?),
        StoreBackend::Sqlite => Box::new(SqliteModelStore::open(&config.model_dir.join(MODEL_DB_FILE))?),
    };
    log::info!(
        "Model store: {:?} at {}",
        config.store_backend,
        config.model_dir.display()
    );
    Ok(store)
}
