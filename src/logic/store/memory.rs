//! In-process store, used by tests and one-shot commands

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{not_found, validate_name, ModelStore};
use crate::logic::error::FaultResult;

#[derive(Debug, Default)]
pub struct MemoryModelStore {
    blobs: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite a blob without validation, for corruption tests
    pub fn put_raw(&self, name: &str, blob: Vec<u8>) {
        self.blobs.write().insert(name.to_string(), blob);
    }
}

impl ModelStore for MemoryModelStore {
    fn save(&self, name: &str, blob: &[u8]) -> FaultResult<()> {
        validate_name(name)?;
        self.blobs.write().insert(name.to_string(), blob.to_vec());
        Ok(())
    }

    fn load(&self, name: &str) -> FaultResult<Vec<u8>> {
        validate_name(name)?;
        self.blobs.read().get(name).cloned().ok_or_else(|| not_found(name))
    }

    fn exists(&self, name: &str) -> FaultResult<bool> {
        validate_name(name)?;
        Ok(self.blobs.read().contains_key(name))
    }

    fn delete(&self, name: &str) -> FaultResult<bool> {
        validate_name(name)?;
        Ok(self.blobs.write().remove(name).is_some())
    }

    fn list(&self) -> FaultResult<Vec<String>> {
        Ok(self.blobs.read().keys().cloned().collect())
    }
}
