//! One file per model under a directory

use std::fs;
use std::path::{Path, PathBuf};

use super::{not_found, validate_name, ModelStore};
use crate::logic::error::FaultResult;

const EXTENSION: &str = "model";

#[derive(Debug, Clone)]
pub struct FileModelStore {
    dir: PathBuf,
}

impl FileModelStore {
    /// Creates the directory if needed
    pub fn new(dir: &Path) -> FaultResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> FaultResult<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{}.{}", name, EXTENSION)))
    }
}

impl ModelStore for FileModelStore {
    fn save(&self, name: &str, blob: &[u8]) -> FaultResult<()> {
        let path = self.path_for(name)?;
        // readers only ever see a complete blob
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        log::debug!("Saved model '{}' ({} bytes) to {}", name, blob.len(), path.display());
        Ok(())
    }

    fn load(&self, name: &str) -> FaultResult<Vec<u8>> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(not_found(name));
        }
        Ok(fs::read(&path)?)
    }

    fn exists(&self, name: &str) -> FaultResult<bool> {
        Ok(self.path_for(name)?.exists())
    }

    fn delete(&self, name: &str) -> FaultResult<bool> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        Ok(true)
    }

    fn list(&self) -> FaultResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
