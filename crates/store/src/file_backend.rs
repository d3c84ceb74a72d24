//! File backend: one `<key>.json` file per key inside a root directory.
//!
//! Writes go to a sibling temp file and are renamed into place. Collection
//! updates hold an exclusive advisory lock on `.<key>.lock` for the whole
//! read-modify-write, so two processes appending to the same collection
//! serialize instead of dropping each other's records.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::backend::{validate_key, StorageBackend};
use crate::errors::StoreError;

pub struct FileBackend {
    root: PathBuf,
}

impl FileBackend {
    /// Open (and create if missing) a backend rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        if !root.exists() {
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the JSON file backing `key`.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }

    fn lock_file(&self, key: &str) -> Result<File, StoreError> {
        let path = self.root.join(format!(".{key}.lock"));
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        // exklusiver Lock, prozessübergreifend
        file.lock_exclusive()?;
        Ok(file)
    }

    fn read(&self, path: &Path) -> Result<Option<String>, StoreError> {
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> Result<(), StoreError> {
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        // rename ist atomar auf demselben Dateisystem
        fs::rename(&tmp, path)?;
        debug!("wrote {} bytes to {}", contents.len(), path.display());
        Ok(())
    }
}

impl StorageBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        self.read(&path)
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let lock = self.lock_file(key)?;
        let result = self.write_atomic(&path, value);
        lock.unlock()?;
        result
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<String, StoreError>,
    ) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let lock = self.lock_file(key)?;
        let result = self
            .read(&path)
            .and_then(|current| apply(current))
            .and_then(|next| self.write_atomic(&path, &next));
        lock.unlock()?;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested").join("store");
        let backend = FileBackend::open(&root).unwrap();
        assert!(backend.root().is_dir());
    }

    #[test]
    fn values_land_in_key_named_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.put_raw("buyerProfileDraft", "{}").unwrap();

        let path = dir.path().join("buyerProfileDraft.json");
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!dir.path().join("buyerProfileDraft.json.tmp").exists());
        assert_eq!(
            backend.get_raw("buyerProfileDraft").unwrap().as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get_raw("properties").unwrap(), None);
    }

    #[test]
    fn failed_update_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        backend.put_raw("buyers", "[]").unwrap();

        let err = backend
            .update("buyers", &mut |_| Err(StoreError::InvalidKey("boom".into())))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
        assert_eq!(backend.get_raw("buyers").unwrap().as_deref(), Some("[]"));
    }
}
