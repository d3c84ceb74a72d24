use std::collections::HashMap;
use std::sync::RwLock;

use crate::backend::{validate_key, StorageBackend};
use crate::errors::StoreError;

/// InMemoryBackend: process-local key/value map.
///
/// Used for tests and dry runs. `update` holds the write lock for the whole
/// read-modify-write so concurrent appends inside one process never lose a
/// record.
#[derive(Default)]
pub struct InMemoryBackend {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value (e.g. a corrupt collection) before handing the backend out.
    pub fn with_entry(self, key: impl Into<String>, raw: impl Into<String>) -> Self {
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key.into(), raw.into());
        }
        self
    }

    /// Keys currently holding a value, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = match self.entries.read() {
            Ok(entries) => entries.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        keys.sort();
        keys
    }
}

impl StorageBackend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        let entries = self
            .entries
            .read()
            .map_err(|_| StoreError::Poisoned("memory entries"))?;
        Ok(entries.get(key).cloned())
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Poisoned("memory entries"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<String, StoreError>,
    ) -> Result<(), StoreError> {
        validate_key(key)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StoreError::Poisoned("memory entries"))?;
        let next = apply(entries.get(key).cloned())?;
        entries.insert(key.to_string(), next);
        Ok(())
    }
}
