use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::backend::StorageBackend;
use crate::errors::StoreError;
use crate::file_backend::FileBackend;
use crate::in_memory::InMemoryBackend;

/// A JSON object as stored inside a collection or draft slot.
pub type JsonObject = serde_json::Map<String, Value>;

/// What `append_entity` stamped onto the record it appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendReceipt {
    /// Milliseconds since the Unix epoch at append time.
    pub id: i64,
    pub created_at: DateTime<Utc>,
    /// Length of the collection after the append.
    pub len: usize,
}

/// Local store adapter: append-only collections plus single-slot drafts.
///
/// Layout (one key each):
/// - collection keys (`buyers`, `properties`) hold a JSON array of records
/// - draft keys (`buyerProfileDraft`, `propertyDraft`) hold one JSON object
///
/// Write-only: no query or delete operations.
#[derive(Clone)]
pub struct LocalStore {
    backend: Arc<dyn StorageBackend>,
}

impl LocalStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Store backed by a fresh in-memory map.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()))
    }

    /// Store backed by JSON files under `dir`.
    pub fn open_dir(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Ok(Self::new(Arc::new(FileBackend::open(dir)?)))
    }

    pub fn backend(&self) -> &Arc<dyn StorageBackend> {
        &self.backend
    }

    /// Append `record` to the collection under `collection_key`.
    ///
    /// Stamps `id` (current time in ms) and `createdAt` (RFC 3339, ms
    /// precision, `Z` suffix) onto the record. Two appends inside the same
    /// millisecond get the same id.
    pub fn append_entity(
        &self,
        collection_key: &str,
        mut record: JsonObject,
    ) -> Result<AppendReceipt, StoreError> {
        let created_at = Utc::now();
        let id = created_at.timestamp_millis();
        record.insert("id".into(), Value::from(id));
        record.insert(
            "createdAt".into(),
            Value::String(created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        let mut len = 0;
        let mut pending = Some(Value::Object(record));
        self.backend.update(collection_key, &mut |current| {
            let mut items = parse_collection(collection_key, current.as_deref());
            if let Some(record) = pending.take() {
                items.push(record);
            }
            len = items.len();
            Ok(serde_json::to_string(&items)?)
        })?;

        info!(
            "appended record {} to '{}' ({} total, {} backend)",
            id,
            collection_key,
            len,
            self.backend.name()
        );
        Ok(AppendReceipt {
            id,
            created_at,
            len,
        })
    }

    /// Overwrite the draft slot under `draft_key`.
    pub fn save_draft(&self, draft_key: &str, draft: &JsonObject) -> Result<(), StoreError> {
        let raw = serde_json::to_string(draft)?;
        self.backend.put_raw(draft_key, &raw)?;
        info!("saved draft '{}' ({} fields)", draft_key, draft.len());
        Ok(())
    }
}

/// Lenient collection read: absent, blank, malformed or non-array values all
/// read as an empty collection. Malformed data is dropped on the next write,
/// so it is logged.
fn parse_collection(key: &str, raw: Option<&str>) -> Vec<Value> {
    let Some(text) = raw else {
        return Vec::new();
    };
    if text.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            warn!(
                "collection '{}' holds a non-array JSON value ({}); treating as empty",
                key,
                json_kind(&other)
            );
            Vec::new()
        }
        Err(err) => {
            warn!(
                "collection '{}' is not valid JSON ({}); treating as empty",
                key, err
            );
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_collection_is_lenient() {
        assert!(parse_collection("buyers", None).is_empty());
        assert!(parse_collection("buyers", Some("   ")).is_empty());
        assert!(parse_collection("buyers", Some("{not json")).is_empty());
        assert!(parse_collection("buyers", Some("{\"a\":1}")).is_empty());
        assert_eq!(parse_collection("buyers", Some("[1,2]")).len(), 2);
    }
}
