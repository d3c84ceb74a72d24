use crate::errors::StoreError;

/// A single key/value backend the local store persists into.
///
/// Values are opaque strings (serialized JSON). Backends only need `get_raw`
/// and `put_raw`; `update` has a default read-then-write implementation that
/// backends with real exclusive access should override.
pub trait StorageBackend: Send + Sync {
    /// Short name used in log lines.
    fn name(&self) -> &'static str;

    /// Read the raw value stored under `key`, if any.
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the raw value stored under `key`.
    fn put_raw(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Read-modify-write of a single key.
    ///
    /// `apply` receives the current raw value and returns the replacement.
    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<String, StoreError>,
    ) -> Result<(), StoreError> {
        let current = self.get_raw(key)?;
        let next = apply(current)?;
        self.put_raw(key, &next)
    }
}

/// Keys double as file stems in the file backend, so they are restricted to
/// ASCII alphanumerics, `_` and `-`.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_storage_keys_in_use() {
        for key in ["buyers", "properties", "buyerProfileDraft", "propertyDraft"] {
            assert!(validate_key(key).is_ok(), "{key} should be accepted");
        }
    }

    #[test]
    fn rejects_path_like_keys() {
        for key in ["", "../buyers", "a/b", "draft.json", "with space"] {
            assert!(
                matches!(validate_key(key), Err(StoreError::InvalidKey(_))),
                "{key:?} should be rejected"
            );
        }
    }
}
