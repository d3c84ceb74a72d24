//! Mutable runtime state of one form: values, markers, agent rows,
//! conditional visibility and staged images.
//!
//! A [`FormSession`] has a single owner. Validator, controller and pipeline
//! all take it by `&mut`; nothing here is shared or global.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conditional::{ConditionalState, Visibility};
use crate::errors::FormError;
use crate::schema::{EntityKind, FormSchema, RepeatingGroup};
use crate::validate::ValidationResult;

/// Visual marker plus message slot of a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FieldMarker {
    #[default]
    Untouched,
    Valid,
    Invalid(String),
}

impl FieldMarker {
    pub fn is_invalid(&self) -> bool {
        matches!(self, FieldMarker::Invalid(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            FieldMarker::Invalid(message) => Some(message),
            _ => None,
        }
    }
}

impl From<&ValidationResult> for FieldMarker {
    fn from(result: &ValidationResult) -> Self {
        if result.valid {
            FieldMarker::Valid
        } else {
            FieldMarker::Invalid(result.message.clone().unwrap_or_default())
        }
    }
}

/// A file staged for upload on the property form. Preview only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StagedImage {
    pub name: String,
    pub mime_type: String,
    #[serde(default)]
    pub size_bytes: u64,
}

impl StagedImage {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Ordered field name -> current value mapping, rebuilt on every read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSnapshot {
    entries: Vec<(String, String)>,
}

impl FormSnapshot {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One row of the repeating group.
#[derive(Debug, Clone, Default)]
pub struct Row {
    values: HashMap<String, String>,
    markers: HashMap<String, FieldMarker>,
}

impl Row {
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or_default()
    }
}

/// Editing state of one form.
#[derive(Debug, Clone)]
pub struct FormSession {
    schema: Arc<FormSchema>,
    values: HashMap<String, String>,
    markers: HashMap<String, FieldMarker>,
    rows: Vec<Row>,
    conditional: ConditionalState,
    images: Vec<StagedImage>,
    pending: Option<&'static str>,
}

impl FormSession {
    /// Empty session: every conditional section hidden, one agent row.
    pub fn new(schema: Arc<FormSchema>) -> Self {
        Self::with_values(schema, HashMap::new())
    }

    /// Session pre-populated with `values`. Conditional sections whose
    /// trigger already holds the sentinel start visible.
    pub fn with_values(schema: Arc<FormSchema>, values: HashMap<String, String>) -> Self {
        let conditional =
            ConditionalState::initialize(&schema.conditionals, |name| {
                values.get(name).map(String::as_str)
            });
        let rows = if schema.repeating.is_some() {
            vec![Row::default()]
        } else {
            Vec::new()
        };
        let mut values = values;
        values.retain(|name, _| schema.field_by_name(name).is_some() && !conditional.is_hidden(name));

        Self {
            schema,
            values,
            markers: HashMap::new(),
            rows,
            conditional,
            images: Vec::new(),
            pending: None,
        }
    }

    pub fn schema(&self) -> &Arc<FormSchema> {
        &self.schema
    }

    pub fn kind(&self) -> EntityKind {
        self.schema.kind
    }

    /// Current value of a scalar field, `""` when unset.
    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or_default()
    }

    /// Set a scalar field.
    ///
    /// An Invalid marker on the field is cleared back to Valid. Setting a
    /// trigger re-runs the controller; dependents that become hidden lose
    /// their value and marker. Writing to a hidden dependent is rejected.
    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        if self.schema.field_by_name(name).is_none() {
            return Err(FormError::UnknownField(name.to_string()));
        }
        if self.conditional.is_hidden(name) {
            debug!(field = name, "rejected write to hidden field");
            return Err(FormError::HiddenField(name.to_string()));
        }

        let value = value.into();
        if self.conditional.is_trigger(name) {
            for change in self.conditional.on_trigger_changed(name, &value) {
                if change.clear_value {
                    self.values.remove(&change.dependent);
                    self.markers.remove(&change.dependent);
                }
            }
        }
        self.values.insert(name.to_string(), value);
        if let Some(marker) = self.markers.get_mut(name) {
            if marker.is_invalid() {
                *marker = FieldMarker::Valid;
            }
        }
        Ok(())
    }

    pub fn visibility(&self, name: &str) -> Option<Visibility> {
        self.conditional.visibility(name)
    }

    pub fn is_visible(&self, name: &str) -> bool {
        !self.conditional.is_hidden(name)
    }

    /// Effective required flag: static, or conditional while visible.
    pub fn is_required(&self, name: &str) -> bool {
        if self.conditional.is_hidden(name) {
            return false;
        }
        self.conditional.is_conditionally_required(name)
            || self.schema.field_by_name(name).is_some_and(|f| f.required)
    }

    pub fn marker(&self, name: &str) -> &FieldMarker {
        static UNTOUCHED: FieldMarker = FieldMarker::Untouched;
        self.markers.get(name).unwrap_or(&UNTOUCHED)
    }

    pub(crate) fn apply_result(&mut self, name: &str, result: &ValidationResult) {
        self.markers.insert(name.to_string(), FieldMarker::from(result));
    }

    fn group(&self) -> Result<&RepeatingGroup, FormError> {
        self.schema
            .repeating
            .as_ref()
            .ok_or(FormError::NoRepeatingGroup(self.schema.kind.as_str()))
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_value(&self, row: usize, field: &str) -> &str {
        self.rows.get(row).map(|r| r.value(field)).unwrap_or_default()
    }

    pub fn set_row_value(
        &mut self,
        row: usize,
        field: &str,
        value: impl Into<String>,
    ) -> Result<(), FormError> {
        let group = self.group()?;
        if group.field_by_name(field).is_none() {
            return Err(FormError::UnknownField(group.field_path(row, field)));
        }
        let len = self.rows.len();
        let target = self
            .rows
            .get_mut(row)
            .ok_or(FormError::RowOutOfRange { index: row, len })?;
        target.values.insert(field.to_string(), value.into());
        if let Some(marker) = target.markers.get_mut(field) {
            if marker.is_invalid() {
                *marker = FieldMarker::Valid;
            }
        }
        Ok(())
    }

    pub fn row_marker(&self, row: usize, field: &str) -> &FieldMarker {
        static UNTOUCHED: FieldMarker = FieldMarker::Untouched;
        self.rows
            .get(row)
            .and_then(|r| r.markers.get(field))
            .unwrap_or(&UNTOUCHED)
    }

    pub(crate) fn apply_row_result(&mut self, row: usize, field: &str, result: &ValidationResult) {
        if let Some(target) = self.rows.get_mut(row) {
            target
                .markers
                .insert(field.to_string(), FieldMarker::from(result));
        }
    }

    /// Append an empty row, returning its index.
    pub fn add_row(&mut self) -> Result<usize, FormError> {
        self.group()?;
        self.rows.push(Row::default());
        Ok(self.rows.len() - 1)
    }

    /// Remove a row. The last remaining row cannot be removed.
    pub fn remove_row(&mut self, index: usize) -> Result<(), FormError> {
        self.group()?;
        if index >= self.rows.len() {
            return Err(FormError::RowOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        if self.rows.len() == 1 {
            return Err(FormError::LastRow);
        }
        self.rows.remove(index);
        Ok(())
    }

    /// Values of every scalar field in schema order. Unset fields are `""`.
    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot::from_pairs(
            self.schema
                .fields
                .iter()
                .map(|f| (f.name.clone(), self.value(&f.name).to_string())),
        )
    }

    pub fn images(&self) -> &[StagedImage] {
        &self.images
    }

    pub(crate) fn images_mut(&mut self) -> &mut Vec<StagedImage> {
        &mut self.images
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Progress text replacing the submit label while pending.
    pub fn pending_label(&self) -> Option<&'static str> {
        self.pending
    }

    pub(crate) fn set_pending(&mut self, pending: bool) {
        self.pending = pending.then(|| self.schema.kind.pending_label());
    }

    /// Back to the initial empty state.
    pub fn reset(&mut self) {
        self.values.clear();
        self.markers.clear();
        self.conditional.collapse_all();
        if !self.rows.is_empty() {
            self.rows.truncate(1);
            self.rows[0] = Row::default();
        }
        self.images.clear();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    fn buyer() -> FormSession {
        FormSession::new(Arc::new(catalog::buyer_profile_form()))
    }

    #[test]
    fn unknown_field_is_an_error() {
        let mut session = buyer();
        assert!(matches!(
            session.set_value("nope", "x"),
            Err(FormError::UnknownField(_))
        ));
    }

    #[test]
    fn hidden_dependent_rejects_writes() {
        let mut session = buyer();
        assert!(matches!(
            session.set_value("timelineToMoveIn", "3 months"),
            Err(FormError::HiddenField(_))
        ));
        session.set_value("purpose", "Own Stay").unwrap();
        session.set_value("timelineToMoveIn", "3 months").unwrap();
        assert!(session.is_required("timelineToMoveIn"));
    }

    #[test]
    fn editing_clears_invalid_marker() {
        let mut session = buyer();
        session.apply_result(
            "buyerName",
            &ValidationResult::invalid("buyerName", "Buyer Name is required."),
        );
        assert!(session.marker("buyerName").is_invalid());
        session.set_value("buyerName", "Al").unwrap();
        assert_eq!(session.marker("buyerName"), &FieldMarker::Valid);
    }

    #[test]
    fn snapshot_follows_schema_order() {
        let mut session = buyer();
        session.set_value("minBudget", "100").unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.len(), session.schema().field_count());
        assert_eq!(snapshot.iter().next().map(|(k, _)| k), Some("buyerName"));
        assert_eq!(snapshot.get("minBudget"), Some("100"));
        assert_eq!(snapshot.get("maxBudget"), Some(""));
    }

    #[test]
    fn with_values_drops_hidden_and_unknown_entries() {
        let values = HashMap::from([
            ("purpose".to_string(), "Investment".to_string()),
            ("timelineToMoveIn".to_string(), "soon".to_string()),
            ("bogus".to_string(), "x".to_string()),
        ]);
        let session = FormSession::with_values(Arc::new(catalog::buyer_profile_form()), values);
        assert_eq!(session.value("timelineToMoveIn"), "");
        assert_eq!(session.value("bogus"), "");
        assert_eq!(session.value("purpose"), "Investment");
    }

    #[test]
    fn pending_label_follows_kind() {
        let mut session = buyer();
        session.set_pending(true);
        assert_eq!(session.pending_label(), Some("Adding Buyer Profile..."));
        session.reset();
        assert!(!session.is_pending());
    }

    #[test]
    fn buyer_form_has_no_rows() {
        let mut session = buyer();
        assert_eq!(session.row_count(), 0);
        assert!(matches!(
            session.add_row(),
            Err(FormError::NoRepeatingGroup("buyer"))
        ));
    }

    #[test]
    fn rows_keep_at_least_one() {
        let mut session = FormSession::new(Arc::new(catalog::property_form()));
        assert_eq!(session.row_count(), 1);
        assert!(matches!(session.remove_row(0), Err(FormError::LastRow)));
        let idx = session.add_row().unwrap();
        session.set_row_value(idx, "name", "Jane").unwrap();
        session.remove_row(0).unwrap();
        assert_eq!(session.row_value(0, "name"), "Jane");
        assert!(matches!(
            session.remove_row(5),
            Err(FormError::RowOutOfRange { index: 5, len: 1 })
        ));
    }
}
