//! Form schemas: which fields a form has, in which order, and which of them
//! depend on a trigger.
//!
//! Schemas are registered explicitly (see [`catalog`](crate::catalog)); no
//! discovery happens at runtime.

use serde::Serialize;

use crate::conditional::ConditionalGroup;
use crate::field::FieldDescriptor;

/// The two entity types the pipeline knows how to persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Buyer,
    Property,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Buyer => "buyer",
            EntityKind::Property => "property",
        }
    }

    /// Store key of the append-only collection.
    pub fn collection_key(self) -> &'static str {
        match self {
            EntityKind::Buyer => "buyers",
            EntityKind::Property => "properties",
        }
    }

    /// Store key of the single draft slot.
    pub fn draft_key(self) -> &'static str {
        match self {
            EntityKind::Buyer => "buyerProfileDraft",
            EntityKind::Property => "propertyDraft",
        }
    }

    /// Label shown on the submit affordance while a submission is pending.
    pub fn pending_label(self) -> &'static str {
        match self {
            EntityKind::Buyer => "Adding Buyer Profile...",
            EntityKind::Property => "Adding Property...",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            EntityKind::Buyer => "Buyer profile added successfully!",
            EntityKind::Property => "Property added successfully!",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group of sub-fields that may repeat (agent rows on the property form).
///
/// Every row holds one value per sub-field. A form always keeps at least one
/// row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatingGroup {
    /// Attribute name of the zipped list in the built record.
    pub key: String,
    pub label: String,
    pub fields: Vec<FieldDescriptor>,
}

impl RepeatingGroup {
    pub fn new(key: impl Into<String>, label: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            fields,
        }
    }

    /// Name used for a sub-field in validation results, e.g. `agents[1].contact`.
    pub fn field_path(&self, row: usize, field: &str) -> String {
        format!("{}[{row}].{field}", self.key)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Declarative schema for one form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSchema {
    pub kind: EntityKind,
    pub title: String,
    /// Scalar fields, in display order.
    pub fields: Vec<FieldDescriptor>,
    pub conditionals: Vec<ConditionalGroup>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeating: Option<RepeatingGroup>,
}

impl FormSchema {
    pub fn new(kind: EntityKind, title: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            kind,
            title: title.into(),
            fields,
            conditionals: Vec::new(),
            repeating: None,
        }
    }

    /// Declare that `dependent` is shown and required only while `trigger`
    /// equals `sentinel`.
    pub fn conditional(
        mut self,
        trigger: impl Into<String>,
        sentinel: impl Into<String>,
        dependent: impl Into<String>,
    ) -> Self {
        self.conditionals
            .push(ConditionalGroup::new(trigger, sentinel, dependent));
        self
    }

    pub fn repeating(mut self, group: RepeatingGroup) -> Self {
        self.repeating = Some(group);
        self
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    #[test]
    fn keys_per_kind() {
        assert_eq!(EntityKind::Buyer.collection_key(), "buyers");
        assert_eq!(EntityKind::Buyer.draft_key(), "buyerProfileDraft");
        assert_eq!(EntityKind::Property.collection_key(), "properties");
        assert_eq!(EntityKind::Property.draft_key(), "propertyDraft");
    }

    #[test]
    fn field_path_names_row_and_field() {
        let group = RepeatingGroup::new(
            "agents",
            "Agents",
            vec![FieldDescriptor::new("name", "Agent name", FieldKind::Text)],
        );
        assert_eq!(group.field_path(2, "name"), "agents[2].name");
        assert!(group.field_by_name("name").is_some());
        assert!(group.field_by_name("contact").is_none());
    }
}
