//! Records built from a form session: what gets persisted or previewed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use store::{AppendReceipt, JsonObject};

use crate::schema::EntityKind;
use crate::state::FormSession;

/// One complete row of the agent group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentEntry {
    pub name: String,
    pub contact: String,
    pub agency: String,
}

/// A submitted Buyer or Property as appended to its collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    pub kind: EntityKind,
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub attributes: JsonObject,
}

impl EntityRecord {
    pub(crate) fn from_receipt(kind: EntityKind, receipt: AppendReceipt, attributes: JsonObject) -> Self {
        Self {
            kind,
            id: receipt.id,
            created_at: receipt.created_at,
            attributes,
        }
    }

    pub fn status(&self) -> Option<&str> {
        self.attributes.get("status").and_then(Value::as_str)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }
}

/// The single overwritable draft of a form.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftRecord {
    pub attributes: JsonObject,
    pub saved_at: DateTime<Utc>,
}

impl DraftRecord {
    pub fn new(attributes: JsonObject, saved_at: DateTime<Utc>) -> Self {
        Self {
            attributes,
            saved_at,
        }
    }

    /// Stored shape: the attributes plus `isDraft: true` and `savedAt`.
    pub fn to_json(&self) -> JsonObject {
        let mut object = self.attributes.clone();
        object.insert("isDraft".into(), Value::Bool(true));
        object.insert(
            "savedAt".into(),
            Value::String(
                self.saved_at
                    .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            ),
        );
        object
    }
}

/// Zip the agent rows, dropping any row where a sub-value is missing.
pub fn collect_agents(session: &FormSession) -> Vec<AgentEntry> {
    session
        .rows()
        .iter()
        .filter_map(|row| {
            let (name, contact, agency) = (
                row.value("name").trim(),
                row.value("contact").trim(),
                row.value("agency").trim(),
            );
            if name.is_empty() || contact.is_empty() || agency.is_empty() {
                return None;
            }
            Some(AgentEntry {
                name: name.to_string(),
                contact: contact.to_string(),
                agency: agency.to_string(),
            })
        })
        .collect()
}

/// Domain attributes of the session's current values: every scalar field in
/// schema order (as trimmed strings), then the zipped agent list when the
/// form has a repeating group.
pub fn build_attributes(session: &FormSession) -> JsonObject {
    let mut attributes = JsonObject::new();
    for (name, value) in session.snapshot().iter() {
        attributes.insert(name.to_string(), Value::String(value.trim().to_string()));
    }
    if let Some(group) = &session.schema().repeating {
        let agents = collect_agents(session)
            .into_iter()
            .map(|a| serde_json::json!({ "name": a.name, "contact": a.contact, "agency": a.agency }))
            .collect();
        attributes.insert(group.key.clone(), Value::Array(agents));
    }
    attributes
}

/// Attributes stamped onto a record at submission time, on top of what the
/// store adds (`id`, `createdAt`).
pub fn stamp_submission(kind: EntityKind, attributes: &mut JsonObject, now: DateTime<Utc>) {
    match kind {
        EntityKind::Buyer => {
            attributes.insert("status".into(), Value::String("Active".into()));
        }
        EntityKind::Property => {
            attributes.insert(
                "listingDate".into(),
                Value::String(now.format("%Y-%m-%d").to_string()),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog;

    #[test]
    fn incomplete_agent_rows_are_dropped() {
        let mut session = FormSession::new(Arc::new(catalog::property_form()));
        session.set_row_value(0, "name", "Jane Tan").unwrap();
        session.set_row_value(0, "contact", "+65 9123 4567").unwrap();
        session.set_row_value(0, "agency", "PropNex").unwrap();
        let second = session.add_row().unwrap();
        session.set_row_value(second, "name", "Half Filled").unwrap();

        assert_eq!(
            collect_agents(&session),
            vec![AgentEntry {
                name: "Jane Tan".into(),
                contact: "+65 9123 4567".into(),
                agency: "PropNex".into(),
            }]
        );
        let attributes = build_attributes(&session);
        assert_eq!(attributes["agents"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn stamping_per_kind() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 23, 30, 0).unwrap();

        let mut buyer = JsonObject::new();
        stamp_submission(EntityKind::Buyer, &mut buyer, now);
        assert_eq!(buyer["status"], "Active");

        let mut property = JsonObject::new();
        stamp_submission(EntityKind::Property, &mut property, now);
        assert_eq!(property["listingDate"], "2024-03-09");
    }

    #[test]
    fn draft_json_marks_draft() {
        let saved_at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let mut attributes = JsonObject::new();
        attributes.insert("buyerName".into(), "Al".into());
        let json = DraftRecord::new(attributes, saved_at).to_json();
        assert_eq!(json["isDraft"], true);
        assert_eq!(json["savedAt"], "2024-01-02T03:04:05.000Z");
        assert_eq!(json["buyerName"], "Al");
    }
}
