//! JSON input for driving a form session non-interactively.
//!
//! ```json
//! {
//!   "fullAddress": "12 Orchard Road",
//!   "askingPrice": 1250000,
//!   "agents": [{ "name": "Jane Tan", "contact": "+65 9123 4567", "agency": "PropNex" }],
//!   "images": [{ "name": "front.jpg", "mimeType": "image/jpeg", "sizeBytes": 20480 }]
//! }
//! ```

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::errors::FormError;
use crate::state::{FormSession, StagedImage};

/// One agent row as given in input; any sub-value may be missing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AgentInput {
    pub name: String,
    pub contact: String,
    pub agency: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormInput {
    #[serde(default)]
    pub agents: Vec<AgentInput>,
    #[serde(default)]
    pub images: Vec<StagedImage>,
    /// Every other key: field name -> value.
    #[serde(flatten)]
    pub values: serde_json::Map<String, Value>,
}

impl FormInput {
    pub fn from_json_str(raw: &str) -> Result<Self, FormError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Write the values and agent rows into `session`.
    ///
    /// Values are applied in schema order so a trigger is set before its
    /// dependent. Unknown keys and values for hidden fields are skipped with
    /// a warning. Staged images are handed back for the caller to stage.
    pub fn apply_to(self, session: &mut FormSession) -> Result<Vec<StagedImage>, FormError> {
        let FormInput {
            agents,
            images,
            mut values,
        } = self;

        let schema = session.schema().clone();
        for field in &schema.fields {
            let Some(value) = values.remove(&field.name) else {
                continue;
            };
            match session.set_value(&field.name, value_to_string(&value)) {
                Ok(()) => {}
                Err(FormError::HiddenField(name)) => {
                    warn!(field = %name, "ignoring value for hidden field");
                }
                Err(err) => return Err(err),
            }
        }
        for key in values.keys() {
            warn!(form = %schema.kind, field = %key, "ignoring unknown field");
        }

        if !agents.is_empty() {
            if schema.repeating.is_none() {
                warn!(form = %schema.kind, "ignoring agents for a form without agent rows");
            } else {
                for (row, agent) in agents.into_iter().enumerate() {
                    if row >= session.row_count() {
                        session.add_row()?;
                    }
                    session.set_row_value(row, "name", agent.name)?;
                    session.set_row_value(row, "contact", agent.contact)?;
                    session.set_row_value(row, "agency", agent.agency)?;
                }
            }
        }

        Ok(images)
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog;

    #[test]
    fn applies_values_agents_and_returns_images() {
        let input = FormInput::from_json_str(
            r#"{
                "fullAddress": "12 Orchard Road",
                "askingPrice": 1250000,
                "status": "Sold",
                "soldDate": "2024-05-01",
                "agents": [
                    {"name": "Jane", "contact": "91234567", "agency": "PropNex"},
                    {"name": "Tim"}
                ],
                "images": [{"name": "a.png", "mimeType": "image/png", "sizeBytes": 10}]
            }"#,
        )
        .unwrap();

        let mut session = FormSession::new(Arc::new(catalog::property_form()));
        let images = input.apply_to(&mut session).unwrap();

        assert_eq!(session.value("askingPrice"), "1250000");
        assert_eq!(session.value("soldDate"), "2024-05-01");
        assert_eq!(session.row_count(), 2);
        assert_eq!(session.row_value(1, "name"), "Tim");
        assert_eq!(session.row_value(1, "agency"), "");
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn hidden_and_unknown_values_are_skipped() {
        let input = FormInput::from_json_str(
            r#"{"purpose": "Investment", "timelineToMoveIn": "soon", "colour": "blue"}"#,
        )
        .unwrap();
        let mut session = FormSession::new(Arc::new(catalog::buyer_profile_form()));
        input.apply_to(&mut session).unwrap();
        assert_eq!(session.value("purpose"), "Investment");
        assert_eq!(session.value("timelineToMoveIn"), "");
    }
}
