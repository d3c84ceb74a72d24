//! Field validator.
//!
//! [`validate_value`] is pure: descriptor, trimmed value and a snapshot of
//! the sibling values in, one [`ValidationResult`] out. Writing the outcome
//! onto the session's markers is the caller's job.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::Serialize;

use crate::field::{FieldDescriptor, FieldKind, Rule};
use crate::state::FormSnapshot;

/// Outcome of validating one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub field_name: String,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn ok(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            valid: true,
            message: None,
        }
    }

    pub fn invalid(field_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            valid: false,
            message: Some(message.into()),
        }
    }
}

/// All results of one full-form pass, in evaluation order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub results: Vec<ValidationResult>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.results.iter().all(|r| r.valid)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationResult> {
        self.results.iter().filter(|r| !r.valid)
    }

    pub fn result_for(&self, field_name: &str) -> Option<&ValidationResult> {
        self.results.iter().find(|r| r.field_name == field_name)
    }
}

/// Validate `value` against `field`.
///
/// `required` is the effective required flag (static or conditional).
/// `result_name` is what the result is reported under; it differs from
/// `field.name` for agent-row sub-fields.
pub fn validate_value(
    field: &FieldDescriptor,
    result_name: &str,
    value: &str,
    required: bool,
    siblings: &FormSnapshot,
) -> ValidationResult {
    let value = value.trim();

    if value.is_empty() {
        return if required {
            ValidationResult::invalid(result_name, format!("{} is required.", field.label))
        } else {
            ValidationResult::ok(result_name)
        };
    }

    if let Err(message) = check_kind(field, value) {
        return ValidationResult::invalid(result_name, message);
    }

    for rule in &field.rules {
        if !check_rule(rule, value, siblings) {
            return ValidationResult::invalid(result_name, rule.message());
        }
    }

    ValidationResult::ok(result_name)
}

fn check_kind(field: &FieldDescriptor, value: &str) -> Result<(), String> {
    match &field.kind {
        FieldKind::Date if !is_iso_date(value) => Err(format!(
            "{} must be a valid date (YYYY-MM-DD).",
            field.label
        )),
        FieldKind::Select { options }
            if !options.is_empty() && !options.iter().any(|o| o == value) =>
        {
            Err(format!("Please select a valid option for {}.", field.label))
        }
        _ => Ok(()),
    }
}

fn check_rule(rule: &Rule, value: &str, siblings: &FormSnapshot) -> bool {
    match rule {
        Rule::MinLength { min, .. } => value.chars().count() >= *min,
        Rule::PositiveNumber { .. } => parse_number(value).is_some_and(|n| n > 0.0),
        Rule::IntegerRange { min, max, .. } => value
            .parse::<i64>()
            .is_ok_and(|n| (*min..=*max).contains(&n)),
        Rule::UrlContaining { fragment, .. } => is_url_containing(value, fragment),
        Rule::Phone { .. } => is_valid_phone(value),
        Rule::GreaterThan { other, .. } => {
            let lower = siblings.get(other).map(str::trim).and_then(parse_number);
            match (parse_number(value), lower) {
                (Some(upper), Some(lower)) => upper > lower,
                _ => true,
            }
        }
    }
}

/// Finite decimal number, or `None`.
pub fn parse_number(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Optional `+`, a leading 1-9, then at most 15 ASCII digits, once spaces,
/// dashes and parentheses are removed.
pub fn is_valid_phone(value: &str) -> bool {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    let re = PHONE.get_or_init(|| Regex::new(r"^\+?[1-9][0-9]{0,15}$").unwrap());
    let stripped: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();
    re.is_match(&stripped)
}

/// Parses as an absolute URL and contains `fragment` somewhere in its text.
pub fn is_url_containing(value: &str, fragment: &str) -> bool {
    url::Url::parse(value).is_ok() && value.contains(fragment)
}

fn is_iso_date(value: &str) -> bool {
    value.len() == 10 && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}
