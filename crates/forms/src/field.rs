//! Field descriptors: the static, declarative half of a form.
//!
//! A [`FieldDescriptor`] names a field, gives it a label for messages, a
//! [`FieldKind`] and an ordered list of format [`Rule`]s. Descriptors never
//! change at runtime; everything mutable lives in [`FormSession`].
//!
//! ```ignore
//! let name = FieldDescriptor::new("buyerName", "Buyer name", FieldKind::Text)
//!     .required()
//!     .rule(Rule::MinLength { min: 2, message: "Too short.".into() });
//! ```
//!
//! [`FormSession`]: crate::FormSession

use serde::Serialize;

/// Input kinds supported by the form system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    /// `options` empty means any value is accepted.
    Select { options: Vec<String> },
    /// ISO `YYYY-MM-DD`.
    Date,
}

impl FieldKind {
    pub fn select<I, S>(options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FieldKind::Select {
            options: options.into_iter().map(Into::into).collect(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Select { .. } => "select",
            FieldKind::Date => "date",
        }
    }
}

/// Format constraint checked only when the value is non-empty.
///
/// Rules run in declaration order and the first failure wins.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "camelCase")]
pub enum Rule {
    /// At least `min` characters (after trimming).
    MinLength { min: usize, message: String },
    /// Parses as a finite number strictly greater than zero.
    PositiveNumber { message: String },
    /// Parses as an integer within `min..=max`.
    IntegerRange { min: i64, max: i64, message: String },
    /// Absolute URL whose text contains `fragment`.
    UrlContaining { fragment: String, message: String },
    /// Optional `+`, first digit 1-9, up to 15 more digits once spaces,
    /// dashes and parentheses are stripped.
    Phone { message: String },
    /// Numerically greater than the sibling field `other`. Skipped when
    /// either side does not parse.
    GreaterThan { other: String, message: String },
}

impl Rule {
    pub fn message(&self) -> &str {
        match self {
            Rule::MinLength { message, .. }
            | Rule::PositiveNumber { message }
            | Rule::IntegerRange { message, .. }
            | Rule::UrlContaining { message, .. }
            | Rule::Phone { message }
            | Rule::GreaterThan { message, .. } => message,
        }
    }
}

/// Declarative description of a single form field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    /// Statically required. Conditional dependents are declared
    /// not-required here; the controller decides at runtime.
    pub required: bool,
    pub rules: Vec<Rule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind,
            required: false,
            rules: Vec::new(),
            help: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Attach hint text shown next to the field.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// True if a non-empty value of this field is subject to any check
    /// beyond "required".
    pub fn has_format_rules(&self) -> bool {
        !self.rules.is_empty()
            || matches!(self.kind, FieldKind::Date)
            || matches!(&self.kind, FieldKind::Select { options } if !options.is_empty())
    }
}
