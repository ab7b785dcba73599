//! Session form state: typed fields with declared domains and defaults.

use crate::error::{FormError, SchemaError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

/// Separator used when a multi-choice value is substituted into a prompt.
pub const DEFAULT_CHOICE_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Number { min: f64, max: f64 },
    SingleChoice { options: Vec<String> },
    MultiChoice { options: Vec<String> },
    FreeText,
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            FieldKind::Number { .. } => "number",
            FieldKind::SingleChoice { .. } => "single-choice",
            FieldKind::MultiChoice { .. } => "multi-choice",
            FieldKind::FreeText => "text",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Choices(Vec<String>),
    Text(String),
}

impl FieldValue {
    pub fn render(&self, separator: &str) -> String {
        match self {
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Choices(items) => items.join(separator),
            FieldValue::Text(text) => text.clone(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                Value::from(*n as i64)
            }
            FieldValue::Number(n) => Value::from(*n),
            FieldValue::Choices(items) => Value::from(items.clone()),
            FieldValue::Text(text) => Value::from(text.clone()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(DEFAULT_CHOICE_SEPARATOR))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub default: FieldValue,
}

impl FormField {
    pub fn number(name: &str, label: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::Number { min, max },
            default: FieldValue::Number(default),
        }
    }

    pub fn single_choice(name: &str, label: &str, options: &[&str], default: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::SingleChoice {
                options: options.iter().map(|o| o.to_string()).collect(),
            },
            default: FieldValue::Text(default.to_string()),
        }
    }

    pub fn multi_choice(name: &str, label: &str, options: &[&str], default: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::MultiChoice {
                options: options.iter().map(|o| o.to_string()).collect(),
            },
            default: FieldValue::Choices(default.iter().map(|o| o.to_string()).collect()),
        }
    }

    pub fn free_text(name: &str, label: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: FieldKind::FreeText,
            default: FieldValue::Text(default.to_string()),
        }
    }

    /// Accepts `value` iff it lies in this field's domain.
    pub fn check(&self, value: &FieldValue) -> Result<(), FormError> {
        match (&self.kind, value) {
            (FieldKind::Number { min, max }, FieldValue::Number(n)) => {
                if (*min..=*max).contains(n) {
                    Ok(())
                } else {
                    Err(FormError::OutOfRange {
                        field: self.name.clone(),
                        value: *n,
                        min: *min,
                        max: *max,
                    })
                }
            }
            (FieldKind::SingleChoice { options }, FieldValue::Text(choice)) => {
                self.check_option(options, choice)
            }
            (FieldKind::MultiChoice { options }, FieldValue::Choices(choices)) => choices
                .iter()
                .try_for_each(|choice| self.check_option(options, choice)),
            (FieldKind::FreeText, FieldValue::Text(_)) => Ok(()),
            (kind, _) => Err(FormError::KindMismatch {
                field: self.name.clone(),
                expected: kind.expected(),
            }),
        }
    }

    fn check_option(&self, options: &[String], choice: &str) -> Result<(), FormError> {
        if options.iter().any(|o| o == choice) {
            Ok(())
        } else {
            Err(FormError::InvalidChoice {
                field: self.name.clone(),
                value: choice.to_string(),
            })
        }
    }

    /// Parse text typed by a user into a value of this field's kind. The
    /// result is not range-checked; `FormState::set` does that.
    pub fn parse(&self, raw: &str) -> Result<FieldValue, FormError> {
        let raw = raw.trim();
        match &self.kind {
            FieldKind::Number { .. } => {
                raw.parse::<f64>()
                    .map(FieldValue::Number)
                    .map_err(|_| FormError::InvalidNumber {
                        field: self.name.clone(),
                        raw: raw.to_string(),
                    })
            }
            FieldKind::SingleChoice { .. } | FieldKind::FreeText => {
                Ok(FieldValue::Text(raw.to_string()))
            }
            FieldKind::MultiChoice { .. } => Ok(FieldValue::Choices(
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            )),
        }
    }
}

/// Ordered field declarations, validated on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FormField>", into = "Vec<FormField>")]
pub struct FormSchema {
    fields: Vec<FormField>,
}

impl FormSchema {
    pub fn new(fields: Vec<FormField>) -> Result<Self, SchemaError> {
        if fields.is_empty() {
            return Err(SchemaError::Empty);
        }
        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyName);
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField(field.name.clone()));
            }
            match &field.kind {
                FieldKind::Number { min, max } => {
                    if !min.is_finite() || !max.is_finite() || min > max {
                        return Err(SchemaError::InvalidBounds {
                            field: field.name.clone(),
                            min: *min,
                            max: *max,
                        });
                    }
                }
                FieldKind::SingleChoice { options } | FieldKind::MultiChoice { options } => {
                    if options.is_empty() {
                        return Err(SchemaError::NoOptions(field.name.clone()));
                    }
                }
                FieldKind::FreeText => {}
            }
            field
                .check(&field.default)
                .map_err(|source| SchemaError::InvalidDefault {
                    field: field.name.clone(),
                    source,
                })?;
        }
        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl TryFrom<Vec<FormField>> for FormSchema {
    type Error = SchemaError;

    fn try_from(fields: Vec<FormField>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<FormSchema> for Vec<FormField> {
    fn from(schema: FormSchema) -> Self {
        schema.fields
    }
}

/// Flat key/value snapshot of a form, keyed by field name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormRecord(pub BTreeMap<String, Value>);

#[derive(Debug, Clone)]
pub struct FormState {
    schema: Arc<FormSchema>,
    values: BTreeMap<String, FieldValue>,
}

impl FormState {
    pub fn new(schema: Arc<FormSchema>) -> Self {
        let values = schema
            .fields()
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect();
        Self { schema, values }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Result<&FieldValue, FormError> {
        self.values
            .get(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(FieldValue::as_number)
    }

    pub fn set(&mut self, name: &str, value: FieldValue) -> Result<(), FormError> {
        let field = self
            .schema
            .field(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        field.check(&value)?;
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn set_from_str(&mut self, name: &str, raw: &str) -> Result<(), FormError> {
        let field = self
            .schema
            .field(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        let value = field.parse(raw)?;
        self.set(name, value)
    }

    pub fn reset(&mut self) {
        *self = Self::new(Arc::clone(&self.schema));
    }

    /// Re-check every value against its declared domain.
    pub fn validate(&self) -> Result<(), FormError> {
        for field in self.schema.fields() {
            let value = self.get(&field.name)?;
            field.check(value)?;
        }
        Ok(())
    }

    pub fn template_fields(&self) -> HashMap<String, String> {
        self.template_fields_with(DEFAULT_CHOICE_SEPARATOR)
    }

    pub fn template_fields_with(&self, separator: &str) -> HashMap<String, String> {
        self.values
            .iter()
            .map(|(name, value)| (name.clone(), value.render(separator)))
            .collect()
    }

    pub fn persist(&self) -> FormRecord {
        FormRecord(
            self.values
                .iter()
                .map(|(name, value)| (name.clone(), value.to_json()))
                .collect(),
        )
    }

    /// Build a state from a record. Entries that are unknown, malformed or out
    /// of domain are skipped and the field keeps its default.
    pub fn restore(schema: Arc<FormSchema>, record: &FormRecord) -> Self {
        let mut state = Self::new(schema);
        for (name, raw) in &record.0 {
            let value = match FieldValue::deserialize(raw) {
                Ok(value) => value,
                Err(err) => {
                    warn!(field = %name, error = %err, "ignoring malformed form record entry");
                    continue;
                }
            };
            if let Err(err) = state.set(name, value) {
                warn!(field = %name, error = %err, "ignoring invalid form record entry");
            }
        }
        state
    }
}
