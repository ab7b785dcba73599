//! Prompt templates with `{name}` placeholders.
//!
//! Values are substituted verbatim. User free text is not escaped or
//! sanitised, so a query can steer the model (prompt injection); callers
//! that need isolation must handle it before rendering.

use crate::error::TemplateError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder pattern"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PromptTemplate {
    text: String,
    required: BTreeSet<String>,
}

impl PromptTemplate {
    /// Every placeholder found in `text` becomes a required field.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let required = PLACEHOLDER
            .captures_iter(&text)
            .map(|caps| caps[1].to_string())
            .collect();
        Self { text, required }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn required_fields(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Fails with the first missing placeholder (alphabetical) and touches nothing.
    pub fn render(&self, fields: &HashMap<String, String>) -> Result<String, TemplateError> {
        if let Some(missing) = self.required.iter().find(|name| !fields.contains_key(*name)) {
            return Err(TemplateError::MissingField(missing.clone()));
        }

        let rendered = PLACEHOLDER.replace_all(&self.text, |caps: &Captures| {
            fields
                .get(&caps[1])
                .map_or_else(String::new, |value| value.clone())
        });
        Ok(rendered.into_owned())
    }
}

impl From<String> for PromptTemplate {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<PromptTemplate> for String {
    fn from(template: PromptTemplate) -> Self {
        template.text
    }
}
