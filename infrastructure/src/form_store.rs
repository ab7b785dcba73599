//! Flat JSON file holding one form record, written and read wholesale.

use anyhow::Context;
use domain::form::{FormRecord, FormSchema, FormState};
use domain::template::PromptTemplate;
use shared::types::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct JsonFormStore {
    path: PathBuf,
}

impl JsonFormStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// A record beside `base` named for `key`: `user_data.json` becomes
    /// `user_data.<key>.json`. Forms built from different schemas never share a file.
    pub fn keyed(base: &Path, key: &str) -> Self {
        let stem = base
            .file_stem()
            .map_or_else(|| "user_data".to_string(), |s| s.to_string_lossy().into_owned());
        let name = match base.extension() {
            Some(ext) => format!("{stem}.{key}.{}", ext.to_string_lossy()),
            None => format!("{stem}.{key}"),
        };
        Self::new(base.with_file_name(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or corrupt file yields the schema defaults.
    pub fn load(&self, schema: Arc<FormSchema>) -> FormState {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved form, using defaults");
                return FormState::new(schema);
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "cannot read saved form, using defaults");
                return FormState::new(schema);
            }
        };
        match serde_json::from_str::<FormRecord>(&data) {
            Ok(record) => FormState::restore(schema, &record),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "corrupt saved form, using defaults");
                FormState::new(schema)
            }
        }
    }

    pub fn save(&self, form: &FormState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let serialized = serde_json::to_string_pretty(&form.persist())?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write form record at {:?}", self.path))?;
        Ok(())
    }
}

/// Read a form schema from JSON; the schema is validated while parsing.
pub fn load_schema(path: &Path) -> Result<FormSchema> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read form schema at {:?}", path))?;
    let schema = serde_json::from_str(&data)
        .with_context(|| format!("Invalid form schema in {:?}", path))?;
    Ok(schema)
}

/// Read a prompt template from a plain text file.
pub fn load_template(path: &Path) -> Result<PromptTemplate> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read prompt template at {:?}", path))?;
    Ok(PromptTemplate::new(text))
}
