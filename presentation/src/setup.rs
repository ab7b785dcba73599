//! Resolves which form schema, prompt template and saved record a chat uses.

use anyhow::Context;
use application::retry::RetryPolicy;
use application::session_service::SessionSettings;
use domain::form::FormSchema;
use domain::profiles::{check_template, Profile};
use domain::template::PromptTemplate;
use infrastructure::config::Config;
use infrastructure::form_store::{load_schema, load_template, JsonFormStore};
use shared::types::Result;
use std::path::Path;
use tracing::debug;

pub struct ChatSetup {
    pub template: PromptTemplate,
    pub schema: FormSchema,
    pub store: JsonFormStore,
}

/// A custom schema falls back to the profile template only when that
/// template's placeholders are all fields of the schema. Each schema gets
/// its own record beside `form_path`, named for the profile or the schema file.
pub fn resolve(
    profile: Profile,
    schema_path: Option<&Path>,
    template_path: Option<&Path>,
    form_path: &Path,
) -> Result<ChatSetup> {
    let (schema, record_key) = match schema_path {
        Some(path) => {
            let key = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .filter(|stem| !stem.is_empty())
                .unwrap_or_else(|| "custom".to_string());
            (load_schema(path)?, key)
        }
        None => (profile.schema()?, profile.to_string()),
    };
    let template = match template_path {
        Some(path) => load_template(path)?,
        None => profile.template(),
    };
    check_template(&template, &schema).with_context(|| match template_path {
        Some(path) => format!("Template {:?} does not fit the form schema", path),
        None => format!("The {profile} template does not fit the form schema; pass --template"),
    })?;

    let store = JsonFormStore::keyed(form_path, &record_key);
    debug!(
        fields = schema.fields().len(),
        record = %store.path().display(),
        "chat setup resolved"
    );
    Ok(ChatSetup {
        template,
        schema,
        store,
    })
}

pub fn session_settings(config: &Config) -> SessionSettings {
    SessionSettings {
        model: config.model().to_string(),
        max_tokens: config.max_output_tokens,
        retry: RetryPolicy {
            max_attempts: config.retry_attempts,
            initial_backoff: config.retry_backoff,
            ..RetryPolicy::default()
        },
        retention: config.retention(),
    }
}
