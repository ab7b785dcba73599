use crate::commands::{parse_command, ChatCommand, HELP};
use crate::setup::{resolve, session_settings, ChatSetup};
use anyhow::{anyhow, Context};
use application::analysis_service::AnalysisService;
use application::session_service::{ChatSession, TurnOutcome};
use clap::Parser;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, MultiSelect, Select};
use domain::form::{FieldKind, FieldValue, FormField, FormSchema, FormState};
use domain::profiles::Profile;
use infrastructure::config::Config;
use infrastructure::export::{write_analysis, write_transcript};
use infrastructure::form_store::JsonFormStore;
use infrastructure::pdf_extractor::PdfTextExtractor;
use shared::confirmation::ask_confirmation;
use shared::types::Result;
use shared::utils::{is_supported_document, split_assignment};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "nutri_chat")]
#[command(about = "Nutrition planning chat and health-report analysis over a local or hosted LLM")]
pub struct Cli {
    /// Built-in profile: standard or indian
    #[arg(long, default_value = "standard")]
    pub profile: Profile,

    /// Load the form schema from a JSON file instead of the built-in profile
    #[arg(long, value_name = "PATH")]
    pub schema: Option<PathBuf>,

    /// Load the prompt template from a text file; its placeholders must be form fields
    #[arg(long, value_name = "PATH")]
    pub template: Option<PathBuf>,

    /// Set a profile field before chatting (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<String>,

    /// Save the profile fields after applying --set
    #[arg(long)]
    pub save_profile: bool,

    /// Analyze a PDF health report instead of chatting
    #[arg(long, value_name = "PDF")]
    pub analyze: Option<PathBuf>,

    /// Write the transcript or analysis to this file (.txt or .json)
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// One-shot question; starts interactive chat when empty
    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,
}

pub struct CliApp {
    config: Config,
}

impl CliApp {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        if let Some(document) = cli.analyze.as_deref() {
            return self.handle_analyze(document, cli.export.as_deref()).await;
        }

        let ChatSetup {
            template,
            schema,
            store,
        } = resolve(
            cli.profile,
            cli.schema.as_deref(),
            cli.template.as_deref(),
            &self.config.form_path,
        )?;
        debug!(profile = %cli.profile, record = %store.path().display(), "form record selected");
        let mut form = store.load(Arc::new(schema));
        for assignment in &cli.set {
            let (name, value) = split_assignment(assignment)
                .ok_or_else(|| anyhow!("expected NAME=VALUE, got `{assignment}`"))?;
            form.set_from_str(name, value)?;
        }
        if cli.save_profile {
            store.save(&form)?;
            println!("{}", format!("Profile saved to {}", store.path().display()).green());
        }

        let mut session = ChatSession::new(
            template,
            form,
            self.config.completion_client()?,
            session_settings(&self.config),
        );
        info!(session = %session.id(), backend = ?self.config.backend, model = self.config.model(), "session started");
        let query = cli.args.join(" ");
        if query.trim().is_empty() {
            self.handle_chat(cli.profile, &mut session, &store).await?;
        } else {
            self.submit(&mut session, &query).await?;
        }

        if let Some(path) = cli.export.as_deref() {
            export_transcript(&session, path)?;
        }
        Ok(())
    }

    async fn handle_chat(
        &self,
        profile: Profile,
        session: &mut ChatSession,
        store: &JsonFormStore,
    ) -> Result<()> {
        println!("{}", profile.title().bold());
        print_profile(session);
        println!("{}", "Ask about your nutrition plan. Type /help for commands.".cyan());

        loop {
            let input: String = Input::with_theme(&ColorfulTheme::default())
                .with_prompt("You")
                .allow_empty(true)
                .interact_text()?;

            match parse_command(&input) {
                ChatCommand::Empty => continue,
                ChatCommand::Quit => break,
                ChatCommand::Help => {
                    println!("{HELP}");
                    println!("Fields:");
                    for line in describe_schema(session.form().schema()) {
                        println!("  {line}");
                    }
                }
                ChatCommand::Profile => print_profile(session),
                ChatCommand::Edit => {
                    edit_form(session.form_mut())?;
                    print_profile(session);
                }
                ChatCommand::Set { name, value } => {
                    match session.form_mut().set_from_str(&name, &value) {
                        Ok(()) => println!("{}", format!("{name} updated.").green()),
                        Err(err) => println!("{}", err.to_string().red()),
                    }
                }
                ChatCommand::Save => {
                    store.save(session.form())?;
                    println!("{}", "User information saved!".green());
                }
                ChatCommand::Reset => {
                    if ask_confirmation("Forget the conversation so far?", false)? {
                        session.reset();
                        println!("{}", "Conversation cleared.".yellow());
                    }
                }
                ChatCommand::Export(path) => {
                    if let Err(err) = export_transcript(session, &path) {
                        println!("{}", format!("Export failed: {err:#}").red());
                    }
                }
                ChatCommand::Invalid(reason) => println!("{}", reason.yellow()),
                ChatCommand::Query(query) => self.submit(session, &query).await?,
            }
        }
        Ok(())
    }

    /// Validation failures are shown and the session carries on.
    async fn submit(&self, session: &mut ChatSession, query: &str) -> Result<()> {
        eprintln!("{}", "Thinking...".dimmed());
        match session.submit(query).await {
            Ok(TurnOutcome::Answered(message)) => {
                println!("{} {}", "Assistant:".green().bold(), message.content);
            }
            Ok(TurnOutcome::Failed { message, .. }) => {
                println!("{} {}", "Assistant:".red().bold(), message.content.red());
            }
            Err(err) => println!("{}", err.to_string().yellow()),
        }
        Ok(())
    }

    async fn handle_analyze(&self, document: &Path, export: Option<&Path>) -> Result<()> {
        if !is_supported_document(document) {
            println!(
                "{}",
                format!("Error: '{}' is not a PDF file.", document.display()).red()
            );
            return Ok(());
        }
        let bytes = std::fs::read(document)
            .with_context(|| format!("Failed to read {:?}", document))?;

        let service = AnalysisService::new(
            Arc::new(PdfTextExtractor::new()),
            self.config.completion_client()?,
            self.config.model(),
        )
        .with_max_tokens(Some(self.config.analysis_max_tokens));

        eprintln!("{}", "Extracting text and analyzing...".dimmed());
        match service.analyze(&bytes).await {
            Ok(result) => {
                println!("{}", "Analysis Result:".green().bold());
                println!("{}", result.recommendation);
                if let Some(path) = export {
                    write_analysis(path, &result)?;
                    println!("{}", format!("Saved to {}", path.display()).green());
                }
            }
            Err(err) => println!("{}", format!("Error analyzing PDF: {err}").red()),
        }
        Ok(())
    }
}

fn export_transcript(session: &ChatSession, path: &Path) -> Result<()> {
    let format = write_transcript(path, session.transcript())?;
    println!(
        "{}",
        format!("Transcript written to {} ({format:?})", path.display()).green()
    );
    Ok(())
}

fn print_profile(session: &ChatSession) {
    println!("{}", "Your Information".bold());
    for field in session.form().schema().fields() {
        if let Ok(value) = session.form().get(&field.name) {
            println!("  {}: {}", field.label.cyan(), value);
        }
    }
    if let Some(bmi) = session.bmi() {
        println!("  {}", bmi.to_string().blue());
    }
}

fn edit_form(form: &mut FormState) -> Result<()> {
    let fields: Vec<FormField> = form.schema().fields().to_vec();
    for field in &fields {
        let current = form.get(&field.name)?.clone();
        let value = prompt_field(field, &current)?;
        form.set(&field.name, value)?;
    }
    Ok(())
}

fn prompt_field(field: &FormField, current: &FieldValue) -> Result<FieldValue> {
    let theme = ColorfulTheme::default();
    let value = match &field.kind {
        FieldKind::SingleChoice { options } => {
            let selected = match current {
                FieldValue::Text(text) => options.iter().position(|o| o == text).unwrap_or(0),
                _ => 0,
            };
            let index = Select::with_theme(&theme)
                .with_prompt(&field.label)
                .items(options)
                .default(selected)
                .interact()?;
            FieldValue::Text(options[index].clone())
        }
        FieldKind::MultiChoice { options } => {
            let defaults: Vec<bool> = options
                .iter()
                .map(|o| matches!(current, FieldValue::Choices(c) if c.contains(o)))
                .collect();
            let picked = MultiSelect::with_theme(&theme)
                .with_prompt(&field.label)
                .items(options)
                .defaults(&defaults)
                .interact()?;
            FieldValue::Choices(picked.into_iter().map(|i| options[i].clone()).collect())
        }
        FieldKind::Number { .. } | FieldKind::FreeText => {
            let raw: String = Input::with_theme(&theme)
                .with_prompt(&field.label)
                .with_initial_text(current.to_string())
                .validate_with(|input: &String| -> std::result::Result<(), String> {
                    field
                        .parse(input)
                        .and_then(|value| field.check(&value))
                        .map_err(|err| err.to_string())
                })
                .interact_text()?;
            field.parse(&raw)?
        }
    };
    Ok(value)
}

/// One line per field with its accepted values.
pub fn describe_schema(schema: &FormSchema) -> Vec<String> {
    schema
        .fields()
        .iter()
        .map(|field| match &field.kind {
            FieldKind::Number { min, max } => format!("{} ({min}-{max})", field.name),
            FieldKind::SingleChoice { options } => {
                format!("{} (one of: {})", field.name, options.join(" | "))
            }
            FieldKind::MultiChoice { options } => {
                format!("{} (any of: {})", field.name, options.join(" | "))
            }
            FieldKind::FreeText => format!("{} (text)", field.name),
        })
        .collect()
}
