//! The chat session: form state and conversation memory wired through a
//! prompt template into a completion backend, one turn at a time.
//!
//! A turn moves `Idle -> AwaitingInput -> Rendering -> AwaitingCompletion ->
//! Recorded -> Idle`. Local validation failures return to `Idle` with nothing
//! recorded. Once rendering succeeds the user message is appended, followed
//! by exactly one assistant message: the reply, or an error message when the
//! backend rejects the request or transient failures exhaust the retry policy.
//! `submit` borrows the session mutably, so there is never more than one
//! completion in flight and the form cannot change under it.

use crate::retry::RetryPolicy;
use domain::bmi::{self, BmiAssessment};
use domain::completion::{CompletionClient, CompletionRequest};
use domain::error::{CompletionError, TemplateError, TurnError};
use domain::form::FormState;
use domain::memory::{ConversationMemory, Message, RetentionPolicy, Role};
use domain::profiles::{CHAT_HISTORY_FIELD, USER_INPUT_FIELD};
use domain::template::PromptTemplate;
use shared::telemetry::Telemetry;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    Idle,
    AwaitingInput,
    Rendering,
    AwaitingCompletion { attempt: u32 },
    Recorded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    Answered(Message),
    /// The backend failed; `message` is the error entry shown in the transcript.
    Failed {
        error: CompletionError,
        message: Message,
    },
}

impl TurnOutcome {
    pub fn message(&self) -> &Message {
        match self {
            TurnOutcome::Answered(message) => message,
            TurnOutcome::Failed { message, .. } => message,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub model: String,
    pub max_tokens: Option<u32>,
    pub retry: RetryPolicy,
    pub retention: RetentionPolicy,
}

impl SessionSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: None,
            retry: RetryPolicy::default(),
            retention: RetentionPolicy::default(),
        }
    }
}

pub struct ChatSession {
    id: Uuid,
    template: PromptTemplate,
    form: FormState,
    memory: ConversationMemory,
    client: Arc<dyn CompletionClient>,
    settings: SessionSettings,
    state: TurnState,
}

impl ChatSession {
    pub fn new(
        template: PromptTemplate,
        form: FormState,
        client: Arc<dyn CompletionClient>,
        settings: SessionSettings,
    ) -> Self {
        let id = Uuid::new_v4();
        debug!(session = %id, backend = client.backend(), model = %settings.model, "session created");
        Self {
            id,
            template,
            form,
            memory: ConversationMemory::with_retention(settings.retention),
            client,
            settings,
            state: TurnState::Idle,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Messages as displayed to the user.
    pub fn transcript(&self) -> &[Message] {
        self.memory.messages()
    }

    pub fn reset(&mut self) {
        info!(session = %self.id, turns = self.memory.turns(), "conversation reset");
        self.memory.clear();
    }

    pub fn bmi(&self) -> Option<BmiAssessment> {
        bmi::assess(self.form.number("weight")?, self.form.number("height")?)
    }

    /// The prompt the next turn would send for `query`.
    pub fn prompt_for(&self, query: &str) -> Result<String, TemplateError> {
        let mut fields = self.form.template_fields();
        fields.insert(CHAT_HISTORY_FIELD.to_string(), self.memory.render());
        fields.insert(USER_INPUT_FIELD.to_string(), query.to_string());
        self.template.render(&fields)
    }

    pub async fn submit(&mut self, query: &str) -> Result<TurnOutcome, TurnError> {
        let telemetry = Telemetry::new();
        self.transition(TurnState::AwaitingInput);

        if query.trim().is_empty() {
            self.transition(TurnState::Idle);
            return Err(TurnError::EmptyQuery);
        }
        if let Err(err) = self.form.validate() {
            self.transition(TurnState::Idle);
            return Err(err.into());
        }

        self.transition(TurnState::Rendering);
        let prompt = match self.prompt_for(query) {
            Ok(prompt) => prompt,
            Err(err) => {
                self.transition(TurnState::Idle);
                return Err(err.into());
            }
        };

        self.memory.append(Role::User, query);
        let request = CompletionRequest::new(self.settings.model.clone(), prompt)
            .with_max_tokens(self.settings.max_tokens);

        let outcome = match self.complete_with_retry(&request).await {
            Ok(reply) => {
                let message = self.memory.append(Role::Assistant, reply).clone();
                self.transition(TurnState::Recorded);
                info!(
                    session = %self.id,
                    turn = self.memory.turns(),
                    elapsed_ms = telemetry.elapsed_ms(),
                    "turn completed"
                );
                TurnOutcome::Answered(message)
            }
            Err(error) => {
                warn!(session = %self.id, error = %error, "turn failed");
                let message = self.memory.append_error(error.to_string()).clone();
                TurnOutcome::Failed { error, message }
            }
        };

        self.transition(TurnState::Idle);
        Ok(outcome)
    }

    async fn complete_with_retry(
        &mut self,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        let max_attempts = self.settings.retry.attempts();
        let mut attempt = 1;
        loop {
            self.transition(TurnState::AwaitingCompletion { attempt });
            match self.client.complete(request).await {
                Ok(reply) => return Ok(reply),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = self.settings.retry.backoff_after(attempt);
                    warn!(
                        session = %self.id,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying completion"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn transition(&mut self, next: TurnState) {
        debug!(session = %self.id, from = ?self.state, to = ?next, "turn state");
        self.state = next;
    }
}
