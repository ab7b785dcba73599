use application::retry::RetryPolicy;
use application::session_service::{ChatSession, SessionSettings, TurnOutcome, TurnState};
use domain::error::{CompletionError, TurnError};
use domain::form::FormState;
use domain::memory::{MessageKind, RetentionPolicy, Role};
use domain::profiles::Profile;
use infrastructure::config::Config;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tests::ScriptedClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn standard_session(client: Arc<ScriptedClient>) -> ChatSession {
    let profile = Profile::Standard;
    let form = FormState::new(Arc::new(profile.schema().unwrap()));
    let settings = SessionSettings {
        retry: RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::ZERO,
            multiplier: 2,
        },
        ..SessionSettings::new("llama2")
    };
    ChatSession::new(profile.template(), form, client, settings)
}

fn config_for(server: &MockServer, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("LLM_BACKEND".to_string(), "ollama".to_string()),
        ("OLLAMA_BASE_URL".to_string(), server.uri()),
        ("OLLAMA_MODEL".to_string(), "llama2".to_string()),
        ("RETRY_BACKOFF_MS".to_string(), "0".to_string()),
    ]);
    for (key, value) in extra {
        vars.insert(key.to_string(), value.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned())
}

fn session_from_config(config: &Config, profile: Profile) -> ChatSession {
    let settings = SessionSettings {
        model: config.model().to_string(),
        max_tokens: config.max_output_tokens,
        retry: RetryPolicy {
            max_attempts: config.retry_attempts,
            initial_backoff: config.retry_backoff,
            ..RetryPolicy::default()
        },
        retention: config.retention(),
    };
    let form = FormState::new(Arc::new(profile.schema().unwrap()));
    ChatSession::new(
        profile.template(),
        form,
        config.completion_client().unwrap(),
        settings,
    )
}

#[tokio::test]
async fn breakfast_question_with_default_profile() {
    let client = ScriptedClient::new(vec![Ok("Oatmeal with fruit".into())]);
    let mut session = standard_session(client.clone());

    let outcome = session
        .submit("What should I eat for breakfast?")
        .await
        .unwrap();
    assert!(matches!(outcome, TurnOutcome::Answered(_)));

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let prompt = &requests[0].prompt;
    assert!(prompt.contains("Age: 30"));
    assert!(prompt.contains("Previous conversation context:\n\n"));
    assert!(prompt.contains("User Query: What should I eat for breakfast?"));

    let transcript = session.transcript();
    assert_eq!(transcript.len(), 2);
    assert_eq!(
        (transcript[0].role, transcript[0].content.as_str()),
        (Role::User, "What should I eat for breakfast?")
    );
    assert_eq!(
        (transcript[1].role, transcript[1].content.as_str()),
        (Role::Assistant, "Oatmeal with fruit")
    );
}

#[tokio::test]
async fn indian_profile_renders_multi_choice_fields() {
    let client = ScriptedClient::new(vec![Ok("Try moong dal chilla".into())]);
    let profile = Profile::Indian;
    let mut form = FormState::new(Arc::new(profile.schema().unwrap()));
    form.set_from_str("health_issues", "Diabetes, Thyroid").unwrap();
    form.set_from_str("dietary_preferences", "Vegetarian,Jain").unwrap();
    let mut session = ChatSession::new(
        profile.template(),
        form,
        client.clone(),
        SessionSettings::new("llama2"),
    );

    session.submit("Suggest a breakfast").await.unwrap();

    let prompt = &client.requests()[0].prompt;
    assert!(prompt.contains("Health Issues: Diabetes, Thyroid"));
    assert!(prompt.contains("Dietary Preferences: Vegetarian, Jain"));
    assert!(prompt.contains("User Question: Suggest a breakfast"));
}

#[tokio::test]
async fn failed_turn_is_shown_but_not_resent() {
    let client = ScriptedClient::new(vec![
        Err(CompletionError::Model("model not found".into())),
        Ok("Eggs".into()),
    ]);
    let mut session = standard_session(client.clone());

    let outcome = session.submit("Breakfast?").await.unwrap();
    let TurnOutcome::Failed { error, message } = outcome else {
        panic!("expected a failed turn");
    };
    assert!(!error.is_retryable());
    assert_eq!(message.kind, MessageKind::Error);
    assert_eq!(session.state(), TurnState::Idle);

    session.submit("Breakfast again?").await.unwrap();
    let second = &client.requests()[1].prompt;
    assert!(second.contains("user: Breakfast?"));
    assert!(!second.contains("model not found"));
    assert_eq!(session.transcript().len(), 4);
}

#[tokio::test]
async fn sessions_do_not_share_history() {
    let client = ScriptedClient::new(vec![Ok("A".into()), Ok("B".into())]);
    let mut alice = standard_session(client.clone());
    let mut bob = standard_session(client.clone());

    alice.submit("Alice's question").await.unwrap();
    bob.submit("Bob's question").await.unwrap();

    assert_ne!(alice.id(), bob.id());
    assert!(!client.requests()[1].prompt.contains("Alice's question"));
    assert_eq!(bob.transcript().len(), 2);
}

#[tokio::test]
async fn rejected_input_records_nothing() {
    let client = ScriptedClient::new(vec![]);
    let mut session = standard_session(client.clone());
    assert!(session.form_mut().set_from_str("age", "150").is_err());

    assert_eq!(session.submit("   ").await, Err(TurnError::EmptyQuery));
    assert!(client.requests().is_empty());
    assert!(session.transcript().is_empty());
}

#[tokio::test]
async fn chat_through_ollama_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama2",
            "message": { "role": "assistant", "content": "Poha with peanuts" },
            "done": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server, &[]);
    let mut session = session_from_config(&config, Profile::Standard);
    let outcome = session.submit("Breakfast?").await.unwrap();

    assert_eq!(outcome.message().content, "Poha with peanuts");
    assert_eq!(outcome.message().role, Role::Assistant);
}

#[tokio::test]
async fn retries_server_errors_then_records_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_string("loading model"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": { "role": "assistant", "content": "Idli" },
            "done": true
        })))
        .mount(&server)
        .await;

    let config = config_for(&server, &[("RETRY_ATTEMPTS", "3")]);
    let mut session = session_from_config(&config, Profile::Indian);
    let outcome = session.submit("Breakfast?").await.unwrap();

    assert_eq!(outcome.message().content, "Idli");
    assert_eq!(session.transcript().len(), 2);
}

#[tokio::test]
async fn single_attempt_config_reports_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server, &[("RETRY_ATTEMPTS", "1")]);
    let mut session = session_from_config(&config, Profile::Standard);
    let outcome = session.submit("Breakfast?").await.unwrap();

    match outcome {
        TurnOutcome::Failed { error, .. } => assert!(error.is_retryable()),
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn retention_drops_oldest_turns_from_prompt() {
    let client = ScriptedClient::new(vec![Ok("r1".into()), Ok("r2".into()), Ok("r3".into())]);
    let profile = Profile::Standard;
    let settings = SessionSettings {
        retention: RetentionPolicy::LastTurns(1),
        ..SessionSettings::new("llama2")
    };
    let mut session = ChatSession::new(
        profile.template(),
        FormState::new(Arc::new(profile.schema().unwrap())),
        client.clone(),
        settings,
    );

    session.submit("first").await.unwrap();
    session.submit("second").await.unwrap();
    session.submit("third").await.unwrap();

    let last = &client.requests()[2].prompt;
    assert!(!last.contains("user: first"));
    assert!(last.contains("user: second"));
}
