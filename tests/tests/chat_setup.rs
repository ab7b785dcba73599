use application::session_service::{ChatSession, TurnOutcome};
use domain::form::FieldValue;
use domain::profiles::Profile;
use infrastructure::config::Config;
use presentation::setup::{resolve, session_settings};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tests::ScriptedClient;

const CUISINE_SCHEMA: &str = r#"[
    {"name": "age", "label": "Age", "kind": "number", "min": 1, "max": 120, "default": 30},
    {"name": "cuisine", "label": "Cuisine", "kind": "single_choice",
     "options": ["Thai", "Italian"], "default": "Thai"}
]"#;

fn default_config() -> Config {
    Config::from_lookup(|_| None)
}

fn write(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn custom_schema_and_template_answer_a_question() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = write(dir.path(), "cuisine.json", CUISINE_SCHEMA);
    let template_path = write(
        dir.path(),
        "cuisine.txt",
        "Age: {age}\nCuisine: {cuisine}\nHistory:\n{chat_history}\nQ: {user_input}",
    );

    let setup = resolve(
        Profile::Standard,
        Some(schema_path.as_path()),
        Some(template_path.as_path()),
        &dir.path().join("user_data.json"),
    )
    .unwrap();
    assert_eq!(setup.store.path(), dir.path().join("user_data.cuisine.json"));

    let mut form = setup.store.load(Arc::new(setup.schema));
    form.set_from_str("cuisine", "Italian").unwrap();
    let client = ScriptedClient::new(vec![Ok("Minestrone".into())]);
    let mut session = ChatSession::new(
        setup.template,
        form,
        client.clone(),
        session_settings(&default_config()),
    );

    let outcome = session.submit("Dinner idea?").await.unwrap();
    assert!(matches!(outcome, TurnOutcome::Answered(_)));
    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].prompt,
        "Age: 30\nCuisine: Italian\nHistory:\n\nQ: Dinner idea?"
    );
    assert_eq!(requests[0].model, "llama2");
}

#[test]
fn custom_schema_without_matching_template_is_rejected_up_front() {
    let dir = tempfile::tempdir().unwrap();
    let schema_path = write(dir.path(), "cuisine.json", CUISINE_SCHEMA);

    let err = resolve(
        Profile::Standard,
        Some(schema_path.as_path()),
        None,
        &dir.path().join("user_data.json"),
    )
    .err()
    .unwrap();
    let message = format!("{err:#}");
    assert!(message.contains("--template"));
    assert!(message.contains("activity_level"));
}

#[test]
fn template_naming_unknown_fields_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let template_path = write(dir.path(), "budget.txt", "Budget: {budget}\nQ: {user_input}");

    let err = resolve(
        Profile::Indian,
        None,
        Some(template_path.as_path()),
        &dir.path().join("user_data.json"),
    )
    .err()
    .unwrap();
    assert!(format!("{err:#}").contains("budget"));
}

#[test]
fn saving_one_profile_leaves_the_other_intact() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("user_data.json");

    let indian = resolve(Profile::Indian, None, None, &base).unwrap();
    let indian_schema = Arc::new(indian.schema);
    let mut form = indian.store.load(Arc::clone(&indian_schema));
    form.set_from_str("health_issues", "Diabetes").unwrap();
    form.set_from_str("goals", "Heart Health").unwrap();
    indian.store.save(&form).unwrap();

    let standard = resolve(Profile::Standard, None, None, &base).unwrap();
    let mut standard_form = standard.store.load(Arc::new(standard.schema));
    assert_eq!(standard_form.number("age"), Some(30.0));
    standard_form.set_from_str("goals", "Run a 10k").unwrap();
    standard.store.save(&standard_form).unwrap();

    let reloaded = resolve(Profile::Indian, None, None, &base)
        .unwrap()
        .store
        .load(indian_schema);
    assert_eq!(
        reloaded.get("health_issues").unwrap(),
        &FieldValue::Choices(vec!["Diabetes".into()])
    );
    assert_eq!(
        reloaded.get("goals").unwrap(),
        &FieldValue::Text("Heart Health".into())
    );
}
