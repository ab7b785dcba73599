use domain::form::{FieldValue, FormState};
use domain::profiles::Profile;
use infrastructure::form_store::{load_schema, JsonFormStore};
use std::fs;
use std::sync::Arc;

#[test]
fn saved_profile_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonFormStore::new(dir.path().join("user_data.json"));
    let schema = Arc::new(Profile::Indian.schema().unwrap());

    let mut form = FormState::new(Arc::clone(&schema));
    form.set_from_str("age", "42").unwrap();
    form.set_from_str("health_issues", "Diabetes, Hypertension").unwrap();
    form.set_from_str("goals", "Blood Sugar Management").unwrap();
    store.save(&form).unwrap();

    let restored = store.load(schema);
    assert_eq!(restored.get("age").unwrap(), &FieldValue::Number(42.0));
    assert_eq!(
        restored.get("health_issues").unwrap(),
        &FieldValue::Choices(vec!["Diabetes".into(), "Hypertension".into()])
    );
    assert_eq!(restored.template_fields(), form.template_fields());
}

#[test]
fn stored_values_are_plain_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("profile.json");
    let store = JsonFormStore::new(&path);
    let mut form = FormState::new(Arc::new(Profile::Standard.schema().unwrap()));
    form.set_from_str("weight", "72.5").unwrap();
    store.save(&form).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["age"], 30);
    assert_eq!(value["weight"], 72.5);
    assert_eq!(value["activity_level"], "Moderate");
}

#[test]
fn out_of_range_saved_values_fall_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("user_data.json");
    fs::write(&path, r#"{"age": 500, "goals": "Run a marathon"}"#).unwrap();

    let form = JsonFormStore::new(&path).load(Arc::new(Profile::Standard.schema().unwrap()));
    assert_eq!(form.number("age"), Some(30.0));
    assert_eq!(
        form.get("goals").unwrap(),
        &FieldValue::Text("Run a marathon".into())
    );
    assert!(form.validate().is_ok());
}

#[test]
fn custom_schema_validates_choices() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.json");
    fs::write(
        &path,
        r#"[
            {"name": "age", "label": "Age", "kind": "number", "min": 1, "max": 120, "default": 30},
            {"name": "cuisine", "label": "Cuisine", "kind": "single_choice",
             "options": ["Thai", "Italian"], "default": "Thai"}
        ]"#,
    )
    .unwrap();

    let schema = load_schema(&path).unwrap();
    let mut form = FormState::new(Arc::new(schema));
    assert!(form.set_from_str("cuisine", "Mexican").is_err());
    form.set_from_str("cuisine", "Italian").unwrap();
    assert_eq!(form.template_fields()["cuisine"], "Italian");
}

#[test]
fn malformed_schema_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.json");
    fs::write(&path, "[]").unwrap();
    assert!(load_schema(&path).is_err());
}
