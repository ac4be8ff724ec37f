use chrono::NaiveDate;
use hsmoa_lib::schedule::extract_schedule_items;
use hsmoa_lib::types::ScheduleDocument;
use hsmoa_lib::ScheduleReport;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("CLI crate should be inside workspace")
        .to_path_buf()
}

fn load_fixture(name: &str) -> Value {
    let path = workspace_root().join("hsmoa_api/tests/fixtures").join(name);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read fixture {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("fixture is valid JSON")
}

fn load_schema() -> Value {
    let path = workspace_root().join("schema/schedule.schema.json");
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("read schema {}: {}", path.display(), e));
    serde_json::from_str(&text).expect("schema is valid JSON")
}

fn report_for(date: NaiveDate) -> Value {
    let doc = ScheduleDocument::from_value(&load_fixture("schedule_document.json"))
        .expect("fixture is a schedule document");
    let items = extract_schedule_items(&doc, date);
    let collected_at = date.and_hms_opt(7, 15, 30).unwrap();
    serde_json::to_value(ScheduleReport::new(date, items, collected_at)).unwrap()
}

fn target() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 25).unwrap()
}

// ---------------------------------------------------------------------------
// Positive validation: exported reports conform to the schema
// ---------------------------------------------------------------------------

#[test]
fn test_report_conforms_to_schema() {
    let schema = load_schema();
    let data = report_for(target());
    assert_eq!(data["total_count"], 4);

    let validator = jsonschema::draft202012::new(&schema).expect("schedule schema compiles");
    if let Err(e) = validator.validate(&data) {
        panic!("report failed validation: {e}");
    }
}

#[test]
fn test_fallback_report_conforms_to_schema() {
    let schema = load_schema();
    let data = report_for(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap());
    assert_eq!(data["total_count"], 5);

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(validator.validate(&data).is_ok());
}

#[test]
fn test_empty_report_conforms_to_schema() {
    let schema = load_schema();
    let date = target();
    let report = ScheduleReport::new(date, Vec::new(), date.and_hms_opt(0, 0, 0).unwrap());
    let data = serde_json::to_value(report).unwrap();

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(validator.validate(&data).is_ok());
}

// ---------------------------------------------------------------------------
// Negative validation: the schema rejects malformed reports
// ---------------------------------------------------------------------------

#[test]
fn test_schema_rejects_missing_item_field() {
    let schema = load_schema();
    let mut data = report_for(target());
    data["items"][0]
        .as_object_mut()
        .expect("item is an object")
        .remove("product_name");

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&data).is_err(),
        "schema should reject item missing product_name"
    );
}

#[test]
fn test_schema_rejects_null_defaults() {
    let schema = load_schema();
    let mut data = report_for(target());
    data["items"][0]["brand"] = Value::Null;

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&data).is_err(),
        "schema should reject null in place of an empty default"
    );
}

#[test]
fn test_schema_rejects_unformatted_timestamp() {
    let schema = load_schema();
    let mut data = report_for(target());
    data["items"][0]["start_time"] = Value::String("2026-02-25T09:00:00+09:00".into());

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(validator.validate(&data).is_err());
}

#[test]
fn test_schema_rejects_additional_properties() {
    let schema = load_schema();
    let mut data = report_for(target());
    data["items"][0]
        .as_object_mut()
        .expect("item is an object")
        .insert("bogusField".to_string(), Value::Number(123.into()));

    let validator = jsonschema::draft202012::new(&schema).expect("schema compiles");
    assert!(
        validator.validate(&data).is_err(),
        "schema should reject additional properties"
    );
}
