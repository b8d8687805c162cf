//! Tests for loading rule bases and facts from disk.

use owlmind::loader::{load_facts, load_rules, save_facts};
use owlmind::{Element, Scope, Strategy, Value};
use std::fs;
use tempfile::tempdir;

const PROVIDER_TOML: &str = r#"
[[rule]]
id = "provider-openai"
namespace = "f_provider"
conditions = { h_host = "*openai*" }
actions = [["provider", "openai"]]

[[rule]]
id = "provider-any"
namespace = "f_provider"
weight = 0.5
conditions = { h_host = "*" }
actions = [["provider", "unknown"]]
"#;

const MODEL_JSON: &str = r#"{
  "rule": [
    {
      "id": "model",
      "namespace": "f_model",
      "conditions": { "provider": "openai", "h_body": "model=$*$/@model" },
      "actions": [["model", "$h_body/model"], {"@last_model": "$h_body/model"}]
    }
  ]
}"#;

#[test]
fn test_load_single_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("provider.toml");
    fs::write(&path, PROVIDER_TOML).unwrap();

    let base = load_rules(&path).unwrap();
    assert_eq!(base.len(), 2);
    assert_eq!(base.get("provider-any").unwrap().weight(), 0.5);

    let session = Element::from([("h_host", "api.openai.com")]);
    let sel = base.select_default(&session, &Scope::from("f_provider"), Strategy::BestMatches);
    assert_eq!(sel.rule().unwrap().id(), "provider-openai");
}

#[test]
fn test_load_directory_skips_other_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a_provider.toml"), PROVIDER_TOML).unwrap();
    fs::write(dir.path().join("b_model.json"), MODEL_JSON).unwrap();
    fs::write(dir.path().join("README.md"), "not rules").unwrap();

    let base = load_rules(dir.path()).unwrap();
    assert_eq!(base.len(), 3);
    let names: Vec<&str> = base.namespaces().collect();
    assert_eq!(names, vec!["f_model", "f_provider"]);
}

#[test]
fn test_invalid_file_reports_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[[rule]\nconditions = ").unwrap();
    let err = load_rules(&path).unwrap_err();
    assert!(matches!(err, owlmind::Error::Toml(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let err = load_rules(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, owlmind::Error::Io(_)));
}

#[test]
fn test_facts_round_trip_keeps_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("belief.json");

    let mut facts = Element::new();
    facts.set("user", "ana");
    facts.set("visits", 3);
    facts.set("score", 0.5);
    save_facts(&path, &facts).unwrap();

    let loaded = load_facts(&path).unwrap();
    assert_eq!(loaded, facts);
    assert_eq!(loaded.get("visits"), Some(&Value::Int(3)));
}

#[test]
fn test_load_toml_facts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.toml");
    fs::write(&path, "h_host = \"api.openai.com\"\nport = 443\n").unwrap();

    let facts = load_facts(&path).unwrap();
    assert_eq!(facts.get("port"), Some(&Value::Int(443)));
    assert_eq!(facts.get("h_host"), Some(&Value::from("api.openai.com")));
}
