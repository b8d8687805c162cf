//! Tests for forward chaining across namespaces.

use owlmind::{
    Action, ArtifactRegistry, Element, Engine, NoArtifacts, Rule, RuleBase, Strategy, Value,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};

fn provider_rules() -> RuleBase {
    let mut rb = RuleBase::new();
    rb += Rule::new([("h_host", "*openai*")], vec![Action::assign("provider", "openai")])
        .with_id("provider")
        .in_namespace("f_provider");
    rb += Rule::new(
        [("provider", "openai"), ("h_body", "model=$*$/@model")],
        vec![Action::assign("model", "$h_body/model")],
    )
    .with_id("model")
    .in_namespace("f_model");
    rb
}

fn request() -> Element {
    Element::from([
        ("h_host", "api.openai.com"),
        ("h_method", "/api/chat"),
        ("h_body", "string model=llama3.2 string"),
    ])
}

#[test]
fn test_chained_namespaces_extract_model() {
    let engine = Engine::new(provider_rules()).with_strategy(Strategy::AllMatches);
    let mut session = request();
    let mut belief = Element::new();
    let mut rng = StdRng::seed_from_u64(0);

    let firings = engine
        .run(
            &["f_provider", "f_model"],
            &mut session,
            Some(&mut belief),
            &mut NoArtifacts,
            &mut rng,
        )
        .unwrap();

    let ids: Vec<&str> = firings.iter().map(|f| f.rule_id.as_str()).collect();
    assert_eq!(ids, vec!["provider", "model"]);
    assert_eq!(session.get("provider"), Some(&Value::from("openai")));
    assert_eq!(session.get("h_body/model"), Some(&Value::from("llama3.2")));
    assert_eq!(session.get("model"), Some(&Value::from("llama3.2")));
    assert!(belief.is_empty());
}

#[test]
fn test_order_matters() {
    let engine = Engine::new(provider_rules());
    let mut session = request();
    let mut rng = StdRng::seed_from_u64(0);

    // f_model needs the provider fact first
    let firings = engine
        .run(&["f_model", "f_provider"], &mut session, None, &mut NoArtifacts, &mut rng)
        .unwrap();
    assert_eq!(firings.len(), 1);
    assert!(!session.contains("model"));
}

#[test]
fn test_existing_belief_keys_are_updated() {
    let engine = Engine::new(provider_rules());
    let mut session = request();
    let mut belief = Element::from([("model", "unknown")]);
    let mut rng = StdRng::seed_from_u64(0);

    engine
        .run(
            &["f_provider", "f_model"],
            &mut session,
            Some(&mut belief),
            &mut NoArtifacts,
            &mut rng,
        )
        .unwrap();

    assert_eq!(belief.get("model"), Some(&Value::from("llama3.2")));
    assert!(!session.contains("model"));
}

#[test]
fn test_artifacts_are_invoked() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&calls);

    let mut registry = ArtifactRegistry::new();
    registry.register("route", move |params| {
        recorded
            .lock()
            .unwrap()
            .push(params.cloned().unwrap_or_default());
        Ok(Some(Value::from("routed")))
    });

    let mut rb = provider_rules();
    rb += Rule::new(
        [("provider", "openai")],
        vec![Action::from_pair("!route", Value::from("$provider"))],
    )
    .in_namespace("f_route");
    let engine = Engine::new(rb);

    let mut session = request();
    let mut rng = StdRng::seed_from_u64(0);
    engine
        .run(
            &["f_provider", "f_route"],
            &mut session,
            None,
            &mut registry,
            &mut rng,
        )
        .unwrap();

    assert_eq!(*calls.lock().unwrap(), vec![Value::from("openai")]);
    assert_eq!(session.get("route"), Some(&Value::from("routed")));
}

#[test]
fn test_unknown_artifact_fails_run() {
    let mut rb = RuleBase::new();
    rb += Rule::new([("h_host", "*")], vec![Action::invoke("missing", None)]).in_namespace("x");
    let engine = Engine::new(rb);

    let mut session = request();
    let mut registry = ArtifactRegistry::new();
    let mut rng = StdRng::seed_from_u64(0);
    let err = engine
        .run(&["x"], &mut session, None, &mut registry, &mut rng)
        .unwrap_err();
    assert!(matches!(err, owlmind::Error::UnknownArtifact(_)));
}
