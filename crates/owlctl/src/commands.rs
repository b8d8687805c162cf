//! Command implementations. Each returns the process exit code.

use crate::cli::QueryArgs;
use crate::config::OwlConfig;
use crate::errors::{EXIT_INVALID_RULES, EXIT_NO_MATCH, EXIT_SUCCESS};
use crate::output::{display_error, Output};
use anyhow::{Context, Result};
use owlmind::loader::{load_facts, load_rules, save_facts};
use owlmind::{match_value, ArtifactRegistry, Element, Engine, Scope, Value};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use tracing::info;

/// Parse a `key=value` fact; the value is read as a number when it looks like one.
pub fn parse_fact(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("Invalid fact '{}': expected KEY=VALUE", raw))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Invalid fact '{}': empty key", raw);
    }
    Ok((key.to_string(), Value::parse_scalar(value)))
}

/// Session facts: the facts file first, then command-line facts on top.
pub fn build_session(args: &QueryArgs) -> Result<Element> {
    let mut session = match &args.facts_file {
        Some(path) => load_facts(path)
            .with_context(|| format!("Failed to load facts from {}", path.display()))?,
        None => Element::new(),
    };
    for raw in &args.facts {
        let (key, value) = parse_fact(raw)?;
        session.set(key, value);
    }
    Ok(session)
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Artifacts available to rules run from the command line.
pub fn builtin_artifacts() -> ArtifactRegistry {
    let mut registry = ArtifactRegistry::new();
    registry.register("print", |params| {
        if let Some(value) = params {
            match value.as_str() {
                Some(s) => eprintln!("{}", s),
                None => eprintln!("{}", value),
            }
        }
        Ok(None)
    });
    registry.register("log", |params| {
        info!("rule log: {}", params.cloned().unwrap_or_default());
        Ok(None)
    });
    registry
}

pub fn match_pattern(out: &Output, value: &str, pattern: &str, text: bool) -> Result<i32> {
    let (value, pattern) = if text {
        (Value::from(value), Value::from(pattern))
    } else {
        (Value::parse_scalar(value), Value::parse_scalar(pattern))
    };
    let outcome = match_value(&value, &pattern);
    out.show_match(&outcome)?;
    Ok(if outcome.is_match() {
        EXIT_SUCCESS
    } else {
        EXIT_NO_MATCH
    })
}

pub fn check(out: &Output, rules: &Path) -> Result<i32> {
    match load_rules(rules) {
        Ok(base) => {
            out.show_rules(&base)?;
            Ok(EXIT_SUCCESS)
        }
        Err(e) => {
            display_error(&format!("{}: {}", rules.display(), e));
            Ok(EXIT_INVALID_RULES)
        }
    }
}

/// Select among the rules of `namespaces` (every namespace when empty).
pub fn select(
    out: &Output,
    config: &OwlConfig,
    args: &QueryArgs,
    namespaces: &[String],
) -> Result<i32> {
    let base = load_rules(&args.rules)
        .with_context(|| format!("Failed to load rules from {}", args.rules.display()))?;
    let session = build_session(args)?;
    let strategy = args.strategy.unwrap_or(config.engine.strategy);
    let mut rng = rng_for(args.seed.or(config.engine.seed));

    let scope = Scope::from(namespaces.to_vec());
    let selection = base.select(&session, &scope, strategy, &mut rng);
    out.show_selection(&selection)?;

    Ok(if selection.is_match() {
        EXIT_SUCCESS
    } else {
        EXIT_NO_MATCH
    })
}

/// Fire `namespaces` in the order given.
pub fn run(
    out: &Output,
    config: &OwlConfig,
    args: &QueryArgs,
    namespaces: &[String],
    belief_path: Option<&Path>,
    save_belief: bool,
) -> Result<i32> {
    if namespaces.is_empty() {
        anyhow::bail!("run needs at least one namespace (-n), in firing order");
    }
    let base = load_rules(&args.rules)
        .with_context(|| format!("Failed to load rules from {}", args.rules.display()))?;
    let mut session = build_session(args)?;
    let mut belief = match belief_path {
        Some(path) if path.exists() => load_facts(path)
            .with_context(|| format!("Failed to load belief from {}", path.display()))?,
        _ => Element::new(),
    };

    let mut engine =
        Engine::new(base).with_strategy(args.strategy.unwrap_or(config.engine.strategy));
    if let Some(key) = &config.engine.default_key {
        engine = engine.with_default_key(key.clone());
    }

    let mut artifacts = builtin_artifacts();
    let mut rng = rng_for(args.seed.or(config.engine.seed));
    let firings = engine.run(
        namespaces,
        &mut session,
        Some(&mut belief),
        &mut artifacts,
        &mut rng,
    )?;

    if save_belief {
        if let Some(path) = belief_path {
            save_facts(path, &belief)
                .with_context(|| format!("Failed to save belief to {}", path.display()))?;
            info!("Belief saved to {}", path.display());
        }
    }

    out.show_run(&firings, &session, &belief)?;
    Ok(if firings.is_empty() {
        EXIT_NO_MATCH
    } else {
        EXIT_SUCCESS
    })
}
