//! Rule and fact files.
//!
//! Rule files are TOML or JSON, chosen by extension:
//!
//! ```toml
//! [[rule]]
//! id = "provider-openai"
//! namespace = "f_provider"
//! weight = 1.0
//! conditions = { h_host = "*openai*" }
//! actions = [["provider", "openai"], "!notify", { "@seen" = 1 }]
//! ```
//!
//! A directory loads every `.toml` and `.json` file in it, sorted by name.

use crate::action::Action;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::rule::Rule;
use crate::rule_base::RuleBase;
use crate::value::Value;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RuleFile {
    #[serde(default, rename = "rule", alias = "rules")]
    rules: Vec<RuleSpec>,
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    id: Option<String>,
    namespace: Option<String>,
    weight: Option<f64>,
    #[serde(default)]
    conditions: Element,
    #[serde(default)]
    actions: Vec<ActionSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ActionSpec {
    Seq(Vec<Value>),
    Map(Element),
    Bare(Value),
}

impl ActionSpec {
    fn into_actions(self) -> Result<Vec<Action>> {
        match self {
            ActionSpec::Bare(value) => Ok(vec![Action::from_single(value)]),
            ActionSpec::Map(element) => Ok(element
                .iter()
                .map(|(k, v)| Action::from_pair(k, v.clone()))
                .collect()),
            ActionSpec::Seq(items) => {
                let mut items = items.into_iter();
                match (items.next(), items.next(), items.next()) {
                    (Some(single), None, None) => Ok(vec![Action::from_single(single)]),
                    (Some(Value::Str(key)), Some(value), None) => {
                        Ok(vec![Action::from_pair(&key, value)])
                    }
                    (Some(key), Some(_), None) => Err(Error::InvalidAction(format!(
                        "action key must be a string, got {}",
                        key
                    ))),
                    (None, _, _) => Err(Error::InvalidAction("empty action".to_string())),
                    _ => Err(Error::InvalidAction(
                        "action takes at most two items".to_string(),
                    )),
                }
            }
        }
    }
}

impl RuleSpec {
    fn into_rule(self) -> Result<Rule> {
        let mut actions = Vec::new();
        for spec in self.actions {
            actions.extend(spec.into_actions()?);
        }

        let mut rule = Rule::new(self.conditions, actions);
        if let Some(id) = self.id {
            rule = rule.with_id(id);
        }
        if let Some(ns) = self.namespace {
            rule = rule.in_namespace(&ns);
        }
        if let Some(weight) = self.weight {
            rule = rule.with_weight(weight)?;
        }
        Ok(rule)
    }
}

fn build(file: RuleFile) -> Result<Vec<Rule>> {
    file.rules.into_iter().map(RuleSpec::into_rule).collect()
}

pub fn parse_toml(text: &str) -> Result<Vec<Rule>> {
    build(toml::from_str(text)?)
}

pub fn parse_json(text: &str) -> Result<Vec<Rule>> {
    build(serde_json::from_str(text)?)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

fn format_of(path: &Path) -> Option<Format> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Some(Format::Toml),
        Some("json") => Some(Format::Json),
        _ => None,
    }
}

/// Load rules from one file.
pub fn load_rule_file(path: &Path) -> Result<Vec<Rule>> {
    let format = format_of(path).ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
    let text = fs::read_to_string(path)?;
    let rules = match format {
        Format::Toml => parse_toml(&text)?,
        Format::Json => parse_json(&text)?,
    };
    debug!("Loaded {} rule(s) from {}", rules.len(), path.display());
    Ok(rules)
}

/// Load a rule base from a file or a directory of rule files.
pub fn load_rules(path: &Path) -> Result<RuleBase> {
    let mut base = RuleBase::new();

    if path.is_dir() {
        let mut files: Vec<PathBuf> = fs::read_dir(path)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && format_of(p).is_some())
            .collect();
        files.sort();
        for file in files {
            base.extend(load_rule_file(&file)?);
        }
    } else {
        base.extend(load_rule_file(path)?);
    }

    info!(
        "Rule base ready: {} rule(s) in {} namespace(s)",
        base.len(),
        base.namespaces().count()
    );
    Ok(base)
}

/// Load a flat table of facts from a TOML or JSON file.
pub fn load_facts(path: &Path) -> Result<Element> {
    let format = format_of(path).ok_or_else(|| Error::UnsupportedFormat(path.to_path_buf()))?;
    let text = fs::read_to_string(path)?;
    Ok(match format {
        Format::Toml => toml::from_str(&text)?,
        Format::Json => serde_json::from_str(&text)?,
    })
}

/// Save facts as pretty JSON.
pub fn save_facts(path: &Path, facts: &Element) -> Result<()> {
    let json = serde_json::to_string_pretty(facts)?;
    fs::write(path, json)?;
    Ok(())
}
