//! Rules: a condition element, a list of actions and a selection weight.

use crate::action::{Action, ActionContext};
use crate::element::{Element, ElementMatch};
use crate::error::{Error, Result};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Namespace used when a rule does not name one
pub const DEFAULT_NAMESPACE: &str = "_";

/// Weight given to rules that do not set one
pub const DEFAULT_WEIGHT: f64 = 1.0;

const ID_PREFIX: &str = "r-";

static NEXT_RULE_ID: AtomicU64 = AtomicU64::new(1);

/// Next process-wide rule id: r-1, r-2, ...
pub fn next_rule_id() -> String {
    let n = NEXT_RULE_ID.fetch_add(1, Ordering::Relaxed);
    format!("{}{}", ID_PREFIX, n)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    id: String,
    namespace: String,
    conditions: Element,
    actions: Vec<Action>,
    weight: f64,
}

impl Rule {
    pub fn new(conditions: impl Into<Element>, actions: Vec<Action>) -> Self {
        Self {
            id: next_rule_id(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            conditions: conditions.into(),
            actions,
            weight: DEFAULT_WEIGHT,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Place the rule in a namespace; an empty name means the default one.
    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = if namespace.is_empty() {
            DEFAULT_NAMESPACE.to_string()
        } else {
            namespace.to_string()
        };
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Result<Self> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(Error::InvalidWeight(weight));
        }
        self.weight = weight;
        Ok(self)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn conditions(&self) -> &Element {
        &self.conditions
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Test the rule's conditions against a knowledge element.
    pub fn matches(&self, knowledge: &Element) -> Option<ElementMatch> {
        let m = knowledge.matches(&self.conditions);
        debug!(
            "Rule {} vs {}: score {}",
            self.id,
            knowledge,
            m.as_ref().map(|m| m.score).unwrap_or(0.0)
        );
        m
    }

    /// Run every action in order, stopping at the first failure.
    pub fn execute(&self, ctx: &mut ActionContext<'_>) -> Result<()> {
        for action in &self.actions {
            action.apply(ctx)?;
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: Vec<String> = self.actions.iter().map(|a| a.to_string()).collect();
        write!(
            f,
            "Rule[{}]:conditions=[{}], actions=[{}], weight={}",
            self.id,
            self.conditions,
            actions.join(", "),
            self.weight
        )
    }
}
