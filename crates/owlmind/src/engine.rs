//! Forward-chaining engine.
//!
//! Fires one rule per namespace, in the order given: select against the
//! session, commit the winner's captures into the session, then run its
//! actions with the session as immediate memory and the belief as long-term
//! memory. Later namespaces see what earlier ones wrote.

use crate::action::ActionContext;
use crate::artifacts::Artifacts;
use crate::element::Element;
use crate::error::Result;
use crate::rule_base::{RuleBase, Scope, Strategy};
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

/// Record of a rule that fired.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Firing {
    pub rule_id: String,
    pub namespace: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    base: RuleBase,
    strategy: Strategy,
    default_key: Option<String>,
}

impl Engine {
    pub fn new(base: RuleBase) -> Self {
        Self {
            base,
            strategy: Strategy::default(),
            default_key: None,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Key that bare-value actions assign to.
    pub fn with_default_key(mut self, key: impl Into<String>) -> Self {
        self.default_key = Some(key.into());
        self
    }

    pub fn base(&self) -> &RuleBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut RuleBase {
        &mut self.base
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Fire at most one rule from `namespace`.
    pub fn fire<R: Rng + ?Sized>(
        &self,
        namespace: &str,
        session: &mut Element,
        belief: Option<&mut Element>,
        artifacts: &mut dyn Artifacts,
        rng: &mut R,
    ) -> Result<Option<Firing>> {
        let selection = self
            .base
            .select(session, &Scope::from(namespace), self.strategy, rng);

        let Some(best) = selection.best.as_ref() else {
            debug!("No rule matched in namespace {}", namespace);
            return Ok(None);
        };

        selection.commit(session);

        let mut ctx = ActionContext::new(session).with_artifacts(artifacts);
        ctx.long = belief;
        if let Some(key) = self.default_key.as_deref() {
            ctx = ctx.with_default_key(key);
        }
        best.rule.execute(&mut ctx)?;

        let firing = Firing {
            rule_id: best.rule.id().to_string(),
            namespace: namespace.to_string(),
            score: best.score,
        };
        info!(
            "Fired {} in {} (score {:.2})",
            firing.rule_id, firing.namespace, firing.score
        );
        Ok(Some(firing))
    }

    /// Fire each namespace in turn.
    pub fn run<S, R>(
        &self,
        namespaces: &[S],
        session: &mut Element,
        mut belief: Option<&mut Element>,
        artifacts: &mut dyn Artifacts,
        rng: &mut R,
    ) -> Result<Vec<Firing>>
    where
        S: AsRef<str>,
        R: Rng + ?Sized,
    {
        let mut firings = Vec::new();
        for ns in namespaces {
            if let Some(firing) =
                self.fire(ns.as_ref(), session, belief.as_deref_mut(), artifacts, rng)?
            {
                firings.push(firing);
            }
        }
        Ok(firings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::artifacts::NoArtifacts;
    use crate::rule::Rule;
    use crate::value::Value;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_fire_without_match() {
        let engine = Engine::new(RuleBase::new());
        let mut session = Element::from([("a", "x")]);
        let mut rng = StdRng::seed_from_u64(0);
        let fired = engine
            .fire("ns", &mut session, None, &mut NoArtifacts, &mut rng)
            .unwrap();
        assert!(fired.is_none());
    }

    #[test]
    fn test_default_key_used_for_bare_values() {
        let mut base = RuleBase::new();
        base += Rule::new([("greeting", "hello*")], vec![Action::from_single("hi there".into())])
            .in_namespace("reply");
        let engine = Engine::new(base).with_default_key("response");

        let mut session = Element::from([("greeting", "hello owl")]);
        let mut rng = StdRng::seed_from_u64(0);
        engine
            .run(&["reply"], &mut session, None, &mut NoArtifacts, &mut rng)
            .unwrap();
        assert_eq!(session.get("response"), Some(&Value::from("hi there")));
    }
}
