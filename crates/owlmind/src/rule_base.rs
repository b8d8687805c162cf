//! Rule base: rules grouped by namespace, and rule selection.
//!
//! Selection scores every rule in scope against a test element and then picks
//! one candidate. Strategies:
//! - `FirstMatch`: stop at the first matching rule, whatever its score.
//! - `BestMatches`: choose among the rules sharing the highest score.
//! - `AllMatches`: choose among every matching rule.
//!
//! Among several candidates the choice is uniform when every weight is 1.0,
//! and proportional to `weight / total weight` otherwise.
//!
//! Namespaces are visited in lexical order (or in the order given by the
//! scope); rules in insertion order.

use crate::element::{Capture, Element};
use crate::error::Error;
use crate::rule::{Rule, DEFAULT_WEIGHT};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    FirstMatch,
    #[default]
    BestMatches,
    AllMatches,
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "first" | "first_match" => Ok(Strategy::FirstMatch),
            "best" | "best_matches" => Ok(Strategy::BestMatches),
            "all" | "all_matches" => Ok(Strategy::AllMatches),
            other => Err(Error::InvalidStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::FirstMatch => write!(f, "first_match"),
            Strategy::BestMatches => write!(f, "best_matches"),
            Strategy::AllMatches => write!(f, "all_matches"),
        }
    }
}

/// Which namespaces a selection searches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    All,
    One(String),
    Many(Vec<String>),
}

impl From<&str> for Scope {
    fn from(ns: &str) -> Self {
        Scope::One(ns.to_string())
    }
}

impl From<Vec<String>> for Scope {
    fn from(list: Vec<String>) -> Self {
        match list.len() {
            0 => Scope::All,
            _ => Scope::Many(list),
        }
    }
}

/// A rule that matched, with its score and captured values.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub rule: &'a Rule,
    pub score: f64,
    pub captures: Vec<Capture>,
}

/// Outcome of `RuleBase::select`.
#[derive(Debug, Clone, Default)]
pub struct Selection<'a> {
    /// The chosen rule, if any matched
    pub best: Option<Candidate<'a>>,
    /// Highest score seen (0 when nothing matched)
    pub best_score: f64,
    /// Rules the choice was made among
    pub candidates: Vec<Candidate<'a>>,
}

impl<'a> Selection<'a> {
    pub fn is_match(&self) -> bool {
        self.best.is_some()
    }

    pub fn rule(&self) -> Option<&'a Rule> {
        self.best.as_ref().map(|c| c.rule)
    }

    /// Write the chosen candidate's captures into an element.
    pub fn commit(&self, element: &mut Element) {
        if let Some(best) = &self.best {
            element.absorb(&best.captures);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RuleBase {
    namespaces: BTreeMap<String, Vec<Rule>>,
}

impl RuleBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule to its namespace. A rule with the same id in that
    /// namespace is replaced.
    pub fn add(&mut self, rule: Rule) {
        let rules = self.namespaces.entry(rule.namespace().to_string()).or_default();
        match rules.iter_mut().find(|r| r.id() == rule.id()) {
            Some(existing) => *existing = rule,
            None => rules.push(rule),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.iter().find(|r| r.id() == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Rule> {
        for rules in self.namespaces.values_mut() {
            if let Some(pos) = rules.iter().position(|r| r.id() == id) {
                return Some(rules.remove(pos));
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.namespaces.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    pub fn rules(&self, namespace: &str) -> &[Rule] {
        self.namespaces
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.namespaces.values().flatten()
    }

    /// Select a rule for `test` using the thread-local RNG.
    pub fn select_default(&self, test: &Element, scope: &Scope, strategy: Strategy) -> Selection<'_> {
        self.select(test, scope, strategy, &mut rand::thread_rng())
    }

    /// Score the rules in scope against `test` and choose one.
    pub fn select<R: Rng + ?Sized>(
        &self,
        test: &Element,
        scope: &Scope,
        strategy: Strategy,
        rng: &mut R,
    ) -> Selection<'_> {
        let mut best_score = 0.0;
        let mut candidates: Vec<Candidate<'_>> = Vec::new();

        'search: for rules in self.scoped(scope) {
            for rule in rules {
                let Some(m) = rule.matches(test) else {
                    continue;
                };
                let candidate = Candidate {
                    rule,
                    score: m.score,
                    captures: m.captures,
                };

                match strategy {
                    Strategy::FirstMatch => {
                        best_score = candidate.score;
                        candidates.push(candidate);
                        break 'search;
                    }
                    Strategy::BestMatches => {
                        if candidate.score > best_score {
                            best_score = candidate.score;
                            candidates.clear();
                            candidates.push(candidate);
                        } else if candidate.score == best_score {
                            candidates.push(candidate);
                        }
                    }
                    Strategy::AllMatches => {
                        best_score = f64::max(best_score, candidate.score);
                        candidates.push(candidate);
                    }
                }
            }
        }

        let best = choose(&candidates, rng).cloned();
        debug!(
            "Selected {:?} among {} candidate(s) ({})",
            best.as_ref().map(|c| c.rule.id()),
            candidates.len(),
            strategy
        );

        Selection {
            best,
            best_score,
            candidates,
        }
    }

    fn scoped(&self, scope: &Scope) -> Vec<&Vec<Rule>> {
        match scope {
            Scope::All => self.namespaces.values().collect(),
            Scope::One(ns) => self.namespaces.get(ns).into_iter().collect(),
            Scope::Many(list) => list
                .iter()
                .filter_map(|ns| self.namespaces.get(ns))
                .collect(),
        }
    }
}

/// Pick one candidate: uniform when all weights are default, weighted otherwise.
fn choose<'c, 'a, R: Rng + ?Sized>(
    candidates: &'c [Candidate<'a>],
    rng: &mut R,
) -> Option<&'c Candidate<'a>> {
    if candidates.len() <= 1 {
        return candidates.first();
    }

    if candidates.iter().all(|c| c.rule.weight() == DEFAULT_WEIGHT) {
        return candidates.choose(rng);
    }

    match WeightedIndex::new(candidates.iter().map(|c| c.rule.weight())) {
        Ok(dist) => candidates.get(dist.sample(rng)),
        // All weights zero
        Err(_) => candidates.choose(rng),
    }
}

impl AddAssign<Rule> for RuleBase {
    fn add_assign(&mut self, rule: Rule) {
        self.add(rule);
    }
}

impl Extend<Rule> for RuleBase {
    fn extend<I: IntoIterator<Item = Rule>>(&mut self, iter: I) {
        for rule in iter {
            self.add(rule);
        }
    }
}

impl FromIterator<Rule> for RuleBase {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        let mut base = RuleBase::new();
        base.extend(iter);
        base
    }
}
