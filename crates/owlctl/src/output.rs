//! Output formatting: plain ASCII text, optionally colored, or JSON.

use crate::config::{ColorMode, OutputConfig};
use anyhow::Result;
use owlmind::{Candidate, Element, Firing, MatchOutcome, RuleBase, Selection};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::io::IsTerminal;

pub struct Output {
    color: bool,
    pub json: bool,
}

impl Output {
    pub fn new(config: &OutputConfig, force_json: bool) -> Self {
        let json = force_json || config.json;
        let color = !json
            && match config.color {
                ColorMode::Auto => std::io::stdout().is_terminal(),
                ColorMode::Always => true,
                ColorMode::Never => false,
            };
        Self { color, json }
    }

    pub fn plain() -> Self {
        Self {
            color: false,
            json: false,
        }
    }

    fn header(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn good(&self, text: &str) -> String {
        if self.color {
            text.bright_green().to_string()
        } else {
            text.to_string()
        }
    }

    fn bad(&self, text: &str) -> String {
        if self.color {
            text.bright_red().to_string()
        } else {
            text.to_string()
        }
    }

    fn id(&self, text: &str) -> String {
        if self.color {
            text.cyan().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn show_match(&self, outcome: &MatchOutcome) -> Result<()> {
        if self.json {
            return self.print_json(&MatchView::from(outcome));
        }
        println!("{}", self.render_match(outcome));
        Ok(())
    }

    pub fn render_match(&self, outcome: &MatchOutcome) -> String {
        if !outcome.is_match() {
            return format!("{} quality=0", self.bad("[NO MATCH]"));
        }
        let mut line = format!("{} quality={:.4}", self.good("[MATCH]"), outcome.quality);
        if let Some(value) = &outcome.value {
            line.push_str(&format!(" value={}", value));
        }
        if let Some(target) = &outcome.target {
            line.push_str(&format!(" target={}", target));
        }
        line
    }

    pub fn show_rules(&self, base: &RuleBase) -> Result<()> {
        if self.json {
            let rules: Vec<RuleView> = base.iter().map(RuleView::from).collect();
            return self.print_json(&rules);
        }
        print!("{}", self.render_rules(base));
        Ok(())
    }

    pub fn render_rules(&self, base: &RuleBase) -> String {
        let mut out = String::new();
        for ns in base.namespaces() {
            out.push_str(&format!("{}\n", self.header(&format!("[{}]", ns))));
            for rule in base.rules(ns) {
                out.push_str(&format!("  {}\n", rule));
            }
        }
        out.push_str(&format!(
            "{} rule(s) in {} namespace(s)\n",
            base.len(),
            base.namespaces().count()
        ));
        out
    }

    pub fn show_selection(&self, selection: &Selection<'_>) -> Result<()> {
        if self.json {
            return self.print_json(&SelectionView::from(selection));
        }
        print!("{}", self.render_selection(selection));
        Ok(())
    }

    pub fn render_selection(&self, selection: &Selection<'_>) -> String {
        let Some(best) = &selection.best else {
            return format!("{} no rule matched\n", self.bad("[NO MATCH]"));
        };

        let mut out = format!(
            "{} {} (score {:.4})\n  {}\n",
            self.good("[SELECTED]"),
            self.id(best.rule.id()),
            best.score,
            best.rule
        );
        if selection.candidates.len() > 1 {
            out.push_str(&format!(
                "{}\n",
                self.header(&format!("Candidates ({}):", selection.candidates.len()))
            ));
            for c in &selection.candidates {
                out.push_str(&format!(
                    "  * {} score={:.4} weight={}\n",
                    self.id(c.rule.id()),
                    c.score,
                    c.rule.weight()
                ));
            }
        }
        out
    }

    pub fn show_run(&self, firings: &[Firing], session: &Element, belief: &Element) -> Result<()> {
        if self.json {
            return self.print_json(&RunView {
                firings,
                session,
                belief,
            });
        }
        print!("{}", self.render_run(firings, session, belief));
        Ok(())
    }

    pub fn render_run(&self, firings: &[Firing], session: &Element, belief: &Element) -> String {
        let mut out = String::new();
        if firings.is_empty() {
            out.push_str(&format!("{} no rule fired\n", self.bad("[NO MATCH]")));
        }
        for f in firings {
            out.push_str(&format!(
                "{} {} -> {} (score {:.4})\n",
                self.good("[FIRED]"),
                f.namespace,
                self.id(&f.rule_id),
                f.score
            ));
        }
        out.push_str(&format!("{} {}\n", self.header("Session:"), session));
        out.push_str(&format!("{} {}\n", self.header("Belief:"), belief));
        out
    }
}

/// Display an error on stderr
pub fn display_error(message: &str) {
    eprintln!("[ERROR] {}", message.red());
}

#[derive(Serialize)]
struct MatchView<'a> {
    quality: f64,
    value: Option<&'a owlmind::Value>,
    target: Option<&'a str>,
}

impl<'a> From<&'a MatchOutcome> for MatchView<'a> {
    fn from(o: &'a MatchOutcome) -> Self {
        Self {
            quality: o.quality,
            value: o.value.as_ref(),
            target: o.target.as_deref(),
        }
    }
}

#[derive(Serialize)]
struct RuleView {
    id: String,
    namespace: String,
    weight: f64,
    conditions: Element,
    actions: Vec<String>,
}

impl From<&owlmind::Rule> for RuleView {
    fn from(rule: &owlmind::Rule) -> Self {
        Self {
            id: rule.id().to_string(),
            namespace: rule.namespace().to_string(),
            weight: rule.weight(),
            conditions: rule.conditions().clone(),
            actions: rule.actions().iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Serialize)]
struct CandidateView<'a> {
    id: &'a str,
    namespace: &'a str,
    score: f64,
    weight: f64,
    captures: Element,
}

impl<'a> From<&Candidate<'a>> for CandidateView<'a> {
    fn from(c: &Candidate<'a>) -> Self {
        let mut captures = Element::new();
        captures.absorb(&c.captures);
        Self {
            id: c.rule.id(),
            namespace: c.rule.namespace(),
            score: c.score,
            weight: c.rule.weight(),
            captures,
        }
    }
}

#[derive(Serialize)]
struct SelectionView<'a> {
    best: Option<CandidateView<'a>>,
    best_score: f64,
    candidates: Vec<CandidateView<'a>>,
}

impl<'a> From<&Selection<'a>> for SelectionView<'a> {
    fn from(s: &Selection<'a>) -> Self {
        Self {
            best: s.best.as_ref().map(CandidateView::from),
            best_score: s.best_score,
            candidates: s.candidates.iter().map(CandidateView::from).collect(),
        }
    }
}

#[derive(Serialize)]
struct RunView<'a> {
    firings: &'a [Firing],
    session: &'a Element,
    belief: &'a Element,
}

#[cfg(test)]
mod tests {
    use super::*;
    use owlmind::{match_value, Action, Rule, Scope, Strategy, Value};

    #[test]
    fn test_render_match() {
        let out = Output::plain();
        let outcome = match_value(&Value::from("key=1.0 x"), &Value::from("key=$*$/@k"));
        assert_eq!(out.render_match(&outcome), "[MATCH] quality=0.7500 value=\"1.0\" target=k");

        let miss = match_value(&Value::from("a"), &Value::from("b"));
        assert_eq!(out.render_match(&miss), "[NO MATCH] quality=0");
    }

    #[test]
    fn test_render_selection() {
        let mut base = RuleBase::new();
        base += Rule::new([("a", "x")], vec![Action::assign("b", 1)]).with_id("r-a");
        let session = Element::from([("a", "x")]);
        let sel = base.select_default(&session, &Scope::All, Strategy::BestMatches);

        let text = Output::plain().render_selection(&sel);
        assert!(text.starts_with("[SELECTED] r-a (score 101.0000)"));
        assert!(!text.contains("Candidates"));
    }

    #[test]
    fn test_render_rules_counts() {
        let mut base = RuleBase::new();
        base += Rule::new([("a", "x")], vec![]).in_namespace("one");
        base += Rule::new([("a", "y")], vec![]).in_namespace("two");
        let text = Output::plain().render_rules(&base);
        assert!(text.contains("[one]"));
        assert!(text.ends_with("2 rule(s) in 2 namespace(s)\n"));
    }
}
