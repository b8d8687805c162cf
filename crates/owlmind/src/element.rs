//! Knowledge elements: ordered bags of facts.
//!
//! An element is used three ways: as working memory (the session), as
//! long-term memory (the belief), and as the condition side of a rule. The
//! embedding test (`Element::matches`) checks that every visible condition
//! key exists in the element and that its value matches.

use crate::matcher::match_value;
use crate::value::Value;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Keys with this prefix are stored but never matched or displayed
pub const HIDDEN_PREFIX: &str = "__";

/// Score contributed by every matched field, on top of its match quality
pub const FIELD_SCORE: f64 = 100.0;

/// A value pulled out of a fact by an extraction condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Capture {
    /// `<fact key>/<target>`, e.g. `h_body/model`
    pub key: String,
    pub value: Value,
}

/// Outcome of a successful embedding test.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementMatch {
    /// 100 per matched field plus the sum of match qualities
    pub score: f64,
    pub captures: Vec<Capture>,
}

/// Ordered fact store. Re-assigning a key keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    facts: Vec<(String, Value)>,
}

impl Element {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).map(|i| &self.facts[i].1)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => self.facts[i].1 = value,
            None => self.facts.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.position(key).map(|i| self.facts.remove(i).1)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.facts.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Facts that take part in matching and display.
    pub fn visible(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.iter().filter(|(k, _)| !is_hidden(k))
    }

    /// Write captured values as facts.
    pub fn absorb(&mut self, captures: &[Capture]) {
        for capture in captures {
            self.set(capture.key.clone(), capture.value.clone());
        }
    }

    /// Embedding test: does this element satisfy every condition?
    ///
    /// Returns None when any visible condition key is missing or fails to
    /// match, or when there are no visible conditions at all.
    pub fn matches(&self, conditions: &Element) -> Option<ElementMatch> {
        let mut score = 0.0;
        let mut captures = Vec::new();

        for (key, test) in conditions.visible() {
            let value = self.get(key)?;
            let outcome = match_value(value, test);
            if !outcome.is_match() {
                return None;
            }
            score += FIELD_SCORE + outcome.quality;

            if let (Some(target), Some(captured)) = (outcome.target, outcome.value) {
                captures.push(Capture {
                    key: format!("{}/{}", key, target),
                    value: captured,
                });
            }
        }

        if score > 0.0 {
            Some(ElementMatch { score, captures })
        } else {
            None
        }
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.facts.iter().position(|(k, _)| k == key)
    }
}

fn is_hidden(key: &str) -> bool {
    key.starts_with(HIDDEN_PREFIX)
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Element {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut element = Element::new();
        for (k, v) in iter {
            element.set(k, v);
        }
        element
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Element {
    fn from(facts: [(K, V); N]) -> Self {
        facts.into_iter().collect()
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.visible().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}

impl Serialize for Element {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.facts.len()))?;
        for (k, v) in &self.facts {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Element {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ElementVisitor;

        impl<'de> Visitor<'de> for ElementVisitor {
            type Value = Element;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of scalar facts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Element, A::Error> {
                let mut element = Element::new();
                while let Some((key, value)) = access.next_entry::<String, Value>()? {
                    element.set(key, value);
                }
                Ok(element)
            }
        }

        deserializer.deserialize_map(ElementVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_keeps_position() {
        let mut e = Element::from([("a", 1), ("b", 2)]);
        e.set("a", 3);
        let keys: Vec<&str> = e.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(e.get("a"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_remove_closes_gap() {
        let mut e = Element::from([("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(e.remove("b"), Some(Value::Int(2)));
        assert_eq!(e.remove("b"), None);
        let keys: Vec<&str> = e.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "c"]);
        assert_eq!(e.len(), 2);
    }

    #[test]
    fn test_missing_key_is_none() {
        let e = Element::new();
        assert!(!e.contains("x"));
        assert_eq!(e.get("x"), None);
    }

    #[test]
    fn test_hidden_keys_not_displayed() {
        let e = Element::from([("__id", "r-1"), ("target", "x")]);
        assert_eq!(e.to_string(), "{target: \"x\"}");
    }

    #[test]
    fn test_match_scores_each_field() {
        let session = Element::from([("target", "api.openai.com"), ("method", "POST")]);
        let conditions = Element::from([("target", "api.openai.com"), ("method", "POST")]);
        let m = session.matches(&conditions).unwrap();
        assert_eq!(m.score, 202.0);
        assert!(m.captures.is_empty());
    }

    #[test]
    fn test_match_fails_on_missing_key() {
        let session = Element::from([("target", "api.openai.com")]);
        let conditions = Element::from([("target", "*"), ("body", "*")]);
        assert!(session.matches(&conditions).is_none());
    }

    #[test]
    fn test_match_fails_on_any_field_mismatch() {
        let session = Element::from([("a", "x"), ("b", "y")]);
        let conditions = Element::from([("a", "x"), ("b", "z")]);
        assert!(session.matches(&conditions).is_none());
    }

    #[test]
    fn test_match_ignores_hidden_conditions() {
        let session = Element::from([("a", "x")]);
        let conditions = Element::from([("a", "x"), ("__note", "missing in session")]);
        assert!(session.matches(&conditions).is_some());
    }

    #[test]
    fn test_empty_conditions_never_match() {
        let session = Element::from([("a", "x")]);
        assert!(session.matches(&Element::new()).is_none());
    }

    #[test]
    fn test_match_collects_captures_without_mutating() {
        let session = Element::from([("h_body", "string model=llama3.2 string")]);
        let conditions = Element::from([("h_body", "model=$*$/@model")]);
        let m = session.matches(&conditions).unwrap();
        assert_eq!(
            m.captures,
            vec![Capture {
                key: "h_body/model".to_string(),
                value: Value::from("llama3.2"),
            }]
        );
        assert!(!session.contains("h_body/model"));
    }

    #[test]
    fn test_json_preserves_order() {
        let e: Element = serde_json::from_str(r#"{"z": 1, "a": "x"}"#).unwrap();
        let keys: Vec<&str> = e.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert_eq!(serde_json::to_string(&e).unwrap(), r#"{"z":1,"a":"x"}"#);
    }
}
