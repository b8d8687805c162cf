//! Value matcher: scores a fact value against a condition pattern.
//!
//! Pattern language for string conditions:
//!
//! | pattern        | matches when                         | quality                  |
//! |----------------|--------------------------------------|--------------------------|
//! | `text`         | value equals text                    | 1.0                      |
//! | `*`            | always                               | 0.25                     |
//! | `re/regex/`    | regex finds a match                  | 0.75                     |
//! | `pre$*`        | extraction, `$*` captures the rest   | 0.75                     |
//! | `k=$*$/@name`  | extraction, `$*$` captures one word  | 0.75                     |
//! | `*s*`          | value contains s                     | len(s) / len(value)      |
//! | `*s`           | value ends with s                    | len(s) / len(value)      |
//! | `s*`           | value starts with s                  | len(s) / len(value)      |
//! | `p*s`          | value starts with p and ends with s  | (len(p)+len(s)) / len(value) |
//!
//! Numbers match exactly (1.0) or within 1e-6 (0.9); an int and a float are
//! compared exactly before the tolerance test. A numeric string is coerced
//! when compared against a number. A regex group that does not take part in
//! the match yields `null`.

use crate::value::Value;
use regex::Regex;
use tracing::warn;

/// Quality of an exact match
pub const EXACT: f64 = 1.0;
/// Quality of a regex or extraction match
pub const PATTERN: f64 = 0.75;
/// Quality of a near-equal float match
pub const NEAR: f64 = 0.9;
/// Quality of the bare wildcard
pub const WILDCARD: f64 = 0.25;

const FLOAT_TOLERANCE: f64 = 1e-6;
const REGEX_PREFIX: &str = "re/";
const EXTRACT_MARK: &str = "$*";
const EXTRACT_WORD_MARK: &str = "$*$";
const TARGET_MARK: &str = "/@";
const DEFAULT_TARGET: &str = "match";

/// Result of matching one value against one condition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchOutcome {
    /// Match quality in [0, 1]; 0 means no match
    pub quality: f64,
    /// Matched (possibly coerced or extracted) value, set only on a match
    pub value: Option<Value>,
    /// Name under which an extracted value should be recorded
    pub target: Option<String>,
}

impl MatchOutcome {
    fn none() -> Self {
        Self::default()
    }

    fn hit(quality: f64, value: Value) -> Self {
        Self {
            quality,
            value: Some(value),
            target: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.quality > 0.0
    }
}

/// Match a fact value against a condition.
pub fn match_value(value: &Value, test: &Value) -> MatchOutcome {
    let (value, test) = coerce_pair(value, test);

    match (&value, &test) {
        (Value::Str(v), Value::Str(t)) => match_str(v, t),
        (v, t) if v.is_numeric() && t.is_numeric() => match_numeric(v, t),
        _ => MatchOutcome::none(),
    }
}

/// Coerce a numeric-looking string when the other side is a number.
fn coerce_pair(value: &Value, test: &Value) -> (Value, Value) {
    match (value, test) {
        (Value::Str(v), t) if t.is_numeric() => (
            Value::coerce_numeric(v).unwrap_or_else(|| value.clone()),
            test.clone(),
        ),
        (v, Value::Str(t)) if v.is_numeric() => (
            value.clone(),
            Value::coerce_numeric(t).unwrap_or_else(|| test.clone()),
        ),
        _ => (value.clone(), test.clone()),
    }
}

fn match_numeric(value: &Value, test: &Value) -> MatchOutcome {
    if let (Value::Int(a), Value::Int(b)) = (value, test) {
        return if a == b {
            MatchOutcome::hit(EXACT, value.clone())
        } else {
            MatchOutcome::none()
        };
    }

    let (Some(a), Some(b)) = (value.as_f64(), test.as_f64()) else {
        return MatchOutcome::none();
    };

    let exact = match (value, test) {
        (Value::Int(i), Value::Float(f)) | (Value::Float(f), Value::Int(i)) => int_eq_float(*i, *f),
        _ => a == b,
    };

    if exact {
        MatchOutcome::hit(EXACT, value.clone())
    } else if (a - b).abs() < FLOAT_TOLERANCE {
        MatchOutcome::hit(NEAR, value.clone())
    } else {
        MatchOutcome::none()
    }
}

/// Exact int/float equality, without rounding the int through f64.
fn int_eq_float(i: i64, f: f64) -> bool {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    f.fract() == 0.0 && f >= -TWO_POW_63 && f < TWO_POW_63 && f as i64 == i
}

fn match_str(value: &str, test: &str) -> MatchOutcome {
    if value == test {
        return MatchOutcome::hit(EXACT, Value::from(value));
    }
    if test == "*" {
        return MatchOutcome::hit(WILDCARD, Value::from(value));
    }
    if let Some(pattern) = test.strip_prefix(REGEX_PREFIX) {
        return match_regex(value, pattern.strip_suffix('/').unwrap_or(pattern));
    }
    if !test.contains('*') {
        return MatchOutcome::none();
    }
    if test.contains(EXTRACT_MARK) {
        return match_extract(value, test);
    }
    match_star(value, test)
}

fn match_regex(value: &str, pattern: &str) -> MatchOutcome {
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!("Ignoring invalid regex condition '{}': {}", pattern, e);
            return MatchOutcome::none();
        }
    };

    let Some(caps) = re.captures(value) else {
        return MatchOutcome::none();
    };

    // An optional group that took no part in the match captures Null
    let captured = if re.captures_len() > 1 {
        caps.get(1).map(|m| Value::from(m.as_str())).unwrap_or_default()
    } else {
        caps.get(0).map(|m| Value::from(m.as_str())).unwrap_or_default()
    };

    MatchOutcome::hit(PATTERN, captured)
}

fn match_extract(value: &str, test: &str) -> MatchOutcome {
    let (test, target) = match test.split_once(TARGET_MARK) {
        Some((t, name)) => (t, name),
        None => (test, DEFAULT_TARGET),
    };

    let escaped = regex::escape(test);
    let pattern = if test.contains(EXTRACT_WORD_MARK) {
        escaped.replace(r"\$\*\$", r"([^\s]+)")
    } else {
        escaped.replace(r"\$\*", "(.*)")
    };

    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!("Ignoring invalid extraction condition '{}': {}", test, e);
            return MatchOutcome::none();
        }
    };

    match re.captures(value).and_then(|caps| caps.get(1)) {
        Some(m) => MatchOutcome {
            quality: PATTERN,
            value: Some(Value::from(m.as_str())),
            target: Some(target.to_string()),
        },
        None => MatchOutcome::none(),
    }
}

fn match_star(value: &str, test: &str) -> MatchOutcome {
    let len = value.chars().count();
    if len == 0 {
        return MatchOutcome::none();
    }
    let ratio = |n: usize| n as f64 / len as f64;

    let quality = if let Some(rest) = test.strip_prefix('*') {
        if let Some(inner) = rest.strip_suffix('*') {
            if value.contains(inner) {
                ratio(inner.chars().count())
            } else {
                0.0
            }
        } else if value.ends_with(rest) {
            ratio(rest.chars().count())
        } else {
            0.0
        }
    } else if let Some(prefix) = test.strip_suffix('*') {
        if value.starts_with(prefix) {
            ratio(prefix.chars().count())
        } else {
            0.0
        }
    } else {
        // Star somewhere inside: prefix*suffix
        let (prefix, suffix) = test.split_once('*').unwrap_or((test, ""));
        if value.starts_with(prefix) && value.ends_with(suffix) {
            ratio(prefix.chars().count() + suffix.chars().count())
        } else {
            0.0
        }
    };

    if quality > 0.0 {
        MatchOutcome::hit(quality, Value::from(value))
    } else {
        MatchOutcome::none()
    }
}
