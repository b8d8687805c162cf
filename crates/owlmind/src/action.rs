//! Rule actions and their effect on memory.
//!
//! Action language:
//! - `key: value` assigns to long-term memory when it already holds `key`,
//!   otherwise to immediate memory.
//! - `@key: value` always assigns to long-term memory.
//! - a `$name` value is read from immediate memory, then long-term memory.
//! - `!function: params` invokes an artifact.
//! - a bare value is assigned to the configured default key.

use crate::artifacts::Artifacts;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt;
use tracing::debug;

const LONG_TERM_MARK: char = '@';
const INVOKE_MARK: char = '!';
const REFERENCE_MARK: char = '$';

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Assign {
        key: String,
        value: Value,
        long_term: bool,
    },
    Invoke {
        function: String,
        params: Option<Value>,
    },
    Emit(Value),
}

impl Action {
    /// Build an action from a `(key, value)` pair.
    pub fn from_pair(key: &str, value: Value) -> Self {
        if let Some(function) = key.strip_prefix(INVOKE_MARK) {
            Action::Invoke {
                function: function.to_string(),
                params: Some(value),
            }
        } else {
            let (key, long_term) = split_long_term(key);
            Action::Assign {
                key: key.to_string(),
                value,
                long_term,
            }
        }
    }

    /// Build an action from a single item: `!function` or a bare value.
    pub fn from_single(value: Value) -> Self {
        match value.as_str().and_then(|s| s.strip_prefix(INVOKE_MARK)) {
            Some(function) => Action::Invoke {
                function: function.to_string(),
                params: None,
            },
            None => Action::Emit(value),
        }
    }

    pub fn assign(key: &str, value: impl Into<Value>) -> Self {
        Self::from_pair(key, value.into())
    }

    pub fn invoke(function: &str, params: Option<Value>) -> Self {
        Action::Invoke {
            function: function.trim_start_matches(INVOKE_MARK).to_string(),
            params,
        }
    }

    /// Apply this action to the given memories.
    pub fn apply(&self, ctx: &mut ActionContext<'_>) -> Result<()> {
        match self {
            Action::Assign {
                key,
                value,
                long_term,
            } => {
                let value = ctx.resolve(value);
                ctx.store(key, value, *long_term);
            }
            Action::Emit(value) => {
                let default_key = ctx.default_key.ok_or(Error::NoDefaultKey)?;
                let (key, long_term) = split_long_term(default_key);
                let value = ctx.resolve(value);
                ctx.store(key, value, long_term);
            }
            Action::Invoke { function, params } => {
                let params = params.as_ref().map(|p| ctx.resolve(p));
                let Some(artifacts) = ctx.artifacts.as_deref_mut() else {
                    debug!("No artifacts provider, skipping !{}", function);
                    return Ok(());
                };
                if let Some(result) = artifacts.process(function, params.as_ref())? {
                    ctx.immediate.set(function.clone(), result);
                }
            }
        }
        Ok(())
    }
}

fn split_long_term(key: &str) -> (&str, bool) {
    match key.strip_prefix(LONG_TERM_MARK) {
        Some(stripped) => (stripped, true),
        None => (key, false),
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Assign {
                key,
                value,
                long_term,
            } => {
                let mark = if *long_term { "@" } else { "" };
                write!(f, "({}{}, {})", mark, key, value)
            }
            Action::Invoke {
                function,
                params: Some(p),
            } => write!(f, "(!{}, {})", function, p),
            Action::Invoke {
                function,
                params: None,
            } => write!(f, "(!{})", function),
            Action::Emit(value) => write!(f, "({})", value),
        }
    }
}

/// Memories and providers an action runs against.
pub struct ActionContext<'a> {
    pub immediate: &'a mut Element,
    pub long: Option<&'a mut Element>,
    pub artifacts: Option<&'a mut dyn Artifacts>,
    pub default_key: Option<&'a str>,
}

impl<'a> ActionContext<'a> {
    pub fn new(immediate: &'a mut Element) -> Self {
        Self {
            immediate,
            long: None,
            artifacts: None,
            default_key: None,
        }
    }

    pub fn with_long(mut self, long: &'a mut Element) -> Self {
        self.long = Some(long);
        self
    }

    pub fn with_artifacts(mut self, artifacts: &'a mut dyn Artifacts) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn with_default_key(mut self, key: &'a str) -> Self {
        self.default_key = Some(key);
        self
    }

    /// Dereference a `$name` value; unresolved references become Null.
    fn resolve(&self, value: &Value) -> Value {
        let Some(name) = value.as_str().and_then(|s| s.strip_prefix(REFERENCE_MARK)) else {
            return value.clone();
        };

        self.immediate
            .get(name)
            .or_else(|| self.long.as_deref().and_then(|long| long.get(name)))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn store(&mut self, key: &str, value: Value, long_term: bool) {
        match self.long.as_deref_mut() {
            Some(long) if long_term || long.contains(key) => long.set(key, value),
            _ if !long_term => self.immediate.set(key, value),
            _ => debug!("No long-term memory, dropping @{}", key),
        }
    }
}
