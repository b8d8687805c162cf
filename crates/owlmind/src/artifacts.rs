//! Artifacts: host functions a rule can invoke with `!name` actions.

use crate::error::{Error, Result};
use crate::value::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Provider of functions callable from rule actions.
///
/// `function` is given without the leading `!`. A returned value is stored in
/// immediate memory under the function name.
pub trait Artifacts {
    fn process(&mut self, function: &str, params: Option<&Value>) -> Result<Option<Value>>;
}

/// Provider that skips every invocation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoArtifacts;

impl Artifacts for NoArtifacts {
    fn process(&mut self, function: &str, _params: Option<&Value>) -> Result<Option<Value>> {
        debug!("No artifacts provider, skipping !{}", function);
        Ok(None)
    }
}

pub type ArtifactFn = Box<dyn FnMut(Option<&Value>) -> Result<Option<Value>> + Send>;

/// Name-indexed set of closures.
#[derive(Default)]
pub struct ArtifactRegistry {
    functions: BTreeMap<String, ArtifactFn>,
}

impl ArtifactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function; a leading `!` in the name is ignored.
    pub fn register<F>(&mut self, name: &str, f: F)
    where
        F: FnMut(Option<&Value>) -> Result<Option<Value>> + Send + 'static,
    {
        let name = name.strip_prefix('!').unwrap_or(name);
        self.functions.insert(name.to_string(), Box::new(f));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }
}

impl Artifacts for ArtifactRegistry {
    fn process(&mut self, function: &str, params: Option<&Value>) -> Result<Option<Value>> {
        let f = self
            .functions
            .get_mut(function)
            .ok_or_else(|| Error::UnknownArtifact(function.to_string()))?;
        f(params)
    }
}

impl fmt::Debug for ArtifactRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactRegistry")
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_strips_bang() {
        let mut registry = ArtifactRegistry::new();
        registry.register("!echo", |p| Ok(p.cloned()));
        assert!(registry.contains("echo"));
        let out = registry.process("echo", Some(&Value::from("hi"))).unwrap();
        assert_eq!(out, Some(Value::from("hi")));
    }

    #[test]
    fn test_no_artifacts_yields_nothing() {
        assert_eq!(NoArtifacts.process("anything", None).unwrap(), None);
    }

    #[test]
    fn test_unknown_function() {
        let mut registry = ArtifactRegistry::new();
        let err = registry.process("missing", None).unwrap_err();
        assert!(matches!(err, Error::UnknownArtifact(name) if name == "missing"));
    }
}
