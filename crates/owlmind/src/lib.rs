//! OwlMind rule-based inference core.
//!
//! Knowledge lives in [`Element`]s. [`Rule`]s test an element against their
//! conditions and, when selected, act on immediate and long-term memory. A
//! [`RuleBase`] groups rules by namespace and picks one per query; the
//! [`Engine`] chains those picks across namespaces.

pub mod action;
pub mod artifacts;
pub mod element;
pub mod engine;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod rule;
pub mod rule_base;
pub mod value;

pub use action::{Action, ActionContext};
pub use artifacts::{ArtifactRegistry, Artifacts, NoArtifacts};
pub use element::{Capture, Element, ElementMatch};
pub use engine::{Engine, Firing};
pub use error::{Error, Result};
pub use matcher::{match_value, MatchOutcome};
pub use rule::{Rule, DEFAULT_NAMESPACE};
pub use rule_base::{Candidate, RuleBase, Scope, Selection, Strategy};
pub use value::Value;
