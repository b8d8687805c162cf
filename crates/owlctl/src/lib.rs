//! owlctl - command line front-end for the OwlMind rule engine.

pub mod cli;
pub mod commands;
pub mod config;
pub mod errors;
pub mod logging;
pub mod output;
