//! Command line definition for owlctl.

use crate::config::ColorMode;
use clap::{Args, Parser, Subcommand};
use owlmind::Strategy;
use std::path::PathBuf;

// Version is embedded at build time
const VERSION: &str = env!("OWLMIND_VERSION");

#[derive(Parser, Debug)]
#[command(name = "owlctl")]
#[command(about = "OwlMind - rule-based inference for hybrid intelligence systems", long_about = None)]
#[command(version = VERSION)]
pub struct Cli {
    /// Config file (default: ~/.config/owlmind/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Colored text output (overrides the config file)
    #[arg(long, global = true, value_enum, value_name = "MODE")]
    pub color: Option<ColorMode>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a value against a condition pattern
    Match {
        value: String,
        pattern: String,

        /// Treat both sides as text (no number parsing)
        #[arg(long)]
        text: bool,
    },

    /// Load a rule file or directory and list its rules
    Check { rules: PathBuf },

    /// Select the rule that best matches the given facts
    Select {
        #[command(flatten)]
        query: QueryArgs,

        /// Namespace to search; repeat for several (default: all)
        #[arg(short, long = "namespace")]
        namespaces: Vec<String>,
    },

    /// Fire rules namespace by namespace against the given facts
    Run {
        #[command(flatten)]
        query: QueryArgs,

        /// Namespace to fire; repeat in chaining order
        #[arg(short, long = "namespace", required = true)]
        namespaces: Vec<String>,

        /// Long-term memory file (JSON or TOML)
        #[arg(long)]
        belief: Option<PathBuf>,

        /// Write the updated long-term memory back to --belief
        #[arg(long, requires = "belief")]
        save_belief: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Rule file (.toml/.json) or directory of rule files
    pub rules: PathBuf,

    /// Session fact, e.g. -f h_host=api.openai.com
    #[arg(short, long = "fact", value_name = "KEY=VALUE")]
    pub facts: Vec<String>,

    /// Session facts file (JSON or TOML)
    #[arg(long)]
    pub facts_file: Option<PathBuf>,

    /// first_match, best_matches or all_matches (default from config)
    #[arg(short, long)]
    pub strategy: Option<Strategy>,

    /// RNG seed for reproducible weighted choice
    #[arg(long)]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let cli = Cli::try_parse_from([
            "owlctl", "run", "rules.toml", "-n", "f_provider", "-n", "f_model", "-f",
            "h_host=api.openai.com", "--strategy", "all", "--belief", "belief.json",
            "--save-belief",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                query,
                namespaces,
                belief,
                save_belief,
            } => {
                assert_eq!(namespaces, vec!["f_provider", "f_model"]);
                assert_eq!(query.facts, vec!["h_host=api.openai.com"]);
                assert_eq!(query.strategy, Some(Strategy::AllMatches));
                assert_eq!(belief, Some(PathBuf::from("belief.json")));
                assert!(save_belief);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_save_belief_requires_belief() {
        assert!(Cli::try_parse_from([
            "owlctl", "run", "rules.toml", "-n", "f_provider", "--save-belief"
        ])
        .is_err());
    }

    #[test]
    fn test_run_requires_namespace() {
        assert!(Cli::try_parse_from(["owlctl", "run", "rules.toml", "-f", "h_host=x"]).is_err());

        let cli = Cli::try_parse_from(["owlctl", "select", "rules.toml"]).unwrap();
        match cli.command {
            Commands::Select { namespaces, .. } => assert!(namespaces.is_empty()),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_color_flag() {
        let cli = Cli::try_parse_from(["owlctl", "--color", "off", "check", "rules.toml"]).unwrap();
        assert_eq!(cli.color, Some(ColorMode::Never));

        let cli = Cli::try_parse_from(["owlctl", "check", "rules.toml", "--color", "always"]).unwrap();
        assert_eq!(cli.color, Some(ColorMode::Always));

        assert!(Cli::try_parse_from(["owlctl", "--color", "rainbow", "check", "rules.toml"]).is_err());
    }

    #[test]
    fn test_bad_strategy_rejected() {
        assert!(Cli::try_parse_from(["owlctl", "select", "rules.toml", "-s", "random"]).is_err());
    }
}
