//! owlctl - inspect and run OwlMind rule bases from the shell.

use anyhow::Result;
use clap::Parser;
use owlctl::cli::{Cli, Commands};
use owlctl::config::OwlConfig;
use owlctl::errors::EXIT_GENERAL_ERROR;
use owlctl::output::{display_error, Output};
use owlctl::{commands, logging};

fn execute(cli: Cli) -> Result<i32> {
    let mut config = OwlConfig::load(cli.config.as_deref())?;
    config.override_output(cli.color, cli.json);
    logging::init(&config.log.level, cli.verbose);
    let out = Output::new(&config.output, false);

    match cli.command {
        Commands::Match {
            value,
            pattern,
            text,
        } => commands::match_pattern(&out, &value, &pattern, text),
        Commands::Check { rules } => commands::check(&out, &rules),
        Commands::Select { query, namespaces } => {
            commands::select(&out, &config, &query, &namespaces)
        }
        Commands::Run {
            query,
            namespaces,
            belief,
            save_belief,
        } => commands::run(
            &out,
            &config,
            &query,
            &namespaces,
            belief.as_deref(),
            save_belief,
        ),
    }
}

fn main() {
    let cli = Cli::parse();
    let code = match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            display_error(&format!("{:#}", e));
            EXIT_GENERAL_ERROR
        }
    };
    std::process::exit(code);
}
