//! collabx CLI Binary
//!
//! Command-line entry point for the collaborative editing client core.

use anyhow::Context;
use clap::Parser;
use collabx::logging::init_logging;
use collabx::tooling::cli::{Cli, CliContext};
use std::process;

fn run() -> anyhow::Result<String> {
    let cli = Cli::parse();

    let context = CliContext::new(cli.config.clone()).context("Error loading configuration")?;
    let logging = cli.logging_config(&context.config().logging);
    init_logging(Some(&logging)).context("Error initializing logging")?;

    Ok(context.execute(&cli.command)?)
}

fn main() {
    match run() {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
