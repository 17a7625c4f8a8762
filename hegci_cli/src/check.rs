use super::{helpers, Subcommand};
use anyhow::Result;
use clap::{Parser, ValueHint};
use hegci::config::Config;
use std::path::PathBuf;
use std::process::ExitCode;

/// Validate a configuration file and show its contents.
#[derive(Parser)]
pub struct Opts {
    /// Path to the JSON configuration.
    #[arg(value_hint = ValueHint::FilePath)]
    config: PathBuf,
}

impl Subcommand for Opts {
    fn run(&self) -> Result<ExitCode> {
        let config = Config::load(&self.config)?;
        config.validate()?;

        helpers::print_config_table(&config);

        Ok(ExitCode::SUCCESS)
    }
}
