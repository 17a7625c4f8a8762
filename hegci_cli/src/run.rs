use super::{helpers, Subcommand};
use anyhow::Result;
use clap::{Parser, ValueHint};
use hegci::config::Config;
use hegci::heg;
use std::path::PathBuf;
use std::process::ExitCode;

/// Run the variational stage for a configuration file.
#[derive(Parser)]
pub struct Opts {
    /// Path to the JSON configuration.
    #[arg(value_hint = ValueHint::FilePath)]
    config: PathBuf,
    /// Number of lockstep workers.
    #[arg(default_value = "1", long, value_name = "N")]
    workers: usize,
}

impl Subcommand for Opts {
    fn run(&self) -> Result<ExitCode> {
        println!("Heat-Bath Configuration Interaction");

        let config = Config::load(&self.config)?;
        let result = heg::run(&config, self.workers)?;

        helpers::print_energy_table(&result);

        Ok(ExitCode::SUCCESS)
    }
}
