#![allow(missing_docs)]

use clap::Parser;
use hegci_cli::{Opts, Subcommand};
use std::process::{ExitCode, Termination};

fn main() -> ExitCode {
    let opts = Opts::parse();

    match opts.subcommand.run() {
        Ok(code) => code,
        result @ Err(_) => result.report(),
    }
}
