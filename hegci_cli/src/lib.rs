#![allow(clippy::missing_errors_doc)]
#![allow(missing_docs)]

mod check;
mod helpers;
mod run;

use anyhow::Result;
use clap::Parser;
use enum_dispatch::enum_dispatch;
use git_version::git_version;
use std::process::ExitCode;

#[enum_dispatch]
pub trait Subcommand {
    fn run(&self) -> Result<ExitCode>;
}

#[enum_dispatch(Subcommand)]
#[derive(Parser)]
pub enum SubcommandEnum {
    Check(check::Opts),
    Run(run::Opts),
}

#[derive(Parser)]
#[command(
    arg_required_else_help = true,
    author,
    about,
    disable_help_subcommand = true,
    name = "hegci",
    version = git_version!(
        args = ["--always", "--dirty", "--long", "--tags"],
        cargo_prefix = "",
        fallback = "unknown"
    )
)]
pub struct Opts {
    #[command(subcommand)]
    pub subcommand: SubcommandEnum,
}
