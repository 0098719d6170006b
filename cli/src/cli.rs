//! Command-line options and subcommands.

use std::path::PathBuf;

use jszero_core::error::report::ColorOpt;

use crate::check::CheckCommand;

#[derive(clap::Parser, Debug)]
/// Type inference for a small subset of JavaScript.
#[command(author, about, long_about = None, version)]
pub struct Options {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Parser, Debug)]
pub struct GlobalOptions {
    /// Configure when to output messages in color
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: clap::ColorChoice,
}

impl GlobalOptions {
    pub fn color_opt(&self) -> ColorOpt {
        match self.color {
            clap::ColorChoice::Auto => ColorOpt::Auto,
            clap::ColorChoice::Always => ColorOpt::Always,
            clap::ColorChoice::Never => ColorOpt::Never,
        }
    }
}

#[derive(clap::Parser, Debug)]
pub struct InputOptions {
    /// Input files, omit to read from stdin
    pub files: Vec<PathBuf>,
}

/// Available subcommands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Infers the types of the top-level bindings of a program and prints them
    Check(CheckCommand),
}
