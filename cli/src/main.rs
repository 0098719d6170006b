//! Entry point of the program.

mod check;
mod cli;
mod error;

use crate::cli::{Command, Options};

fn main() {
    env_logger::init();

    let opts = <Options as clap::Parser>::parse();

    let result = match opts.command {
        Command::Check(check) => check.run(opts.global),
    };

    result.unwrap_or_else(|e| {
        e.report();
        std::process::exit(1)
    })
}
