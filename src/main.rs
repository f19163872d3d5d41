//! Hamlet CLI application entry point.
//!
//! This binary handles command dispatch for the Hamlet test framework
//! converter.

use std::process::ExitCode;

use clap::Parser;
use hamlet::cli::{Arguments, ExitStatus};

fn main() -> ExitCode {
    let args = Arguments::parse();

    match hamlet::cli::run_cli(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitStatus::Error.into()
        }
    }
}
