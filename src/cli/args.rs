//! CLI argument definitions using clap.
//!
//! ## Commands
//!
//! - `convert`: Convert a single test file between frameworks
//! - `migrate`: Convert a whole project in dependency order
//! - `frameworks`: List registered framework plugins
//! - `init`: Write a default `.hamletrc.json`

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::emitter::EmitterStrategy;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }
}

/// Arguments shared by the converting commands.
#[derive(Debug, Clone, Args)]
pub struct ConversionArgs {
    /// Source framework (e.g. cypress, jest, pytest, junit4)
    #[arg(long)]
    pub from: Option<String>,

    /// Target framework (e.g. playwright, vitest, unittest, junit5)
    #[arg(long)]
    pub to: Option<String>,

    /// Language, for homonymous framework names
    #[arg(long)]
    pub language: Option<String>,

    /// Emission strategy
    #[arg(long, value_enum)]
    pub emitter: Option<EmitterStrategy>,

    /// Opt into structural emission (alias for --emitter ir-patch)
    #[arg(long)]
    pub experimental_ir: bool,

    /// Emit machine-readable JSON instead of the human report
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct ConvertCommand {
    /// File to convert
    pub file: PathBuf,

    /// Where to write the converted file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub args: ConversionArgs,
}

#[derive(Debug, Args)]
pub struct MigrateCommand {
    /// Project root (defaults to the current directory)
    pub root: Option<PathBuf>,

    /// Resume a previous run, skipping already-converted files
    #[arg(long = "continue")]
    pub continue_run: bool,

    /// Re-attempt only files that failed in a previous run
    #[arg(long)]
    pub retry_failed: bool,

    /// Directories to scan (defaults to the whole root)
    #[arg(long)]
    pub include: Vec<String>,

    /// Paths or glob patterns to skip
    #[arg(long)]
    pub ignore: Vec<String>,

    /// State directory name (default: .hamlet)
    #[arg(long)]
    pub state_dir: Option<String>,

    #[command(flatten)]
    pub args: ConversionArgs,
}

#[derive(Debug, Args)]
pub struct FrameworksCommand {
    /// Restrict the listing to one language
    #[arg(long)]
    pub language: Option<String>,

    /// Emit the listing as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Convert a single test file between frameworks
    Convert(ConvertCommand),
    /// Migrate a whole project between frameworks
    Migrate(MigrateCommand),
    /// List registered framework plugins
    Frameworks(FrameworksCommand),
    /// Initialize a hamlet configuration file
    Init,
}
