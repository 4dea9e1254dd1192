//! Argument parsing: one `clap` derive tree covering both subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "alloy-engine", about = "Analyzes Alloy 6 models by translating them to SAT.", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    /// Parses, analyzes, encodes, and solves an Alloy model.
    Run(RunArgs),
    /// Reads a DIMACS CNF file directly, bypassing the Alloy front end.
    Dimacs(DimacsArgs),
}

#[derive(clap::Args)]
pub struct RunArgs {
    /// The `.als` source file to analyze.
    pub file: PathBuf,

    /// Which `run`/`check` command in the model to execute. Defaults to the first one declared.
    #[arg(long)]
    pub command: Option<String>,

    /// Overrides the default per-signature scope.
    #[arg(long)]
    pub scope: Option<u32>,

    /// Overrides the default trace length for temporal models.
    #[arg(long)]
    pub steps: Option<u32>,

    /// Increases logging verbosity; repeatable.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(clap::Args)]
pub struct DimacsArgs {
    /// The DIMACS CNF file to solve.
    pub file: PathBuf,

    /// Increases logging verbosity; repeatable.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
