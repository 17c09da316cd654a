//! sitegen CLI - small-site structure generator.
//!
//! Provides commands for:
//! - `build`: validate the structure, scaffold pages, write partials
//! - `tree`: print the parent → children mapping
//! - `routes`: print the route table as JSON
//! - `check`: report integrity warnings and structural errors
//! - `export`: write the structure as JSON
//! - `apply`: apply an editor change batch from a file
//! - `upload`: store an image through the upload contract

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{ApplyArgs, BuildArgs, CheckArgs, ExportArgs, RoutesArgs, TreeArgs, UploadArgs};
use output::Output;

/// sitegen - build a small site from a declarative structure.
#[derive(Parser)]
#[command(name = "sitegen", version, about)]
struct Cli {
    /// Enable verbose output (info-level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate, scaffold pages and regenerate partials.
    Build(BuildArgs),
    /// Print the menu tree as parent → children levels.
    Tree(TreeArgs),
    /// Print the route table as JSON.
    Routes(RoutesArgs),
    /// Check the structure for errors and warnings.
    Check(CheckArgs),
    /// Export the structure as JSON.
    Export(ExportArgs),
    /// Apply a change batch from a JSON file.
    Apply(ApplyArgs),
    /// Store an image in the uploads directory.
    Upload(UploadArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
        Commands::Tree(args) => args.execute(),
        Commands::Routes(args) => args.execute(),
        Commands::Check(args) => args.execute(),
        Commands::Export(args) => args.execute(),
        Commands::Apply(args) => args.execute(),
        Commands::Upload(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
