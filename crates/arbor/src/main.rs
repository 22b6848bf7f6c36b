//! Arbor CLI - page tree maintenance.
//!
//! Provides commands for:
//! - `rebuild`: Recompile the navigation cache
//! - `url`: Print the public URL of a page
//! - `tree`: Show the page tree
//! - `move`: Move a page before, after or inside another
//! - `delete`: Delete a page with all revisions
//! - `revisions`: List revisions of a page
//! - `resolve-url`: Find a free URL slug under a parent

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    DeleteArgs, GlobalArgs, MoveArgs, RebuildArgs, ResolveUrlArgs, RevisionsArgs, TreeArgs,
    UrlArgs,
};
use output::Output;

/// Arbor - page tree maintenance.
#[derive(Parser)]
#[command(name = "arbor", version, about)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild the navigation cache.
    Rebuild(RebuildArgs),
    /// Print the public URL of a page.
    Url(UrlArgs),
    /// Show the page tree.
    Tree(TreeArgs),
    /// Move a page relative to another.
    Move(MoveArgs),
    /// Delete a page with all its revisions.
    Delete(DeleteArgs),
    /// List revisions of a page.
    Revisions(RevisionsArgs),
    /// Find a free URL slug for a page.
    ResolveUrl(ResolveUrlArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.global.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let global = &cli.global;
    let result = match cli.command {
        Commands::Rebuild(args) => args.execute(global),
        Commands::Url(args) => args.execute(global),
        Commands::Tree(args) => args.execute(global),
        Commands::Move(args) => args.execute(global),
        Commands::Delete(args) => args.execute(global),
        Commands::Revisions(args) => args.execute(global),
        Commands::ResolveUrl(args) => args.execute(global),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
