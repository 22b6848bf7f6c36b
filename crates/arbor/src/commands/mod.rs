//! CLI command implementations.

mod delete;
mod move_page;
mod rebuild;
mod resolve_url;
mod revisions;
mod site;
mod tree;
mod url;

use std::path::PathBuf;

use clap::Args;

pub(crate) use delete::DeleteArgs;
pub(crate) use move_page::MoveArgs;
pub(crate) use rebuild::RebuildArgs;
pub(crate) use resolve_url::ResolveUrlArgs;
pub(crate) use revisions::RevisionsArgs;
pub(crate) use tree::TreeArgs;
pub(crate) use url::UrlArgs;

/// Options shared by every command.
#[derive(Args)]
pub(crate) struct GlobalArgs {
    /// Path to configuration file (default: auto-discover arbor.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Store snapshot file (overrides config).
    #[arg(long, global = true, env = "ARBOR_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Cache directory (overrides config).
    #[arg(long, global = true, env = "ARBOR_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Working language (default: site.default_language).
    #[arg(short, long, global = true)]
    language: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,
}
