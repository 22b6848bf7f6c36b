//! `arbor resolve-url` command implementation.

use arbor_storage::PageId;
use clap::Args;

use super::GlobalArgs;
use super::site::Site;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the resolve-url command.
#[derive(Args)]
pub(crate) struct ResolveUrlArgs {
    /// Desired URL slug.
    candidate: String,

    /// Parent page the slug must be unique under.
    #[arg(long, default_value_t = PageId::HOME)]
    parent: PageId,

    /// Page being edited, so its own slug is not a collision.
    #[arg(long)]
    page: Option<PageId>,
}

impl ResolveUrlArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = Site::open(global)?;
        let slug =
            site.pages
                .resolve_url(&self.candidate, self.page, self.parent, &site.language)?;
        output.result(&slug);
        Ok(())
    }
}
