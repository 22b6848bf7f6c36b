//! `arbor url` command implementation.

use arbor_storage::PageId;
use clap::Args;

use super::GlobalArgs;
use super::site::Site;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the url command.
#[derive(Args)]
pub(crate) struct UrlArgs {
    /// Page ID.
    page_id: PageId,
}

impl UrlArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = Site::open(global)?;
        output.result(&site.pages.full_url(self.page_id, &site.language)?);
        Ok(())
    }
}
