//! `arbor delete` command implementation.

use arbor_storage::PageId;
use clap::Args;

use super::GlobalArgs;
use super::site::Site;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the delete command.
#[derive(Args)]
pub(crate) struct DeleteArgs {
    /// Page ID.
    page_id: PageId,
}

impl DeleteArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = Site::open(global)?;

        if !site.pages.delete(self.page_id, &site.language)? {
            return Err(CliError::Validation(format!(
                "page {} doesn't exist in {} or can't be deleted",
                self.page_id, site.language
            )));
        }
        site.save()?;

        output.success(&format!("Deleted page {}", self.page_id));
        Ok(())
    }
}
