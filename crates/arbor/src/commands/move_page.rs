//! `arbor move` command implementation.

use arbor_pages::DropKind;
use arbor_storage::PageId;
use clap::{Args, ValueEnum};

use super::GlobalArgs;
use super::site::Site;
use crate::error::CliError;
use crate::output::Output;

/// Where to drop the page relative to the target.
#[derive(Clone, Copy, ValueEnum)]
enum Placement {
    Before,
    After,
    Inside,
}

impl From<Placement> for DropKind {
    fn from(placement: Placement) -> Self {
        match placement {
            Placement::Before => Self::Before,
            Placement::After => Self::After,
            Placement::Inside => Self::Inside,
        }
    }
}

/// Arguments for the move command.
#[derive(Args)]
pub(crate) struct MoveArgs {
    /// Page to move.
    page_id: PageId,

    /// Placement relative to the target.
    #[arg(value_enum)]
    placement: Placement,

    /// Target page.
    target: PageId,
}

impl MoveArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = Site::open(global)?;

        let kind = DropKind::from(self.placement);
        let position = site
            .pages
            .move_page(self.page_id, self.target, kind, &site.language)?;
        site.save()?;

        output.success(&format!(
            "Moved page {} {kind} {}: parent {}, sequence {}",
            self.page_id, self.target, position.parent_id, position.sequence
        ));
        Ok(())
    }
}
