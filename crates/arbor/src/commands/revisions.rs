//! `arbor revisions` command implementation.

use arbor_storage::{PageId, PageStatus, RevisionSummary};
use clap::{Args, ValueEnum};

use super::GlobalArgs;
use super::site::Site;
use crate::error::CliError;
use crate::output::Output;

#[derive(Clone, Copy, ValueEnum)]
enum Status {
    Active,
    Archive,
    Draft,
}

impl From<Status> for PageStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Active => Self::Active,
            Status::Archive => Self::Archive,
            Status::Draft => Self::Draft,
        }
    }
}

/// Arguments for the revisions command.
#[derive(Args)]
pub(crate) struct RevisionsArgs {
    /// Page ID (default: recent revisions of every page).
    page_id: Option<PageId>,

    /// Revision status to list.
    #[arg(short, long, value_enum, default_value_t = Status::Archive)]
    status: Status,

    /// Maximum number of revisions to show.
    #[arg(short = 'n', long, default_value_t = 20)]
    limit: usize,
}

impl RevisionsArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = Site::open(global)?;
        let status = PageStatus::from(self.status);

        let revisions = match self.page_id {
            Some(id) => {
                let mut revisions = site.pages.revisions(id, &site.language, status)?;
                revisions.truncate(self.limit);
                revisions
            }
            None => site.pages.recent(&site.language, status, self.limit)?,
        };

        for revision in &revisions {
            output.result(&format_revision(revision));
        }
        Ok(())
    }
}

fn format_revision(revision: &RevisionSummary) -> String {
    format!(
        "{}\tpage {}\tuser {}\t{}\t{}",
        revision.revision_id, revision.id, revision.user_id, revision.edited_on, revision.title
    )
}

#[cfg(test)]
mod tests {
    use arbor_storage::{RevisionId, UserId};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_format_revision() {
        let revision = RevisionSummary {
            id: PageId(1001),
            revision_id: RevisionId(42),
            user_id: UserId(3),
            title: "About us".to_owned(),
            edited_on: 1_700_000_000,
        };

        assert_eq!(
            format_revision(&revision),
            "42\tpage 1001\tuser 3\t1700000000\tAbout us"
        );
    }
}
