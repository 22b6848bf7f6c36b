//! `arbor rebuild` command implementation.

use clap::Args;

use super::GlobalArgs;
use super::site::Site;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the rebuild command.
#[derive(Args)]
pub(crate) struct RebuildArgs {
    /// Rebuild every configured language, not just the working one.
    #[arg(long)]
    all: bool,
}

impl RebuildArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = Site::open(global)?;

        let languages = if self.all {
            site.languages()?
        } else {
            vec![site.language.clone()]
        };

        output.info(&format!(
            "Cache: {}",
            site.config.resolved.cache_dir.display()
        ));
        for language in &languages {
            let navigation = site.pages.rebuild(language)?;
            output.success(&format!(
                "Rebuilt navigation for {language}: {} pages",
                navigation.keys().len()
            ));
        }
        Ok(())
    }
}
