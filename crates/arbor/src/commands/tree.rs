//! `arbor tree` command implementation.

use arbor_pages::{MenuItem, TreeType};
use clap::Args;

use super::GlobalArgs;
use super::site::Site;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the tree command.
#[derive(Args)]
pub(crate) struct TreeArgs {
    /// Print the tree as JSON.
    #[arg(long)]
    json: bool,
}

impl TreeArgs {
    pub(crate) fn execute(self, global: &GlobalArgs) -> Result<(), CliError> {
        let output = Output::new();
        let site = Site::open(global)?;
        let view = site.pages.navigation(&site.language)?.tree_view();

        if self.json {
            output.result(&serde_json::to_string_pretty(&view)?);
            return Ok(());
        }

        let sections = [
            ("Pages", view.home.as_slice()),
            ("Meta", view.meta.as_slice()),
            ("Footer", view.footer.as_slice()),
            ("Root", view.root.as_slice()),
        ];
        for (title, items) in sections {
            if items.is_empty() {
                continue;
            }
            output.highlight(title);
            for line in render_lines(items) {
                output.result(&line);
            }
        }
        Ok(())
    }
}

/// One indented line per item, depth first.
fn render_lines(items: &[MenuItem]) -> Vec<String> {
    fn walk(items: &[MenuItem], depth: usize, lines: &mut Vec<String>) {
        for item in items {
            let entry = &item.entry;
            let hidden = if entry.tree_type == TreeType::Hidden {
                " (hidden)"
            } else {
                ""
            };
            lines.push(format!(
                "{}{} [{}] /{}{hidden}",
                "  ".repeat(depth),
                entry.navigation_title,
                entry.page_id,
                entry.full_url
            ));
            walk(&item.children, depth + 1, lines);
        }
    }

    let mut lines = Vec::new();
    walk(items, 0, &mut lines);
    lines
}
