//! Template layout grids.
//!
//! A template's `format` describes its block layout as bracketed rows of
//! comma-separated cells, for example `[1,2],[3:selected,4]`. A cell refers
//! to a block by its index; `:selected` marks the block shown by default.
//! Cells whose index has no entry in the template's `names` are spacers.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::PagesError;

static FORMAT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[[^\[\]]*\](?:,\[[^\[\]]*\])*$").expect("invalid template format regex")
});

const SELECTED_MARKER: &str = ":selected";

/// One cell of a layout row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GridCell {
    /// Block index, `None` for a spacer.
    pub index: Option<String>,
    /// Block label from the template's names.
    pub label: Option<String>,
    pub selected: bool,
}

/// Parsed layout of a template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TemplateGrid {
    pub rows: Vec<Vec<GridCell>>,
}

impl TemplateGrid {
    /// Parse a layout format against the template's block names.
    ///
    /// # Errors
    ///
    /// Returns [`PagesError::Validation`] if `format` is not a list of
    /// bracketed rows.
    pub fn parse(format: &str, names: &BTreeMap<String, String>) -> Result<Self, PagesError> {
        let format: String = format.chars().filter(|c| !c.is_whitespace()).collect();
        if !FORMAT_PATTERN.is_match(&format) {
            return Err(PagesError::Validation(format!(
                "invalid template format: {format:?}"
            )));
        }

        let rows = format
            .split("],[")
            .map(|row| {
                row.trim_matches(|c| c == '[' || c == ']')
                    .split(',')
                    .map(|cell| parse_cell(cell, names))
                    .collect()
            })
            .collect();

        Ok(Self { rows })
    }

    /// Indices of the blocks marked as selected, in layout order.
    pub fn selected(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flatten()
            .filter(|c| c.selected)
            .filter_map(|c| c.index.as_deref())
            .collect()
    }
}

fn parse_cell(cell: &str, names: &BTreeMap<String, String>) -> GridCell {
    let selected = cell.contains(SELECTED_MARKER);
    let key = cell.replace(SELECTED_MARKER, "");
    match names.get(&key) {
        Some(label) => GridCell {
            index: Some(key),
            label: Some(label.clone()),
            selected,
        },
        None => GridCell {
            index: None,
            label: None,
            selected,
        },
    }
}
