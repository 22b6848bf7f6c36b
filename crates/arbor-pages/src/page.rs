//! Reserved page ids and the tree role derived from them.

use arbor_storage::{PageId, PageRecord};
use serde::{Deserialize, Serialize};

/// Role of a page in the navigation tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeType {
    Home,
    Sitemap,
    Error,
    Hidden,
    Page,
}

impl TreeType {
    /// Classify a page. Reserved ids win over the hidden flag.
    #[must_use]
    pub fn classify(id: PageId, hidden: bool) -> Self {
        match id {
            PageId::HOME => Self::Home,
            PageId::SITEMAP => Self::Sitemap,
            PageId::ERROR => Self::Error,
            _ if hidden => Self::Hidden,
            _ => Self::Page,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Sitemap => "sitemap",
            Self::Error => "error",
            Self::Hidden => "hidden",
            Self::Page => "page",
        }
    }
}

/// Override stored permission flags for reserved pages.
///
/// Home and the error page can never be moved or deleted, and the error page
/// never takes children, whatever the row says.
pub(crate) fn apply_reserved_flags(page: &mut PageRecord) {
    if matches!(page.id, PageId::HOME | PageId::ERROR) {
        page.allow_move = false;
        page.allow_delete = false;
    }
    if page.id == PageId::ERROR {
        page.allow_children = false;
    }
}
