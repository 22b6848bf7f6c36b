//! Typed records for the page, meta, block and template tables.
//!
//! Records reject unknown fields on deserialization so untrusted input can't
//! smuggle columns past the boundary.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident($inner:ty)) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[derive(Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub $inner);

        impl $name {
            /// Raw numeric value.
            #[must_use]
            pub fn get(self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
}

id_type!(
    /// Page identity, shared by every revision of the page.
    PageId(u32)
);
id_type!(
    /// Identifier of one immutable page revision.
    RevisionId(u64)
);
id_type!(
    /// Content block identifier.
    BlockId(u64)
);
id_type!(
    /// Meta row identifier (holds the URL slug).
    MetaId(u64)
);
id_type!(
    /// Layout template identifier.
    TemplateId(u32)
);
id_type!(
    /// Backend user identifier.
    UserId(u32)
);

impl PageId {
    /// Virtual parent of every top-level page.
    pub const ROOT: Self = Self(0);
    /// The home page.
    pub const HOME: Self = Self(1);
    /// The sitemap page.
    pub const SITEMAP: Self = Self(2);
    /// The error (404) page.
    pub const ERROR: Self = Self(404);
}

/// Working language code (e.g. `en`, `nl`, `pt-br`).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    /// Parse and validate a language code.
    ///
    /// # Errors
    ///
    /// Returns an invalid input error for empty codes or codes containing
    /// anything other than lowercase ASCII letters and `-`.
    pub fn new(code: impl Into<String>) -> Result<Self, StorageError> {
        let code = code.into();
        if code.is_empty() {
            return Err(StorageError::invalid_input("language code cannot be empty"));
        }
        if !code.chars().all(|c| c.is_ascii_lowercase() || c == '-') {
            return Err(StorageError::invalid_input(format!(
                "invalid language code: {code}"
            )));
        }
        Ok(Self(code))
    }

    /// Language code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Language {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Language {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.0
    }
}

/// Page lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    /// The published version. Exactly one per (id, language).
    Active,
    /// A user's working copy.
    Draft,
    /// A historical revision.
    Archive,
}

impl PageStatus {
    /// Lowercase name as stored.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Draft => "draft",
            Self::Archive => "archive",
        }
    }
}

impl FromStr for PageStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "draft" => Ok(Self::Draft),
            "archive" => Ok(Self::Archive),
            other => Err(StorageError::invalid_input(format!(
                "unknown page status: {other}"
            ))),
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Section of the site a page renders in.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    /// Main navigation.
    #[default]
    Page,
    /// Meta navigation.
    Meta,
    /// Footer links.
    Footer,
    /// Pages outside any menu.
    Root,
}

impl Zone {
    /// All zones in rendering order.
    pub const ALL: [Self; 4] = [Self::Page, Self::Meta, Self::Footer, Self::Root];

    /// Lowercase name as stored.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Meta => "meta",
            Self::Footer => "footer",
            Self::Root => "root",
        }
    }
}

impl FromStr for Zone {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "page" => Ok(Self::Page),
            "meta" => Ok(Self::Meta),
            "footer" => Ok(Self::Footer),
            "root" => Ok(Self::Root),
            other => Err(StorageError::invalid_input(format!("unknown zone: {other}"))),
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Block lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockStatus {
    /// Block of the current revision.
    Active,
    /// Block of a historical revision.
    Archive,
}

/// Page data supplied by callers for insert and update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewPage {
    pub id: PageId,
    pub language: Language,
    pub user_id: UserId,
    pub template_id: TemplateId,
    pub meta_id: MetaId,
    pub parent_id: PageId,
    pub sequence: i64,
    #[serde(rename = "type", default)]
    pub zone: Zone,
    pub status: PageStatus,
    pub title: String,
    pub navigation_title: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub has_extra: bool,
    #[serde(default = "default_true")]
    pub allow_move: bool,
    #[serde(default = "default_true")]
    pub allow_edit: bool,
    #[serde(default = "default_true")]
    pub allow_delete: bool,
    #[serde(default = "default_true")]
    pub allow_children: bool,
    /// Unix seconds.
    pub created_on: i64,
    /// Unix seconds.
    pub edited_on: i64,
    /// Unix seconds.
    pub publish_on: i64,
}

fn default_true() -> bool {
    true
}

impl NewPage {
    /// Attach the revision id assigned by the store.
    #[must_use]
    pub fn into_record(self, revision_id: RevisionId) -> PageRecord {
        PageRecord {
            revision_id,
            id: self.id,
            language: self.language,
            user_id: self.user_id,
            template_id: self.template_id,
            meta_id: self.meta_id,
            parent_id: self.parent_id,
            sequence: self.sequence,
            zone: self.zone,
            status: self.status,
            title: self.title,
            navigation_title: self.navigation_title,
            hidden: self.hidden,
            has_extra: self.has_extra,
            allow_move: self.allow_move,
            allow_edit: self.allow_edit,
            allow_delete: self.allow_delete,
            allow_children: self.allow_children,
            created_on: self.created_on,
            edited_on: self.edited_on,
            publish_on: self.publish_on,
        }
    }
}

/// One stored page revision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageRecord {
    pub id: PageId,
    pub revision_id: RevisionId,
    pub language: Language,
    pub user_id: UserId,
    pub template_id: TemplateId,
    pub meta_id: MetaId,
    pub parent_id: PageId,
    pub sequence: i64,
    #[serde(rename = "type")]
    pub zone: Zone,
    pub status: PageStatus,
    pub title: String,
    pub navigation_title: String,
    pub hidden: bool,
    pub has_extra: bool,
    pub allow_move: bool,
    pub allow_edit: bool,
    pub allow_delete: bool,
    pub allow_children: bool,
    pub created_on: i64,
    pub edited_on: i64,
    pub publish_on: i64,
}

/// Tree loader row: an active page joined with its meta URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageSummary {
    pub id: PageId,
    pub parent_id: PageId,
    pub sequence: i64,
    pub zone: Zone,
    pub title: String,
    pub navigation_title: String,
    pub hidden: bool,
    pub has_extra: bool,
    /// URL segment from the meta row.
    pub url: String,
}

/// Revision listing row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RevisionSummary {
    pub id: PageId,
    pub revision_id: RevisionId,
    pub user_id: UserId,
    pub title: String,
    pub edited_on: i64,
}

/// Meta data supplied when creating a meta row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewMeta {
    /// URL segment of the page.
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keywords: String,
}

/// Stored meta row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaRecord {
    pub id: MetaId,
    pub url: String,
    pub title: String,
    pub description: String,
    pub keywords: String,
}

/// Content block belonging to one revision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockRecord {
    pub id: BlockId,
    pub revision_id: RevisionId,
    /// Attached module extra, if any.
    #[serde(default)]
    pub extra_id: Option<u32>,
    #[serde(default)]
    pub html: String,
    pub status: BlockStatus,
    pub created_on: i64,
    pub edited_on: i64,
}

/// Template data supplied for insert and update.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTemplate {
    pub label: String,
    pub path: String,
    pub num_blocks: u32,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    /// Grid layout, e.g. `[1,2],[3:selected,4]`. `None` if the template has no layout yet.
    #[serde(default)]
    pub format: Option<String>,
    /// Block index to block label.
    #[serde(default)]
    pub names: BTreeMap<String, String>,
}

/// Stored template row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateRecord {
    pub id: TemplateId,
    pub label: String,
    pub path: String,
    pub num_blocks: u32,
    pub is_default: bool,
    pub active: bool,
    pub format: Option<String>,
    pub names: BTreeMap<String, String>,
}

impl TemplateRecord {
    /// Build a record from input data and an assigned id.
    #[must_use]
    pub fn from_new(id: TemplateId, template: NewTemplate) -> Self {
        Self {
            id,
            label: template.label,
            path: template.path,
            num_blocks: template.num_blocks,
            is_default: template.is_default,
            active: template.active,
            format: template.format,
            names: template.names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_validation() {
        assert!(Language::new("en").is_ok());
        assert!(Language::new("pt-br").is_ok());
        assert!(Language::new("").is_err());
        assert!(Language::new("EN").is_err());
        assert!(Language::new("en/../x").is_err());
    }

    #[test]
    fn test_language_deserialize_rejects_invalid() {
        let ok: Result<Language, _> = serde_json::from_str("\"nl\"");
        assert_eq!(ok.unwrap().as_str(), "nl");

        let bad: Result<Language, _> = serde_json::from_str("\"N L\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_zone_and_status_round_trip_names() {
        for zone in Zone::ALL {
            assert_eq!(zone.as_str().parse::<Zone>().unwrap(), zone);
        }
        assert_eq!("draft".parse::<PageStatus>().unwrap(), PageStatus::Draft);
        assert!("published".parse::<PageStatus>().is_err());
        assert!("sidebar".parse::<Zone>().is_err());
    }

    #[test]
    fn test_new_page_rejects_unknown_fields() {
        let json = r#"{
            "id": 5, "language": "en", "user_id": 1, "template_id": 1, "meta_id": 1,
            "parent_id": 1, "sequence": 1, "status": "active", "title": "About",
            "navigation_title": "About", "created_on": 0, "edited_on": 0, "publish_on": 0,
            "is_admin": true
        }"#;

        let result: Result<NewPage, _> = serde_json::from_str(json);

        let err = result.unwrap_err().to_string();
        assert!(err.contains("is_admin"), "unexpected error: {err}");
    }

    #[test]
    fn test_new_page_defaults_flags() {
        let json = r#"{
            "id": 5, "language": "en", "user_id": 1, "template_id": 1, "meta_id": 1,
            "parent_id": 1, "sequence": 1, "status": "active", "title": "About",
            "navigation_title": "About", "created_on": 0, "edited_on": 0, "publish_on": 0
        }"#;

        let page: NewPage = serde_json::from_str(json).unwrap();

        assert_eq!(page.zone, Zone::Page);
        assert!(!page.hidden);
        assert!(page.allow_children);
        assert!(page.allow_delete);
    }

    #[test]
    fn test_reserved_ids() {
        assert_eq!(PageId::HOME.get(), 1);
        assert_eq!(PageId::SITEMAP.get(), 2);
        assert_eq!(PageId::ERROR.get(), 404);
        assert_eq!(PageId::ROOT.to_string(), "0");
    }
}
