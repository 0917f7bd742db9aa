use crate::error::{PatchError, Result};
use crate::locator::LocatorPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Full address of a document, compared byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageIdentity(String);

impl PageIdentity {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageIdentity {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for PageIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditKind {
    Text,
    Image,
    Overlay,
}

impl EditKind {
    /// Text and image edits are keyed by locator; overlays float free.
    pub fn is_located(&self) -> bool {
        !matches!(self, EditKind::Overlay)
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditKind::Text => "text",
            EditKind::Image => "image",
            EditKind::Overlay => "overlay",
        };
        f.write_str(name)
    }
}

/// Identity of a located record.
pub type RecordKey = (PageIdentity, LocatorPath);

/// One persisted edit.
///
/// Field names on disk follow the layout the extension has always written
/// (`url`, `xpath`, `type`, `newContent`, `originalContent`), so older data
/// loads as-is. Overlays written before the value field was unified stored
/// their geometry under `rect`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRecord {
    #[serde(rename = "url")]
    pub page: PageIdentity,

    #[serde(rename = "xpath", default, skip_serializing_if = "Option::is_none")]
    pub locator: Option<LocatorPath>,

    #[serde(rename = "type")]
    pub kind: EditKind,

    /// Replacement text, image source, or serialized overlay spec.
    #[serde(rename = "newContent", alias = "rect", default)]
    pub new_value: String,

    /// Value before the first edit. Set once.
    #[serde(
        rename = "originalContent",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub original_value: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<String>,

    #[serde(rename = "createdAt", default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt", default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl PatchRecord {
    fn located(
        page: PageIdentity,
        locator: LocatorPath,
        kind: EditKind,
        new_value: String,
        original_value: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            page,
            locator: Some(locator),
            kind,
            new_value,
            original_value,
            width: None,
            height: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn text(
        page: PageIdentity,
        locator: LocatorPath,
        new_value: impl Into<String>,
        original_value: impl Into<String>,
    ) -> Self {
        Self::located(
            page,
            locator,
            EditKind::Text,
            new_value.into(),
            Some(original_value.into()),
        )
    }

    pub fn image(
        page: PageIdentity,
        locator: LocatorPath,
        src: impl Into<String>,
        original_src: impl Into<String>,
    ) -> Self {
        Self::located(
            page,
            locator,
            EditKind::Image,
            src.into(),
            Some(original_src.into()),
        )
    }

    pub fn with_size(mut self, width: Option<String>, height: Option<String>) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn overlay(page: PageIdentity, spec_json: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            page,
            locator: None,
            kind: EditKind::Overlay,
            new_value: spec_json.into(),
            original_value: None,
            width: None,
            height: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// `(page, locator)` for text and image records, `None` for overlays.
    pub fn key(&self) -> Option<RecordKey> {
        if !self.kind.is_located() {
            return None;
        }
        self.locator
            .as_ref()
            .map(|locator| (self.page.clone(), locator.clone()))
    }

    pub fn matches(&self, page: &PageIdentity, locator: &LocatorPath) -> bool {
        self.kind.is_located() && self.page == *page && self.locator.as_ref() == Some(locator)
    }

    /// Structural checks serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.kind.is_located() && self.locator.is_none() {
            return Err(PatchError::CorruptRecord(format!(
                "{} record for {} has no locator",
                self.kind, self.page
            )));
        }
        Ok(())
    }
}
