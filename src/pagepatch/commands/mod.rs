//! # Command Layer
//!
//! Store-level operations behind the settings surface and the command-line
//! tool. Each command lives in its own submodule and returns a structured
//! [`CmdResult`]; none of them print, prompt or touch the terminal.
//!
//! Snapshot-based commands take the snapshot text, not a path. Reading files
//! is the caller's job.
//!
//! ## Command Modules
//!
//! - [`list`]: Stored records, optionally for one page
//! - [`clear`]: Empty the store for every page
//! - [`prefs`]: Show or change the three toggles
//! - [`replay`]: Apply stored records to a page snapshot
//! - [`locate`]: Resolve a locator path against a page snapshot

use crate::config::Preferences;
use crate::model::PatchRecord;
use crate::replay::ReplayReport;
use serde::Serialize;

pub mod clear;
pub mod list;
pub mod locate;
pub mod prefs;
pub mod replay;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// A stored record with its 1-based position in the store.
#[derive(Debug, Clone)]
pub struct ListedRecord {
    pub position: usize,
    pub record: PatchRecord,
}

/// Element found by [`locate`].
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedElement {
    pub tag: String,
    pub text: String,
    /// Path computed back from the element; differs from the query when an
    /// ancestor gained an id.
    pub canonical_path: String,
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub listed_records: Vec<ListedRecord>,
    pub preferences: Option<Preferences>,
    pub replay: Option<ReplayReport>,
    /// Serialized page snapshot produced by the command.
    pub document: Option<String>,
    pub located: Option<LocatedElement>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_listed_records(mut self, records: Vec<ListedRecord>) -> Self {
        self.listed_records = records;
        self
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = Some(preferences);
        self
    }

    pub fn with_replay(mut self, report: ReplayReport) -> Self {
        self.replay = Some(report);
        self
    }

    pub fn with_document(mut self, document: String) -> Self {
        self.document = Some(document);
        self
    }

    pub fn with_located(mut self, located: LocatedElement) -> Self {
        self.located = Some(located);
        self
    }
}
