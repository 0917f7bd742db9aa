//! # Page Context
//!
//! Per-tab controller tying the pieces together. The host glue creates one
//! [`PageContext`] per loaded document and forwards three kinds of events:
//!
//! 1. **Lifecycle**: [`PageContext::begin_load`] once, then
//!    [`PageContext::on_mutations`] for every observed batch of tree changes
//!    and [`PageContext::tick`] from a timer. Replay runs from `tick` when the
//!    settle detector fires.
//! 2. **Activations**: a double-click (or equivalent) on an element goes to
//!    [`PageContext::activate`]; the session controls go to `save`, `reset`,
//!    `cancel` and the `set_*` helpers.
//! 3. **Broadcast messages** from the settings surface, as JSON:
//!
//! ```json
//! { "showEditsEnabled": false, "command": "clearStorage" }
//! ```
//!
//! Each preference present in a message replaces only that toggle. Sessions
//! already open are left alone.

use crate::config::{PagepatchConfig, PreferenceUpdate, Preferences};
use crate::dom::{Document, NodeId, Rect, Viewport};
use crate::error::Result;
use crate::model::{EditKind, PageIdentity};
use crate::overlay::OverlayFill;
use crate::replay::{apply_stored_edits, ReplayReport};
use crate::session::{Editor, SaveOutcome, SessionState};
use crate::settle::SettleDetector;
use crate::store::{PatchStore, StorageBackend};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    ClearStorage,
    CreateOverlay,
    /// Any command this engine does not know. The rest of the message still applies.
    #[serde(other)]
    Unknown,
}

/// Broadcast message: any subset of the preference keys plus an optional command.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(flatten)]
    pub preferences: PreferenceUpdate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Command>,
}

impl Message {
    pub fn command(command: Command) -> Self {
        Self {
            preferences: PreferenceUpdate::default(),
            command: Some(command),
        }
    }

    pub fn preferences(update: PreferenceUpdate) -> Self {
        Self {
            preferences: update,
            command: None,
        }
    }
}

/// Reply to a command message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    StorageCleared,
    OverlayCreated,
}

impl Response {
    pub fn message(&self) -> &'static str {
        match self {
            Response::StorageCleared => "Storage cleared",
            Response::OverlayCreated => "Overlay created",
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

pub struct PageContext<B: StorageBackend, D: Document> {
    page: PageIdentity,
    doc: D,
    store: PatchStore<B>,
    prefs: Preferences,
    config: PagepatchConfig,
    settle: SettleDetector,
    editor: Editor,
    last_replay: Option<ReplayReport>,
}

impl<B: StorageBackend, D: Document> PageContext<B, D> {
    /// Reads the stored preferences; everything else starts idle.
    pub fn new(
        page: PageIdentity,
        doc: D,
        store: PatchStore<B>,
        config: PagepatchConfig,
    ) -> Result<Self> {
        let prefs = store.preferences()?;
        Ok(Self {
            editor: Editor::new(page.clone()),
            settle: SettleDetector::new(config.settle_delay()),
            page,
            doc,
            store,
            prefs,
            config,
            last_replay: None,
        })
    }

    pub fn page(&self) -> &PageIdentity {
        &self.page
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn store(&self) -> &PatchStore<B> {
        &self.store
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn settle(&self) -> &SettleDetector {
        &self.settle
    }

    pub fn session_state(&self) -> SessionState {
        self.editor.state()
    }

    pub fn active_kind(&self) -> Option<EditKind> {
        self.editor.active_kind()
    }

    pub fn editing_node(&self) -> Option<NodeId> {
        self.editor.editing_node()
    }

    pub fn last_replay(&self) -> Option<ReplayReport> {
        self.last_replay
    }

    /// Arms the settle detector when replay-on-load is on.
    pub fn begin_load(&mut self, now: Instant) {
        if self.prefs.replay_on_load() {
            self.settle.arm(now);
        }
    }

    pub fn on_mutations(&mut self, now: Instant, count: usize) {
        if count > 0 && self.prefs.replay_on_load() {
            self.settle.notify_mutation(now);
        }
    }

    /// Runs replay if the page has settled. Returns the report of that pass.
    ///
    /// While an edit session is open the detector is not polled, so a
    /// deadline that passes mid-edit fires on the first tick after the
    /// session closes.
    pub fn tick(&mut self, now: Instant) -> Result<Option<ReplayReport>> {
        if self.editor.active_kind().is_some() {
            return Ok(None);
        }
        if !self.settle.poll(now) {
            return Ok(None);
        }
        let report = apply_stored_edits(&self.store, &mut self.doc, &self.page)?;
        self.last_replay = Some(report);
        Ok(Some(report))
    }

    pub fn activate(&mut self, node: NodeId) -> Result<Option<EditKind>> {
        self.editor.activate(&mut self.doc, &self.prefs, node)
    }

    pub fn set_value(&mut self, value: &str) -> Result<()> {
        self.editor.set_value(&mut self.doc, value)
    }

    pub fn set_image_size(&mut self, width: f64, height: f64) -> Result<()> {
        self.editor.set_image_size(&mut self.doc, width, height)
    }

    pub fn set_overlay_rect(&mut self, rect: Rect) -> Result<()> {
        self.editor.set_overlay_rect(&mut self.doc, rect)
    }

    pub fn set_overlay_fill(&mut self, fill: OverlayFill) -> Result<()> {
        self.editor.set_overlay_fill(&mut self.doc, fill)
    }

    pub fn save(&mut self) -> Result<SaveOutcome> {
        self.editor.save(&mut self.doc, &self.store)
    }

    pub fn reset(&mut self) -> Result<()> {
        self.editor.reset(&mut self.doc, &self.store)
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.editor.cancel(&mut self.doc)
    }

    /// Applies a broadcast message. Commands produce a [`Response`].
    pub fn handle_message(
        &mut self,
        message: &Message,
        now: Instant,
        viewport: Viewport,
    ) -> Result<Option<Response>> {
        if !message.preferences.is_empty() {
            let was_replaying = self.prefs.replay_on_load();
            self.prefs.apply(&message.preferences);
            debug!(page = %self.page, prefs = ?self.prefs, "preferences updated");

            match (was_replaying, self.prefs.replay_on_load()) {
                (true, false) => self.settle.cancel(),
                (false, true) if !self.settle.has_fired() => self.settle.arm(now),
                _ => {}
            }
        }

        let response = match message.command {
            Some(Command::ClearStorage) => {
                let dropped = self.store.clear()?;
                info!(page = %self.page, dropped, "storage cleared on request");
                Some(Response::StorageCleared)
            }
            Some(Command::CreateOverlay) => {
                self.editor
                    .create_overlay(&mut self.doc, viewport, &self.config)?;
                Some(Response::OverlayCreated)
            }
            Some(Command::Unknown) => {
                debug!(page = %self.page, "ignoring unknown command");
                None
            }
            None => None,
        };
        Ok(response)
    }
}
