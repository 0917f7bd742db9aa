//! # Edit Sessions
//!
//! Interactive capture of a single edit. At most one session is open per
//! page; [`Editor`] owns it and drives the state machine:
//!
//! ```text
//! Idle ──activate / create_overlay──▶ Editing ──save──▶ Saved
//!                                        │
//!                                        └──cancel──▶ Cancelled
//! ```
//!
//! For text and image edits the original element is never edited directly.
//! An editable clone is positioned over it and the original is hidden with
//! `visibility: hidden`, which keeps its layout box so nothing reflows. The
//! locator is computed while no clone is in the tree: a clone is a same-tag
//! sibling and would shift the original's index.
//!
//! Overlay sessions edit a free-floating box instead. Their geometry and
//! fill are adjusted through [`Editor::set_overlay_rect`] and
//! [`Editor::set_overlay_fill`].
//!
//! Activating another element while a session is open cancels the open one
//! first.

use crate::config::{PagepatchConfig, Preferences};
use crate::dom::{Document, NodeId, Rect, Viewport};
use crate::error::{PatchError, Result};
use crate::locator::{compute_path, LocatorPath};
use crate::model::{EditKind, PageIdentity, PatchRecord};
use crate::overlay::{px, OverlayFill, OverlaySpec, OVERLAY_CLASS};
use crate::store::{PatchStore, StorageBackend};
use tracing::{debug, warn};

pub const CLONE_CLASS: &str = "pagepatch-clone";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Editing,
    Saved,
    Cancelled,
}

/// Result of a save that reached the page.
#[derive(Debug)]
pub enum SaveOutcome {
    Persisted,
    /// The page shows the edit but the store rejected it.
    NotPersisted(PatchError),
}

impl SaveOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, SaveOutcome::Persisted)
    }
}

/// Which edit an element qualifies for, if any.
///
/// Form fields never qualify. Images qualify for image editing, anything else
/// with visible text for text editing; each is gated by its preference.
pub fn qualifying_kind<D: Document + ?Sized>(
    doc: &D,
    node: NodeId,
    prefs: &Preferences,
) -> Option<EditKind> {
    let tag = doc.tag_name(node)?;
    if has_class(doc, node, OVERLAY_CLASS) || has_class(doc, node, CLONE_CLASS) {
        return None;
    }
    match tag.as_str() {
        "input" | "textarea" => None,
        "img" => prefs.image_editing_enabled.then_some(EditKind::Image),
        _ if !doc.text_content(node).trim().is_empty() => {
            prefs.text_editing_enabled.then_some(EditKind::Text)
        }
        _ => None,
    }
}

fn has_class<D: Document + ?Sized>(doc: &D, node: NodeId, class: &str) -> bool {
    doc.attribute(node, "class")
        .map(|classes| classes.split_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

#[derive(Debug)]
struct ElementEdit {
    kind: EditKind,
    original: NodeId,
    clone: NodeId,
    locator: LocatorPath,
    /// Value shown by the original when the session opened.
    pre_edit: String,
    prior_visibility: Option<String>,
}

#[derive(Debug)]
struct OverlayEdit {
    node: NodeId,
    initial: OverlaySpec,
    current: OverlaySpec,
}

#[derive(Debug)]
enum ActiveEdit {
    Element(ElementEdit),
    Overlay(OverlayEdit),
}

impl ActiveEdit {
    fn kind(&self) -> EditKind {
        match self {
            ActiveEdit::Element(edit) => edit.kind,
            ActiveEdit::Overlay(_) => EditKind::Overlay,
        }
    }
}

/// Owner of the page's single edit session.
#[derive(Debug)]
pub struct Editor {
    page: PageIdentity,
    active: Option<ActiveEdit>,
    state: SessionState,
}

impl Editor {
    pub fn new(page: PageIdentity) -> Self {
        Self {
            page,
            active: None,
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn active_kind(&self) -> Option<EditKind> {
        self.active.as_ref().map(ActiveEdit::kind)
    }

    /// Clone being edited, or the overlay element.
    pub fn editing_node(&self) -> Option<NodeId> {
        match self.active.as_ref()? {
            ActiveEdit::Element(edit) => Some(edit.clone),
            ActiveEdit::Overlay(edit) => Some(edit.node),
        }
    }

    /// Opens a session on `node` if it qualifies. Returns the kind entered,
    /// or `None` when the element does not qualify (nothing changes then).
    pub fn activate<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        prefs: &Preferences,
        node: NodeId,
    ) -> Result<Option<EditKind>> {
        let Some(kind) = qualifying_kind(&*doc, node, prefs) else {
            return Ok(None);
        };
        // The open session's clone is a same-tag sibling until it is gone.
        if self.active.is_some() {
            debug!("new activation, cancelling open session");
            self.cancel(doc)?;
        }

        let locator = compute_path(&*doc, node)?;
        let parent = doc.parent(node).ok_or(PatchError::Detached)?;

        let pre_edit = current_value(&*doc, node, kind);
        let clone = build_clone(doc, node, kind, &pre_edit)?;
        doc.insert_before(parent, clone, Some(node))?;
        let prior_visibility = doc.style(node, "visibility");
        doc.set_style(node, "visibility", "hidden")?;

        debug!(page = %self.page, locator = %locator, kind = %kind, "entered edit session");
        self.active = Some(ActiveEdit::Element(ElementEdit {
            kind,
            original: node,
            clone,
            locator,
            pre_edit,
            prior_visibility,
        }));
        self.state = SessionState::Editing;
        Ok(Some(kind))
    }

    /// Inserts a default overlay centered in the viewport and opens an
    /// overlay session on it.
    pub fn create_overlay<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        viewport: Viewport,
        config: &PagepatchConfig,
    ) -> Result<NodeId> {
        if self.active.is_some() {
            self.cancel(doc)?;
        }
        let (x, y) = viewport.center();
        let spec = OverlaySpec::new(
            Rect::new(x, y, config.overlay_width, config.overlay_height),
            config.overlay_fill,
        );
        let node = spec.insert(doc)?;
        self.active = Some(ActiveEdit::Overlay(OverlayEdit {
            node,
            initial: spec,
            current: spec,
        }));
        self.state = SessionState::Editing;
        Ok(node)
    }

    /// Replaces the clone's value: typed text or a chosen image source.
    pub fn set_value<D: Document + ?Sized>(&mut self, doc: &mut D, value: &str) -> Result<()> {
        match self.active.as_ref() {
            Some(ActiveEdit::Element(edit)) => write_value(doc, edit.clone, edit.kind, value),
            Some(ActiveEdit::Overlay(_)) => Err(PatchError::Session(
                "overlays have no value to set".to_string(),
            )),
            None => Err(no_session()),
        }
    }

    pub fn set_image_size<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        width: f64,
        height: f64,
    ) -> Result<()> {
        match self.active.as_ref() {
            Some(ActiveEdit::Element(edit)) if edit.kind == EditKind::Image => {
                doc.set_style(edit.clone, "width", &px(width))?;
                doc.set_style(edit.clone, "height", &px(height))
            }
            Some(_) => Err(PatchError::Session(
                "only image edits can be resized".to_string(),
            )),
            None => Err(no_session()),
        }
    }

    pub fn set_overlay_rect<D: Document + ?Sized>(&mut self, doc: &mut D, rect: Rect) -> Result<()> {
        let edit = self.overlay_mut()?;
        edit.current.rect = rect;
        edit.current.paint(doc, edit.node)
    }

    pub fn set_overlay_fill<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        fill: OverlayFill,
    ) -> Result<()> {
        let edit = self.overlay_mut()?;
        edit.current.fill = fill;
        edit.current.paint(doc, edit.node)
    }

    fn overlay_mut(&mut self) -> Result<&mut OverlayEdit> {
        match self.active.as_mut() {
            Some(ActiveEdit::Overlay(edit)) => Ok(edit),
            Some(_) => Err(PatchError::Session(
                "open session is not an overlay".to_string(),
            )),
            None => Err(no_session()),
        }
    }

    /// Commits the edit to the page, closes the session and upserts the
    /// record. A store failure does not undo the page change; it comes back
    /// as [`SaveOutcome::NotPersisted`].
    ///
    /// If writing to the page fails the session stays open, clone and all,
    /// so the caller can retry or [`cancel`](Editor::cancel).
    pub fn save<D, B>(&mut self, doc: &mut D, store: &PatchStore<B>) -> Result<SaveOutcome>
    where
        D: Document + ?Sized,
        B: StorageBackend,
    {
        let active = self.active.as_ref().ok_or_else(no_session)?;
        let record = match active {
            ActiveEdit::Element(edit) => commit_element(doc, &self.page, edit)?,
            ActiveEdit::Overlay(edit) => {
                PatchRecord::overlay(self.page.clone(), edit.current.to_json()?)
            }
        };
        self.active = None;
        self.state = SessionState::Saved;

        match store.upsert(record) {
            Ok(()) => Ok(SaveOutcome::Persisted),
            Err(e) => {
                warn!(page = %self.page, error = %e, "edit applied but not persisted");
                Ok(SaveOutcome::NotPersisted(e))
            }
        }
    }

    /// Puts the clone back to the original value: the stored record's
    /// `originalContent` if one exists, else what the original shows now.
    /// Overlays return to their initial geometry and fill. Writes nothing.
    pub fn reset<D, B>(&mut self, doc: &mut D, store: &PatchStore<B>) -> Result<()>
    where
        D: Document + ?Sized,
        B: StorageBackend,
    {
        match self.active.as_mut() {
            Some(ActiveEdit::Element(edit)) => {
                let stored = store
                    .find(&self.page, &edit.locator)?
                    .and_then(|record| record.original_value);
                let value = match stored {
                    Some(value) => value,
                    None => current_value(&*doc, edit.original, edit.kind),
                };
                write_value(doc, edit.clone, edit.kind, &value)
            }
            Some(ActiveEdit::Overlay(edit)) => {
                edit.current = edit.initial;
                edit.current.paint(doc, edit.node)
            }
            None => Err(no_session()),
        }
    }

    /// Discards the session without writing anything. No-op when idle.
    pub fn cancel<D: Document + ?Sized>(&mut self, doc: &mut D) -> Result<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };
        self.state = SessionState::Cancelled;
        match active {
            ActiveEdit::Element(edit) => {
                close_element(doc, edit.original, edit.clone, edit.prior_visibility)
            }
            ActiveEdit::Overlay(edit) => doc.remove(edit.node),
        }
    }
}

fn no_session() -> PatchError {
    PatchError::Session("no edit in progress".to_string())
}

/// Writes the clone's value onto the original and removes the clone.
fn commit_element<D: Document + ?Sized>(
    doc: &mut D,
    page: &PageIdentity,
    edit: &ElementEdit,
) -> Result<PatchRecord> {
    let value = current_value(&*doc, edit.clone, edit.kind);
    write_value(doc, edit.original, edit.kind, &value)?;

    let record = match edit.kind {
        EditKind::Image => {
            let width = doc.style(edit.clone, "width");
            let height = doc.style(edit.clone, "height");
            for (property, size) in [("width", &width), ("height", &height)] {
                if let Some(size) = size {
                    doc.set_style(edit.original, property, size)?;
                }
            }
            PatchRecord::image(page.clone(), edit.locator.clone(), value, edit.pre_edit.clone())
                .with_size(width, height)
        }
        _ => PatchRecord::text(page.clone(), edit.locator.clone(), value, edit.pre_edit.clone()),
    };
    close_element(doc, edit.original, edit.clone, edit.prior_visibility.clone())?;
    Ok(record)
}

fn current_value<D: Document + ?Sized>(doc: &D, node: NodeId, kind: EditKind) -> String {
    match kind {
        EditKind::Image => doc.attribute(node, "src").unwrap_or_default(),
        _ => doc.text_content(node),
    }
}

fn write_value<D: Document + ?Sized>(
    doc: &mut D,
    node: NodeId,
    kind: EditKind,
    value: &str,
) -> Result<()> {
    match kind {
        EditKind::Image => doc.set_attribute(node, "src", value),
        _ => doc.set_text_content(node, value),
    }
}

/// Detached copy of `original`, positioned over it.
fn build_clone<D: Document + ?Sized>(
    doc: &mut D,
    original: NodeId,
    kind: EditKind,
    value: &str,
) -> Result<NodeId> {
    let tag = doc
        .tag_name(original)
        .ok_or(PatchError::NodeNotFound(original.index()))?;
    let clone = doc.create_element(&tag);

    let class = match doc.attribute(original, "class") {
        Some(existing) if !existing.trim().is_empty() => format!("{} {}", CLONE_CLASS, existing),
        _ => CLONE_CLASS.to_string(),
    };
    doc.set_attribute(clone, "class", &class)?;
    if kind == EditKind::Text {
        doc.set_attribute(clone, "contenteditable", "true")?;
    }
    write_value(doc, clone, kind, value)?;

    let rect = doc.bounding_rect(original);
    doc.set_style(clone, "position", "absolute")?;
    doc.set_style(clone, "left", &px(rect.x))?;
    doc.set_style(clone, "top", &px(rect.y))?;
    for (property, measured) in [("width", rect.width), ("height", rect.height)] {
        let size = doc.style(original, property).unwrap_or_else(|| px(measured));
        doc.set_style(clone, property, &size)?;
    }
    Ok(clone)
}

fn close_element<D: Document + ?Sized>(
    doc: &mut D,
    original: NodeId,
    clone: NodeId,
    prior_visibility: Option<String>,
) -> Result<()> {
    doc.remove(clone)?;
    match prior_visibility {
        Some(value) => doc.set_style(original, "visibility", &value),
        None => doc.remove_style(original, "visibility"),
    }
}
