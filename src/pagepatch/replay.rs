//! Replay of stored edits onto a freshly loaded page.

use crate::dom::{Document, NodeId};
use crate::error::Result;
use crate::locator::resolve_path;
use crate::model::{EditKind, PageIdentity, PatchRecord};
use crate::overlay::OverlaySpec;
use crate::store::{PatchStore, StorageBackend};
use tracing::{debug, info, warn};

/// Outcome counts of one replay pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayReport {
    /// Text and image records written onto the page.
    pub applied: usize,
    /// Overlay elements inserted.
    pub overlays: usize,
    /// Records whose locator no longer resolves.
    pub skipped: usize,
    /// Records whose stored value could not be used.
    pub corrupt: usize,
}

impl ReplayReport {
    pub fn total(&self) -> usize {
        self.applied + self.overlays + self.skipped + self.corrupt
    }
}

/// Applies every stored record for `page` to `doc`, in insertion order.
///
/// Not idempotent for overlays: each call inserts them again. A single
/// record failing never stops the pass; only failing to read the store does.
pub fn apply_stored_edits<B, D>(
    store: &PatchStore<B>,
    doc: &mut D,
    page: &PageIdentity,
) -> Result<ReplayReport>
where
    B: StorageBackend,
    D: Document + ?Sized,
{
    let mut report = ReplayReport::default();

    for record in store.records_for(page)? {
        match record.kind {
            EditKind::Text | EditKind::Image => {
                apply_located(store, doc, page, &record, &mut report)
            }
            EditKind::Overlay => match OverlaySpec::from_json(&record.new_value) {
                Ok(spec) => match spec.insert(doc) {
                    Ok(_) => report.overlays += 1,
                    Err(e) => {
                        warn!(page = %page, error = %e, "could not insert overlay");
                        report.corrupt += 1;
                    }
                },
                Err(e) => {
                    warn!(page = %page, error = %e, "skipping corrupt overlay record");
                    report.corrupt += 1;
                }
            },
        }
    }

    info!(
        page = %page,
        applied = report.applied,
        overlays = report.overlays,
        skipped = report.skipped,
        corrupt = report.corrupt,
        "replayed stored edits"
    );
    Ok(report)
}

fn apply_located<B, D>(
    store: &PatchStore<B>,
    doc: &mut D,
    page: &PageIdentity,
    record: &PatchRecord,
    report: &mut ReplayReport,
) where
    B: StorageBackend,
    D: Document + ?Sized,
{
    let Some(locator) = record.locator.as_ref() else {
        report.corrupt += 1;
        return;
    };
    let Some(node) = resolve_path(&*doc, locator) else {
        debug!(page = %page, locator = %locator, "locator no longer resolves, skipping");
        report.skipped += 1;
        return;
    };

    let written = match record.kind {
        EditKind::Text => {
            store.note_live_original(page, locator, doc.text_content(node));
            doc.set_text_content(node, &record.new_value)
        }
        EditKind::Image => {
            let current = doc.attribute(node, "src").unwrap_or_default();
            store.note_live_original(page, locator, current);
            write_image(doc, node, record)
        }
        EditKind::Overlay => return,
    };

    match written {
        Ok(()) => report.applied += 1,
        Err(e) => {
            warn!(page = %page, locator = %locator, error = %e, "could not apply stored edit");
            report.skipped += 1;
        }
    }
}

fn write_image<D: Document + ?Sized>(
    doc: &mut D,
    node: NodeId,
    record: &PatchRecord,
) -> Result<()> {
    doc.set_attribute(node, "src", &record.new_value)?;
    for (property, value) in [("width", &record.width), ("height", &record.height)] {
        match value.as_deref() {
            Some(v) if !v.is_empty() => doc.set_style(node, property, v)?,
            _ => {}
        }
    }
    Ok(())
}
