use crate::commands::{CmdMessage, CmdResult};
use crate::dom::mem::MemDocument;
use crate::error::Result;
use crate::model::PageIdentity;
use crate::replay::apply_stored_edits;
use crate::store::{PatchStore, StorageBackend};

/// Applies the records stored for `page` to a page snapshot and returns the
/// patched snapshot.
pub fn run<B: StorageBackend>(
    store: &PatchStore<B>,
    snapshot: &str,
    page: &PageIdentity,
) -> Result<CmdResult> {
    let mut doc = MemDocument::from_json(snapshot)?;
    let report = apply_stored_edits(store, &mut doc, page)?;
    let document = doc.to_json()?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "Applied {} edit(s) and {} overlay(s) to {}",
        report.applied, report.overlays, page
    )));
    if report.skipped > 0 {
        result.add_message(CmdMessage::warning(format!(
            "{} edit(s) no longer match the page structure",
            report.skipped
        )));
    }
    if report.corrupt > 0 {
        result.add_message(CmdMessage::warning(format!(
            "{} stored record(s) could not be read",
            report.corrupt
        )));
    }
    Ok(result.with_replay(report).with_document(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PatchRecord;
    use crate::store::MemBackend;

    const SNAPSHOT: &str = r#"{"tag":"body","children":[{"tag":"h1","children":["Old"]}]}"#;

    #[test]
    fn test_replay_onto_snapshot() {
        let store = PatchStore::with_backend(MemBackend::new());
        let page: PageIdentity = "https://a.test/".into();
        store
            .upsert(PatchRecord::text(
                page.clone(),
                "body/h1[1]".parse().unwrap(),
                "New",
                "Old",
            ))
            .unwrap();
        store
            .upsert(PatchRecord::text(
                page.clone(),
                "body/h2[1]".parse().unwrap(),
                "Gone",
                "Gone",
            ))
            .unwrap();

        let result = run(&store, SNAPSHOT, &page).unwrap();
        let report = result.replay.unwrap();
        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, 1);
        assert!(result.document.unwrap().contains("\"New\""));
        assert_eq!(result.messages.len(), 2);
    }

    #[test]
    fn test_bad_snapshot_is_an_error() {
        let store = PatchStore::with_backend(MemBackend::new());
        assert!(run(&store, "[]", &"https://a.test/".into()).is_err());
    }
}
