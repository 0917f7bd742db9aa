//! # API Facade
//!
//! Thin facade over the command layer, and the single entry point for the
//! settings surface and the command-line tool.
//!
//! The facade:
//! - **Dispatches** to the matching function in `commands/*.rs`
//! - **Normalizes inputs** (page addresses to [`PageIdentity`], toggle words to booleans)
//! - **Returns structured types** (`Result<CmdResult>`), never strings for the terminal
//!
//! `PagepatchApi<B: StorageBackend>` is generic over the backend:
//! - Production: `PagepatchApi<FsBackend>`
//! - Testing: `PagepatchApi<MemBackend>`

use crate::commands;
use crate::error::Result;
use crate::model::PageIdentity;
use crate::store::{PatchStore, StorageBackend};

pub use crate::commands::prefs::PrefsAction;
pub use crate::commands::{CmdMessage, CmdResult, ListedRecord, LocatedElement, MessageLevel};

pub struct PagepatchApi<B: StorageBackend> {
    store: PatchStore<B>,
}

impl<B: StorageBackend> PagepatchApi<B> {
    pub fn new(backend: B) -> Self {
        Self {
            store: PatchStore::with_backend(backend),
        }
    }

    pub fn store(&self) -> &PatchStore<B> {
        &self.store
    }

    pub fn list(&self, page: Option<&str>) -> Result<CmdResult> {
        let page = page.map(PageIdentity::from);
        commands::list::run(&self.store, page.as_ref())
    }

    pub fn clear(&self) -> Result<CmdResult> {
        commands::clear::run(&self.store)
    }

    pub fn prefs(&self, key: Option<&str>, value: Option<&str>) -> Result<CmdResult> {
        let action = match (key, value) {
            (None, _) => PrefsAction::ShowAll,
            (Some(key), None) => PrefsAction::ShowKey(key.to_string()),
            (Some(key), Some(value)) => {
                PrefsAction::Set(key.to_string(), commands::prefs::parse_toggle(value)?)
            }
        };
        commands::prefs::run(&self.store, action)
    }

    pub fn replay(&self, snapshot: &str, page: &str) -> Result<CmdResult> {
        commands::replay::run(&self.store, snapshot, &PageIdentity::from(page))
    }

    pub fn locate(&self, snapshot: &str, path: &str) -> Result<CmdResult> {
        commands::locate::run(snapshot, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PatchRecord;
    use crate::store::MemBackend;
    use crate::test_utils::{seeded_store, PRICING_SNAPSHOT, PRICING_URL};

    fn api() -> PagepatchApi<MemBackend> {
        PagepatchApi::new(MemBackend::new())
    }

    #[test]
    fn test_list_filters_by_page_string() {
        let api = api();
        api.store()
            .upsert(PatchRecord::overlay("https://a.test/".into(), "{}"))
            .unwrap();
        assert_eq!(api.list(Some("https://a.test/")).unwrap().listed_records.len(), 1);
        assert!(api.list(Some("https://a.test")).unwrap().listed_records.is_empty());
        assert_eq!(api.list(None).unwrap().listed_records.len(), 1);
    }

    #[test]
    fn test_prefs_dispatch() {
        let api = api();
        assert!(api.prefs(None, None).unwrap().preferences.is_some());
        api.prefs(Some("text-editing"), Some("off")).unwrap();
        assert!(!api.store().preferences().unwrap().text_editing_enabled);
        assert!(api.prefs(Some("text-editing"), Some("perhaps")).is_err());
    }

    #[test]
    fn test_clear_dispatch() {
        let api = api();
        api.store()
            .upsert(PatchRecord::overlay("https://a.test/".into(), "{}"))
            .unwrap();
        api.clear().unwrap();
        assert!(api.store().is_empty().unwrap());
    }

    #[test]
    fn test_replay_and_locate_share_paths() {
        let api = PagepatchApi {
            store: seeded_store(),
        };
        let result = api.replay(PRICING_SNAPSHOT, PRICING_URL).unwrap();
        let report = result.replay.unwrap();
        assert_eq!(report.applied, 3);
        assert_eq!(report.overlays, 1);

        let patched = result.document.unwrap();
        let located = api.locate(&patched, "body/ul[1]/li[2]").unwrap().located.unwrap();
        assert_eq!(located.text, "Pro $15");
        assert_eq!(located.canonical_path, "id(\"plans\")/li[2]");
    }
}
