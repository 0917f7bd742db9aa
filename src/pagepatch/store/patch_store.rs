use super::backend::StorageBackend;
use crate::config::{PreferenceUpdate, Preferences};
use crate::error::Result;
use crate::locator::LocatorPath;
use crate::model::{PageIdentity, PatchRecord, RecordKey};
use chrono::Utc;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Keyed record collection over a [`StorageBackend`].
///
/// The backend is the source of truth. Records are read once, lazily, and
/// cached for the lifetime of the store. Every mutation writes the complete
/// next collection through the backend first and only then swaps the cache,
/// so a failed write leaves both untouched.
pub struct PatchStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    cache: RefCell<Option<Vec<PatchRecord>>>,
    live_originals: RefCell<HashMap<RecordKey, String>>,
}

impl<B: StorageBackend> PatchStore<B> {
    pub fn with_backend(backend: B) -> Self {
        Self {
            backend,
            cache: RefCell::new(None),
            live_originals: RefCell::new(HashMap::new()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.cache.borrow().is_some() {
            return Ok(());
        }
        let records = collapse_duplicates(self.backend.load_patches()?);
        debug!(count = records.len(), "loaded patch records");
        *self.cache.borrow_mut() = Some(records);
        Ok(())
    }

    fn with_records<R>(&self, f: impl FnOnce(&[PatchRecord]) -> R) -> Result<R> {
        self.ensure_loaded()?;
        let cache = self.cache.borrow();
        Ok(f(cache.as_deref().unwrap_or_default()))
    }

    fn commit(&self, next: Vec<PatchRecord>) -> Result<()> {
        if let Err(e) = self.backend.save_patches(&next) {
            warn!(error = %e, "patch store flush failed, keeping previous state");
            return Err(e);
        }
        *self.cache.borrow_mut() = Some(next);
        Ok(())
    }

    /// All records for all pages, in insertion order.
    pub fn records(&self) -> Result<Vec<PatchRecord>> {
        self.with_records(|records| records.to_vec())
    }

    pub fn records_for(&self, page: &PageIdentity) -> Result<Vec<PatchRecord>> {
        self.with_records(|records| {
            records
                .iter()
                .filter(|r| r.page == *page)
                .cloned()
                .collect()
        })
    }

    pub fn len(&self) -> Result<usize> {
        self.with_records(|records| records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Text or image record for `(page, locator)`.
    ///
    /// If replay noted the element's live value this session, that value is
    /// reported as the original instead of the persisted one.
    pub fn find(&self, page: &PageIdentity, locator: &LocatorPath) -> Result<Option<PatchRecord>> {
        let found = self.with_records(|records| {
            records
                .iter()
                .find(|r| r.matches(page, locator))
                .cloned()
        })?;
        Ok(found.map(|mut record| {
            let key = (page.clone(), locator.clone());
            if let Some(live) = self.live_originals.borrow().get(&key) {
                record.original_value = Some(live.clone());
            }
            record
        }))
    }

    /// Inserts `record`, or updates the record with the same key in place.
    ///
    /// An update replaces kind, value, dimensions and `updated_at`. The stored
    /// `original_value` and `created_at` are kept. Overlays always append.
    pub fn upsert(&self, record: PatchRecord) -> Result<()> {
        let mut next = self.records()?;
        let existing = record
            .key()
            .and_then(|key| next.iter().position(|r| r.key().as_ref() == Some(&key)));

        match existing {
            Some(index) => {
                let current = &mut next[index];
                current.kind = record.kind;
                current.new_value = record.new_value;
                current.width = record.width;
                current.height = record.height;
                current.updated_at = Utc::now();
                if current.original_value.is_none() {
                    current.original_value = record.original_value;
                }
                debug!(page = %current.page, kind = %current.kind, "updated patch record");
            }
            None => {
                debug!(page = %record.page, kind = %record.kind, "appended patch record");
                next.push(record);
            }
        }
        self.commit(next)
    }

    /// Empties the store for every page. Returns how many records were dropped.
    pub fn clear(&self) -> Result<usize> {
        let dropped = self.len()?;
        self.commit(Vec::new())?;
        self.live_originals.borrow_mut().clear();
        info!(dropped, "cleared patch store");
        Ok(dropped)
    }

    /// Remembers the value an element showed before replay overwrote it.
    /// Session-scoped: never persisted, dropped by [`PatchStore::clear`].
    pub fn note_live_original(
        &self,
        page: &PageIdentity,
        locator: &LocatorPath,
        value: impl Into<String>,
    ) {
        self.live_originals
            .borrow_mut()
            .insert((page.clone(), locator.clone()), value.into());
    }

    /// Stored preferences, or install defaults.
    pub fn preferences(&self) -> Result<Preferences> {
        Ok(self.backend.load_preferences()?.unwrap_or_default())
    }

    /// Applies `update` to the stored preferences and persists the result.
    pub fn update_preferences(&self, update: &PreferenceUpdate) -> Result<Preferences> {
        let mut preferences = self.preferences()?;
        preferences.apply(update);
        self.backend.save_preferences(&preferences)?;
        Ok(preferences)
    }
}

/// Keeps the first record per key, which is the one `find` would return.
fn collapse_duplicates(records: Vec<PatchRecord>) -> Vec<PatchRecord> {
    let mut seen: HashSet<RecordKey> = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if let Some(key) = record.key() {
            if !seen.insert(key) {
                warn!(
                    page = %record.page,
                    locator = ?record.locator.as_ref().map(ToString::to_string),
                    "discarding duplicate patch record"
                );
                continue;
            }
        }
        kept.push(record);
    }
    kept
}
