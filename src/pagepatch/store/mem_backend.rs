use super::backend::StorageBackend;
use super::schema::{decode_records, encode_records};
use crate::config::Preferences;
use crate::error::{PatchError, Result};
use crate::model::PatchRecord;
use std::cell::RefCell;

/// In-memory storage backend for testing.
///
/// Records are kept in their encoded form so tests exercise the same codec
/// as the filesystem backend, and can seed legacy layouts directly.
#[derive(Default)]
pub struct MemBackend {
    patches: RefCell<Option<String>>,
    preferences: RefCell<Option<Preferences>>,
    simulate_write_error: RefCell<bool>,
    writes: RefCell<usize>,
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend whose record partition already holds `raw`.
    pub fn with_raw_patches(raw: impl Into<String>) -> Self {
        let backend = Self::default();
        *backend.patches.borrow_mut() = Some(raw.into());
        backend
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Encoded record partition as last written.
    pub fn raw_patches(&self) -> Option<String> {
        self.patches.borrow().clone()
    }

    /// Number of successful writes across both partitions.
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }

    fn check_writable(&self) -> Result<()> {
        if *self.simulate_write_error.borrow() {
            return Err(PatchError::Store("Simulated write error".to_string()));
        }
        Ok(())
    }
}

impl StorageBackend for MemBackend {
    fn load_patches(&self) -> Result<Vec<PatchRecord>> {
        match self.patches.borrow().as_deref() {
            Some(raw) => decode_records(raw),
            None => Ok(Vec::new()),
        }
    }

    fn save_patches(&self, records: &[PatchRecord]) -> Result<()> {
        self.check_writable()?;
        let raw = encode_records(records)?;
        *self.patches.borrow_mut() = Some(raw);
        *self.writes.borrow_mut() += 1;
        Ok(())
    }

    fn load_preferences(&self) -> Result<Option<Preferences>> {
        Ok(*self.preferences.borrow())
    }

    fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        self.check_writable()?;
        *self.preferences.borrow_mut() = Some(*preferences);
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}
