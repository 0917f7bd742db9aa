use crate::config::Preferences;
use crate::error::Result;
use crate::model::PatchRecord;

/// Abstract interface for raw storage I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while PatchStore handles the "what" (key uniqueness, caching, overrides).
pub trait StorageBackend {
    // --- Record Partition ---

    /// Load the record list (patches.json).
    /// Returns an empty list when nothing was ever written.
    /// Individual malformed records are dropped with a warning; only an
    /// unreadable container is an error.
    fn load_patches(&self) -> Result<Vec<PatchRecord>>;

    /// Replace the record list.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn save_patches(&self, records: &[PatchRecord]) -> Result<()>;

    // --- Preference Partition ---

    /// Load the stored preferences (preferences.json), `None` before first save.
    fn load_preferences(&self) -> Result<Option<Preferences>>;

    fn save_preferences(&self, preferences: &Preferences) -> Result<()>;
}
