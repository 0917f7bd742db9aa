use super::backend::StorageBackend;
use super::schema::{decode_records, encode_records};
use crate::config::Preferences;
use crate::error::{PatchError, Result};
use crate::model::PatchRecord;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const PATCHES_FILE: &str = "patches.json";
const PREFERENCES_FILE: &str = "preferences.json";

pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn patches_path(&self) -> PathBuf {
        self.root.join(PATCHES_FILE)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.root.join(PREFERENCES_FILE)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(PatchError::Io)?;
        }
        Ok(())
    }

    fn read_optional(&self, path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(path).map(Some).map_err(PatchError::Io)
    }

    /// Atomic write: a reader sees either the old file or the new one.
    fn write_atomic(&self, target: &Path, stem: &str, content: &str) -> Result<()> {
        self.ensure_dir()?;
        let tmp_path = self.root.join(format!(".{}-{}.tmp", stem, Uuid::new_v4()));
        fs::write(&tmp_path, content).map_err(PatchError::Io)?;
        if let Err(e) = fs::rename(&tmp_path, target) {
            let _ = fs::remove_file(&tmp_path);
            return Err(PatchError::Io(e));
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn load_patches(&self) -> Result<Vec<PatchRecord>> {
        match self.read_optional(&self.patches_path())? {
            Some(raw) => decode_records(&raw),
            None => Ok(Vec::new()),
        }
    }

    fn save_patches(&self, records: &[PatchRecord]) -> Result<()> {
        let content = encode_records(records)?;
        self.write_atomic(&self.patches_path(), "patches", &content)
    }

    fn load_preferences(&self) -> Result<Option<Preferences>> {
        match self.read_optional(&self.preferences_path())? {
            Some(raw) => {
                let preferences: Preferences =
                    serde_json::from_str(&raw).map_err(PatchError::Serialization)?;
                Ok(Some(preferences))
            }
            None => Ok(None),
        }
    }

    fn save_preferences(&self, preferences: &Preferences) -> Result<()> {
        let content =
            serde_json::to_string_pretty(preferences).map_err(PatchError::Serialization)?;
        self.write_atomic(&self.preferences_path(), "preferences", &content)
    }
}
