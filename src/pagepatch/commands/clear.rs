use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::store::{PatchStore, StorageBackend};

/// Empties the store for every page.
pub fn run<B: StorageBackend>(store: &PatchStore<B>) -> Result<CmdResult> {
    let dropped = store.clear()?;
    let mut result = CmdResult::default();
    let noun = if dropped == 1 { "edit" } else { "edits" };
    result.add_message(CmdMessage::success(format!(
        "Storage cleared ({} {} removed)",
        dropped, noun
    )));
    Ok(result)
}
