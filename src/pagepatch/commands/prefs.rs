use crate::commands::{CmdMessage, CmdResult};
use crate::config::Preferences;
use crate::error::{PatchError, Result};
use crate::store::{PatchStore, StorageBackend};

#[derive(Debug, Clone)]
pub enum PrefsAction {
    ShowAll,
    ShowKey(String),
    Set(String, bool),
}

pub fn run<B: StorageBackend>(store: &PatchStore<B>, action: PrefsAction) -> Result<CmdResult> {
    match action {
        PrefsAction::ShowAll => Ok(CmdResult::default().with_preferences(store.preferences()?)),
        PrefsAction::ShowKey(key) => {
            let preferences = store.preferences()?;
            let mut result = CmdResult::default();
            match preferences.get(&key) {
                Ok(value) => result.add_message(CmdMessage::info(format!("{} = {}", key, value))),
                Err(e) => result.add_message(CmdMessage::error(e.to_string())),
            }
            Ok(result)
        }
        PrefsAction::Set(key, value) => {
            let update = match Preferences::update_for(&key, value) {
                Ok(update) => update,
                Err(e) => {
                    let mut result = CmdResult::default();
                    result.add_message(CmdMessage::error(e.to_string()));
                    return Ok(result);
                }
            };
            let preferences = store.update_preferences(&update)?;
            let mut result = CmdResult::default().with_preferences(preferences);
            result.add_message(CmdMessage::success(format!("{} set to {}", key, value)));
            Ok(result)
        }
    }
}

/// Parses the user-facing spelling of a toggle value.
pub fn parse_toggle(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Ok(true),
        "off" | "false" | "no" | "0" => Ok(false),
        other => Err(PatchError::Api(format!(
            "Invalid toggle value: {} (use on or off)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::MessageLevel;
    use crate::store::MemBackend;

    fn store() -> PatchStore<MemBackend> {
        PatchStore::with_backend(MemBackend::new())
    }

    #[test]
    fn test_show_all_defaults() {
        let result = run(&store(), PrefsAction::ShowAll).unwrap();
        assert_eq!(result.preferences, Some(Preferences::default()));
    }

    #[test]
    fn test_set_persists_single_toggle() {
        let store = store();
        run(&store, PrefsAction::Set("show-edits".into(), false)).unwrap();
        let prefs = store.preferences().unwrap();
        assert!(!prefs.show_edits_enabled);
        assert!(prefs.text_editing_enabled);

        let result = run(&store, PrefsAction::ShowKey("show-edits".into())).unwrap();
        assert_eq!(result.messages[0].content, "show-edits = false");
    }

    #[test]
    fn test_unknown_key_is_reported_not_raised() {
        let store = store();
        let result = run(&store, PrefsAction::Set("dark-mode".into(), true)).unwrap();
        assert!(matches!(result.messages[0].level, MessageLevel::Error));
        assert_eq!(store.backend().write_count(), 0);
    }

    #[test]
    fn test_parse_toggle() {
        assert!(parse_toggle("ON").unwrap());
        assert!(!parse_toggle("0").unwrap());
        assert!(parse_toggle("maybe").is_err());
    }
}
