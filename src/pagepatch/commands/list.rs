use crate::commands::{CmdMessage, CmdResult, ListedRecord};
use crate::error::Result;
use crate::model::PageIdentity;
use crate::store::{PatchStore, StorageBackend};

/// Lists stored records in insertion order. Positions count across all
/// pages, so they stay stable whether or not a page filter is applied.
pub fn run<B: StorageBackend>(
    store: &PatchStore<B>,
    page: Option<&PageIdentity>,
) -> Result<CmdResult> {
    let listed: Vec<ListedRecord> = store
        .records()?
        .into_iter()
        .enumerate()
        .filter(|(_, record)| page.is_none_or(|p| record.page == *p))
        .map(|(i, record)| ListedRecord {
            position: i + 1,
            record,
        })
        .collect();

    let mut result = CmdResult::default();
    if listed.is_empty() {
        result.add_message(CmdMessage::info(match page {
            Some(p) => format!("No stored edits for {}", p),
            None => "No stored edits.".to_string(),
        }));
    }
    Ok(result.with_listed_records(listed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PatchRecord;
    use crate::store::MemBackend;

    fn seeded() -> PatchStore<MemBackend> {
        let store = PatchStore::with_backend(MemBackend::new());
        store
            .upsert(PatchRecord::text(
                "https://a.test/".into(),
                "body/p[1]".parse().unwrap(),
                "x",
                "y",
            ))
            .unwrap();
        store
            .upsert(PatchRecord::overlay("https://b.test/".into(), "{}"))
            .unwrap();
        store
            .upsert(PatchRecord::text(
                "https://a.test/".into(),
                "body/p[2]".parse().unwrap(),
                "x",
                "y",
            ))
            .unwrap();
        store
    }

    #[test]
    fn test_lists_everything_in_order() {
        let result = run(&seeded(), None).unwrap();
        let positions: Vec<_> = result.listed_records.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert!(result.messages.is_empty());
    }

    #[test]
    fn test_page_filter_keeps_global_positions() {
        let page: PageIdentity = "https://a.test/".into();
        let result = run(&seeded(), Some(&page)).unwrap();
        let positions: Vec<_> = result.listed_records.iter().map(|l| l.position).collect();
        assert_eq!(positions, vec![1, 3]);
    }

    #[test]
    fn test_empty_store_says_so() {
        let store = PatchStore::with_backend(MemBackend::new());
        let result = run(&store, None).unwrap();
        assert!(result.listed_records.is_empty());
        assert_eq!(result.messages[0].content, "No stored edits.");
    }
}
