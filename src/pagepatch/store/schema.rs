//! On-disk layout of the record partition.
//!
//! Current layout (version 1):
//!
//! ```json
//! { "version": 1, "records": [ { "url": "...", "xpath": "...", ... } ] }
//! ```
//!
//! The browser extension wrote a bare array of records. That layout is read
//! as version 0 and rewritten as version 1 on the next flush.

use crate::error::{PatchError, Result};
use crate::model::PatchRecord;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Serialize)]
struct Envelope<'a> {
    version: u32,
    records: &'a [PatchRecord],
}

pub fn encode_records(records: &[PatchRecord]) -> Result<String> {
    let envelope = Envelope {
        version: SCHEMA_VERSION,
        records,
    };
    serde_json::to_string_pretty(&envelope).map_err(PatchError::Serialization)
}

/// Decodes either layout. Records that fail to parse or validate are
/// dropped with a warning; the rest load.
pub fn decode_records(raw: &str) -> Result<Vec<PatchRecord>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(raw).map_err(PatchError::Serialization)?;
    let (version, items) = match value {
        Value::Array(items) => (0, items),
        Value::Object(mut map) => {
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .ok_or_else(|| PatchError::Store("record file has no version".to_string()))?;
            let version = u32::try_from(version).unwrap_or(u32::MAX);
            if version > SCHEMA_VERSION {
                return Err(PatchError::UnsupportedSchema {
                    found: version,
                    supported: SCHEMA_VERSION,
                });
            }
            let items = match map.remove("records") {
                Some(Value::Array(items)) => items,
                None | Some(Value::Null) => Vec::new(),
                Some(_) => {
                    return Err(PatchError::Store(
                        "record file field `records` is not a list".to_string(),
                    ))
                }
            };
            (version, items)
        }
        _ => {
            return Err(PatchError::Store(
                "record file is neither a list nor a versioned object".to_string(),
            ))
        }
    };

    if version < SCHEMA_VERSION {
        debug!(
            from = version,
            to = SCHEMA_VERSION,
            "migrating record layout"
        );
    }

    let mut records = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        let record = serde_json::from_value::<PatchRecord>(item)
            .map_err(|e| PatchError::CorruptRecord(e.to_string()))
            .and_then(|record| record.validate().map(|_| record));
        match record {
            Ok(record) => records.push(record),
            Err(e) => warn!(position, error = %e, "dropping unreadable patch record"),
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EditKind;

    #[test]
    fn test_encode_writes_envelope() {
        let record = PatchRecord::text(
            "https://a.test/".into(),
            "body/p[1]".parse().unwrap(),
            "new",
            "old",
        );
        let raw = encode_records(&[record]).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["records"][0]["xpath"], "body/p[1]");
    }

    #[test]
    fn test_decode_legacy_array() {
        let raw = r#"[
            {"newContent":"Hi","url":"https://a.test/","xpath":"id(\"t\")","type":"text","originalContent":"Hello"},
            {"rect":"{\"x\":0,\"y\":0,\"width\":10,\"height\":10}","url":"https://a.test/","type":"overlay"}
        ]"#;
        let records = decode_records(raw).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].kind, EditKind::Text);
        assert_eq!(records[1].kind, EditKind::Overlay);
    }

    #[test]
    fn test_decode_drops_bad_records_and_keeps_the_rest() {
        let raw = r#"{"version":1,"records":[
            {"url":"https://a.test/","type":"text","newContent":"no locator"},
            {"url":"https://a.test/","type":"sparkle","newContent":"x"},
            {"url":"https://a.test/","xpath":"body/p[0]","type":"text","newContent":"bad index"},
            {"url":"https://a.test/","xpath":"body/p[1]","type":"text","newContent":"ok"}
        ]}"#;
        let records = decode_records(raw).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].new_value, "ok");
    }

    #[test]
    fn test_decode_rejects_newer_version() {
        let err = decode_records(r#"{"version":7,"records":[]}"#).unwrap_err();
        assert!(matches!(
            err,
            PatchError::UnsupportedSchema {
                found: 7,
                supported: 1
            }
        ));
    }

    #[test]
    fn test_decode_empty_and_garbage() {
        assert!(decode_records("").unwrap().is_empty());
        assert!(matches!(
            decode_records("{{"),
            Err(PatchError::Serialization(_))
        ));
        assert!(matches!(decode_records("42"), Err(PatchError::Store(_))));
        assert!(matches!(
            decode_records(r#"{"records":[]}"#),
            Err(PatchError::Store(_))
        ));
    }
}
