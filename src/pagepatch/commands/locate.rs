use crate::commands::{CmdMessage, CmdResult, LocatedElement};
use crate::dom::mem::MemDocument;
use crate::dom::Document;
use crate::error::Result;
use crate::locator::{compute_path, resolve_path, LocatorPath};

/// Resolves `path` against a page snapshot.
///
/// A malformed path is an error; a path that finds nothing is a warning.
pub fn run(snapshot: &str, path: &str) -> Result<CmdResult> {
    let locator: LocatorPath = path.parse()?;
    let doc = MemDocument::from_json(snapshot)?;

    let mut result = CmdResult::default();
    let Some(node) = resolve_path(&doc, &locator) else {
        result.add_message(CmdMessage::warning(format!("No element at {}", locator)));
        return Ok(result);
    };

    let located = LocatedElement {
        tag: doc.tag_name(node).unwrap_or_default(),
        text: doc.text_content(node),
        canonical_path: compute_path(&doc, node)?.to_string(),
    };
    Ok(result.with_located(located))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PatchError;

    const SNAPSHOT: &str = r#"{"tag":"body","children":[
        {"tag":"div","attrs":{"id":"nav"},"children":[{"tag":"a","children":["Home"]}]},
        {"tag":"p","children":["Body copy"]}
    ]}"#;

    #[test]
    fn test_finds_element() {
        let result = run(SNAPSHOT, "body/p[1]").unwrap();
        let located = result.located.unwrap();
        assert_eq!(located.tag, "p");
        assert_eq!(located.text, "Body copy");
        assert_eq!(located.canonical_path, "body/p[1]");
    }

    #[test]
    fn test_canonical_path_prefers_id_anchor() {
        let result = run(SNAPSHOT, "body/div[1]/a[1]").unwrap();
        assert_eq!(result.located.unwrap().canonical_path, "id(\"nav\")/a[1]");
    }

    #[test]
    fn test_missing_element_is_a_warning() {
        let result = run(SNAPSHOT, "body/p[2]").unwrap();
        assert!(result.located.is_none());
        assert_eq!(result.messages[0].content, "No element at body/p[2]");
    }

    #[test]
    fn test_malformed_path_is_an_error() {
        assert!(matches!(
            run(SNAPSHOT, "body/p[x]"),
            Err(PatchError::InvalidLocator(_))
        ));
    }
}
