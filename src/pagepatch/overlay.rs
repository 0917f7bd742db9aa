//! Free-floating overlay boxes used to mask parts of a page.

use crate::dom::{Document, NodeId, Rect};
use crate::error::{PatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const OVERLAY_CLASS: &str = "pagepatch-overlay";
const OVERLAY_BORDER: &str = "1px solid #b3d4fc";
const OVERLAY_Z_INDEX: &str = "9999";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayFill {
    #[default]
    Black,
    White,
    Blur,
}

impl fmt::Display for OverlayFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OverlayFill::Black => "black",
            OverlayFill::White => "white",
            OverlayFill::Blur => "blur",
        };
        f.write_str(name)
    }
}

impl FromStr for OverlayFill {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "black" => Ok(OverlayFill::Black),
            "white" => Ok(OverlayFill::White),
            "blur" => Ok(OverlayFill::Blur),
            other => Err(PatchError::Api(format!("unknown overlay fill: {}", other))),
        }
    }
}

/// Geometry and fill of an overlay, in page coordinates.
///
/// Stored as the `newContent` of an overlay record. Extra keys are ignored on
/// read, which lets a serialized `DOMRect` (with `top`, `left`, ...) parse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlaySpec {
    #[serde(flatten)]
    pub rect: Rect,
    #[serde(default)]
    pub fill: OverlayFill,
}

impl OverlaySpec {
    pub fn new(rect: Rect, fill: OverlayFill) -> Self {
        Self { rect, fill }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(PatchError::Serialization)
    }

    /// Parses a stored spec. Failure means the record is corrupt.
    pub fn from_json(json: &str) -> Result<Self> {
        let spec: OverlaySpec = serde_json::from_str(json)
            .map_err(|e| PatchError::CorruptRecord(format!("overlay spec: {}", e)))?;
        let r = spec.rect;
        let finite = [r.x, r.y, r.width, r.height].iter().all(|v| v.is_finite());
        if !finite || r.width < 0.0 || r.height < 0.0 {
            return Err(PatchError::CorruptRecord(format!(
                "overlay rect out of range: {:?}",
                r
            )));
        }
        Ok(spec)
    }

    /// Writes position, size and fill onto `node`.
    pub fn paint<D: Document + ?Sized>(&self, doc: &mut D, node: NodeId) -> Result<()> {
        doc.set_style(node, "position", "absolute")?;
        doc.set_style(node, "left", &px(self.rect.x))?;
        doc.set_style(node, "top", &px(self.rect.y))?;
        doc.set_style(node, "width", &px(self.rect.width))?;
        doc.set_style(node, "height", &px(self.rect.height))?;
        doc.set_style(node, "border", OVERLAY_BORDER)?;
        doc.set_style(node, "z-index", OVERLAY_Z_INDEX)?;
        match self.fill {
            OverlayFill::Black | OverlayFill::White => {
                doc.set_style(node, "background-color", &self.fill.to_string())?;
                doc.remove_style(node, "backdrop-filter")?;
            }
            OverlayFill::Blur => {
                doc.set_style(node, "background-color", "transparent")?;
                doc.set_style(node, "backdrop-filter", "blur(5px)")?;
            }
        }
        Ok(())
    }

    /// Creates a painted overlay element and appends it to the body.
    pub fn insert<D: Document + ?Sized>(&self, doc: &mut D) -> Result<NodeId> {
        let node = doc.create_element("div");
        doc.set_attribute(node, "class", OVERLAY_CLASS)?;
        self.paint(doc, node)?;
        let body = doc.body();
        doc.append_child(body, node)?;
        Ok(node)
    }
}

pub(crate) fn px(value: f64) -> String {
    format!("{}px", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::mem::MemDocument;

    #[test]
    fn test_spec_json_shape() {
        let spec = OverlaySpec::new(Rect::new(10.0, 20.0, 300.0, 150.0), OverlayFill::White);
        let value: serde_json::Value = serde_json::from_str(&spec.to_json().unwrap()).unwrap();
        assert_eq!(value["x"], 10.0);
        assert_eq!(value["height"], 150.0);
        assert_eq!(value["fill"], "white");
    }

    #[test]
    fn test_parses_dom_rect_json() {
        let json = r#"{"x":5,"y":6,"width":7,"height":8,"top":6,"right":12,"bottom":14,"left":5}"#;
        let spec = OverlaySpec::from_json(json).unwrap();
        assert_eq!(spec.rect, Rect::new(5.0, 6.0, 7.0, 8.0));
        assert_eq!(spec.fill, OverlayFill::Black);
    }

    #[test]
    fn test_malformed_spec_is_corrupt() {
        for json in ["", "not json", r#"{"x":1}"#, r#"{"x":1,"y":1,"width":-1,"height":2}"#] {
            assert!(
                matches!(OverlaySpec::from_json(json), Err(PatchError::CorruptRecord(_))),
                "{:?}",
                json
            );
        }
    }

    #[test]
    fn test_insert_paints_and_appends_to_body() {
        let mut doc = MemDocument::new("body");
        let spec = OverlaySpec::new(Rect::new(1.0, 2.0, 3.5, 4.0), OverlayFill::Blur);
        let node = spec.insert(&mut doc).unwrap();

        assert_eq!(doc.parent(node), Some(doc.root()));
        assert_eq!(doc.style(node, "left").as_deref(), Some("1px"));
        assert_eq!(doc.style(node, "width").as_deref(), Some("3.5px"));
        assert_eq!(doc.style(node, "backdrop-filter").as_deref(), Some("blur(5px)"));
        assert_eq!(doc.style(node, "background-color").as_deref(), Some("transparent"));
        assert_eq!(doc.attribute(node, "class").as_deref(), Some(OVERLAY_CLASS));
    }

    #[test]
    fn test_fill_parse() {
        assert_eq!("blur".parse::<OverlayFill>().unwrap(), OverlayFill::Blur);
        assert!("red".parse::<OverlayFill>().is_err());
    }
}
