//! # Document Abstraction
//!
//! The engine never touches a browser directly. Everything it needs from the
//! live page goes through the [`Document`] trait, which the host glue
//! implements (a `web-sys` binding in the extension, [`mem::MemDocument`] in
//! tests and in the command-line tool).
//!
//! The trait is deliberately element-centric:
//! - [`Document::children`] yields element children only, in document order.
//!   Text nodes exist behind [`Document::text_content`] but never show up as
//!   locator steps.
//! - Geometry is reported in page coordinates (scroll offset already added),
//!   so overlays and clones can be positioned with plain `left`/`top` styles.
//! - Mutating calls return `Result` because a real binding can fail (for
//!   example when a node was removed by the host page between two calls).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod mem;
pub mod snapshot;

/// Handle to a node of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Axis-aligned box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Visible window of the page.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    pub fn with_scroll(mut self, scroll_x: f64, scroll_y: f64) -> Self {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self
    }

    /// Center of the visible area in page coordinates.
    pub fn center(&self) -> (f64, f64) {
        (
            self.width / 2.0 + self.scroll_x,
            self.height / 2.0 + self.scroll_y,
        )
    }
}

/// Host page as seen by the engine.
pub trait Document {
    /// The root element paths are computed against (`body` in a content script).
    fn root(&self) -> NodeId;

    /// Parent element, `None` for the root and for detached nodes.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Element children in document order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Lower-case tag name, `None` if the handle is not an element.
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()>;

    /// Concatenated text of all descendant text nodes.
    fn text_content(&self, node: NodeId) -> String;

    /// Replaces all children with a single text node.
    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()>;

    /// Inline style property, `None` when unset.
    fn style(&self, node: NodeId, property: &str) -> Option<String>;

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()>;

    fn remove_style(&mut self, node: NodeId, property: &str) -> Result<()>;

    fn bounding_rect(&self, node: NodeId) -> Rect;

    /// Creates a detached element.
    fn create_element(&mut self, tag: &str) -> NodeId;

    /// Inserts `child` under `parent`, before `reference` or at the end.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()>;

    /// Detaches `node` (and its subtree) from the tree.
    fn remove(&mut self, node: NodeId) -> Result<()>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Element overlays get appended to. Defaults to the first `body`
    /// element at or under the root, else the root itself.
    fn body(&self) -> NodeId {
        let root = self.root();
        find_first(self, root, |doc, node| {
            doc.tag_name(node).as_deref() == Some("body")
        })
        .unwrap_or(root)
    }

    /// First element in document order whose `id` attribute equals `id`.
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        find_first(self, self.root(), |doc, node| {
            doc.attribute(node, "id").as_deref() == Some(id)
        })
    }

    /// Whether `node` is attached to the tree under the root.
    fn is_connected(&self, node: NodeId) -> bool {
        let root = self.root();
        let mut current = Some(node);
        while let Some(n) = current {
            if n == root {
                return true;
            }
            current = self.parent(n);
        }
        false
    }
}

/// Pre-order search starting at (and including) `start`.
pub fn find_first<D, F>(doc: &D, start: NodeId, pred: F) -> Option<NodeId>
where
    D: Document + ?Sized,
    F: Fn(&D, NodeId) -> bool,
{
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if pred(doc, node) {
            return Some(node);
        }
        stack.extend(doc.children(node).into_iter().rev());
    }
    None
}
