//! JSON page snapshots.
//!
//! A snapshot is a plain tree: elements are objects, text nodes are strings.
//!
//! ```json
//! { "tag": "body", "children": [
//!     { "tag": "h1", "attrs": { "id": "title" }, "children": ["Pricing"] },
//!     { "tag": "img", "attrs": { "src": "logo.png" } }
//! ] }
//! ```
//!
//! The command-line tool replays stored patches onto snapshots, and tests use
//! them to build fixtures quickly.

use super::mem::{MemDocument, NodeKind};
use super::{Document, NodeId, Rect};
use crate::error::{PatchError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeSnapshot {
    Text(String),
    Element(ElementSnapshot),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<Rect>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl ElementSnapshot {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: BTreeMap::new(),
            style: BTreeMap::new(),
            rect: None,
            children: Vec::new(),
        }
    }
}

impl Drop for ElementSnapshot {
    // Flattens the subtree before it is freed; the derived drop would recurse once per level.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(child) = pending.pop() {
            if let NodeSnapshot::Element(mut element) = child {
                pending.append(&mut element.children);
            }
        }
    }
}

impl MemDocument {
    pub fn from_snapshot(root: &ElementSnapshot) -> Result<Self> {
        let mut doc = MemDocument::new(&root.tag);
        let root_id = doc.root();
        doc.fill(root_id, root)?;
        doc.take_mutations();
        Ok(doc)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let root: ElementSnapshot =
            serde_json::from_str(json).map_err(PatchError::Serialization)?;
        Self::from_snapshot(&root)
    }

    /// Copies `snapshot` under `root` with an explicit work list, so nesting
    /// depth is bounded by the heap rather than the call stack.
    fn fill(&mut self, root: NodeId, snapshot: &ElementSnapshot) -> Result<()> {
        let mut pending = vec![(root, snapshot)];
        while let Some((node, snapshot)) = pending.pop() {
            for (name, value) in &snapshot.attrs {
                self.set_attribute(node, name, value)?;
            }
            for (property, value) in &snapshot.style {
                self.set_style(node, property, value)?;
            }
            if let Some(rect) = snapshot.rect {
                self.set_rect(node, rect)?;
            }
            for child in &snapshot.children {
                match child {
                    NodeSnapshot::Text(text) => {
                        self.append_text(node, text)?;
                    }
                    NodeSnapshot::Element(element) => {
                        let child_id = self.append_element(node, &element.tag)?;
                        pending.push((child_id, element));
                    }
                }
            }
        }
        Ok(())
    }

    /// Snapshot of the attached tree. Detached nodes are not included.
    pub fn to_snapshot(&self) -> ElementSnapshot {
        self.snapshot_element(self.root())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.to_snapshot()).map_err(PatchError::Serialization)
    }

    fn snapshot_element(&self, root: NodeId) -> ElementSnapshot {
        // One frame per open element: its snapshot so far and the children left to visit.
        let mut frames = vec![(self.element_shell(root), self.nodes[root.0].children.iter())];
        let mut finished = None;
        while let Some((snapshot, children)) = frames.last_mut() {
            match children.next() {
                Some(&child) => match &self.nodes[child.0].kind {
                    NodeKind::Text(text) => snapshot.children.push(NodeSnapshot::Text(text.clone())),
                    NodeKind::Element { .. } => {
                        let frame = (self.element_shell(child), self.nodes[child.0].children.iter());
                        frames.push(frame);
                    }
                },
                None => {
                    if let Some((done, _)) = frames.pop() {
                        match frames.last_mut() {
                            Some((parent, _)) => parent.children.push(NodeSnapshot::Element(done)),
                            None => finished = Some(done),
                        }
                    }
                }
            }
        }
        finished.unwrap_or_else(|| self.element_shell(root))
    }

    fn element_shell(&self, node: NodeId) -> ElementSnapshot {
        let data = &self.nodes[node.0];
        match &data.kind {
            NodeKind::Element {
                tag,
                attributes,
                style,
            } => ElementSnapshot {
                tag: tag.clone(),
                attrs: attributes.clone(),
                style: style.clone(),
                rect: data.rect,
                children: Vec::new(),
            },
            NodeKind::Text(_) => ElementSnapshot::new("#text"),
        }
    }
}
