use super::{Document, NodeId, Rect};
use crate::error::{PatchError, Result};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub(crate) enum NodeKind {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        style: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) rect: Option<Rect>,
}

/// Arena-backed document for tests and offline replay.
///
/// Nodes are never freed: `remove` only detaches, so stale handles keep
/// answering queries (as detached nodes do in a browser). Every child-list
/// change bumps a counter that stands in for a subtree `MutationObserver`;
/// drain it with [`MemDocument::take_mutations`].
#[derive(Debug, Clone)]
pub struct MemDocument {
    pub(crate) nodes: Vec<NodeData>,
    root: NodeId,
    mutations: usize,
}

impl MemDocument {
    /// New document containing only a root element.
    pub fn new(root_tag: &str) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            mutations: 0,
        };
        doc.root = doc.push_element(root_tag);
        doc
    }

    fn push_element(&mut self, tag: &str) -> NodeId {
        self.push(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            style: BTreeMap::new(),
        })
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
            rect: None,
        });
        id
    }

    fn node(&self, node: NodeId) -> Result<&NodeData> {
        self.nodes.get(node.0).ok_or(PatchError::NodeNotFound(node.0))
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut NodeData> {
        self.nodes
            .get_mut(node.0)
            .ok_or(PatchError::NodeNotFound(node.0))
    }

    fn element_parts_mut(
        &mut self,
        node: NodeId,
    ) -> Result<(&mut BTreeMap<String, String>, &mut BTreeMap<String, String>)> {
        match &mut self.node_mut(node)?.kind {
            NodeKind::Element {
                attributes, style, ..
            } => Ok((attributes, style)),
            NodeKind::Text(_) => Err(PatchError::Api(format!("{} is a text node", node))),
        }
    }

    /// Builder helper: creates an element and appends it to `parent`.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId> {
        let child = self.create_element(tag);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Builder helper: appends a text node to `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        let child = self.push(NodeKind::Text(text.to_string()));
        self.attach(parent, child, None)?;
        Ok(child)
    }

    /// Sets the layout box reported by `bounding_rect`.
    pub fn set_rect(&mut self, node: NodeId, rect: Rect) -> Result<()> {
        self.node_mut(node)?.rect = Some(rect);
        Ok(())
    }

    /// Number of child-list mutations since the last call.
    pub fn take_mutations(&mut self) -> usize {
        std::mem::take(&mut self.mutations)
    }

    /// All attached nodes with the given tag, in document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.tag_name(node).as_deref() == Some(tag) {
                found.push(node);
            }
            stack.extend(self.children(node).into_iter().rev());
        }
        found
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        if parent == child {
            return Err(PatchError::Api("cannot insert a node into itself".into()));
        }
        // Reject cycles: `child` may not be an ancestor of `parent`.
        let mut cursor = Some(parent);
        while let Some(n) = cursor {
            if n == child {
                return Err(PatchError::Api(format!(
                    "{} is an ancestor of {}",
                    child, parent
                )));
            }
            cursor = self.node(n)?.parent;
        }

        self.detach(child)?;

        let position = match reference {
            Some(r) => self
                .node(parent)?
                .children
                .iter()
                .position(|c| *c == r)
                .ok_or_else(|| {
                    PatchError::Api(format!("{} is not a child of {}", r, parent))
                })?,
            None => self.node(parent)?.children.len(),
        };
        self.node_mut(parent)?.children.insert(position, child);
        self.node_mut(child)?.parent = Some(parent);
        self.mutations += 1;
        Ok(())
    }

    fn detach(&mut self, node: NodeId) -> Result<()> {
        if let Some(parent) = self.node(node)?.parent {
            self.node_mut(parent)?.children.retain(|c| *c != node);
            self.node_mut(node)?.parent = None;
            self.mutations += 1;
        }
        Ok(())
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        if let Some(data) = self.nodes.get(node.0) {
            match &data.kind {
                NodeKind::Text(t) => out.push_str(t),
                NodeKind::Element { .. } => {
                    for child in &data.children {
                        self.collect_text(*child, out);
                    }
                }
            }
        }
    }
}

impl Document for MemDocument {
    fn root(&self) -> NodeId {
        self.root
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        match self.nodes.get(node.0) {
            Some(data) => data
                .children
                .iter()
                .copied()
                .filter(|c| matches!(self.nodes[c.0].kind, NodeKind::Element { .. }))
                .collect(),
            None => Vec::new(),
        }
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let (attributes, _) = self.element_parts_mut(node)?;
        attributes.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()> {
        self.element_parts_mut(node)?;
        let old_children = std::mem::take(&mut self.node_mut(node)?.children);
        for child in old_children {
            self.node_mut(child)?.parent = None;
        }
        self.mutations += 1;
        if !text.is_empty() {
            let text_node = self.push(NodeKind::Text(text.to_string()));
            self.node_mut(text_node)?.parent = Some(node);
            self.node_mut(node)?.children.push(text_node);
        }
        Ok(())
    }

    fn style(&self, node: NodeId, property: &str) -> Option<String> {
        match &self.nodes.get(node.0)?.kind {
            NodeKind::Element { style, .. } => style.get(property).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    fn set_style(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        let (_, style) = self.element_parts_mut(node)?;
        style.insert(property.to_string(), value.to_string());
        Ok(())
    }

    fn remove_style(&mut self, node: NodeId, property: &str) -> Result<()> {
        let (_, style) = self.element_parts_mut(node)?;
        style.remove(property);
        Ok(())
    }

    fn bounding_rect(&self, node: NodeId) -> Rect {
        self.nodes
            .get(node.0)
            .and_then(|n| n.rect)
            .unwrap_or_default()
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.push_element(tag)
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        self.element_parts_mut(parent)?;
        self.attach(parent, child, reference)
    }

    fn remove(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(PatchError::Api("cannot remove the root element".into()));
        }
        self.detach(node)
    }
}
