//! # Locator
//!
//! Structural addresses for elements, stable across reloads as long as the
//! page's shape does not change.
//!
//! A [`LocatorPath`] starts at an anchor and walks down by `(tag, n)` steps,
//! where `n` is the 1-based position among element siblings sharing that tag:
//!
//! ```text
//! body/div[2]/p[1]        anchored at the root element
//! id("pricing")/li[3]     anchored at the nearest ancestor with an id
//! id("hero")              the element itself carries an id
//! ```
//!
//! The text form is what gets persisted, and it matches the XPath subset the
//! browser extension has always written. Inside `id("...")` a `"` or `\` in
//! the id is written with a leading backslash, so every path survives a
//! display/parse round trip.
//!
//! Resolution against a changed page can land on a different element or on
//! nothing at all. Absence is reported as `None`, never as an error: replay
//! treats it as a normal outcome.

use crate::dom::{Document, NodeId};
use crate::error::{PatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Element whose `id` attribute equals the value.
    Id(String),
    /// The document's root element, by tag name.
    Root(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Step {
    pub tag: String,
    /// 1-based.
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocatorPath {
    anchor: Anchor,
    steps: Vec<Step>,
}

impl LocatorPath {
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            anchor: Anchor::Id(id.into()),
            steps: Vec::new(),
        }
    }

    pub fn root(tag: impl Into<String>) -> Self {
        Self {
            anchor: Anchor::Root(tag.into()),
            steps: Vec::new(),
        }
    }

    /// Appends a step. `index` is 1-based; zero is rejected.
    pub fn child(mut self, tag: impl Into<String>, index: usize) -> Result<Self> {
        let tag = tag.into();
        if index == 0 {
            return Err(PatchError::InvalidLocator(format!(
                "step {}[0]: indexes start at 1",
                tag
            )));
        }
        if !is_valid_tag(&tag) {
            return Err(PatchError::InvalidLocator(format!("bad tag name {:?}", tag)));
        }
        self.steps.push(Step { tag, index });
        Ok(self)
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// True for the one-step identifier form.
    pub fn is_id_shortcut(&self) -> bool {
        matches!(self.anchor, Anchor::Id(_)) && self.steps.is_empty()
    }
}

fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
}

fn escape_id(id: &str) -> String {
    let mut escaped = String::with_capacity(id.len());
    for c in id.chars() {
        if c == '"' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Reads an escaped id up to its closing `")`. Returns the id and the rest.
fn parse_quoted_id(after: &str) -> Option<(String, &str)> {
    let mut id = String::new();
    let mut chars = after.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => id.push(chars.next()?.1),
            '"' => return after[i + 1..].strip_prefix(')').map(|rest| (id, rest)),
            _ => id.push(c),
        }
    }
    None
}

fn writable_tag(tag: String) -> Result<String> {
    if is_valid_tag(&tag) {
        Ok(tag)
    } else {
        Err(PatchError::InvalidLocator(format!(
            "tag name {:?} cannot be written in a path",
            tag
        )))
    }
}

impl fmt::Display for LocatorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.anchor {
            Anchor::Id(id) => write!(f, "id(\"{}\")", escape_id(id))?,
            Anchor::Root(tag) => write!(f, "{}", tag)?,
        }
        for step in &self.steps {
            write!(f, "/{}[{}]", step.tag, step.index)?;
        }
        Ok(())
    }
}

impl FromStr for LocatorPath {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |why: &str| PatchError::InvalidLocator(format!("{:?}: {}", s, why));

        let (anchor, rest) = if let Some(after) = s.strip_prefix("id(\"") {
            let (id, rest) =
                parse_quoted_id(after).ok_or_else(|| invalid("unterminated id(...)"))?;
            if id.is_empty() {
                return Err(invalid("empty id"));
            }
            (Anchor::Id(id), rest)
        } else {
            let end = s.find('/').unwrap_or(s.len());
            let tag = &s[..end];
            if !is_valid_tag(tag) {
                return Err(invalid("missing root tag"));
            }
            (Anchor::Root(tag.to_ascii_lowercase()), &s[end..])
        };

        let mut path = LocatorPath {
            anchor,
            steps: Vec::new(),
        };
        if rest.is_empty() {
            return Ok(path);
        }
        let rest = rest
            .strip_prefix('/')
            .ok_or_else(|| invalid("expected '/' after anchor"))?;

        for segment in rest.split('/') {
            let open = segment
                .find('[')
                .ok_or_else(|| invalid("step without [index]"))?;
            let index_text = segment[open + 1..]
                .strip_suffix(']')
                .ok_or_else(|| invalid("unterminated [index]"))?;
            let index: usize = index_text
                .parse()
                .map_err(|_| invalid("index is not a number"))?;
            path = path
                .child(segment[..open].to_ascii_lowercase(), index)
                .map_err(|e| invalid(&e.to_string()))?;
        }
        Ok(path)
    }
}

impl TryFrom<String> for LocatorPath {
    type Error = PatchError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<LocatorPath> for String {
    fn from(path: LocatorPath) -> Self {
        path.to_string()
    }
}

/// Computes the path of `element`.
///
/// Id form if the element has a non-empty `id`; root tag alone for the root;
/// otherwise the parent's path plus this element's same-tag sibling position.
/// An element with an id'd ancestor gets anchored at that ancestor. A tag
/// name the text form cannot carry is an [`PatchError::InvalidLocator`], so
/// no record is ever stored under a path that would not load back.
pub fn compute_path<D: Document + ?Sized>(doc: &D, element: NodeId) -> Result<LocatorPath> {
    let root = doc.root();
    let mut steps = Vec::new();
    let mut current = element;

    let anchor = loop {
        let tag = doc
            .tag_name(current)
            .ok_or(PatchError::NodeNotFound(current.index()))?;

        if let Some(id) = doc.attribute(current, "id").filter(|id| !id.is_empty()) {
            break Anchor::Id(id);
        }
        let tag = writable_tag(tag)?;
        if current == root {
            break Anchor::Root(tag);
        }

        let parent = doc.parent(current).ok_or(PatchError::Detached)?;
        let preceding = doc
            .children(parent)
            .into_iter()
            .take_while(|sibling| *sibling != current)
            .filter(|sibling| doc.tag_name(*sibling).as_deref() == Some(tag.as_str()))
            .count();
        steps.push(Step {
            tag,
            index: preceding + 1,
        });
        current = parent;
    };

    steps.reverse();
    Ok(LocatorPath { anchor, steps })
}

/// Resolves `path` top-down. `None` when any hop is missing.
pub fn resolve_path<D: Document + ?Sized>(doc: &D, path: &LocatorPath) -> Option<NodeId> {
    let mut current = match &path.anchor {
        Anchor::Id(id) => doc.element_by_id(id)?,
        Anchor::Root(tag) => {
            let root = doc.root();
            if doc.tag_name(root)? != *tag {
                return None;
            }
            root
        }
    };

    for step in &path.steps {
        current = doc
            .children(current)
            .into_iter()
            .filter(|child| doc.tag_name(*child).as_deref() == Some(step.tag.as_str()))
            .nth(step.index.checked_sub(1)?)?;
    }
    Some(current)
}
