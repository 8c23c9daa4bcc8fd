//! Rendering nodes back to markup or to a serde data model.
//!
//! Attributes are always written in name order so the output is stable
//! regardless of hash map iteration order.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::{AttrValue, DomTree, ElementData, NodeId, NodeType};

impl DomTree {
    /// Render a node and its subtree as markup.
    ///
    /// Text is written verbatim (it already holds decoded characters and any
    /// comment runs). Elements without children are written self-closing.
    /// The synthetic root renders as its children only.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// Concatenated text of every text node at or below `id`.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_text(id, &mut out);
        out
    }

    /// A serializable view of the subtree rooted at `id`.
    #[must_use]
    pub const fn view(&self, id: NodeId) -> NodeView<'_> {
        NodeView { tree: self, id }
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.get(id) else {
            return;
        };
        match &node.node_type {
            NodeType::Text(text) => out.push_str(text),
            NodeType::Element(_) if id == NodeId::ROOT => {
                for &child in &node.children {
                    self.write_html(child, out);
                }
            }
            NodeType::Element(element) => {
                out.push('<');
                out.push_str(element.tag_name());
                write_attributes(element, out);
                if node.children.is_empty() {
                    out.push_str(" />");
                    return;
                }
                out.push('>');
                for &child in &node.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(element.tag_name());
                out.push('>');
            }
        }
    }

    fn write_text(&self, id: NodeId, out: &mut String) {
        match self.get(id).map(|n| &n.node_type) {
            Some(NodeType::Text(text)) => out.push_str(text),
            Some(NodeType::Element(_)) => {
                for &child in self.children(id) {
                    self.write_text(child, out);
                }
            }
            None => {}
        }
    }
}

fn sorted_attributes(element: &ElementData) -> BTreeMap<&str, &AttrValue> {
    element
        .attrs()
        .iter()
        .map(|(name, value)| (name.as_str(), value))
        .collect()
}

fn write_attributes(element: &ElementData, out: &mut String) {
    for (name, value) in sorted_attributes(element) {
        out.push(' ');
        out.push_str(name);
        if let AttrValue::Text(value) = value {
            out.push_str("=\"");
            for c in value.chars() {
                match c {
                    '"' => out.push_str("&quot;"),
                    '&' => out.push_str("&amp;"),
                    _ => out.push(c),
                }
            }
            out.push('"');
        }
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(value) => serializer.serialize_str(value),
            Self::Present => serializer.serialize_bool(true),
        }
    }
}

/// A borrowed node that serializes as
/// `{"type": "element", "tagName", "attributes", "children"}` or
/// `{"type": "text", "text"}`.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    tree: &'a DomTree,
    id: NodeId,
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(node) = self.tree.get(self.id) else {
            return serializer.serialize_none();
        };
        match &node.node_type {
            NodeType::Text(text) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "text")?;
                map.serialize_entry("text", text)?;
                map.end()
            }
            NodeType::Element(element) => {
                let children: Vec<NodeView<'_>> = node
                    .children
                    .iter()
                    .map(|&child| self.tree.view(child))
                    .collect();
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("type", "element")?;
                map.serialize_entry("tagName", element.tag_name())?;
                map.serialize_entry("attributes", &sorted_attributes(element))?;
                map.serialize_entry("children", &children)?;
                map.end()
            }
        }
    }
}
