//! Node tree for the soup HTML parser.
//!
//! The parser produces an arena-based tree: every node lives in a single
//! vector owned by [`DomTree`] and all relationships are [`NodeId`] indices.
//!
//! # Design
//!
//! Ownership only flows from parent to children. The parent link stored on
//! each node is a plain index, so the tree has no reference cycles and is
//! dropped as one allocation.
//!
//! Index 0 always holds a synthetic root element (empty tag name, no
//! attributes, no parent). The top-level forest of a parse is the list of its
//! children.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

mod serialize;

pub use serialize::NodeView;

/// Map of lowercase attribute names to values for an element.
pub type AttributesMap = HashMap<String, AttrValue>;

/// Attributes whose name starts with this prefix feed [`ElementData::dataset`].
const DATASET_ATTR_PREFIX: &str = "data-";

/// A type-safe index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The synthetic root element is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// Value of a single attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// `name="value"`, `name='value'` or `name=value`.
    Text(String),
    /// A valueless attribute such as `<input checked>`.
    Present,
}

impl AttrValue {
    /// The string value, or `None` for a valueless attribute.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            Self::Present => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// A node in the arena.
///
/// Relationships are stored as indices so the tree can be walked in any
/// direction without borrowing the nodes themselves.
#[derive(Debug, Clone)]
pub struct Node {
    /// Element or text payload.
    pub node_type: NodeType,

    /// The element this node is attached to. `None` for the synthetic root
    /// and for nodes that were allocated but never appended.
    pub parent: Option<NodeId>,

    /// Child nodes in document order.
    pub children: Vec<NodeId>,

    /// The node immediately following this one in its parent's children.
    pub next_sibling: Option<NodeId>,

    /// The node immediately preceding this one in its parent's children.
    pub prev_sibling: Option<NodeId>,
}

/// The two kinds of node the parser creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeType {
    /// A tag with attributes and children.
    Element(ElementData),
    /// Decoded character data. Never mutated after the parser creates it.
    Text(String),
}

/// Element-specific data.
///
/// The class set and dataset are derived from the attributes on first access
/// and cached; the cache is filled at most once, so concurrent readers all
/// observe the same value.
#[derive(Debug, Clone)]
pub struct ElementData {
    tag_name: String,
    attrs: AttributesMap,
    class_set: OnceLock<HashSet<String>>,
    dataset: OnceLock<HashMap<String, String>>,
}

impl ElementData {
    /// Create element data. Attribute names are expected to be lowercase.
    #[must_use]
    pub fn new(tag_name: impl Into<String>, attrs: AttributesMap) -> Self {
        Self {
            tag_name: tag_name.into(),
            attrs,
            class_set: OnceLock::new(),
            dataset: OnceLock::new(),
        }
    }

    /// The tag name, with the case it was written in.
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    /// All attributes of this element.
    #[must_use]
    pub const fn attrs(&self) -> &AttributesMap {
        &self.attrs
    }

    /// Look up a single attribute by its lowercase name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Whether the attribute is present, with or without a value.
    #[must_use]
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// The `id` attribute, if it has a string value.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attr("id").and_then(AttrValue::as_str)
    }

    /// The class names from the `class` attribute, split on whitespace.
    ///
    /// Empty when the attribute is absent or valueless.
    pub fn classes(&self) -> &HashSet<String> {
        self.class_set.get_or_init(|| {
            self.attr("class")
                .and_then(AttrValue::as_str)
                .map(|classes| classes.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default()
        })
    }

    /// The `data-*` attributes keyed by their camel-cased suffix.
    ///
    /// `data-date-of-birth` becomes `dateOfBirth`. Valueless attributes map
    /// to the empty string.
    pub fn dataset(&self) -> &HashMap<String, String> {
        self.dataset.get_or_init(|| {
            self.attrs
                .iter()
                .filter_map(|(name, value)| {
                    let key = name.strip_prefix(DATASET_ATTR_PREFIX)?;
                    let value = value.as_str().unwrap_or_default().to_string();
                    Some((camel_case(key), value))
                })
                .collect()
        })
    }
}

impl PartialEq for ElementData {
    fn eq(&self, other: &Self) -> bool {
        self.tag_name == other.tag_name && self.attrs == other.attrs
    }
}

impl Eq for ElementData {}

/// Replace every `-x` (x a lowercase ASCII letter) with `X`.
fn camel_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(c) = chars.next() {
        match chars.peek() {
            Some(&next) if c == '-' && next.is_ascii_lowercase() => {
                result.push(next.to_ascii_uppercase());
                let _ = chars.next();
            }
            _ => result.push(c),
        }
    }
    result
}

/// The public shape of a parse result.
///
/// A forest with exactly one member is unwrapped to that member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed<'a> {
    /// The input produced exactly one top-level node.
    Single(NodeId),
    /// The input produced zero or several top-level nodes, in document order.
    Forest(&'a [NodeId]),
}

/// Arena-based node tree with O(1) node access and parent/sibling traversal.
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All nodes in the tree, indexed by `NodeId`.
    /// The synthetic root is always at index 0 (`NodeId::ROOT`).
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a tree holding only the synthetic root element.
    #[must_use]
    pub fn new() -> Self {
        let root = Node {
            node_type: NodeType::Element(ElementData::new("", AttributesMap::new())),
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        };
        Self { nodes: vec![root] }
    }

    /// The synthetic root element.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Number of nodes in the arena, the synthetic root included.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: the synthetic root is allocated up front.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        });
        id
    }

    /// Append `child` as the last child of `parent`, updating the parent and
    /// sibling links.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let prev_last_child = self.nodes[parent.0].children.last().copied();

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(prev_id);
        }
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node, in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// The sole child of a node: `Some` only when it has exactly one child.
    #[must_use]
    pub fn child(&self, id: NodeId) -> Option<NodeId> {
        match self.children(id) {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Iterate over following siblings (from immediately after to last child).
    pub fn following_siblings(&self, id: NodeId) -> FollowingSiblingIterator<'_> {
        FollowingSiblingIterator {
            tree: self,
            current: self.next_sibling(id),
        }
    }

    /// The siblings strictly after `id` in its parent's children.
    ///
    /// Empty for a detached node.
    #[must_use]
    pub fn siblings_after(&self, id: NodeId) -> &[NodeId] {
        let Some(parent) = self.parent(id) else {
            return &[];
        };
        let siblings = self.children(parent);
        siblings
            .iter()
            .position(|&sibling| sibling == id)
            .map_or(&[], |index| &siblings[index + 1..])
    }

    /// The element children of a node, text nodes skipped.
    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(id)
            .iter()
            .copied()
            .filter(|&child| self.as_element(child).is_some())
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            NodeType::Text(_) => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            NodeType::Element(_) => None,
        })
    }

    /// The top-level forest: the children of the synthetic root.
    #[must_use]
    pub fn top_level(&self) -> &[NodeId] {
        self.children(NodeId::ROOT)
    }

    /// The parse result, unwrapped to a single node when the forest has
    /// exactly one member.
    #[must_use]
    pub fn parsed(&self) -> Parsed<'_> {
        match self.top_level() {
            [only] => Parsed::Single(*only),
            forest => Parsed::Forest(forest),
        }
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over following siblings of a node.
pub struct FollowingSiblingIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for FollowingSiblingIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.next_sibling(id);
        Some(id)
    }
}
