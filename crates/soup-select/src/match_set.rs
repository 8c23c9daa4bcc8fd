//! Ordered, de-duplicated result set for selector matches.

use std::collections::HashSet;
use std::slice;

use soup_dom::NodeId;

/// The elements a selector matched, de-duplicated, in the order they were
/// first found.
///
/// Equality compares membership only.
#[derive(Debug, Clone, Default)]
pub struct MatchSet {
    order: Vec<NodeId>,
    members: HashSet<NodeId>,
}

impl MatchSet {
    /// An empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `id`, returning `false` if it was already present.
    pub fn insert(&mut self, id: NodeId) -> bool {
        if !self.members.insert(id) {
            return false;
        }
        self.order.push(id);
        true
    }

    /// Whether `id` is in the set.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    /// Number of matched elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.order.iter().copied()
    }

    /// The first element inserted.
    #[must_use]
    pub fn first(&self) -> Option<NodeId> {
        self.order.first().copied()
    }

    /// The last element inserted.
    #[must_use]
    pub fn last(&self) -> Option<NodeId> {
        self.order.last().copied()
    }

    /// The members in insertion order.
    #[must_use]
    pub fn as_slice(&self) -> &[NodeId] {
        &self.order
    }
}

impl PartialEq for MatchSet {
    fn eq(&self, other: &Self) -> bool {
        self.members == other.members
    }
}

impl Eq for MatchSet {}

impl Extend<NodeId> for MatchSet {
    fn extend<I: IntoIterator<Item = NodeId>>(&mut self, iter: I) {
        for id in iter {
            let _ = self.insert(id);
        }
    }
}

impl FromIterator<NodeId> for MatchSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for MatchSet {
    type Item = NodeId;
    type IntoIter = std::vec::IntoIter<NodeId>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

impl<'a> IntoIterator for &'a MatchSet {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter().copied()
    }
}
