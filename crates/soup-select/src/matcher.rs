//! Evaluating compiled selectors against a [`DomTree`].
//!
//! Every selector is evaluated over a scope, an ordered list of candidate
//! nodes. In the recursive form a compound selector also searches every
//! element below the scope; the non-recursive form only tests the scope
//! itself. Combinators evaluate their left operand first and then run the
//! right operand over the nodes related to each left match.

use std::collections::HashMap;

use soup_dom::{AttrValue, DomTree, ElementData, NodeId};

use crate::match_set::MatchSet;
use crate::nth::NthExpr;
use crate::selector::{PseudoClass, Selector, SimpleSelector};

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

impl Selector {
    /// Find every element at or below `scope` that this selector matches.
    ///
    /// Text nodes in `scope` are skipped. The synthetic root is never
    /// matched itself, so `&[NodeId::ROOT]` searches the whole parse.
    #[must_use]
    pub fn select(&self, tree: &DomTree, scope: &[NodeId]) -> MatchSet {
        let mut matches = MatchSet::new();
        self.find_matches(tree, scope, true, &mut matches);
        tracing::debug!(
            "Selector {} matched {} elements from {} scope nodes",
            self,
            matches.len(),
            scope.len()
        );
        matches
    }

    fn find_matches(
        &self,
        tree: &DomTree,
        scope: &[NodeId],
        recursive: bool,
        out: &mut MatchSet,
    ) {
        match self {
            Self::Simple(simple) => simple.find_matches(tree, scope, recursive, out),
            Self::Comma(branches) => {
                for branch in branches {
                    branch.find_matches(tree, scope, recursive, out);
                }
            }
            Self::Descendant(ancestor, descendant) => {
                for matched in left_matches(ancestor, tree, scope, recursive) {
                    descendant.find_matches(tree, tree.children(matched), true, out);
                }
            }
            Self::DirectChild(parent, child) => {
                for matched in left_matches(parent, tree, scope, recursive) {
                    child.find_matches(tree, tree.children(matched), false, out);
                }
            }
            Self::Adjacent(before, after) => {
                for matched in left_matches(before, tree, scope, recursive) {
                    if let Some(next) = tree.next_sibling(matched) {
                        after.find_matches(tree, &[next], false, out);
                    }
                }
            }
            Self::LaterSibling(before, after) => {
                for matched in left_matches(before, tree, scope, recursive) {
                    after.find_matches(tree, tree.siblings_after(matched), false, out);
                }
            }
        }
    }
}

fn left_matches(
    selector: &Selector,
    tree: &DomTree,
    scope: &[NodeId],
    recursive: bool,
) -> MatchSet {
    let mut matches = MatchSet::new();
    selector.find_matches(tree, scope, recursive, &mut matches);
    matches
}

impl SimpleSelector {
    fn find_matches(
        &self,
        tree: &DomTree,
        scope: &[NodeId],
        recursive: bool,
        out: &mut MatchSet,
    ) {
        self.filter_scope(tree, scope, &[], out);
        if !recursive {
            return;
        }
        for &id in scope {
            if tree.as_element(id).is_some() {
                self.find_matches(tree, tree.children(id), true, out);
            }
        }
    }

    /// Add the elements of `scope` that match, ignoring the pseudo-classes
    /// at the `excluded` indices.
    fn filter_scope(
        &self,
        tree: &DomTree,
        scope: &[NodeId],
        excluded: &[usize],
        out: &mut MatchSet,
    ) {
        // Matches of this selector without each `*-of-type` pseudo-class,
        // computed once per scope.
        let mut of_type: Vec<(usize, MatchSet)> = Vec::new();
        let mut positions = SiblingPositions::default();

        for &id in scope {
            if id == NodeId::ROOT {
                continue;
            }
            let Some(element) = tree.as_element(id) else {
                continue;
            };
            if !self.matches_ignoring_pseudo_classes(element) {
                continue;
            }

            let pseudo_classes_hold = self
                .pseudo_classes
                .iter()
                .enumerate()
                .filter(|(index, _)| !excluded.contains(index))
                .all(|(index, &pseudo)| {
                    if !pseudo.is_of_type() {
                        return matches_pseudo_class(
                            tree,
                            id,
                            element,
                            pseudo,
                            &mut positions,
                        );
                    }
                    let position = of_type.iter().position(|(i, _)| *i == index);
                    let position = position.unwrap_or_else(|| {
                        let mut skip = excluded.to_vec();
                        skip.push(index);
                        let mut peers = MatchSet::new();
                        self.filter_scope(tree, scope, &skip, &mut peers);
                        of_type.push((index, peers));
                        of_type.len() - 1
                    });
                    matches_of_type(pseudo, id, &of_type[position].1)
                });
            if pseudo_classes_hold {
                let _ = out.insert(id);
            }
        }
    }

    fn matches_ignoring_pseudo_classes(&self, element: &ElementData) -> bool {
        if let Some(tag_name) = &self.tag_name
            && !element.tag_name().eq_ignore_ascii_case(tag_name)
        {
            return false;
        }
        if !self
            .classes
            .iter()
            .all(|class| element.classes().contains(class))
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.id() != Some(id.as_str())
        {
            return false;
        }
        self.attributes
            .iter()
            .all(|attribute| attribute.matches(element))
    }
}

fn matches_pseudo_class(
    tree: &DomTree,
    id: NodeId,
    element: &ElementData,
    pseudo: PseudoClass,
    positions: &mut SiblingPositions,
) -> bool {
    match pseudo {
        PseudoClass::Checked => element.has_attr("checked"),
        PseudoClass::Disabled => element.has_attr("disabled"),
        PseudoClass::Required => element.has_attr("required"),
        PseudoClass::Optional => !element.has_attr("required"),
        PseudoClass::Empty => tree
            .children(id)
            .iter()
            .all(|&child| tree.as_text(child).is_some_and(is_blank)),
        PseudoClass::FirstChild => {
            positions.of(tree, id).is_some_and(|(index, _)| index == 0)
        }
        PseudoClass::LastChild => {
            positions.of(tree, id).is_some_and(|(index, count)| index + 1 == count)
        }
        PseudoClass::OnlyChild => positions.of(tree, id).is_some_and(|(_, count)| count == 1),
        PseudoClass::NthChild(expr) => {
            positions.of(tree, id).is_some_and(|(index, _)| expr.matches(index + 1))
        }
        PseudoClass::NthLastChild(expr) => {
            positions.of(tree, id).is_some_and(|(index, count)| expr.matches(count - index))
        }
        PseudoClass::Indeterminate => is_indeterminate(tree, id, element),
        PseudoClass::Root => tree
            .parent(id)
            .is_some_and(|parent| tree.parent(parent).is_none()),
        PseudoClass::FirstOfType
        | PseudoClass::LastOfType
        | PseudoClass::OnlyOfType
        | PseudoClass::NthOfType(_)
        | PseudoClass::NthLastOfType(_) => false,
    }
}

/// Test a `*-of-type` pseudo-class against the ordered matches of the rest
/// of the compound selector.
fn matches_of_type(pseudo: PseudoClass, id: NodeId, peers: &MatchSet) -> bool {
    let nth = |expr: NthExpr, from_end: bool| {
        peers
            .iter()
            .position(|peer| peer == id)
            .is_some_and(|index| {
                let position = if from_end { peers.len() - index } else { index + 1 };
                expr.matches(position)
            })
    };
    match pseudo {
        PseudoClass::FirstOfType => peers.first() == Some(id),
        PseudoClass::LastOfType => peers.last() == Some(id),
        PseudoClass::OnlyOfType => peers.len() == 1 && peers.first() == Some(id),
        PseudoClass::NthOfType(expr) => nth(expr, false),
        PseudoClass::NthLastOfType(expr) => nth(expr, true),
        _ => false,
    }
}

/// Element-only positions among one parent's children. Rebuilt only when
/// the parent changes, so a scope of siblings is indexed once.
#[derive(Debug, Default)]
struct SiblingPositions {
    parent: Option<NodeId>,
    index: HashMap<NodeId, usize>,
}

impl SiblingPositions {
    /// Zero-based index of `id` among its parent's element children, and
    /// the number of those children.
    fn of(&mut self, tree: &DomTree, id: NodeId) -> Option<(usize, usize)> {
        let parent = tree.parent(id)?;
        if self.parent != Some(parent) {
            self.index = tree
                .element_children(parent)
                .enumerate()
                .map(|(index, child)| (child, index))
                .collect();
            self.parent = Some(parent);
        }
        let &index = self.index.get(&id)?;
        Some((index, self.index.len()))
    }
}

/// Whether text holds nothing but whitespace and complete comments.
fn is_blank(text: &str) -> bool {
    let mut rest = text;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return true;
        }
        let Some(after_start) = rest.strip_prefix(COMMENT_START) else {
            return false;
        };
        let Some(end) = after_start.find(COMMENT_END) else {
            return false;
        };
        rest = &after_start[end + COMMENT_END.len()..];
    }
}

fn is_indeterminate(tree: &DomTree, id: NodeId, element: &ElementData) -> bool {
    let tag_name = element.tag_name();
    if tag_name.eq_ignore_ascii_case("progress") {
        return !(is_truthy(element.attr("value")) && is_truthy(element.attr("max")));
    }
    if !tag_name.eq_ignore_ascii_case("input") {
        return false;
    }
    match element.attr("type").and_then(AttrValue::as_str) {
        Some("checkbox") => element.has_attr("indeterminate"),
        Some("radio") => {
            let Some(group) = element.attr("name").and_then(AttrValue::as_str) else {
                return false;
            };
            let alone = [id];
            let siblings = tree
                .parent(id)
                .map_or(&alone[..], |parent| tree.children(parent));
            !siblings.iter().any(|&sibling| {
                tree.as_element(sibling)
                    .is_some_and(|other| is_checked_radio_in_group(other, group))
            })
        }
        _ => false,
    }
}

fn is_checked_radio_in_group(element: &ElementData, group: &str) -> bool {
    element.tag_name().eq_ignore_ascii_case("input")
        && element.attr("type").and_then(AttrValue::as_str) == Some("radio")
        && element.attr("name").and_then(AttrValue::as_str) == Some(group)
        && element.has_attr("checked")
}

/// A valueless attribute or a non-empty value.
fn is_truthy(value: Option<&AttrValue>) -> bool {
    match value {
        Some(AttrValue::Present) => true,
        Some(AttrValue::Text(text)) => !text.is_empty(),
        None => false,
    }
}
