//! CSS selector queries over soup node trees.
//!
//! # Scope
//!
//! This crate implements:
//! - **Selector compiler**: [`compile`] turns a selector string into a
//!   [`Selector`] tree of compound selectors joined by combinators
//!   - Type, universal, class, id and attribute selectors
//!     (`=`, `~=`, `|=`, `^=`, `$=`, `*=`, existence)
//!   - Descendant, child (`>`), adjacent (`+`) and later sibling (`~`)
//!     combinators, and `,` lists
//!   - Backslash escapes and quoted attribute values
//! - **Pseudo-classes**: `:checked`, `:disabled`, `:required`, `:optional`,
//!   `:empty`, `:root`, `:indeterminate`, the `*-child` and `*-of-type`
//!   families, and `An+B` arguments for the `nth-*` forms
//! - **Matcher**: [`Selector::select`] evaluates a compiled selector over a
//!   scope of nodes and returns a de-duplicated [`MatchSet`]
//!
//! # Not Implemented
//!
//! - `:not()`, `:is()`, `:has()` and other functional pseudo-classes
//! - Namespaces and case-sensitivity flags in attribute selectors
//! - Pseudo-elements
//!
//! # Example
//!
//! ```
//! let tree = soup_html::parse("<ul><li>a</li><li class=on>b</li></ul>", true).unwrap();
//! let matches = soup_select::select(&tree, tree.top_level(), "ul > li.on").unwrap();
//! assert_eq!(matches.len(), 1);
//! ```

mod error;
mod match_set;
mod matcher;
mod nth;
mod parser;
mod selector;

use soup_dom::{DomTree, NodeId};

pub use error::SelectorError;
pub use match_set::MatchSet;
pub use nth::NthExpr;
pub use parser::compile;
pub use selector::{AttributeMatcher, AttributeOperator, PseudoClass, Selector, SimpleSelector};

/// Compile `selector` and find its matches at or below `scope`.
///
/// # Errors
///
/// Returns a [`SelectorError`] when `selector` does not compile. Nothing is
/// matched in that case.
pub fn select(
    tree: &DomTree,
    scope: &[NodeId],
    selector: &str,
) -> Result<MatchSet, SelectorError> {
    Ok(compile(selector)?.select(tree, scope))
}
