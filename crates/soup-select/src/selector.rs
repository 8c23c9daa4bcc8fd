//! Compiled selector types.

use std::fmt;

use regex_lite::Regex;
use soup_dom::{AttrValue, ElementData};
use strum_macros::{Display, EnumIter};

use crate::error::SelectorError;
use crate::nth::NthExpr;

/// A compiled selector.
///
/// The combinator variants hold their left operand first: `A > B` is
/// `DirectChild(A, B)`. Evaluation always produces matches of the right
/// operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// A compound selector such as `div.note#first[lang|=en]:first-child`.
    Simple(SimpleSelector),

    /// `A, B, ...`: the union of every branch.
    Comma(Vec<Selector>),

    /// `A B`: B anywhere below an A.
    Descendant(Box<Selector>, Box<Selector>),

    /// `A > B`: B directly below an A.
    DirectChild(Box<Selector>, Box<Selector>),

    /// `A + B`: B as the next element sibling of an A.
    Adjacent(Box<Selector>, Box<Selector>),

    /// `A ~ B`: B anywhere after an A among its siblings.
    LaterSibling(Box<Selector>, Box<Selector>),
}

/// Conditions on a single element. All must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimpleSelector {
    /// Required tag name, compared ignoring ASCII case. `None` for `*` or
    /// an omitted tag.
    pub tag_name: Option<String>,

    /// Class names that must all be in the element's class set.
    pub classes: Vec<String>,

    /// Required `id` attribute value.
    pub id: Option<String>,

    /// Attribute conditions, in source order.
    pub attributes: Vec<AttributeMatcher>,

    /// Pseudo-class conditions, in source order.
    pub pseudo_classes: Vec<PseudoClass>,
}

/// How an attribute matcher compares the attribute value.
///
/// Variants are declared in the order operator tokens are tried when a
/// bracket is compiled, so `=` is only chosen when no longer token applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum AttributeOperator {
    /// `[attr~=value]`: value is a whole word, delimited by whitespace,
    /// `-` or the ends of the string.
    ///
    /// Example: `[x~=four]` matches `x="three-four"`
    #[strum(serialize = "~=")]
    Includes,

    /// `[attr|=value]`: value exactly, or value followed by `-`.
    ///
    /// Example: `[lang|=en]` matches `lang="en-US"`
    #[strum(serialize = "|=")]
    DashMatch,

    /// `[attr^=value]`: prefix.
    #[strum(serialize = "^=")]
    Prefix,

    /// `[attr$=value]`: suffix.
    #[strum(serialize = "$=")]
    Suffix,

    /// `[attr*=value]`: substring.
    #[strum(serialize = "*=")]
    Substring,

    /// `[attr=value]`: exact value.
    #[strum(serialize = "=")]
    Equals,

    /// `[attr]`: present, with or without a value.
    #[strum(serialize = "")]
    Exists,
}

impl AttributeOperator {
    /// Whether the operator compares against a value.
    #[must_use]
    pub const fn needs_value(self) -> bool {
        !matches!(self, Self::Exists)
    }
}

/// One `[...]` condition.
#[derive(Debug, Clone)]
pub struct AttributeMatcher {
    name: String,
    operator: AttributeOperator,
    value: Option<String>,
    /// Compiled for [`AttributeOperator::Includes`] only.
    word_pattern: Option<Regex>,
}

impl AttributeMatcher {
    /// Build a matcher. The attribute name is lowercased.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::MissingAttributeValue`] when `operator`
    /// needs a value and `value` is `None`.
    pub fn new(
        name: &str,
        operator: AttributeOperator,
        value: Option<String>,
    ) -> Result<Self, SelectorError> {
        let name = name.to_lowercase();
        if operator.needs_value() && value.is_none() {
            return Err(SelectorError::MissingAttributeValue {
                attribute: name,
                operator,
            });
        }

        let word_pattern = match (&value, operator) {
            (Some(word), AttributeOperator::Includes) => {
                let pattern = format!(r"(?:^|\s|-){}(?:\s|-|$)", regex_lite::escape(word));
                let regex = Regex::new(&pattern).map_err(|err| {
                    SelectorError::InvalidWordPattern {
                        attribute: name.clone(),
                        value: word.clone(),
                        reason: err.to_string(),
                    }
                })?;
                Some(regex)
            }
            _ => None,
        };

        Ok(Self {
            name,
            operator,
            value,
            word_pattern,
        })
    }

    /// The lowercase attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The comparison operator.
    #[must_use]
    pub const fn operator(&self) -> AttributeOperator {
        self.operator
    }

    /// The value compared against, `None` for [`AttributeOperator::Exists`].
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Check the condition against an element's attributes.
    ///
    /// Every operator but `Exists` requires a string value; valueless
    /// attributes fail them.
    #[must_use]
    pub fn matches(&self, element: &ElementData) -> bool {
        let Some(actual) = element.attr(&self.name) else {
            return false;
        };
        if self.operator == AttributeOperator::Exists {
            return true;
        }
        let (AttrValue::Text(actual), Some(expected)) = (actual, self.value.as_deref()) else {
            return false;
        };

        match self.operator {
            AttributeOperator::Equals => actual == expected,
            AttributeOperator::Includes => self
                .word_pattern
                .as_ref()
                .is_some_and(|pattern| pattern.is_match(actual)),
            AttributeOperator::DashMatch => {
                actual == expected
                    || actual
                        .strip_prefix(expected)
                        .is_some_and(|rest| rest.starts_with('-'))
            }
            AttributeOperator::Prefix => actual.starts_with(expected),
            AttributeOperator::Suffix => actual.ends_with(expected),
            AttributeOperator::Substring => actual.contains(expected),
            AttributeOperator::Exists => true,
        }
    }
}

impl PartialEq for AttributeMatcher {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.operator == other.operator && self.value == other.value
    }
}

impl Eq for AttributeMatcher {}

/// Pseudo-classes the matcher implements.
///
/// Positional variants count element siblings only; text nodes are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PseudoClass {
    /// `:checked`: has a `checked` attribute.
    Checked,
    /// `:disabled`: has a `disabled` attribute.
    Disabled,
    /// `:required`: has a `required` attribute.
    Required,
    /// `:optional`: has no `required` attribute.
    Optional,
    /// `:empty`: every child is text made only of whitespace and complete
    /// `<!-- -->` comments.
    Empty,
    /// `:first-child`
    FirstChild,
    /// `:last-child`
    LastChild,
    /// `:only-child`
    OnlyChild,
    /// `:nth-child(An+B)`
    NthChild(NthExpr),
    /// `:nth-last-child(An+B)`, counting from the last sibling.
    NthLastChild(NthExpr),
    /// `:first-of-type`: first element in the current scope that matches
    /// the rest of the compound selector.
    FirstOfType,
    /// `:last-of-type`
    LastOfType,
    /// `:only-of-type`
    OnlyOfType,
    /// `:nth-of-type(An+B)`
    NthOfType(NthExpr),
    /// `:nth-last-of-type(An+B)`
    NthLastOfType(NthExpr),
    /// `:indeterminate`: a checkbox with an `indeterminate` attribute, a
    /// radio button whose group has nothing checked, or a `progress`
    /// without both `value` and `max`.
    Indeterminate,
    /// `:root`: a top-level element of the parse.
    Root,
}

impl PseudoClass {
    /// Parse a pseudo-class written without its leading `:`, such as
    /// `first-child` or `nth-child(2n+1)`. Names ignore ASCII case.
    ///
    /// # Errors
    ///
    /// [`SelectorError::UnknownPseudoClass`] for an unimplemented name, or a
    /// name used with the wrong arity; [`SelectorError::InvalidNth`] for a
    /// bad `nth-*` argument.
    pub fn parse(raw: &str) -> Result<Self, SelectorError> {
        let (name, argument) = match raw.split_once('(') {
            Some((name, rest)) => (name, Some(rest.strip_suffix(')').unwrap_or(rest))),
            None => (raw, None),
        };
        let pseudo = match (name.trim().to_ascii_lowercase().as_str(), argument) {
            ("checked", None) => Self::Checked,
            ("disabled", None) => Self::Disabled,
            ("required", None) => Self::Required,
            ("optional", None) => Self::Optional,
            ("empty", None) => Self::Empty,
            ("first-child", None) => Self::FirstChild,
            ("last-child", None) => Self::LastChild,
            ("only-child", None) => Self::OnlyChild,
            ("first-of-type", None) => Self::FirstOfType,
            ("last-of-type", None) => Self::LastOfType,
            ("only-of-type", None) => Self::OnlyOfType,
            ("indeterminate", None) => Self::Indeterminate,
            ("root", None) => Self::Root,
            ("nth-child", Some(query)) => Self::NthChild(NthExpr::parse(query)?),
            ("nth-last-child", Some(query)) => Self::NthLastChild(NthExpr::parse(query)?),
            ("nth-of-type", Some(query)) => Self::NthOfType(NthExpr::parse(query)?),
            ("nth-last-of-type", Some(query)) => Self::NthLastOfType(NthExpr::parse(query)?),
            _ => {
                return Err(SelectorError::UnknownPseudoClass {
                    pseudo: raw.to_string(),
                });
            }
        };
        Ok(pseudo)
    }

    /// Whether matching needs the other matches in the current scope.
    #[must_use]
    pub const fn is_of_type(self) -> bool {
        matches!(
            self,
            Self::FirstOfType
                | Self::LastOfType
                | Self::OnlyOfType
                | Self::NthOfType(_)
                | Self::NthLastOfType(_)
        )
    }
}

impl fmt::Display for PseudoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checked => write!(f, "checked"),
            Self::Disabled => write!(f, "disabled"),
            Self::Required => write!(f, "required"),
            Self::Optional => write!(f, "optional"),
            Self::Empty => write!(f, "empty"),
            Self::FirstChild => write!(f, "first-child"),
            Self::LastChild => write!(f, "last-child"),
            Self::OnlyChild => write!(f, "only-child"),
            Self::NthChild(expr) => write!(f, "nth-child({expr})"),
            Self::NthLastChild(expr) => write!(f, "nth-last-child({expr})"),
            Self::FirstOfType => write!(f, "first-of-type"),
            Self::LastOfType => write!(f, "last-of-type"),
            Self::OnlyOfType => write!(f, "only-of-type"),
            Self::NthOfType(expr) => write!(f, "nth-of-type({expr})"),
            Self::NthLastOfType(expr) => write!(f, "nth-last-of-type({expr})"),
            Self::Indeterminate => write!(f, "indeterminate"),
            Self::Root => write!(f, "root"),
        }
    }
}

/// Characters the compiler reads as syntax inside a name.
const NAME_SYNTAX: &str = "\\.#[]:(),>+~\"'";

/// Write `name` with a backslash before every syntax character and
/// whitespace.
fn write_escaped(f: &mut fmt::Formatter<'_>, name: &str) -> fmt::Result {
    for c in name.chars() {
        if c.is_whitespace() || NAME_SYNTAX.contains(c) {
            write!(f, "\\")?;
        }
        write!(f, "{c}")?;
    }
    Ok(())
}

impl fmt::Display for AttributeMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        write_escaped(f, &self.name)?;
        if let Some(value) = &self.value {
            let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
            write!(f, "{}\"{escaped}\"", self.operator)?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for SimpleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bare = self.classes.is_empty()
            && self.id.is_none()
            && self.attributes.is_empty()
            && self.pseudo_classes.is_empty();
        match &self.tag_name {
            Some(tag_name) => write_escaped(f, tag_name)?,
            None if bare => write!(f, "*")?,
            None => {}
        }
        for class in &self.classes {
            write!(f, ".")?;
            write_escaped(f, class)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#")?;
            write_escaped(f, id)?;
        }
        for attribute in &self.attributes {
            write!(f, "{attribute}")?;
        }
        for pseudo in &self.pseudo_classes {
            write!(f, ":{pseudo}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(simple) => write!(f, "{simple}"),
            Self::Comma(branches) => {
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{branch}")?;
                }
                Ok(())
            }
            Self::Descendant(left, right) => write!(f, "{left} {right}"),
            Self::DirectChild(left, right) => write!(f, "{left} > {right}"),
            Self::Adjacent(left, right) => write!(f, "{left} + {right}"),
            Self::LaterSibling(left, right) => write!(f, "{left} ~ {right}"),
        }
    }
}
