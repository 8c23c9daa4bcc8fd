//! Selector string compiler.
//!
//! Compilation runs in two passes. A scanner walks the string once, tracking
//! backslash escapes, quotes, `[...]` and `(...)` nesting, and splits it into
//! compound segments, combinators and commas found at the top level. Each
//! segment is then read by a small state machine into a [`SimpleSelector`].

use strum::IntoEnumIterator;

use crate::error::SelectorError;
use crate::selector::{
    AttributeMatcher, AttributeOperator, PseudoClass, Selector, SimpleSelector,
};

/// Compile a selector string.
///
/// The result is always a [`Selector::Comma`], with one branch per
/// top-level `,`. Whitespace next to a combinator is insignificant, so
/// `a > b` and `a>b` compile identically. An empty string or branch is the
/// wildcard.
///
/// # Errors
///
/// Returns a [`SelectorError`] for an unknown pseudo-class or a malformed
/// `nth-*` argument.
///
/// # Example
///
/// ```
/// let selector = soup_select::compile("div.note > p, a[href^=https]").unwrap();
/// assert_eq!(selector.to_string(), "div.note > p, a[href^=\"https\"]");
/// ```
pub fn compile(selector: &str) -> Result<Selector, SelectorError> {
    let tokens = scan(selector);
    let branches = tokens
        .split(|token| matches!(token, Token::Comma))
        .map(compile_branch)
        .collect::<Result<Vec<_>, _>>()?;
    let compiled = Selector::Comma(branches);
    tracing::trace!("Compiled selector {:?} as {}", selector, compiled);
    Ok(compiled)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    DirectChild,
    Adjacent,
    LaterSibling,
}

impl Combinator {
    const fn from_char(c: char) -> Option<Self> {
        match c {
            '>' => Some(Self::DirectChild),
            '+' => Some(Self::Adjacent),
            '~' => Some(Self::LaterSibling),
            _ => None,
        }
    }

    fn join(self, left: Selector, right: Selector) -> Selector {
        let (left, right) = (Box::new(left), Box::new(right));
        match self {
            Self::Descendant => Selector::Descendant(left, right),
            Self::DirectChild => Selector::DirectChild(left, right),
            Self::Adjacent => Selector::Adjacent(left, right),
            Self::LaterSibling => Selector::LaterSibling(left, right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Raw compound selector text, escapes still in place.
    Segment(String),
    Combinator(Combinator),
    Comma,
}

/// Split a selector string at its top-level commas, combinators and
/// whitespace runs.
///
/// Whitespace becomes a descendant combinator only between two segments.
fn scan(selector: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut segment = String::new();
    let mut quote: Option<char> = None;
    let mut brackets = 0usize;
    let mut parens = 0usize;
    let mut whitespace_pending = false;

    let mut chars = selector.chars();
    while let Some(c) = chars.next() {
        let top_level = quote.is_none() && brackets == 0 && parens == 0;
        let separator = top_level
            && (c.is_whitespace() || c == ',' || Combinator::from_char(c).is_some());
        if !separator {
            if whitespace_pending {
                push_descendant(&mut tokens);
                whitespace_pending = false;
            }
            segment.push(c);
            match (quote, c) {
                (_, '\\') => {
                    if let Some(escaped) = chars.next() {
                        segment.push(escaped);
                    }
                }
                (Some(open), c) if c == open => quote = None,
                (None, '"' | '\'') => quote = Some(c),
                (None, '[') => brackets += 1,
                (None, ']') => brackets = brackets.saturating_sub(1),
                (None, '(') => parens += 1,
                (None, ')') => parens = parens.saturating_sub(1),
                _ => {}
            }
            continue;
        }

        if !segment.is_empty() {
            tokens.push(Token::Segment(std::mem::take(&mut segment)));
        }
        if c.is_whitespace() {
            whitespace_pending = matches!(tokens.last(), Some(Token::Segment(_)));
            continue;
        }
        whitespace_pending = false;
        tokens.push(match Combinator::from_char(c) {
            Some(combinator) => Token::Combinator(combinator),
            None => Token::Comma,
        });
    }
    if !segment.is_empty() {
        tokens.push(Token::Segment(segment));
    }
    tokens
}

fn push_descendant(tokens: &mut Vec<Token>) {
    if matches!(tokens.last(), Some(Token::Segment(_))) {
        tokens.push(Token::Combinator(Combinator::Descendant));
    }
}

/// Build one comma branch right to left, so the rightmost compound is the
/// evaluation target. A combinator with no segment on one side gets the
/// wildcard there.
fn compile_branch(tokens: &[Token]) -> Result<Selector, SelectorError> {
    let mut compounds = Vec::new();
    let mut combinators = Vec::new();
    let mut expecting_segment = true;
    for token in tokens {
        match token {
            Token::Segment(raw) => {
                compounds.push(parse_simple_selector(raw)?);
                expecting_segment = false;
            }
            Token::Combinator(combinator) => {
                if expecting_segment {
                    compounds.push(SimpleSelector::default());
                }
                combinators.push(*combinator);
                expecting_segment = true;
            }
            Token::Comma => {}
        }
    }
    if expecting_segment {
        compounds.push(SimpleSelector::default());
    }

    let mut compounds = compounds.into_iter().rev().map(Selector::Simple);
    let Some(mut selector) = compounds.next() else {
        return Ok(Selector::Simple(SimpleSelector::default()));
    };
    for (left, combinator) in compounds.zip(combinators.into_iter().rev()) {
        selector = combinator.join(left, selector);
    }
    Ok(selector)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentState {
    Tag,
    Class,
    Id,
    Attribute,
    Pseudo,
    /// After a `]`, until the next `.`, `#`, `[` or `:`.
    AfterAttribute,
}

/// Read one compound selector such as `a.b#c[d=e]:first-child`.
fn parse_simple_selector(raw: &str) -> Result<SimpleSelector, SelectorError> {
    let mut simple = SimpleSelector::default();
    let mut state = SegmentState::Tag;
    let mut name = String::new();
    let mut quote: Option<char> = None;
    let mut parens = 0usize;

    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                name.push(escaped);
            }
            continue;
        }
        if let Some(open) = quote {
            if c == open {
                quote = None;
            }
            name.push(c);
            continue;
        }

        match (state, c) {
            (SegmentState::Attribute, '"' | '\'') => quote = Some(c),
            (SegmentState::Pseudo, '(') => parens += 1,
            (SegmentState::Pseudo, ')') => parens = parens.saturating_sub(1),
            _ => {}
        }
        let nested = state == SegmentState::Attribute || parens > 0;
        let next_state = if state == SegmentState::Attribute && c == ']' {
            Some(SegmentState::AfterAttribute)
        } else if nested {
            None
        } else {
            segment_start(c)
        };

        match next_state {
            Some(next) => {
                save_segment(&mut simple, state, &std::mem::take(&mut name))?;
                state = next;
            }
            None => name.push(c),
        }
    }
    save_segment(&mut simple, state, &name)?;
    Ok(simple)
}

const fn segment_start(c: char) -> Option<SegmentState> {
    match c {
        '.' => Some(SegmentState::Class),
        '#' => Some(SegmentState::Id),
        '[' => Some(SegmentState::Attribute),
        ':' => Some(SegmentState::Pseudo),
        _ => None,
    }
}

fn save_segment(
    simple: &mut SimpleSelector,
    state: SegmentState,
    name: &str,
) -> Result<(), SelectorError> {
    match state {
        SegmentState::Tag => {
            if !name.is_empty() && name != "*" {
                simple.tag_name = Some(name.to_string());
            }
        }
        SegmentState::Class => simple.classes.push(name.to_string()),
        SegmentState::Id => simple.id = Some(name.to_string()),
        SegmentState::Attribute => simple.attributes.push(parse_attribute(name)?),
        SegmentState::Pseudo => simple.pseudo_classes.push(PseudoClass::parse(name)?),
        SegmentState::AfterAttribute => {}
    }
    Ok(())
}

/// Read the inside of `[...]`. Operators are tried in priority order, `~=`
/// `|=` `^=` `$=` `*=` and then `=`, each searched for in the text before
/// any quote; the first one found splits name from value. Without one the
/// attribute only has to exist.
fn parse_attribute(raw: &str) -> Result<AttributeMatcher, SelectorError> {
    let unquoted = raw.find(['"', '\'']).map_or(raw, |quote| &raw[..quote]);
    let found = AttributeOperator::iter()
        .filter(|op| op.needs_value())
        .find_map(|op| unquoted.find(&op.to_string()).map(|at| (op, at)));
    let Some((operator, at)) = found else {
        return AttributeMatcher::new(raw.trim(), AttributeOperator::Exists, None);
    };
    let name = &raw[..at];
    let value = strip_quotes(raw[at + operator.to_string().len()..].trim());
    AttributeMatcher::new(name.trim(), operator, Some(value.to_string()))
}

/// Remove a pair of matching quotes that wrap the whole value.
fn strip_quotes(value: &str) -> &str {
    let mut chars = value.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first @ ('"' | '\'')), Some(last)) if first == last => &value[1..value.len() - 1],
        _ => value,
    }
}
