//! Single-pass markup parser.
//!
//! The parser walks the input one character at a time through a small state
//! machine and builds a [`DomTree`] as it goes. Each element's children are
//! read by a nested `ChildrenReader` that starts right after the element's
//! opening `>` and stops at the first closing tag, whatever its name.
//!
//! Input is assumed to be reasonably well formed. There is no tree repair:
//! unclosed elements are closed by the end of input and stray closing tags
//! close whatever element is open.

use std::mem;

use soup_dom::{AttrValue, AttributesMap, DomTree, ElementData, NodeId, NodeType};
use strum_macros::Display;

use crate::entities::{lookup_entity, starts_character_reference};
use crate::error::DecodeError;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "link", "meta",
    "param", "source",
];

/// The element whose content is read as raw text.
const RAW_TEXT_ELEMENT: &str = "script";
const RAW_TEXT_END_TAG: &str = "</script>";

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

/// Parser configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Strip leading and trailing whitespace from every text run, dropping
    /// runs that end up empty.
    pub trim_text: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { trim_text: true }
    }
}

/// States of the character state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
enum ReadingState {
    /// Literal text between tags.
    Text,
    /// Inside `<!-- ... -->`. The run is kept verbatim as text.
    Comment,
    /// After `&` in text, collecting the reference code up to `;`.
    Escape,
    /// After `<`, reading the tag name and the `/` markers.
    Tag,
    /// Between attributes. Whitespace is skipped.
    AttributeName,
    /// After `=`. Whitespace is skipped.
    BeforeAttributeValue,
    /// Reading a quoted or unquoted value.
    AttributeValue,
    /// After `&` in an attribute value.
    EscapeInAttributeValue,
}

impl ReadingState {
    const fn skips_whitespace(self) -> bool {
        matches!(self, Self::AttributeName | Self::BeforeAttributeValue)
    }
}

/// Which `/` markers the tag being read carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Start,
    /// `<name ... />`, or a void element.
    SelfClosing,
    /// `</...>`
    End,
}

/// Builds a [`DomTree`] from a string.
pub struct HtmlParser<'a> {
    input: &'a str,
    options: ParseOptions,
    tree: DomTree,
}

impl<'a> HtmlParser<'a> {
    /// Create a parser over `input`.
    #[must_use]
    pub fn new(input: &'a str, options: ParseOptions) -> Self {
        Self {
            input,
            options,
            tree: DomTree::new(),
        }
    }

    /// Run the parser to completion.
    ///
    /// The top-level forest becomes the children of the tree's synthetic
    /// root; see [`DomTree::parsed`] for the unwrapped result.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] for a named reference that is not in the
    /// entity table or a numeric reference whose digits do not parse. No
    /// partial tree is returned.
    pub fn run(mut self) -> Result<DomTree, DecodeError> {
        tracing::debug!("Parsing {} bytes of HTML", self.input.len());
        let _ = ChildrenReader::new(self.input, self.options, &mut self.tree, 0, NodeId::ROOT)
            .run()?;
        tracing::debug!("Parsed {} nodes", self.tree.len());
        Ok(self.tree)
    }
}

/// Parse `input` into a node tree.
///
/// # Errors
///
/// See [`HtmlParser::run`].
pub fn parse(input: &str, trim_text: bool) -> Result<DomTree, DecodeError> {
    HtmlParser::new(input, ParseOptions { trim_text }).run()
}

/// Parse a byte buffer, decoded as UTF-8 with invalid sequences replaced by
/// U+FFFD.
///
/// # Errors
///
/// See [`HtmlParser::run`].
pub fn parse_bytes(bytes: &[u8], trim_text: bool) -> Result<DomTree, DecodeError> {
    parse(&String::from_utf8_lossy(bytes), trim_text)
}

/// Reads the children of one element.
///
/// Returns the position just past the closing tag that ended it, or the end
/// of input.
struct ChildrenReader<'a, 't> {
    input: &'a str,
    options: ParseOptions,
    tree: &'t mut DomTree,
    parent: NodeId,
    in_raw_text: bool,

    state: ReadingState,
    /// Byte offset of the next character to consume.
    pos: usize,
    /// Byte offset of `current`.
    char_start: usize,
    current: Option<char>,
    // When true, the next iteration of the main loop will not consume a new character.
    reconsume: bool,

    text: String,
    escape_code: String,
    tag_name: String,
    tag_kind: TagKind,
    attributes: AttributesMap,
    attribute_name: String,
    attribute_value: String,
    /// `None` for an unquoted value.
    value_quote: Option<char>,
}

impl<'a, 't> ChildrenReader<'a, 't> {
    fn new(
        input: &'a str,
        options: ParseOptions,
        tree: &'t mut DomTree,
        pos: usize,
        parent: NodeId,
    ) -> Self {
        let in_raw_text = tree
            .as_element(parent)
            .is_some_and(|element| element.tag_name().eq_ignore_ascii_case(RAW_TEXT_ELEMENT));
        Self {
            input,
            options,
            tree,
            parent,
            in_raw_text,
            state: ReadingState::Text,
            pos,
            char_start: pos,
            current: None,
            reconsume: false,
            text: String::new(),
            escape_code: String::new(),
            tag_name: String::new(),
            tag_kind: TagKind::Start,
            attributes: AttributesMap::new(),
            attribute_name: String::new(),
            attribute_value: String::new(),
            value_quote: None,
        }
    }

    fn run(mut self) -> Result<usize, DecodeError> {
        loop {
            if self.reconsume {
                self.reconsume = false;
            } else {
                self.current = self.consume();
            }
            let Some(c) = self.current else {
                break;
            };
            if self.state.skips_whitespace() && c.is_whitespace() {
                continue;
            }

            match self.state {
                ReadingState::Text => self.handle_text_state(c),
                ReadingState::Comment => self.handle_comment_state(c),
                ReadingState::Escape | ReadingState::EscapeInAttributeValue => {
                    self.handle_escape_state(c)?;
                }
                ReadingState::Tag => {
                    if let Some(end) = self.handle_tag_state(c)? {
                        return Ok(end);
                    }
                }
                ReadingState::AttributeName => self.handle_attribute_name_state(c),
                ReadingState::BeforeAttributeValue => self.handle_before_attribute_value_state(c),
                ReadingState::AttributeValue => self.handle_attribute_value_state(c),
            }
        }

        self.finish_at_eof();
        Ok(self.input.len())
    }

    // =========================================================================
    // Input helpers
    // =========================================================================

    fn consume(&mut self) -> Option<char> {
        let c = self.input[self.pos..].chars().next()?;
        self.char_start = self.pos;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Whether the input at the current character starts with `target`.
    fn next_few_characters_are(&self, target: &str) -> bool {
        self.input[self.char_start..].starts_with(target)
    }

    fn next_few_characters_are_ascii_case_insensitive(&self, target: &str) -> bool {
        self.input
            .get(self.char_start..self.char_start + target.len())
            .is_some_and(|s| s.eq_ignore_ascii_case(target))
    }

    /// Consume the rest of a marker whose first character is `current`.
    fn skip_rest_of(&mut self, marker: &str) {
        self.pos = self.char_start + marker.len();
    }

    fn previous_character_is_whitespace(&self) -> bool {
        self.input[..self.char_start]
            .chars()
            .next_back()
            .is_some_and(char::is_whitespace)
    }

    fn switch_to(&mut self, state: ReadingState) {
        self.state = state;
    }

    fn reconsume_in(&mut self, state: ReadingState) {
        self.reconsume = true;
        self.state = state;
    }

    // =========================================================================
    // States
    // =========================================================================

    fn handle_text_state(&mut self, c: char) {
        match c {
            '<' if !self.in_raw_text && self.next_few_characters_are(COMMENT_START) => {
                self.text.push_str(COMMENT_START);
                self.skip_rest_of(COMMENT_START);
                self.switch_to(ReadingState::Comment);
            }
            '<' if !self.in_raw_text
                || self.next_few_characters_are_ascii_case_insensitive(RAW_TEXT_END_TAG) =>
            {
                self.flush_text();
                self.tag_name.clear();
                self.tag_kind = TagKind::Start;
                self.attributes = AttributesMap::new();
                self.switch_to(ReadingState::Tag);
            }
            '&' if !self.in_raw_text && starts_character_reference(&self.input[self.pos..]) => {
                self.escape_code.clear();
                self.switch_to(ReadingState::Escape);
            }
            _ => self.text.push(c),
        }
    }

    fn handle_comment_state(&mut self, c: char) {
        if c == '-' && self.next_few_characters_are(COMMENT_END) {
            self.text.push_str(COMMENT_END);
            self.skip_rest_of(COMMENT_END);
            self.switch_to(ReadingState::Text);
        } else {
            self.text.push(c);
        }
    }

    fn handle_escape_state(&mut self, c: char) -> Result<(), DecodeError> {
        if c != ';' {
            self.escape_code.push(c);
            return Ok(());
        }
        if self.state == ReadingState::Escape {
            push_decoded(&self.escape_code, &mut self.text)?;
            self.switch_to(ReadingState::Text);
        } else {
            push_decoded(&self.escape_code, &mut self.attribute_value)?;
            self.switch_to(ReadingState::AttributeValue);
        }
        Ok(())
    }

    /// Returns the end position when a closing tag ends this reader.
    fn handle_tag_state(&mut self, c: char) -> Result<Option<usize>, DecodeError> {
        match c {
            c if c.is_whitespace() => {
                if !self.tag_name.is_empty() {
                    self.attribute_name.clear();
                    self.switch_to(ReadingState::AttributeName);
                }
            }
            '/' => {
                self.tag_kind = if self.tag_name.is_empty() {
                    TagKind::End
                } else {
                    TagKind::SelfClosing
                };
            }
            '>' if self.tag_kind == TagKind::End => {
                if self.parent != NodeId::ROOT {
                    tracing::trace!("Closed <{}>", self.parent_tag_name());
                    return Ok(Some(self.pos));
                }
                tracing::warn!("Ignoring closing tag with no open element");
                self.switch_to(ReadingState::Text);
            }
            '>' => {
                self.emit_element()?;
                self.switch_to(ReadingState::Text);
            }
            _ => {
                if self.tag_kind != TagKind::End {
                    self.tag_name.push(c);
                }
            }
        }
        Ok(None)
    }

    fn handle_attribute_name_state(&mut self, c: char) {
        match c {
            '=' => self.switch_to(ReadingState::BeforeAttributeValue),
            '/' | '>' => {
                if !self.attribute_name.is_empty() {
                    self.commit_attribute(AttrValue::Present);
                }
                self.reconsume_in(ReadingState::Tag);
            }
            _ => {
                if self.previous_character_is_whitespace() && !self.attribute_name.is_empty() {
                    self.commit_attribute(AttrValue::Present);
                }
                self.attribute_name.push(c);
            }
        }
    }

    fn handle_before_attribute_value_state(&mut self, c: char) {
        self.attribute_value.clear();
        if c == '"' || c == '\'' {
            self.value_quote = Some(c);
            self.switch_to(ReadingState::AttributeValue);
        } else {
            self.value_quote = None;
            self.reconsume_in(ReadingState::AttributeValue);
        }
    }

    fn handle_attribute_value_state(&mut self, c: char) {
        let unquoted = self.value_quote.is_none();
        if self.value_quote == Some(c) || (unquoted && c.is_whitespace()) {
            let value = mem::take(&mut self.attribute_value);
            self.commit_attribute(AttrValue::Text(value));
            self.switch_to(ReadingState::AttributeName);
        } else if unquoted && (c == '/' || c == '>') {
            let value = mem::take(&mut self.attribute_value);
            self.commit_attribute(AttrValue::Text(value));
            self.reconsume_in(ReadingState::Tag);
        } else if c == '&' && starts_character_reference(&self.input[self.pos..]) {
            self.escape_code.clear();
            self.switch_to(ReadingState::EscapeInAttributeValue);
        } else {
            self.attribute_value.push(c);
        }
    }

    // =========================================================================
    // Tree building
    // =========================================================================

    /// Lowercases the pending attribute name and stores it. A later duplicate
    /// replaces an earlier one.
    fn commit_attribute(&mut self, value: AttrValue) {
        let name = mem::take(&mut self.attribute_name).to_lowercase();
        let _ = self.attributes.insert(name, value);
    }

    fn flush_text(&mut self) {
        let text = mem::take(&mut self.text);
        let text = if self.options.trim_text {
            text.trim()
        } else {
            text.as_str()
        };
        if !text.is_empty() {
            let id = self.tree.alloc(NodeType::Text(text.to_string()));
            self.tree.append_child(self.parent, id);
        }
    }

    fn emit_element(&mut self) -> Result<(), DecodeError> {
        let name = mem::take(&mut self.tag_name);
        if is_void_element(&name) {
            self.tag_kind = TagKind::SelfClosing;
        }
        let attributes = mem::take(&mut self.attributes);
        let id = self
            .tree
            .alloc(NodeType::Element(ElementData::new(name, attributes)));
        self.tree.append_child(self.parent, id);

        if self.tag_kind == TagKind::SelfClosing {
            return Ok(());
        }
        tracing::trace!("Opened <{}> at byte {}", self.tag_name_of(id), self.pos);
        self.pos = ChildrenReader::new(self.input, self.options, &mut *self.tree, self.pos, id)
            .run()?;
        Ok(())
    }

    fn finish_at_eof(&mut self) {
        match self.state {
            ReadingState::Text | ReadingState::Comment => self.flush_text(),
            ReadingState::Escape => {
                tracing::warn!(
                    "Unterminated character reference &{} at end of input",
                    self.escape_code
                );
                self.text.push('&');
                let code = mem::take(&mut self.escape_code);
                self.text.push_str(&code);
                self.flush_text();
            }
            state => {
                tracing::warn!("Dropping incomplete tag at end of input (state {state})");
            }
        }
        if self.parent != NodeId::ROOT {
            tracing::warn!("Unclosed <{}> at end of input", self.parent_tag_name());
        }
    }

    fn parent_tag_name(&self) -> &str {
        self.tag_name_of(self.parent)
    }

    fn tag_name_of(&self, id: NodeId) -> &str {
        self.tree.as_element(id).map_or("", ElementData::tag_name)
    }
}

fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(name))
}

/// Decode the reference `code` (the text between `&` and `;`) onto `out`.
fn push_decoded(code: &str, out: &mut String) -> Result<(), DecodeError> {
    if let Some(number) = code.strip_prefix('#') {
        let parsed = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => number.parse::<u32>(),
        };
        let code_point = parsed.map_err(|_| DecodeError::MalformedNumeric {
            code: code.to_string(),
        })?;
        out.push(char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER));
        return Ok(());
    }

    let decoded = lookup_entity(code).ok_or_else(|| DecodeError::UnknownEntity {
        code: code.to_string(),
    })?;
    out.push_str(decoded);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(code: &str) -> Result<String, DecodeError> {
        let mut out = String::new();
        push_decoded(code, &mut out)?;
        Ok(out)
    }

    #[test]
    fn test_push_decoded_forms() {
        assert_eq!(decode("amp").unwrap(), "&");
        assert_eq!(decode("#97").unwrap(), "a");
        assert_eq!(decode("#x61").unwrap(), "a");
        assert_eq!(decode("#X2014").unwrap(), "\u{2014}");
        assert_eq!(decode("#xD800").unwrap(), "\u{FFFD}");
    }

    #[test]
    fn test_push_decoded_errors() {
        assert_eq!(
            decode("bogus"),
            Err(DecodeError::UnknownEntity {
                code: "bogus".to_string()
            })
        );
        assert_eq!(
            decode("#"),
            Err(DecodeError::MalformedNumeric {
                code: "#".to_string()
            })
        );
        assert_eq!(
            decode("#xZZ"),
            Err(DecodeError::MalformedNumeric {
                code: "#xZZ".to_string()
            })
        );
    }

    #[test]
    fn test_void_elements_ignore_case() {
        assert!(is_void_element("br"));
        assert!(is_void_element("IMG"));
        assert!(!is_void_element("div"));
        assert!(!is_void_element(""));
    }

    #[test]
    fn test_reading_state_display() {
        assert_eq!(ReadingState::AttributeValue.to_string(), "AttributeValue");
        assert!(ReadingState::AttributeName.skips_whitespace());
        assert!(!ReadingState::Text.skips_whitespace());
    }
}
