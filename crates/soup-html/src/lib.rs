//! HTML parser for the soup toolkit.
//!
//! # Scope
//!
//! This crate implements:
//! - **Markup parser**: a single-pass character state machine producing a
//!   [`soup_dom::DomTree`] of elements and text
//!   - Tags, quoted/unquoted/valueless attributes, self-closing and void elements
//!   - Comments kept verbatim inside the surrounding text run
//!   - `script` content read as raw text up to `</script>`
//! - **Character references**: named (HTML 4 set plus `apos`), decimal and
//!   hexadecimal, with a prefix tree deciding whether an `&` is literal
//!
//! # Not Implemented
//!
//! - The HTML5 tree construction algorithm (implied tags, foster parenting)
//! - Doctype handling beyond treating `<!DOCTYPE ...>` as an element

mod entities;
mod error;
mod parser;

pub use entities::{is_entity_prefix, lookup_entity, starts_character_reference};
pub use error::DecodeError;
pub use parser::{HtmlParser, ParseOptions, parse, parse_bytes};
