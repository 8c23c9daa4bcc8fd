//! High-level API for the soup HTML toolkit.
//!
//! # Scope
//!
//! This crate provides:
//! - **Parsing** - strings or byte buffers into a [`DomTree`]
//! - **Querying** - CSS selectors evaluated over any part of a tree
//! - **Documents** - a parsed tree kept together with its source
//!
//! The node tree, parser and selector engine live in their own crates and are
//! re-exported here as [`dom`], [`html`] and [`css`].
//!
//! # Example
//!
//! ```
//! let document = soup::parse_document("<p class=note>Hello <b>world</b></p>", true).unwrap();
//! let bold = document.select("p.note > b").unwrap();
//! assert_eq!(bold.len(), 1);
//! assert_eq!(document.tree.text_content(bold.as_slice()[0]), "world");
//! ```

use std::fs;

use thiserror::Error;

pub use soup_dom as dom;
pub use soup_html as html;
pub use soup_select as css;

pub use soup_dom::{AttrValue, DomTree, ElementData, NodeId, NodeType, Parsed};
pub use soup_html::{DecodeError, ParseOptions};
pub use soup_select::{MatchSet, Selector, SelectorError, compile};

/// Anything that can go wrong while loading, parsing or querying.
#[derive(Debug, Error)]
pub enum Error {
    /// The markup held a character reference that could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The selector string did not compile.
    #[error(transparent)]
    Selector(#[from] SelectorError),

    /// The source file could not be read.
    #[error("Failed to read '{path}': {source}")]
    File {
        /// The path that was requested.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A parsed document.
#[derive(Debug, Clone)]
pub struct Document {
    /// The markup as parsed.
    pub source: String,

    /// Source path, empty when parsed from a string.
    pub source_path: String,

    /// The node tree. Its top-level forest is the parse result.
    pub tree: DomTree,
}

impl Document {
    /// Run a selector over the whole document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Selector`] when `selector` does not compile.
    pub fn select(&self, selector: &str) -> Result<MatchSet, Error> {
        select(&self.tree, self.tree.top_level(), selector)
    }

    /// The parse result, unwrapped to a single node when there is exactly one
    /// top-level node.
    #[must_use]
    pub fn parsed(&self) -> Parsed<'_> {
        self.tree.parsed()
    }
}

/// Parse markup into a node tree.
///
/// With `trim_text`, every text run is trimmed and runs left empty are
/// dropped.
///
/// # Errors
///
/// Returns [`Error::Decode`] for an undecodable character reference.
pub fn parse(input: &str, trim_text: bool) -> Result<DomTree, Error> {
    Ok(soup_html::parse(input, trim_text)?)
}

/// Parse a byte buffer. Invalid UTF-8 is replaced with U+FFFD.
///
/// # Errors
///
/// Returns [`Error::Decode`] for an undecodable character reference.
pub fn parse_bytes(bytes: &[u8], trim_text: bool) -> Result<DomTree, Error> {
    Ok(soup_html::parse_bytes(bytes, trim_text)?)
}

/// Find the elements at or below `scope` matching `selector`.
///
/// Pass `tree.top_level()` to search a whole parse, or a slice of any nodes
/// to search below them. Each element appears once in the result.
///
/// # Errors
///
/// Returns [`Error::Selector`] when `selector` does not compile.
pub fn select(tree: &DomTree, scope: &[NodeId], selector: &str) -> Result<MatchSet, Error> {
    Ok(soup_select::select(tree, scope, selector)?)
}

/// Parse markup into a [`Document`].
///
/// # Errors
///
/// Returns [`Error::Decode`] for an undecodable character reference.
pub fn parse_document(html: &str, trim_text: bool) -> Result<Document, Error> {
    Ok(Document {
        source: html.to_string(),
        source_path: String::new(),
        tree: parse(html, trim_text)?,
    })
}

/// Read and parse a file.
///
/// The file is read as bytes, so invalid UTF-8 does not fail the load.
///
/// # Errors
///
/// Returns [`Error::File`] when the file cannot be read and
/// [`Error::Decode`] for an undecodable character reference.
pub fn load_document(path: &str, trim_text: bool) -> Result<Document, Error> {
    let bytes = fs::read(path).map_err(|source| Error::File {
        path: path.to_string(),
        source,
    })?;
    tracing::debug!("Loaded {} bytes from {}", bytes.len(), path);
    let source = String::from_utf8_lossy(&bytes).into_owned();
    let tree = parse(&source, trim_text)?;
    Ok(Document {
        source,
        source_path: path.to_string(),
        tree,
    })
}
