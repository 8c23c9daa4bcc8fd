//! Soup CLI - parse HTML and run CSS selector queries
//!
//! Usage:
//!   soup <file>                     Print the parsed node tree
//!   soup <file> -s 'ul > li'        Print the elements a selector matches
//!   soup <file> -s a -s b --json    Emit matches as JSON
//!   soup --html '<p>Hi</p>'         Parse an HTML string directly

use std::collections::BTreeMap;
use std::env;

use anyhow::{Context, Result};
use clap::Parser;
use owo_colors::OwoColorize;
use soup::{AttrValue, Document, DomTree, NodeId, NodeType, Parsed};
use tracing_subscriber::EnvFilter;

/// Parse HTML into a node tree and query it with CSS selectors
#[derive(Parser, Debug)]
#[command(name = "soup")]
#[command(author, version, about, long_about = None)]
#[command(after_help = r"EXAMPLES:
    # Print the node tree of a file
    soup ./index.html

    # Run a selector
    soup ./index.html -s 'ul.menu > li:nth-child(odd)'

    # Several selectors, JSON output
    soup ./index.html -s 'a[href^=https]' -s 'img' --json

    # Parse inline HTML
    soup --html '<p>Hello <b>world</b></p>' -s b
")]
struct Cli {
    /// Path to an HTML file
    #[arg(value_name = "FILE", required_unless_present = "html")]
    path: Option<String>,

    /// Parse this HTML string instead of a file
    #[arg(long, value_name = "HTML", conflicts_with = "path")]
    html: Option<String>,

    /// CSS selector to run; may be repeated
    #[arg(short = 's', long = "select", value_name = "SELECTOR")]
    selectors: Vec<String>,

    /// Keep leading and trailing whitespace in text nodes
    #[arg(long)]
    keep_whitespace: bool,

    /// Print JSON instead of a tree
    #[arg(short = 'j', long)]
    json: bool,

    /// Log parser and selector activity to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let document = load(&cli)?;
    tracing::debug!(
        "Document ready: {} nodes, {} top-level",
        document.tree.len(),
        document.tree.top_level().len()
    );
    let color = !cli.json && env::var_os("NO_COLOR").is_none();

    if cli.selectors.is_empty() {
        if cli.json {
            print_parsed_json(&document)?;
        } else {
            for &id in document.tree.top_level() {
                print_tree(&document.tree, id, 0, color);
            }
        }
        return Ok(());
    }

    let mut results = Vec::new();
    for selector in &cli.selectors {
        let matches = document
            .select(selector)
            .with_context(|| format!("Failed to run selector '{selector}'"))?;
        if cli.json {
            let views: Vec<_> = matches.iter().map(|id| document.tree.view(id)).collect();
            results.push(serde_json::json!({ "selector": selector, "matches": views }));
        } else {
            print_matches(&document.tree, selector, matches.as_slice(), color);
        }
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(cli: &Cli) -> Result<Document> {
    let trim_text = !cli.keep_whitespace;
    if let Some(html) = &cli.html {
        return soup::parse_document(html, trim_text).context("Failed to parse --html input");
    }
    let path = cli.path.as_deref().context("No input file or --html provided")?;
    soup::load_document(path, trim_text).with_context(|| format!("Failed to load '{path}'"))
}

/// Print the parse result the way the library returns it: one node, or an
/// array for a forest.
fn print_parsed_json(document: &Document) -> Result<()> {
    let json = match document.parsed() {
        Parsed::Single(id) => serde_json::to_string_pretty(&document.tree.view(id))?,
        Parsed::Forest(forest) => {
            let views: Vec<_> = forest.iter().map(|&id| document.tree.view(id)).collect();
            serde_json::to_string_pretty(&views)?
        }
    };
    println!("{json}");
    Ok(())
}

fn print_matches(tree: &DomTree, selector: &str, matches: &[NodeId], color: bool) {
    let header = format!("=== {selector} ({} matches) ===", matches.len());
    if color {
        println!("{}", header.bold());
    } else {
        println!("{header}");
    }
    for (i, &id) in matches.iter().enumerate() {
        let index = format!("{i:3}:");
        if color {
            println!("{} {}", index.dimmed(), tree.outer_html(id));
        } else {
            println!("{index} {}", tree.outer_html(id));
        }
    }
    println!();
}

/// Print a node tree with one node per line.
fn print_tree(tree: &DomTree, id: NodeId, depth: usize, color: bool) {
    let prefix = "  ".repeat(depth);
    let Some(node) = tree.get(id) else {
        return;
    };
    match &node.node_type {
        NodeType::Element(data) => {
            let sorted: BTreeMap<_, _> = data.attrs().iter().collect();
            let attrs: Vec<String> = sorted
                .into_iter()
                .map(|(name, value)| match value {
                    AttrValue::Text(value) => format!("{name}=\"{value}\""),
                    AttrValue::Present => name.clone(),
                })
                .collect();
            let tag_name = if color {
                data.tag_name().cyan().to_string()
            } else {
                data.tag_name().to_string()
            };
            if attrs.is_empty() {
                println!("{prefix}<{tag_name}>");
            } else {
                println!("{prefix}<{tag_name} {}>", attrs.join(" "));
            }
        }
        NodeType::Text(text) => {
            let display = format!("\"{}\"", text.replace('\n', "\\n"));
            if color {
                println!("{prefix}{}", display.green());
            } else {
                println!("{prefix}{display}");
            }
        }
    }
    for &child in tree.children(id) {
        print_tree(tree, child, depth + 1, color);
    }
}
