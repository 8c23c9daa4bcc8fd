//! End-to-end tests for the public parse and select API.

use quickcheck::{Arbitrary, Gen};
use quickcheck_macros::quickcheck;
use rstest::rstest;
use soup::{AttrValue, DomTree, Error, NodeId, Parsed, parse, parse_bytes, parse_document, select};

fn single_element(tree: &DomTree) -> NodeId {
    match tree.parsed() {
        Parsed::Single(id) if tree.as_element(id).is_some() => id,
        other => panic!("expected one element, got {other:?}"),
    }
}

// ========== parse ==========

#[rstest]
#[case("<abc> \r \n\t </abc>", "<abc />")]
#[case("<abc />", "<abc />")]
#[case("<a /><b></b>", "<a /><b />")]
#[case("< br  >< br>< br>", "<br /><br /><br />")]
#[case("<a><b>", "<a><b /></a>")]
#[case("\n\n<p> Some text </p>\n\n", "<p>Some text</p>")]
#[case("one<A><b><C /></b><d> </d></A><BR>two", "one<A><b><C /></b><d /></A><BR />two")]
fn test_parse_structure(#[case] input: &str, #[case] expected: &str) {
    let tree = parse(input, true).unwrap();
    assert_eq!(tree.outer_html(NodeId::ROOT), expected);
}

#[test]
fn test_parse_attribute_forms() {
    let tree = parse(
        r#"
            <abc one two=3 four= five six =seven eight = "&quot;nine&quot;" ten='eleven' >
                text
            </abc>
        "#,
        true,
    )
    .unwrap();
    let abc = single_element(&tree);
    let element = tree.as_element(abc).unwrap();
    assert_eq!(element.attr("one"), Some(&AttrValue::Present));
    assert_eq!(element.attr("two"), Some(&AttrValue::from("3")));
    assert_eq!(element.attr("four"), Some(&AttrValue::from("five")));
    assert_eq!(element.attr("six"), Some(&AttrValue::from("seven")));
    assert_eq!(element.attr("eight"), Some(&AttrValue::from("\"nine\"")));
    assert_eq!(element.attr("ten"), Some(&AttrValue::from("eleven")));
    assert_eq!(tree.text_content(abc), "text");
}

#[test]
fn test_parse_reports_decode_errors() {
    let err = parse("<p>&1x;</p>", true).unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
    assert_eq!(err.to_string(), "Couldn't decode &1x;");
}

#[test]
fn test_parse_bytes_matches_parse() {
    let from_bytes = parse_bytes(b"<p>caf\xC3\xA9</p>", true).unwrap();
    let from_str = parse("<p>caf\u{e9}</p>", true).unwrap();
    assert_eq!(
        from_bytes.outer_html(NodeId::ROOT),
        from_str.outer_html(NodeId::ROOT)
    );
}

#[test]
fn test_dataset() {
    let tree = parse(
        r#"
            <div
                id="user"
                data-id="1234567890"
                data-user="johndoe"
                data-date-of-birth
            >John Doe</div>
        "#,
        true,
    )
    .unwrap();
    let dataset = tree.as_element(single_element(&tree)).unwrap().dataset();
    assert_eq!(dataset.len(), 3);
    assert_eq!(dataset["id"], "1234567890");
    assert_eq!(dataset["user"], "johndoe");
    assert_eq!(dataset["dateOfBirth"], "");

    let br = parse("<br>", true).unwrap();
    assert!(br.as_element(single_element(&br)).unwrap().dataset().is_empty());
}

// ========== select ==========

#[test]
fn test_select_over_document() {
    let document = parse_document(
        "<ul><li class=on>a</li><li>b</li></ul><ol><li class=on>c</li></ol>",
        true,
    )
    .unwrap();
    let matches = document.select("ul > li.on, ol li").unwrap();
    let texts: Vec<String> = matches
        .iter()
        .map(|id| document.tree.text_content(id))
        .collect();
    assert_eq!(texts, vec!["a", "c"]);
}

#[test]
fn test_select_errors_surface() {
    let tree = parse("<p></p>", true).unwrap();
    let err = select(&tree, tree.top_level(), "p:visited").unwrap_err();
    assert!(matches!(err, Error::Selector(_)));
    assert_eq!(err.to_string(), "Unknown pseudo-selector: visited");
}

#[test]
fn test_load_document_missing_file() {
    let err = soup::load_document("/nonexistent/soup/input.html", true).unwrap_err();
    assert!(matches!(err, Error::File { .. }));
    assert!(err.to_string().starts_with("Failed to read '/nonexistent/soup/input.html'"));
}

// ========== properties ==========

/// A small random document built from a fixed vocabulary of tags, so that
/// selectors have something to match.
#[derive(Debug, Clone)]
struct Markup(String);

impl Arbitrary for Markup {
    fn arbitrary(g: &mut Gen) -> Self {
        let tags = ["a", "b", "c", "p"];
        let classes = ["", " class=x", " class=\"x y\"", " checked"];
        let mut out = String::new();
        let mut open: Vec<&str> = Vec::new();
        for _ in 0..usize::arbitrary(g) % 24 {
            match u8::arbitrary(g) % 4 {
                0 => {
                    let tag = *g.choose(&tags).unwrap();
                    out.push_str(&format!("<{tag}{}>", g.choose(&classes).unwrap()));
                    open.push(tag);
                }
                1 => {
                    if let Some(tag) = open.pop() {
                        out.push_str(&format!("</{tag}>"));
                    }
                }
                2 => out.push_str(&format!("<{} />", g.choose(&tags).unwrap())),
                _ => out.push_str("text "),
            }
        }
        Self(out)
    }
}

#[quickcheck]
fn prop_select_is_idempotent(markup: Markup, selector_index: u8) -> bool {
    let selectors = [
        "a",
        "a b",
        "a > b",
        "b + c",
        "a ~ p",
        ".x",
        "[class~=y]",
        ":first-child",
        "c:last-of-type",
        ":nth-child(2n+1)",
        ":empty, :checked",
    ];
    let selector = selectors[usize::from(selector_index) % selectors.len()];
    let tree = parse(&markup.0, true).unwrap();
    let first = select(&tree, tree.top_level(), selector).unwrap();
    let second = select(&tree, tree.top_level(), selector).unwrap();
    first == second && first.as_slice() == second.as_slice()
}

#[quickcheck]
fn prop_matches_are_elements_in_the_tree(markup: Markup) -> bool {
    let tree = parse(&markup.0, true).unwrap();
    let all = select(&tree, tree.top_level(), "*").unwrap();
    let element_count = (1..tree.len())
        .filter(|&i| tree.as_element(NodeId(i)).is_some())
        .count();
    all.len() == element_count && all.iter().all(|id| tree.as_element(id).is_some())
}
