//! Integration tests for selector matching over parsed markup.

use rstest::rstest;
use soup_dom::{DomTree, NodeId};
use soup_select::{MatchSet, SelectorError, compile, select};

const BASIC_MARKUP: &str = r#"
    <e checked />
    <c />
    <a>
        <b id = "three"><c disabled="disabled"></c></b>
        <c />
    </a>
    <d />
    <c class = "one two"></c>
"#;

/// Named elements of [`BASIC_MARKUP`].
struct Basic {
    tree: DomTree,
    e: NodeId,
    c1: NodeId,
    a: NodeId,
    b: NodeId,
    disabled_c: NodeId,
    c2: NodeId,
    d: NodeId,
    last_c: NodeId,
}

fn element_children(tree: &DomTree, id: NodeId) -> Vec<NodeId> {
    tree.element_children(id).collect()
}

fn basic() -> Basic {
    let tree = soup_html::parse(BASIC_MARKUP, true).unwrap();
    let top = element_children(&tree, NodeId::ROOT);
    let [e, c1, a, d, last_c] = top[..] else {
        panic!("unexpected top level: {top:?}");
    };
    let [b, c2] = element_children(&tree, a)[..] else {
        panic!("unexpected children of a");
    };
    let [disabled_c] = element_children(&tree, b)[..] else {
        panic!("unexpected children of b");
    };
    Basic {
        tree,
        e,
        c1,
        a,
        b,
        disabled_c,
        c2,
        d,
        last_c,
    }
}

fn set(ids: &[NodeId]) -> MatchSet {
    ids.iter().copied().collect()
}

fn run(tree: &DomTree, selector: &str) -> MatchSet {
    select(tree, tree.top_level(), selector).unwrap()
}

// ========== simple selectors and combinators ==========

#[test]
fn test_tag_selector_searches_whole_tree() {
    let dom = basic();
    assert_eq!(
        run(&dom.tree, "c"),
        set(&[dom.c1, dom.disabled_c, dom.c2, dom.last_c])
    );
    assert_eq!(run(&dom.tree, "C"), run(&dom.tree, "c"));
}

#[test]
fn test_id_and_class_selectors() {
    let dom = basic();
    assert_eq!(run(&dom.tree, "#three"), set(&[dom.b]));
    assert_eq!(run(&dom.tree, "c.one.two"), set(&[dom.last_c]));
    assert_eq!(run(&dom.tree, ".two"), set(&[dom.last_c]));
    assert!(run(&dom.tree, "c.one.three").is_empty());
}

#[test]
fn test_combinators() {
    let dom = basic();
    assert_eq!(run(&dom.tree, "a c"), set(&[dom.disabled_c, dom.c2]));
    assert_eq!(run(&dom.tree, "a>*"), set(&[dom.b, dom.c2]));
    assert_eq!(run(&dom.tree, "a > *"), set(&[dom.b, dom.c2]));
    assert_eq!(
        run(&dom.tree, "* + c"),
        set(&[dom.c1, dom.last_c, dom.c2])
    );
    assert_eq!(run(&dom.tree, "b + c"), set(&[dom.c2]));
    assert!(run(&dom.tree, "a + c").is_empty());
    assert_eq!(run(&dom.tree, "a ~ c"), set(&[dom.last_c]));
}

#[test]
fn test_comma_is_a_union() {
    let dom = basic();
    assert_eq!(
        run(&dom.tree, "c[disabled], c.one.two, div"),
        set(&[dom.disabled_c, dom.last_c])
    );
    let both = run(&dom.tree, "c, c");
    assert_eq!(both.len(), 4);
}

#[test]
fn test_empty_selector_is_wildcard() {
    let dom = basic();
    assert_eq!(run(&dom.tree, ""), run(&dom.tree, "*"));
    assert_eq!(run(&dom.tree, "*").len(), 8);
}

#[test]
fn test_nested_combinator_scenario() {
    let tree = soup_html::parse("<a><b><c/></b><c/></a>", true).unwrap();
    let [a] = element_children(&tree, NodeId::ROOT)[..] else {
        panic!("expected a single top-level element");
    };
    let [b, second_c] = element_children(&tree, a)[..] else {
        panic!("expected two children");
    };
    let [first_c] = element_children(&tree, b)[..] else {
        panic!("expected one child");
    };

    assert_eq!(run(&tree, "a c"), set(&[first_c, second_c]));
    assert_eq!(run(&tree, "a > c"), set(&[second_c]));
    assert!(run(&tree, "b > b").is_empty());
    assert_eq!(run(&tree, "b + c"), set(&[second_c]));
}

#[test]
fn test_adjacent_is_the_immediate_sibling() {
    let tree = soup_html::parse("<p>x</p> between <q></q>", true).unwrap();
    assert!(run(&tree, "p + q").is_empty());
    assert_eq!(run(&tree, "p ~ q"), set(&[tree.top_level()[2]]));

    let untrimmed = soup_html::parse("<b></b>\n<c></c>", false).unwrap();
    assert!(run(&untrimmed, "b + c").is_empty());

    let trimmed = soup_html::parse("<b></b>\n<c></c>", true).unwrap();
    assert_eq!(run(&trimmed, "b + c"), set(&[trimmed.top_level()[1]]));
}

#[test]
fn test_select_from_single_node_scope() {
    let dom = basic();
    assert_eq!(
        select(&dom.tree, &[dom.a], "c").unwrap(),
        set(&[dom.disabled_c, dom.c2])
    );
    assert_eq!(
        select(&dom.tree, &[NodeId::ROOT], "c").unwrap(),
        run(&dom.tree, "c")
    );
    assert_eq!(
        select(&dom.tree, &[NodeId::ROOT], ":root:empty").unwrap(),
        set(&[dom.e, dom.c1, dom.d, dom.last_c])
    );
}

#[test]
fn test_matches_keep_document_order() {
    let dom = basic();
    let matches = run(&dom.tree, "d, e");
    assert_eq!(matches.as_slice(), &[dom.d, dom.e]);
}

#[test]
fn test_compiled_selector_is_reusable() {
    let dom = basic();
    let selector = compile("a c").unwrap();
    let first = selector.select(&dom.tree, dom.tree.top_level());
    let second = selector.select(&dom.tree, dom.tree.top_level());
    assert_eq!(first, second);
    assert_eq!(first.as_slice(), second.as_slice());
}

// ========== pseudo-classes ==========

#[test]
fn test_state_pseudo_classes() {
    let dom = basic();
    assert_eq!(run(&dom.tree, ":checked"), set(&[dom.e]));
    assert_eq!(run(&dom.tree, ":disabled"), set(&[dom.disabled_c]));
}

#[test]
fn test_child_position_pseudo_classes() {
    let dom = basic();
    assert_eq!(
        run(&dom.tree, ":first-child"),
        set(&[dom.e, dom.b, dom.disabled_c])
    );
    assert_eq!(run(&dom.tree, "a > :last-child"), set(&[dom.c2]));
    assert_eq!(run(&dom.tree, ":only-child"), set(&[dom.disabled_c]));
}

#[test]
fn test_of_type_pseudo_classes() {
    let dom = basic();
    assert_eq!(
        run(&dom.tree, "c:first-of-type"),
        set(&[dom.c1, dom.c2, dom.disabled_c])
    );
    assert_eq!(
        run(&dom.tree, "c:last-of-type"),
        set(&[dom.last_c, dom.c2, dom.disabled_c])
    );
    assert_eq!(
        run(&dom.tree, "c:only-of-type"),
        set(&[dom.c2, dom.disabled_c])
    );
}

#[test]
fn test_root_pseudo_class() {
    let dom = basic();
    assert_eq!(run(&dom.tree, ":root ~ :last-child"), set(&[dom.last_c]));
    assert_eq!(
        run(&dom.tree, "b:root, c:root, d:root, e:root"),
        set(&[dom.c1, dom.last_c, dom.d, dom.e])
    );
    assert!(!run(&dom.tree, ":root").contains(dom.b));
    assert!(run(&dom.tree, ":root").contains(dom.a));
}

#[test]
fn test_empty_pseudo_class_ignores_whitespace_and_comments() {
    let tree = soup_html::parse(
        r"
            <a>abc</a>
            <b></b>
            <c><!--comment--></c>
            <d><!--abc-->--></d>
            <e>  <!--abc--> <!--def--> </e>
            <f><g></g></f>
        ",
        true,
    )
    .unwrap();
    let top = element_children(&tree, NodeId::ROOT);
    assert_eq!(run(&tree, ":root:empty"), set(&[top[1], top[2], top[4]]));
}

#[test]
fn test_indeterminate_pseudo_class() {
    let tree = soup_html::parse(
        r"
            <div></div>
            <input type=radio name=one value=a>
            <input type=radio name=one value=b>
            <input type=radio name=two value=c>
            <input type=radio name=two value=d checked>
            <input type=checkbox indeterminate=yes>
            <input type=checkbox>
            <input type=password value=1234>
            <progress max=20 value=10 />
            <progress />
            <progress max=20 />
            <progress value=10 />
        ",
        true,
    )
    .unwrap();
    let top = element_children(&tree, NodeId::ROOT);
    assert_eq!(top.len(), 12);
    assert_eq!(
        run(&tree, ":indeterminate"),
        set(&[top[1], top[2], top[5], top[9], top[10], top[11]])
    );
}

#[test]
fn test_unnamed_radio_is_not_indeterminate() {
    let tree = soup_html::parse("<input type=radio>", true).unwrap();
    assert!(run(&tree, ":indeterminate").is_empty());
}

#[test]
fn test_required_and_optional() {
    let tree = soup_html::parse(
        r"
            <textarea required></textarea>
            <textarea></textarea>
            <input>
            <input required>
            <div></div>
        ",
        true,
    )
    .unwrap();
    let top = element_children(&tree, NodeId::ROOT);
    assert_eq!(run(&tree, ":optional"), set(&[top[1], top[2], top[4]]));
    assert_eq!(run(&tree, ":required"), set(&[top[0], top[3]]));
}

// ========== nth ==========

const NTH_MARKUP: &str = r"
    <root>
        <a one />
        <b one />
        <a two />
        <c one />
        <c two />
        <a three/>
    </root>
";

#[rstest]
#[case("root > :nth-child(5)", &[4])]
#[case("root > :nth-child(3n)", &[2, 5])]
#[case("root > :nth-child(0n+3)", &[2])]
#[case("root > :nth-child(n+4)", &[3, 4, 5])]
#[case("root > :nth-child(-n+2)", &[0, 1])]
#[case("root > :nth-child(3n-100)", &[1, 4])]
#[case("root > :nth-child(n+2):nth-child(-n+4)", &[1, 2, 3])]
#[case("root > :nth-child(even)", &[1, 3, 5])]
#[case("root > :nth-child(odd)", &[0, 2, 4])]
#[case("root > :nth-child( 2n + 1 )", &[0, 2, 4])]
#[case("root > :nth-last-child(2n+3)", &[1, 3])]
#[case("root > a:nth-of-type(odd)", &[0, 5])]
#[case("root > c:nth-last-of-type(-3n+8)", &[3])]
#[case("root > :nth-child(7)", &[])]
fn test_nth_pseudo_classes(#[case] selector: &str, #[case] expected: &[usize]) {
    let tree = soup_html::parse(NTH_MARKUP, true).unwrap();
    let [root] = element_children(&tree, NodeId::ROOT)[..] else {
        panic!("expected a single root element");
    };
    let children = element_children(&tree, root);
    let expected: MatchSet = expected.iter().map(|&i| children[i]).collect();
    assert_eq!(run(&tree, selector), expected);
}

// ========== attributes ==========

const ATTRIBUTE_MARKUP: &str = r#"
    <a one = two two = "three-four" six = "seven" />
    <a two = "threefour" five six="eight"/>
"#;

#[rstest]
#[case("[five]", &[1])]
#[case("a[six=eight]", &[1])]
#[case("[six=eight]", &[1])]
#[case("[six=\"eight\"]", &[1])]
#[case("[six='eight']", &[1])]
#[case("a[two][six=eight]", &[1])]
#[case("[two~=four]", &[0])]
#[case("[two~=three]", &[0])]
#[case("[two|=three]", &[0])]
#[case("[two^=three]", &[0, 1])]
#[case("[two$=ur]", &[0, 1])]
#[case("[one*=w]", &[0])]
#[case("[two*=\"e-f\"]", &[0])]
#[case("[SIX]", &[0, 1])]
#[case("[five=\"\"]", &[])]
#[case("[seven]", &[])]
fn test_attribute_operators(#[case] selector: &str, #[case] expected: &[usize]) {
    let tree = soup_html::parse(ATTRIBUTE_MARKUP, true).unwrap();
    let top = element_children(&tree, NodeId::ROOT);
    let expected: MatchSet = expected.iter().map(|&i| top[i]).collect();
    assert_eq!(run(&tree, selector), expected);
}

#[rstest]
#[case("[x~=four]", true)]
#[case("[x^=three]", true)]
#[case("[x$=four]", true)]
#[case("[x*=\"e-f\"]", true)]
#[case("[x~=thr]", false)]
#[case("[x|=three-four]", true)]
#[case("[x|=thre]", false)]
#[case("[x=three]", false)]
fn test_word_and_substring_operators(#[case] selector: &str, #[case] matched: bool) {
    let tree = soup_html::parse("<p x=\"three-four\"></p>", true).unwrap();
    assert_eq!(!run(&tree, selector).is_empty(), matched);
}

#[test]
fn test_escaped_characters_in_attribute_selectors() {
    let tree = soup_html::parse(
        r#"
            <div abc='"'></div>
            <div abc = '"' def="]"></div>
            <div def = "]"></div>
        "#,
        true,
    )
    .unwrap();
    let top = element_children(&tree, NodeId::ROOT);
    let (first, second, third) = (top[0], top[1], top[2]);

    assert_eq!(run(&tree, "div"), set(&[first, second, third]));
    assert_eq!(run(&tree, r#"div[abc="\""]"#), set(&[first, second]));
    assert_eq!(run(&tree, r#"div[def="]"]"#), set(&[second, third]));
    assert_eq!(run(&tree, r"div[def=\]]"), set(&[second, third]));
    assert_eq!(run(&tree, r#"div[def="]"][abc="\""]"#), set(&[second]));
}

#[test]
fn test_combinator_characters_inside_quotes() {
    let tree = soup_html::parse("<p title=\"a > b, c\"></p><p></p>", true).unwrap();
    let top = tree.top_level();
    assert_eq!(run(&tree, "p[title=\"a > b, c\"]"), set(&[top[0]]));
}

// ========== errors ==========

#[test]
fn test_unknown_pseudo_class_fails_select() {
    let dom = basic();
    assert_eq!(
        select(&dom.tree, dom.tree.top_level(), "a:hover"),
        Err(SelectorError::UnknownPseudoClass {
            pseudo: "hover".to_string()
        })
    );
}

#[test]
fn test_invalid_nth_fails_select() {
    let dom = basic();
    let err = select(&dom.tree, dom.tree.top_level(), ":nth-child(2n+x)").unwrap_err();
    assert_eq!(
        err,
        SelectorError::InvalidNth {
            query: "2n+x".to_string()
        }
    );
    assert_eq!(err.to_string(), "Invalid nth expression: 2n+x");
}
