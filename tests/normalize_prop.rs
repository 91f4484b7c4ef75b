//! Property tests for the structure normalizer.
//!
//! Generates arbitrary messy list trees (orphan paragraphs and text, lists
//! nested as siblings of items) and checks that normalization always yields
//! a well-formed tree and is idempotent.

use helpdown::dom::{Element, Node};
use helpdown::normalize::normalize;
use proptest::prelude::*;

fn li(text: &str) -> Node {
    let mut el = Element::new("li");
    el.children.push(Node::Text(text.to_string()));
    Node::Element(el)
}

fn p(text: &str) -> Node {
    let mut el = Element::new("p");
    el.children.push(Node::Text(text.to_string()));
    Node::Element(el)
}

fn arb_list(depth: u32) -> BoxedStrategy<Element> {
    let child = if depth == 0 {
        prop_oneof![
            Just(li("item")),
            Just(p("orphan")),
            Just(Node::Text("stray".to_string())),
            Just(Node::Text("   ".to_string())),
            Just(Node::Comment("note".to_string())),
        ]
        .boxed()
    } else {
        prop_oneof![
            4 => Just(li("item")),
            2 => Just(p("orphan")),
            1 => Just(Node::Text("stray".to_string())),
            1 => arb_list(depth - 1).prop_map(Node::Element),
        ]
        .boxed()
    };
    ("ol|ul", prop::collection::vec(child, 0..6))
        .prop_map(|(tag, children)| {
            let mut el = Element::new(tag);
            el.children = children;
            el
        })
        .boxed()
}

/// Every list element may contain only items, blank text, and comments.
fn well_formed(el: &Element) -> bool {
    if el.tag == "ol" || el.tag == "ul" {
        let ok = el.children.iter().all(|child| match child {
            Node::Element(e) => e.tag == "li",
            Node::Text(t) => t.trim().is_empty(),
            Node::Comment(_) => true,
        });
        if !ok {
            return false;
        }
    }
    el.children
        .iter()
        .filter_map(Node::as_element)
        .all(well_formed)
}

proptest! {
    #[test]
    fn normalized_trees_are_well_formed(list in arb_list(3)) {
        let mut body = Element::new("body");
        body.children.push(Node::Element(list));
        normalize(&mut body);
        prop_assert!(well_formed(&body));
    }

    #[test]
    fn normalization_is_idempotent(list in arb_list(3)) {
        let mut body = Element::new("body");
        body.children.push(Node::Element(list));
        normalize(&mut body);
        let once = body.clone();
        normalize(&mut body);
        prop_assert_eq!(once, body);
    }
}
