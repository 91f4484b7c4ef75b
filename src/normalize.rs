//! Structure normalization.
//!
//! Authoring-tool exports produce two recurring shapes of malformed list
//! nesting:
//!
//! 1. Block elements (paragraphs, images, divs) as direct children of an
//!    `ol`/`ul` instead of living inside a list item.
//! 2. Nested lists emitted as *siblings* of the list item they belong to.
//!
//! [`normalize`] repairs both with two composable passes. Orphan repair must
//! run first: moving an orphaned paragraph into the preceding item can leave
//! a nested list sitting immediately after that item, which is exactly the
//! shape the sibling-nesting pass then repairs uniformly. Both passes are
//! idempotent, and anything they cannot classify passes through unchanged;
//! content preservation wins over structural purity.

use tracing::trace;

use crate::dom::{Element, Node};

fn is_list(node: &Node) -> bool {
    matches!(node, Node::Element(el) if el.tag == "ol" || el.tag == "ul")
}

fn is_item(node: &Node) -> bool {
    node.is_element("li")
}

/// Run both repair passes over the whole tree.
pub fn normalize(root: &mut Element) {
    repair_orphans(root);
    repair_sibling_nesting(root);
}

/// Pass 1: reattach non-item, non-list children of a list to the nearest
/// preceding list item, synthesizing an item when none exists yet.
pub fn repair_orphans(el: &mut Element) {
    for child in &mut el.children {
        if let Node::Element(child_el) = child {
            repair_orphans(child_el);
        }
    }

    if el.tag != "ol" && el.tag != "ul" {
        return;
    }

    let needs_repair = el
        .children
        .iter()
        .any(|c| !is_item(c) && !is_list(c) && !c.is_blank_text() && !matches!(c, Node::Comment(_)));
    if !needs_repair {
        return;
    }
    trace!(tag = %el.tag, "reattaching orphaned list children");

    let mut repaired: Vec<Node> = Vec::with_capacity(el.children.len());
    for child in el.children.drain(..) {
        if is_item(&child) || is_list(&child) || child.is_blank_text() {
            repaired.push(child);
            continue;
        }
        if matches!(child, Node::Comment(_)) {
            repaired.push(child);
            continue;
        }
        // Orphaned block or text: goes to the end of the preceding item.
        match repaired.iter_mut().rev().find_map(|n| {
            if is_item(n) { n.as_element_mut() } else { None }
        }) {
            Some(item) => item.children.push(child),
            None => {
                let mut synthetic = Element::new("li");
                synthetic.children.push(child);
                repaired.push(Node::Element(synthetic));
            }
        }
    }
    el.children = repaired;
}

/// Pass 2: move nested lists that follow a list item at the same level into
/// that item, preserving order and style attributes.
pub fn repair_sibling_nesting(el: &mut Element) {
    for child in &mut el.children {
        if let Node::Element(child_el) = child {
            repair_sibling_nesting(child_el);
        }
    }

    if el.tag != "ol" && el.tag != "ul" {
        return;
    }
    if !el.children.iter().any(is_list) {
        return;
    }
    trace!(tag = %el.tag, "nesting sibling lists into preceding items");

    let mut repaired: Vec<Node> = Vec::with_capacity(el.children.len());
    for child in el.children.drain(..) {
        if !is_list(&child) {
            repaired.push(child);
            continue;
        }
        match repaired.iter_mut().rev().find_map(|n| {
            if is_item(n) { n.as_element_mut() } else { None }
        }) {
            Some(item) => item.children.push(child),
            None => {
                // A list with no preceding item; host it in a synthetic one.
                let mut synthetic = Element::new("li");
                synthetic.children.push(child);
                repaired.push(Node::Element(synthetic));
            }
        }
    }
    el.children = repaired;
}
