//! Condition filtering.
//!
//! Authored content carries condition tags in a `MadCap:conditions` attribute
//! (or `data-conditions` in the plain-HTML variant), whitespace-separated.
//! A node's effective condition set is the union of its own tags and every
//! ancestor's tags. A node whose effective set intersects the configured
//! exclusion list is dropped along with its whole subtree, without
//! re-evaluating descendants. Malformed or empty attributes mean "no
//! conditions", never an error.

use crate::dom::{Element, Node};
use crate::options::ConditionConfig;

/// Attribute names carrying condition tags, in lookup order.
const CONDITION_ATTRS: [&str; 2] = ["madcap:conditions", "data-conditions"];

/// The effective (ancestor-union) condition set for a node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConditionSet {
    tags: Vec<String>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union this set with the tags declared on an element.
    pub fn union_with(&self, element: &Element) -> Self {
        let mut tags = self.tags.clone();
        for tag in declared_conditions(element) {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Self { tags }
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// Condition tags declared directly on an element.
pub fn declared_conditions(element: &Element) -> impl Iterator<Item = &str> {
    CONDITION_ATTRS
        .iter()
        .find_map(|name| element.attr(name))
        .unwrap_or("")
        .split_whitespace()
}

/// Prune every subtree whose effective condition set hits the exclusion list.
///
/// Returns the number of elements dropped. The surviving tree keeps its
/// condition attributes; they are inert for later passes but useful when
/// snippets splice content under a conditioned placeholder.
pub fn apply(root: &mut Element, config: &ConditionConfig) -> usize {
    let inherited = ConditionSet::new().union_with(root);
    filter_children(root, &inherited, config)
}

fn filter_children(parent: &mut Element, inherited: &ConditionSet, config: &ConditionConfig) -> usize {
    let mut dropped = 0;
    let mut kept = Vec::with_capacity(parent.children.len());
    for mut child in parent.children.drain(..) {
        match &mut child {
            Node::Element(el) => {
                let effective = inherited.union_with(el);
                if config.excludes_any(effective.tags()) {
                    // The drop cascades; descendants are not re-evaluated.
                    dropped += 1 + count_elements(&el.children);
                    continue;
                }
                dropped += filter_children(el, &effective, config);
                kept.push(child);
            }
            Node::Text(_) | Node::Comment(_) => kept.push(child),
        }
    }
    parent.children = kept;
    dropped
}

fn count_elements(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .filter_map(Node::as_element)
        .map(|el| 1 + count_elements(&el.children))
        .sum()
}
