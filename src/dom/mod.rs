//! Owned document tree.
//!
//! The conversion pipeline operates on a plain owned tree of [`Node`]s built
//! once per document by the parser in [`parse`]. Elements carry their tag name
//! (ASCII-lowercased, with any namespace prefix folded in, so a
//! `<MadCap:variable>` element has the tag `"madcap:variable"`), an ordered
//! attribute list, and an ordered list of owned children. There is no parent
//! link and no interior mutability; passes either rebuild children lists in
//! place or produce new subtrees.

pub mod parse;

pub use parse::parse_document;

/// A single attribute on an element, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

/// An element node: tag name, ordered attributes, owned children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
}

/// A node in the document tree.
///
/// This is a closed set: every component matches exhaustively over these
/// three variants rather than testing tag strings scattered across the
/// codebase.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

impl Element {
    /// Create an empty element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Look up an attribute value by name (case-insensitive on the name).
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Set an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        if let Some(attr) = self
            .attrs
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            attr.value = value.to_string();
        } else {
            self.attrs.push(Attr {
                name: name.to_string(),
                value: value.to_string(),
            });
        }
    }

    /// Iterate the element's CSS classes.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    /// Check whether the element carries the given class (case-insensitive).
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c.eq_ignore_ascii_case(class))
    }

    /// Find the first descendant element (depth-first) matching a tag name.
    pub fn find(&self, tag: &str) -> Option<&Element> {
        for child in &self.children {
            if let Node::Element(el) = child {
                if el.tag == tag {
                    return Some(el);
                }
                if let Some(found) = el.find(tag) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Collect the concatenated text content of the subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

impl Node {
    /// Get the element if this node is one.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Get the element mutably if this node is one.
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Check whether this node is an element with the given tag.
    pub fn is_element(&self, tag: &str) -> bool {
        matches!(self, Node::Element(el) if el.tag == tag)
    }

    /// Check whether this node is a text node containing only whitespace.
    pub fn is_blank_text(&self) -> bool {
        matches!(self, Node::Text(t) if t.trim().is_empty())
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Comment(_) => {}
        }
    }
}
