//! HTML parsing into the owned document tree.
//!
//! Parsing goes through a small arena that html5ever's `TreeSink` can drive,
//! then the arena is flattened into the owned [`Node`] tree the rest of the
//! pipeline consumes. The arena only exists for the duration of the parse.
//!
//! Authoring-tool exports lean on XML self-closing syntax for namespaced
//! elements (`<MadCap:variable name="…" />`). The HTML parser ignores the
//! self-closing slash on unknown elements and would swallow the rest of the
//! document as children, so [`expand_foreign_self_closing`] rewrites those
//! tags to an explicit open/close pair before parsing.

use std::cell::RefCell;

use html5ever::driver::ParseOpts;
use html5ever::parse_document as html5_parse;
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::{ElementFlags, NodeOrText, QuirksMode, TreeSink};
use html5ever::{Attribute as Html5Attribute, QualName};

use super::{Attr, Element, Node};

/// Index of a node in the parse arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ArenaId(u32);

impl ArenaId {
    const NONE: ArenaId = ArenaId(u32::MAX);

    fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

#[derive(Debug)]
enum ArenaData {
    Document,
    Element { name: QualName, attrs: Vec<Attr> },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct ArenaNode {
    data: ArenaData,
    parent: ArenaId,
    children: Vec<ArenaId>,
}

/// Arena the TreeSink builds into.
struct Arena {
    nodes: Vec<ArenaNode>,
}

impl Arena {
    fn new() -> Self {
        Self {
            nodes: vec![ArenaNode {
                data: ArenaData::Document,
                parent: ArenaId::NONE,
                children: Vec::new(),
            }],
        }
    }

    fn document(&self) -> ArenaId {
        ArenaId(0)
    }

    fn alloc(&mut self, data: ArenaData) -> ArenaId {
        let id = ArenaId(self.nodes.len() as u32);
        self.nodes.push(ArenaNode {
            data,
            parent: ArenaId::NONE,
            children: Vec::new(),
        });
        id
    }

    fn node(&self, id: ArenaId) -> Option<&ArenaNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get(id.0 as usize)
    }

    fn node_mut(&mut self, id: ArenaId) -> Option<&mut ArenaNode> {
        if id.is_none() {
            return None;
        }
        self.nodes.get_mut(id.0 as usize)
    }

    fn append(&mut self, parent: ArenaId, child: ArenaId) {
        if let Some(c) = self.node_mut(child) {
            c.parent = parent;
        }
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
    }

    /// Append text, merging into a trailing text node when possible.
    fn append_text(&mut self, parent: ArenaId, text: &str) {
        let last = self
            .node(parent)
            .and_then(|p| p.children.last().copied())
            .unwrap_or(ArenaId::NONE);
        if let Some(node) = self.node_mut(last)
            && let ArenaData::Text(existing) = &mut node.data
        {
            existing.push_str(text);
            return;
        }
        let id = self.alloc(ArenaData::Text(text.to_string()));
        self.append(parent, id);
    }

    fn insert_before(&mut self, sibling: ArenaId, new_node: ArenaId) {
        let parent = self.node(sibling).map(|n| n.parent).unwrap_or(ArenaId::NONE);
        if parent.is_none() {
            return;
        }
        if let Some(n) = self.node_mut(new_node) {
            n.parent = parent;
        }
        if let Some(p) = self.node_mut(parent) {
            let pos = p
                .children
                .iter()
                .position(|&c| c == sibling)
                .unwrap_or(p.children.len());
            p.children.insert(pos, new_node);
        }
    }

    fn detach(&mut self, id: ArenaId) {
        let parent = self.node(id).map(|n| n.parent).unwrap_or(ArenaId::NONE);
        if let Some(p) = self.node_mut(parent) {
            p.children.retain(|&c| c != id);
        }
        if let Some(n) = self.node_mut(id) {
            n.parent = ArenaId::NONE;
        }
    }

    /// Flatten an arena subtree into an owned node.
    fn to_owned_node(&self, id: ArenaId) -> Option<Node> {
        let node = self.node(id)?;
        match &node.data {
            ArenaData::Document => None,
            ArenaData::Element { name, attrs } => {
                let mut el = Element::new(qual_to_tag(name));
                el.attrs = attrs.clone();
                el.children = node
                    .children
                    .iter()
                    .filter_map(|&c| self.to_owned_node(c))
                    .collect();
                Some(Node::Element(el))
            }
            ArenaData::Text(t) => Some(Node::Text(t.clone())),
            ArenaData::Comment(t) => Some(Node::Comment(t.clone())),
        }
    }
}

/// Fold a qualified name into a single lowercase tag string.
///
/// HTML parsing already lowercases names; a namespaced authoring element like
/// `<MadCap:dropDown>` arrives with the colon inside the local name, so the
/// result is `"madcap:dropdown"` either way.
fn qual_to_tag(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix.to_ascii_lowercase(), name.local),
        None => name.local.to_string(),
    }
}

fn attr_name(name: &QualName) -> String {
    match &name.prefix {
        Some(prefix) => format!("{}:{}", prefix.to_ascii_lowercase(), name.local),
        None => name.local.to_string(),
    }
}

/// Handle used by the TreeSink to reference arena nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHandle(ArenaId);

impl Default for NodeHandle {
    fn default() -> Self {
        NodeHandle(ArenaId::NONE)
    }
}

/// TreeSink implementation building the parse arena.
///
/// Uses interior mutability (RefCell) because html5ever's TreeSink trait
/// takes `&self` while we need to mutate the arena.
struct Sink {
    arena: RefCell<Arena>,
    quirks_mode: RefCell<QuirksMode>,
}

impl Sink {
    fn new() -> Self {
        Self {
            arena: RefCell::new(Arena::new()),
            quirks_mode: RefCell::new(QuirksMode::NoQuirks),
        }
    }
}

impl TreeSink for Sink {
    type Handle = NodeHandle;
    type Output = Self;
    type ElemName<'a>
        = &'a QualName
    where
        Self: 'a;

    fn finish(self) -> Self::Output {
        self
    }

    fn parse_error(&self, _msg: std::borrow::Cow<'static, str>) {
        // Ignore parse errors - be lenient like browsers
    }

    fn get_document(&self) -> Self::Handle {
        NodeHandle(self.arena.borrow().document())
    }

    fn elem_name<'a>(&'a self, target: &'a Self::Handle) -> Self::ElemName<'a> {
        static EMPTY: QualName = QualName {
            prefix: None,
            ns: html5ever::ns!(),
            local: html5ever::local_name!(""),
        };

        let arena = self.arena.borrow();
        match arena.node(target.0) {
            Some(node) => match &node.data {
                ArenaData::Element { name, .. } => {
                    // SAFETY: the QualName is stored in the arena, which lives
                    // as long as self; the RefCell borrow hides that from the
                    // checker. The reference is used immediately by the tree
                    // builder and never stored.
                    unsafe { std::mem::transmute::<&QualName, &'a QualName>(name) }
                }
                _ => &EMPTY,
            },
            None => &EMPTY,
        }
    }

    fn create_element(
        &self,
        name: QualName,
        attrs: Vec<Html5Attribute>,
        _flags: ElementFlags,
    ) -> Self::Handle {
        let attrs = attrs
            .into_iter()
            .map(|a| Attr {
                name: attr_name(&a.name),
                value: a.value.to_string(),
            })
            .collect();
        let id = self
            .arena
            .borrow_mut()
            .alloc(ArenaData::Element { name, attrs });
        NodeHandle(id)
    }

    fn create_comment(&self, text: StrTendril) -> Self::Handle {
        let id = self
            .arena
            .borrow_mut()
            .alloc(ArenaData::Comment(text.to_string()));
        NodeHandle(id)
    }

    fn create_pi(&self, _target: StrTendril, _data: StrTendril) -> Self::Handle {
        // Processing instructions are irrelevant to conversion; keep a comment
        // node so the handle stays valid.
        let id = self.arena.borrow_mut().alloc(ArenaData::Comment(String::new()));
        NodeHandle(id)
    }

    fn append(&self, parent: &Self::Handle, child: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match child {
            NodeOrText::AppendNode(node) => arena.append(parent.0, node.0),
            NodeOrText::AppendText(text) => arena.append_text(parent.0, &text),
        }
    }

    fn append_based_on_parent_node(
        &self,
        element: &Self::Handle,
        prev_element: &Self::Handle,
        child: NodeOrText<Self::Handle>,
    ) {
        let parent = self.arena.borrow().node(element.0).map(|n| n.parent);
        if let Some(parent) = parent
            && !parent.is_none()
        {
            let mut arena = self.arena.borrow_mut();
            match child {
                NodeOrText::AppendNode(node) => arena.append(parent, node.0),
                NodeOrText::AppendText(text) => arena.append_text(parent, &text),
            }
            return;
        }
        self.append(prev_element, child);
    }

    fn append_doctype_to_document(
        &self,
        _name: StrTendril,
        _public_id: StrTendril,
        _system_id: StrTendril,
    ) {
        // The doctype carries nothing the converter needs.
    }

    fn get_template_contents(&self, target: &Self::Handle) -> Self::Handle {
        *target
    }

    fn same_node(&self, x: &Self::Handle, y: &Self::Handle) -> bool {
        x.0 == y.0
    }

    fn set_quirks_mode(&self, mode: QuirksMode) {
        *self.quirks_mode.borrow_mut() = mode;
    }

    fn append_before_sibling(&self, sibling: &Self::Handle, new_node: NodeOrText<Self::Handle>) {
        let mut arena = self.arena.borrow_mut();
        match new_node {
            NodeOrText::AppendNode(node) => arena.insert_before(sibling.0, node.0),
            NodeOrText::AppendText(text) => {
                let id = arena.alloc(ArenaData::Text(text.to_string()));
                arena.insert_before(sibling.0, id);
            }
        }
    }

    fn add_attrs_if_missing(&self, target: &Self::Handle, attrs: Vec<Html5Attribute>) {
        let mut arena = self.arena.borrow_mut();
        if let Some(node) = arena.node_mut(target.0)
            && let ArenaData::Element { attrs: existing, .. } = &mut node.data
        {
            for attr in attrs {
                let name = attr_name(&attr.name);
                if !existing.iter().any(|a| a.name == name) {
                    existing.push(Attr {
                        name,
                        value: attr.value.to_string(),
                    });
                }
            }
        }
    }

    fn remove_from_parent(&self, target: &Self::Handle) {
        self.arena.borrow_mut().detach(target.0);
    }

    fn reparent_children(&self, node: &Self::Handle, new_parent: &Self::Handle) {
        let children: Vec<_> = self
            .arena
            .borrow()
            .node(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        let mut arena = self.arena.borrow_mut();
        if let Some(n) = arena.node_mut(node.0) {
            n.children.clear();
        }
        for child in children {
            arena.append(new_parent.0, child);
        }
    }
}

/// Parse an HTML/XHTML source into an owned tree rooted at the `html` element.
pub fn parse_document(source: &str) -> Node {
    let prepared = expand_foreign_self_closing(source);
    let sink = html5_parse(Sink::new(), ParseOpts::default())
        .from_utf8()
        .one(prepared.as_bytes());
    let arena = sink.arena.into_inner();

    // The document node has the html element as its only element child.
    let doc = arena.document();
    let html = arena
        .node(doc)
        .into_iter()
        .flat_map(|n| n.children.iter().copied())
        .find_map(|c| {
            let node = arena.to_owned_node(c)?;
            node.as_element().is_some().then_some(node)
        });
    html.unwrap_or_else(|| Node::Element(Element::new("html")))
}

/// Locate the `body` element of a parsed document.
pub fn body_of(root: &Node) -> Option<&Element> {
    let el = root.as_element()?;
    if el.tag == "body" {
        return Some(el);
    }
    el.find("body")
}

/// Rewrite `<prefix:name … />` self-closing tags to `<prefix:name …></prefix:name>`.
///
/// Only namespaced (colon-carrying) tags are rewritten; HTML void elements
/// like `<br/>` are handled correctly by the parser already.
pub fn expand_foreign_self_closing(source: &str) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c != b'<' || i + 1 >= bytes.len() || !bytes[i + 1].is_ascii_alphabetic() {
            // Copy text, comments, and end tags through to the next tag
            // start untouched. Always slicing between ASCII markers keeps
            // multibyte text intact.
            let skip_from = i + 1;
            let next = bytes[skip_from..]
                .iter()
                .position(|&b| b == b'<')
                .map(|offset| skip_from + offset)
                .unwrap_or(bytes.len());
            out.push_str(&source[i..next]);
            i = next;
            continue;
        }

        // Scan the tag, honoring quoted attribute values.
        let start = i;
        let mut j = i + 1;
        let mut quote: Option<u8> = None;
        let mut name_end = j;
        let mut saw_name_end = false;
        while j < bytes.len() {
            let b = bytes[j];
            match quote {
                Some(q) => {
                    if b == q {
                        quote = None;
                    }
                }
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'>' => break,
                    b' ' | b'\t' | b'\r' | b'\n' | b'/' if !saw_name_end => {
                        name_end = j;
                        saw_name_end = true;
                    }
                    _ => {}
                },
            }
            j += 1;
        }
        if j >= bytes.len() {
            out.push_str(&source[start..]);
            break;
        }
        if !saw_name_end {
            name_end = j;
        }

        let name = &source[start + 1..name_end];
        let self_closing = j > start && bytes[j - 1] == b'/';
        if self_closing && name.contains(':') {
            out.push_str(&source[start..j - 1]);
            out.push('>');
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        } else {
            out.push_str(&source[start..=j]);
        }
        i = j + 1;
    }

    out
}
