//! The list/block converter.
//!
//! A recursive descent over the normalized tree, emitting target-format text
//! through a [`Syntax`] back end. All list state lives in a [`ListContext`]
//! threaded by value through the recursion; the converter holds no mutable
//! list counters, so it is re-entrant and cheap to exercise with arbitrary
//! trees.
//!
//! Numbering continuity across sibling lists is decided before emission by
//! [`crate::continuity::sibling_list_starts`]; the converter only consumes
//! the per-list starting ordinals that pre-pass computed.

pub mod inline;
pub mod links;

use std::path::PathBuf;

use crate::continuity;
use crate::dom::{Element, Node};
use crate::emit::{Admonition, ItemSpec, ListKind, OrdinalStyle, Syntax};
use crate::meta::{Warning, WarningKind};
use crate::options::ConvertOptions;
use crate::project::Project;
use crate::snippets::INCLUDE_TAG;
use crate::variables::VARREF_TAG;
use inline::InlineWriter;

/// List state for one nesting level, passed by value into children.
#[derive(Debug, Clone, Copy)]
pub struct ListContext {
    pub depth: usize,
    pub kind: ListKind,
    pub style: OrdinalStyle,
    /// Ordinal the next item will take (already offset for continuity).
    pub next_ordinal: u64,
}

/// Where the document being converted lives, for link checking and include
/// resolution. Both fields are optional so string-only conversions work.
#[derive(Debug, Default)]
pub struct DocumentContext<'a> {
    pub project: Option<&'a Project>,
    pub document_dir: Option<PathBuf>,
}

/// Raw output of the converter, before packaging into a `Conversion`.
#[derive(Debug)]
pub struct ConvertOutput {
    pub text: String,
    pub word_count: usize,
    pub warnings: Vec<Warning>,
    pub broken_links: Vec<String>,
}

/// Convert a normalized body under the given syntax.
pub fn emit_document<S: Syntax>(
    syntax: &S,
    body: &Element,
    title: Option<&str>,
    options: &ConvertOptions,
    doc: &DocumentContext<'_>,
) -> ConvertOutput {
    let mut converter = Converter {
        syntax,
        options,
        doc,
        out: String::new(),
        line_prefix: String::new(),
        words: 0,
        warnings: Vec::new(),
        broken_links: Vec::new(),
    };

    if let Some(title) = title {
        let has_heading = body
            .children
            .iter()
            .filter_map(Node::as_element)
            .any(|el| el.tag == "h1");
        if !has_heading && !title.trim().is_empty() {
            let line = syntax.heading(1, &syntax.escape(title.trim()));
            converter.emit_block(&line);
            converter.words += title.split_whitespace().count();
        }
    }

    converter.walk_blocks(&body.children, None);

    let mut text = converter.out.trim_end().to_string();
    if !text.is_empty() {
        text.push('\n');
    }
    ConvertOutput {
        text,
        word_count: converter.words,
        warnings: converter.warnings,
        broken_links: converter.broken_links,
    }
}

struct Converter<'a, S: Syntax> {
    syntax: &'a S,
    options: &'a ConvertOptions,
    doc: &'a DocumentContext<'a>,
    out: String,
    line_prefix: String,
    words: usize,
    warnings: Vec<Warning>,
    broken_links: Vec<String>,
}

impl<S: Syntax> Converter<'_, S> {
    // --- output primitives ---

    /// Separate the next block from previous output with one blank line.
    fn block_break(&mut self) {
        if self.out.is_empty() {
            return;
        }
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out.push('\n');
    }

    /// Write multi-line text, applying the current line prefix to every
    /// non-empty line.
    fn write_lines(&mut self, text: &str) {
        for (i, line) in text.lines().enumerate() {
            if i > 0 {
                self.out.push('\n');
            }
            if !line.is_empty() {
                self.out.push_str(&self.line_prefix);
                self.out.push_str(line);
            }
        }
    }

    fn emit_block(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.block_break();
        self.write_lines(text);
    }

    /// Render a run of children into a standalone string (admonition and
    /// collapsible bodies, blockquotes). The capture starts a fresh block
    /// scope with no indentation.
    fn capture_blocks(&mut self, children: &[Node]) -> String {
        let saved_out = std::mem::take(&mut self.out);
        let saved_prefix = std::mem::take(&mut self.line_prefix);
        self.walk_blocks(children, None);
        self.line_prefix = saved_prefix;
        std::mem::replace(&mut self.out, saved_out)
            .trim_end()
            .to_string()
    }

    // --- block walking ---

    fn walk_blocks(&mut self, children: &[Node], list: Option<&ListContext>) {
        let starts = continuity::sibling_list_starts(children);
        for (index, node) in children.iter().enumerate() {
            match node {
                Node::Comment(_) => {}
                Node::Text(text) => {
                    if !text.trim().is_empty() {
                        let paragraph = self.inline_nodes(std::slice::from_ref(node));
                        self.emit_block(&paragraph);
                    }
                }
                Node::Element(el) => {
                    let start = starts.get(&index).copied().unwrap_or(1);
                    self.block_element(el, start, list);
                }
            }
        }
    }

    fn block_element(&mut self, el: &Element, list_start: u64, list: Option<&ListContext>) {
        match el.tag.as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = el.tag.as_bytes()[1] - b'0';
                let text = self.inline_nodes(&el.children);
                if !text.is_empty() {
                    let heading = self.syntax.heading(level, &text);
                    self.emit_block(&heading);
                }
            }
            "p" => self.paragraph(el),
            "ol" | "ul" => self.list(el, list_start, list),
            "img" => self.image_block(el),
            "hr" => {
                let rule = self.syntax.thematic_break().to_string();
                self.emit_block(&rule);
            }
            "pre" => self.code_block(el),
            "blockquote" => {
                let body = self.capture_blocks(&el.children);
                if !body.is_empty() {
                    let block = self.syntax.quote(&body);
                    self.emit_block(&block);
                }
            }
            "table" => self.table(el),
            "madcap:dropdown" => self.dropdown(el, list),
            "div" if el.has_class("MCDropDown") || el.has_class("dropDown") => {
                self.dropdown(el, list)
            }
            "div" | "section" | "article" | "main" | "body" => {
                match el.classes().find_map(Admonition::from_class) {
                    Some(kind) => {
                        let body = self.capture_blocks(&el.children);
                        if !body.is_empty() {
                            let block = self.syntax.admonition(kind, &body);
                            self.emit_block(&block);
                        }
                    }
                    // Transparent container; its children are blocks at the
                    // same list level.
                    None => self.walk_blocks(&el.children, list),
                }
            }
            INCLUDE_TAG => {
                let src = el.attr("src").unwrap_or("");
                let path = links::translate_extension(src, self.syntax.extension());
                let directive = self.syntax.include(&path);
                self.emit_block(&directive);
            }
            tag if tag.starts_with("madcap:") => self.foreign_block(el, list),
            _ => {
                // Inline content at block level becomes a paragraph; unknown
                // containers pass their children through unchanged.
                if el.children.iter().any(is_block_node) {
                    self.walk_blocks(&el.children, list);
                } else {
                    let node = Node::Element(el.clone());
                    let text = self.inline_nodes(std::slice::from_ref(&node));
                    self.emit_block(&text);
                }
            }
        }
    }

    /// Unhandled authoring-tool elements: keyword, concept and toggler
    /// markers are dropped (warned about when they wrap visible text),
    /// anything else still carrying visible text degrades to a paragraph
    /// plus a warning.
    fn foreign_block(&mut self, el: &Element, list: Option<&ListContext>) {
        match el.tag.as_str() {
            "madcap:keyword" | "madcap:concept" | "madcap:toggler" => {
                self.dropped_marker(el)
            }
            _ => {
                if el.children.iter().any(is_block_node) {
                    self.walk_blocks(&el.children, list);
                    return;
                }
                let text = el.text_content();
                if !text.trim().is_empty() {
                    self.warnings
                        .push(Warning::new(WarningKind::UnknownElement, el.tag.clone()));
                    let node = Node::Element(el.clone());
                    let rendered = self.inline_nodes(std::slice::from_ref(&node));
                    self.emit_block(&rendered);
                }
            }
        }
    }

    /// An index/concept marker is dropped, but visible text it wraps is a
    /// real loss the caller should be able to audit.
    fn dropped_marker(&mut self, el: &Element) {
        if !el.text_content().trim().is_empty() {
            self.warnings
                .push(Warning::new(WarningKind::UnknownElement, el.tag.clone()));
        }
    }

    fn paragraph(&mut self, el: &Element) {
        if let Some(kind) = el.classes().find_map(Admonition::from_class) {
            let body = self.inline_nodes(&el.children);
            if !body.is_empty() {
                let block = self.syntax.admonition(kind, &body);
                self.emit_block(&block);
            }
            return;
        }

        // A paragraph holding only an image is a figure candidate.
        let significant: Vec<&Node> = el
            .children
            .iter()
            .filter(|n| !n.is_blank_text() && !matches!(n, Node::Comment(_)))
            .collect();
        if significant.len() == 1
            && let Some(img) = significant[0].as_element()
            && img.tag == "img"
            && !self.is_inline_image(img)
        {
            self.image_block(img);
            return;
        }

        let text = self.inline_nodes(&el.children);
        self.emit_block(&text);
    }

    // --- lists ---

    fn list(&mut self, el: &Element, start: u64, parent: Option<&ListContext>) {
        let depth = parent.map(|ctx| ctx.depth + 1).unwrap_or(0);
        let kind = if el.tag == "ol" {
            ListKind::Ordered
        } else {
            ListKind::Unordered
        };
        let declared = continuity::declared_style(el);
        let style = declared.unwrap_or_else(|| OrdinalStyle::for_depth(depth));

        // An explicit declaration is only needed when a depth-0 list departs
        // from the numeric default; nested depths infer style from nesting.
        let declare = match (depth, declared) {
            (0, Some(style)) if style != OrdinalStyle::Arabic => Some(style),
            _ => None,
        };

        self.block_break();
        if kind == ListKind::Ordered
            && let Some(prelude) = self.syntax.list_prelude(declare, start)
        {
            self.write_lines(&prelude);
            self.out.push('\n');
        }

        let mut ctx = ListContext {
            depth,
            kind,
            style,
            next_ordinal: start,
        };
        for child in &el.children {
            let Some(item) = child.as_element() else {
                continue;
            };
            if item.tag != "li" {
                continue;
            }
            self.item(item, ctx);
            ctx.next_ordinal += 1;
        }
    }

    fn item(&mut self, li: &Element, ctx: ListContext) {
        if !self.out.is_empty() && !self.out.ends_with('\n') {
            self.out.push('\n');
        }

        let spec = ItemSpec {
            kind: ctx.kind,
            style: ctx.style,
            depth: ctx.depth,
            ordinal: ctx.next_ordinal,
        };
        let marker = self.syntax.item_marker(&spec);

        let (lead, blocks) = partition_item(li);
        let lead_text = self.inline_refs(&lead);

        self.out.push_str(&self.line_prefix);
        self.out.push_str(&marker);
        self.out.push_str(&lead_text);

        if blocks.is_empty() {
            return;
        }

        // Everything after the lead is a continuation of this item, never a
        // new sibling item. Indentation-based formats hang continuations
        // under the marker.
        let saved_prefix = self.line_prefix.clone();
        if self.syntax.continuation_separator().is_none() {
            self.line_prefix.push_str(&" ".repeat(marker.len()));
        }

        let block_nodes: Vec<Node> = blocks.iter().map(|&n| n.clone()).collect();
        let starts = continuity::sibling_list_starts(&block_nodes);
        for (index, node) in block_nodes.iter().enumerate() {
            if let Some(block_el) = node.as_element()
                && (block_el.tag == "ol" || block_el.tag == "ul")
            {
                // Nested lists attach to the item directly.
                self.list(block_el, starts.get(&index).copied().unwrap_or(1), Some(&ctx));
                continue;
            }
            // Stray text between an item's blocks still belongs to the item;
            // capture_blocks renders it as a paragraph.
            let rendered = self.capture_blocks(std::slice::from_ref(node));
            if rendered.is_empty() {
                continue;
            }
            if let Some(separator) = self.syntax.continuation_separator() {
                self.out.push('\n');
                self.out.push_str(separator);
                self.out.push('\n');
                self.write_lines(&rendered);
            } else {
                self.emit_block(&rendered);
            }
        }

        self.line_prefix = saved_prefix;
    }

    // --- leaf blocks ---

    fn image_block(&mut self, img: &Element) {
        let src = img.attr("src").unwrap_or("");
        if src.is_empty() {
            return;
        }
        let alt = img.attr("alt").unwrap_or("");
        if self.is_inline_image(img) {
            let token = self.syntax.image_inline(src, alt);
            self.emit_block(&token);
            return;
        }
        let title = img.attr("title").filter(|t| !t.trim().is_empty());
        let width = img.attr("width").and_then(|w| w.trim().parse::<u32>().ok());
        let figure = self.syntax.figure(src, alt, title, width);
        self.emit_block(&figure);
    }

    fn is_inline_image(&self, img: &Element) -> bool {
        if img.has_class("icon") || img.has_class("inline") {
            return true;
        }
        let dimension = |name: &str| img.attr(name).and_then(|v| v.trim().parse::<u32>().ok());
        match (dimension("width"), dimension("height")) {
            (Some(w), Some(h)) => {
                w <= self.options.inline_image_max_px && h <= self.options.inline_image_max_px
            }
            (Some(w), None) => w <= self.options.inline_image_max_px,
            (None, Some(h)) => h <= self.options.inline_image_max_px,
            (None, None) => false,
        }
    }

    fn code_block(&mut self, pre: &Element) {
        let language = pre
            .find("code")
            .into_iter()
            .flat_map(Element::classes)
            .find_map(|class| class.strip_prefix("language-"))
            .map(str::to_string);
        let code = pre.text_content();
        let code = code.trim_matches('\n');
        let block = self.syntax.code_block(code, language.as_deref());
        self.emit_block(&block);
    }

    fn dropdown(&mut self, el: &Element, list: Option<&ListContext>) {
        let title = dropdown_title(el).unwrap_or_else(|| "Details".to_string());
        let body = dropdown_body(el);

        if self.options.collapsible {
            let rendered = self.capture_blocks(body);
            let block = self.syntax.collapsible(&title, &rendered);
            self.emit_block(&block);
        } else {
            // Fallback: plain heading plus section content.
            let escaped = self.syntax.escape(&title);
            let heading = self.syntax.heading(3, &escaped);
            self.emit_block(&heading);
            self.walk_blocks(body, list);
        }
        self.words += title.split_whitespace().count();
    }

    fn table(&mut self, el: &Element) {
        if let Some(caption) = el.find("caption") {
            let text = self.inline_nodes(&caption.children);
            if !text.is_empty() {
                let styled = self.syntax.emphasis(&text);
                self.emit_block(&styled);
            }
        }

        let mut header: Option<Vec<String>> = None;
        let mut rows: Vec<Vec<String>> = Vec::new();
        for row in table_rows(el) {
            let cells: Vec<String> = row
                .children
                .iter()
                .filter_map(Node::as_element)
                .filter(|c| c.tag == "td" || c.tag == "th")
                .map(|c| self.inline_nodes(&c.children))
                .collect();
            if cells.is_empty() {
                continue;
            }
            let all_headers = row
                .children
                .iter()
                .filter_map(Node::as_element)
                .filter(|c| c.tag == "td" || c.tag == "th")
                .all(|c| c.tag == "th");
            if header.is_none() && rows.is_empty() && all_headers {
                header = Some(cells);
            } else {
                rows.push(cells);
            }
        }
        if header.is_none() && rows.is_empty() {
            return;
        }
        let block = self.syntax.table(header.as_deref(), &rows);
        self.emit_block(&block);
    }

    // --- inline ---

    fn inline_nodes(&mut self, nodes: &[Node]) -> String {
        let mut writer = InlineWriter::new();
        for node in nodes {
            self.inline_into(node, &mut writer);
        }
        writer.finish()
    }

    fn inline_refs(&mut self, nodes: &[&Node]) -> String {
        let mut writer = InlineWriter::new();
        for node in nodes {
            self.inline_into(node, &mut writer);
        }
        writer.finish()
    }

    fn inline_into(&mut self, node: &Node, writer: &mut InlineWriter) {
        match node {
            Node::Comment(_) => {}
            Node::Text(text) => {
                self.words += text.split_whitespace().count();
                writer.push_plain(&self.syntax.escape(text));
            }
            Node::Element(el) => self.inline_element(el, writer),
        }
    }

    fn inline_element(&mut self, el: &Element, writer: &mut InlineWriter) {
        match el.tag.as_str() {
            "em" | "i" => {
                let inner = self.inline_nodes(&el.children);
                if !inner.is_empty() {
                    writer.push_styled(&self.syntax.emphasis(&inner));
                }
            }
            "strong" | "b" => {
                let inner = self.inline_nodes(&el.children);
                if !inner.is_empty() {
                    writer.push_styled(&self.syntax.strong(&inner));
                }
            }
            "code" | "tt" | "kbd" => {
                let text = collapse_whitespace(&el.text_content());
                self.words += text.split_whitespace().count();
                if !text.is_empty() {
                    writer.push_styled(&self.syntax.code(&text));
                }
            }
            "a" | "madcap:xref" => self.inline_link(el, writer),
            "img" => {
                let src = el.attr("src").unwrap_or("");
                if !src.is_empty() {
                    let alt = el.attr("alt").unwrap_or("");
                    writer.push_styled(&self.syntax.image_inline(src, alt));
                }
            }
            "br" => {
                writer.push_raw(self.syntax.line_break());
                writer.push_raw("\n");
            }
            VARREF_TAG => {
                let name = el.attr("name").unwrap_or("");
                writer.push_raw(&self.syntax.variable_ref(name));
            }
            INCLUDE_TAG => {
                let src = el.attr("src").unwrap_or("");
                let path = links::translate_extension(src, self.syntax.extension());
                writer.push_raw(&self.syntax.include(&path));
            }
            "madcap:keyword" | "madcap:concept" => self.dropped_marker(el),
            _ => {
                // Transparent inline containers (span, u, sub, sup, unknown).
                for child in &el.children {
                    self.inline_into(child, writer);
                }
            }
        }
    }

    fn inline_link(&mut self, el: &Element, writer: &mut InlineWriter) {
        let href = el.attr("href").unwrap_or("");
        let inner = self.inline_nodes(&el.children);
        if href.is_empty() {
            writer.push_plain(&inner);
            return;
        }
        let target = links::classify(href);
        if let links::LinkTarget::Sibling { path, .. } = &target
            && let (Some(project), Some(dir)) = (self.doc.project, self.doc.document_dir.as_deref())
            && !project.target_exists(dir, path)
        {
            self.broken_links.push(href.to_string());
        }
        let emitted = links::emit_target(&target, self.syntax.extension());
        let text = if inner.is_empty() { emitted.clone() } else { inner };
        writer.push_styled(&self.syntax.link(&text, &emitted));
    }
}

/// Split a list item into its lead (inline content emitted after the
/// marker) and trailing continuation blocks.
fn partition_item(li: &Element) -> (Vec<&Node>, Vec<&Node>) {
    let mut lead: Vec<&Node> = Vec::new();
    let mut blocks: Vec<&Node> = Vec::new();
    let mut in_blocks = false;

    let mut children = li.children.iter().peekable();
    // A leading paragraph supplies the lead; its siblings are continuation.
    while let Some(node) = children.peek() {
        if node.is_blank_text() || matches!(node, Node::Comment(_)) {
            children.next();
            continue;
        }
        break;
    }
    if let Some(Node::Element(first)) = children.peek()
        && first.tag == "p"
    {
        lead.extend(first.children.iter());
        children.next();
        in_blocks = true;
    }

    for node in children {
        if in_blocks {
            if !node.is_blank_text() {
                blocks.push(node);
            }
            continue;
        }
        if is_block_node(node) {
            in_blocks = true;
            blocks.push(node);
        } else {
            lead.push(node);
        }
    }
    (lead, blocks)
}

fn is_block_node(node: &Node) -> bool {
    let Some(el) = node.as_element() else {
        return false;
    };
    matches!(
        el.tag.as_str(),
        "p" | "div"
            | "ol"
            | "ul"
            | "li"
            | "table"
            | "pre"
            | "blockquote"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "hr"
            | "section"
            | "article"
            | "madcap:dropdown"
    ) || (el.tag == "img" && el.attr("width").is_some())
        || el.tag == INCLUDE_TAG && el.attr("inline").is_none()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn dropdown_title(el: &Element) -> Option<String> {
    let head = el
        .find("madcap:dropdownhotspot")
        .or_else(|| el.find("madcap:dropdownhead"))
        .or_else(|| {
            el.children
                .iter()
                .filter_map(Node::as_element)
                .find(|c| c.has_class("dropDownHead") || c.has_class("MCDropDownHead"))
        })?;
    let title = collapse_whitespace(&head.text_content());
    (!title.is_empty()).then_some(title)
}

fn dropdown_body(el: &Element) -> &[Node] {
    el.children
        .iter()
        .filter_map(Node::as_element)
        .find(|c| {
            c.tag == "madcap:dropdownbody"
                || c.has_class("dropDownBody")
                || c.has_class("MCDropDownBody")
        })
        .map(|c| c.children.as_slice())
        .unwrap_or(&[])
}

fn table_rows(table: &Element) -> Vec<&Element> {
    let mut rows = Vec::new();
    for child in table.children.iter().filter_map(Node::as_element) {
        match child.tag.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(
                    child
                        .children
                        .iter()
                        .filter_map(Node::as_element)
                        .filter(|c| c.tag == "tr"),
                );
            }
            _ => {}
        }
    }
    rows
}
