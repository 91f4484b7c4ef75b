//! Snippet resolution.
//!
//! Snippets are reusable fragments stored next to the project content
//! (`*.flsnp`, themselves HTML documents). A placeholder element
//! (`<MadCap:snippetBlock src="…"/>` at block level,
//! `<MadCap:snippetText src="…"/>` inline, or the plain-HTML
//! `class="mc-snippet"` variant) either gets the fragment's content merged
//! in place, or becomes an include directive pointing at the
//! extension-translated path.
//!
//! Each distinct source is parsed once per conversion run. Merged content
//! inherits the placeholder's condition context and then goes through the
//! same condition and variable passes as the host document, so
//! fragment-internal conditions still apply independently. A missing source
//! degrades to a visible placeholder plus a warning.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::condition;
use crate::dom::parse::body_of;
use crate::dom::{Element, Node};
use crate::meta::{Warning, WarningKind};
use crate::options::ConvertOptions;
use crate::project::Project;
use crate::variables::{ResolveOutcome, VariableSet};

/// Internal marker element for reference-mode includes; the emitters turn it
/// into `include::…[]` or `::include{src="…"}`.
pub(crate) const INCLUDE_TAG: &str = "x-include";

/// Everything a snippet pass needs besides the tree.
pub struct SnippetContext<'a> {
    pub project: &'a Project,
    pub document_dir: PathBuf,
    pub vars: &'a VariableSet,
    pub options: &'a ConvertOptions,
}

/// Run-scoped cache of parsed snippet sources.
///
/// `None` records a source that could not be read or parsed, so repeated
/// references warn once per placeholder but read the file only once.
#[derive(Default)]
pub struct SnippetCache {
    parsed: HashMap<PathBuf, Option<Vec<Node>>>,
    /// Sources currently being merged, for cycle detection.
    in_flight: Vec<PathBuf>,
}

impl SnippetCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn fragment(&mut self, path: &Path) -> Option<Vec<Node>> {
        if let Some(cached) = self.parsed.get(path) {
            return cached.clone();
        }
        let parsed = std::fs::read(path).ok().map(|bytes| {
            let source = crate::decode::decode_source(&bytes);
            let root = crate::dom::parse_document(&source);
            body_of(&root)
                .map(|body| body.children.clone())
                .unwrap_or_default()
        });
        self.parsed.insert(path.to_path_buf(), parsed.clone());
        parsed
    }
}

/// Resolve every snippet placeholder under `root`.
///
/// Variable references introduced by merged fragments are accumulated into
/// `outcome` alongside the host document's.
pub fn resolve(
    root: &mut Element,
    ctx: &SnippetContext<'_>,
    cache: &mut SnippetCache,
    outcome: &mut ResolveOutcome,
) {
    let mut replaced = Vec::with_capacity(root.children.len());
    for mut child in root.children.drain(..) {
        let placeholder = child.as_element().and_then(classify_placeholder);
        if let Some(kind) = placeholder {
            if let Some(el) = child.as_element() {
                replaced.extend(resolve_placeholder(el, kind, ctx, cache, outcome));
            }
            continue;
        }
        if let Some(el) = child.as_element_mut() {
            resolve(el, ctx, cache, outcome);
        }
        replaced.push(child);
    }
    root.children = replaced;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Block,
    Inline,
}

fn classify_placeholder(el: &Element) -> Option<Placeholder> {
    match el.tag.as_str() {
        "madcap:snippetblock" => Some(Placeholder::Block),
        "madcap:snippettext" => Some(Placeholder::Inline),
        "div" if el.has_class("mc-snippet") => Some(Placeholder::Block),
        "span" if el.has_class("mc-snippet") => Some(Placeholder::Inline),
        _ => None,
    }
}

fn resolve_placeholder(
    el: &Element,
    placeholder: Placeholder,
    ctx: &SnippetContext<'_>,
    cache: &mut SnippetCache,
    outcome: &mut ResolveOutcome,
) -> Vec<Node> {
    let src = el
        .attr("src")
        .or_else(|| el.attr("data-src"))
        .unwrap_or("")
        .to_string();
    if src.is_empty() {
        outcome
            .warnings
            .push(Warning::new(WarningKind::MissingSnippet, "placeholder without src"));
        return vec![missing_marker("")];
    }

    if !ctx.options.merge_snippets {
        let mut include = Element::new(INCLUDE_TAG);
        include.set_attr("src", &src);
        if placeholder == Placeholder::Inline {
            include.set_attr("inline", "true");
        }
        return vec![Node::Element(include)];
    }

    let path = ctx.project.resolve_relative(&ctx.document_dir, &src);
    if cache.in_flight.contains(&path) {
        warn!(src = %src, "snippet includes itself");
        outcome
            .warnings
            .push(Warning::new(WarningKind::MissingSnippet, format!("{src} (cycle)")));
        return vec![missing_marker(&src)];
    }

    let Some(nodes) = cache.fragment(&path) else {
        outcome
            .warnings
            .push(Warning::new(WarningKind::MissingSnippet, src.clone()));
        return vec![missing_marker(&src)];
    };

    // Host the fragment under a carrier element that re-declares the
    // placeholder's conditions, so the fragment is filtered in the same
    // condition context it was referenced from.
    let mut carrier = Element::new("body");
    if let Some(conditions) = el
        .attr("madcap:conditions")
        .or_else(|| el.attr("data-conditions"))
    {
        carrier.set_attr("madcap:conditions", conditions);
    }
    carrier.children = nodes;
    condition::apply(&mut carrier, &ctx.options.conditions);

    let var_outcome = crate::variables::resolve(&mut carrier, ctx.vars, ctx.options);
    merge_outcome(outcome, var_outcome);

    // Fragments can reference further snippets, relative to their own
    // directory.
    let fragment_ctx = SnippetContext {
        project: ctx.project,
        document_dir: path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        vars: ctx.vars,
        options: ctx.options,
    };
    cache.in_flight.push(path.clone());
    resolve(&mut carrier, &fragment_ctx, cache, outcome);
    cache.in_flight.pop();

    match placeholder {
        Placeholder::Block => carrier.children,
        Placeholder::Inline => unwrap_single_paragraph(carrier.children),
    }
}

/// Inline placeholders splice the content of a lone paragraph rather than
/// the paragraph itself, so the result stays inside the host sentence.
fn unwrap_single_paragraph(mut nodes: Vec<Node>) -> Vec<Node> {
    let significant = nodes.iter().filter(|n| !n.is_blank_text()).count();
    if significant == 1 {
        let idx = nodes.iter().position(|n| !n.is_blank_text()).unwrap_or(0);
        if let Node::Element(el) = &mut nodes[idx]
            && matches!(el.tag.as_str(), "p" | "div")
        {
            return std::mem::take(&mut el.children);
        }
    }
    nodes
}

fn missing_marker(src: &str) -> Node {
    if src.is_empty() {
        Node::Text("[MISSING SNIPPET]".to_string())
    } else {
        Node::Text(format!("[MISSING SNIPPET: {src}]"))
    }
}

fn merge_outcome(into: &mut ResolveOutcome, from: ResolveOutcome) {
    for (key, value) in from.referenced {
        if !into.referenced.iter().any(|(k, _)| *k == key) {
            into.referenced.push((key, value));
        }
    }
    into.warnings.extend(from.warnings);
}
