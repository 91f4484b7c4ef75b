//! Cross-sibling numbering continuity.
//!
//! Export output frequently splits what an author wrote as one numbered
//! procedure into several adjacent `<ol>` elements, interrupted only by
//! non-list block content (a paragraph, an image, an admonition). Restarting
//! each fragment at 1 corrupts the procedure, so runs of "logically
//! continuous" sibling lists are detected up front and later fragments carry
//! an explicit starting ordinal.
//!
//! The grouping decision is a pure function over a flattened sibling
//! sequence, computed before the recursive converter runs, deliberately not
//! inline lookahead during emission. Whether the pattern is intended
//! authoring semantics or an export quirk is unknowable from the trees alone;
//! it is kept as this single named policy. Headings break a run (a new
//! section restarts numbering), as does any intervening list of a different
//! kind or declared style, and any sibling whose subtree holds a list.

use std::collections::HashMap;

use crate::dom::Node;
use crate::emit::OrdinalStyle;

/// Declared ordinal style of a list element, from `type`/`style` attributes.
pub fn declared_style(el: &crate::dom::Element) -> Option<OrdinalStyle> {
    if let Some(t) = el.attr("type") {
        return match t.trim() {
            "a" => Some(OrdinalStyle::LowerAlpha),
            "A" => Some(OrdinalStyle::UpperAlpha),
            "i" => Some(OrdinalStyle::LowerRoman),
            "I" => Some(OrdinalStyle::UpperRoman),
            "1" => Some(OrdinalStyle::Arabic),
            _ => None,
        };
    }
    let style = el.attr("style")?.to_ascii_lowercase();
    let value = style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            name.trim()
                .eq("list-style-type")
                .then(|| value.trim().to_string())
        })
        .next_back()?;
    match value.as_str() {
        "lower-alpha" | "lower-latin" => Some(OrdinalStyle::LowerAlpha),
        "upper-alpha" | "upper-latin" => Some(OrdinalStyle::UpperAlpha),
        "lower-roman" => Some(OrdinalStyle::LowerRoman),
        "upper-roman" => Some(OrdinalStyle::UpperRoman),
        "decimal" => Some(OrdinalStyle::Arabic),
        _ => None,
    }
}

/// Compute the starting ordinal for each ordered list in a sibling sequence.
///
/// The returned map is keyed by the list's index within `siblings`. Lists
/// that begin a run start at 1 (or at their explicit `start` attribute);
/// lists continuing a run start after the previous fragment's last ordinal.
pub fn sibling_list_starts(siblings: &[Node]) -> HashMap<usize, u64> {
    let mut starts = HashMap::new();
    // (declared style, next ordinal) of the run in progress.
    let mut run: Option<(Option<OrdinalStyle>, u64)> = None;

    for (index, node) in siblings.iter().enumerate() {
        let Some(el) = node.as_element() else {
            // Text and comments never interrupt a run.
            continue;
        };
        match el.tag.as_str() {
            "ol" => {
                let style = declared_style(el);
                let explicit = el.attr("start").and_then(|s| s.trim().parse::<u64>().ok());
                let start = match (&run, explicit) {
                    // An authored start attribute always wins.
                    (_, Some(n)) => n,
                    (Some((run_style, next)), None) if *run_style == style => *next,
                    _ => 1,
                };
                starts.insert(index, start);
                let items = el.children.iter().filter(|c| c.is_element("li")).count() as u64;
                run = Some((style, start + items));
            }
            "ul" => {
                // An intervening list of the other kind ends the run.
                run = None;
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                // A new section restarts numbering.
                run = None;
            }
            _ => {
                // Non-list block content keeps the run alive, unless it
                // hides a list somewhere in its subtree; that list renders
                // between the fragments and numbering must not flow over it.
                if contains_list(el) {
                    run = None;
                }
            }
        }
    }
    starts
}

fn contains_list(el: &crate::dom::Element) -> bool {
    el.children.iter().any(|child| {
        child
            .as_element()
            .is_some_and(|c| c.tag == "ol" || c.tag == "ul" || contains_list(c))
    })
}
