//! String-level conversion tests.
//!
//! Everything here converts in-memory documents with no project on disk,
//! covering list structure, numbering continuity, inline formatting, and
//! the block constructs of both back ends.

use helpdown::{convert_str, ConvertOptions, Format, VariableMode, WarningKind};

fn adoc(html: &str) -> String {
    convert_str(html, &ConvertOptions::new(Format::AsciiDoc))
        .unwrap()
        .text
}

fn md(html: &str) -> String {
    convert_str(html, &ConvertOptions::new(Format::Markdown))
        .unwrap()
        .text
}

// ============================================================================
// Numbering Continuity
// ============================================================================

const INTERRUPTED: &str = "<html><body>\
<ol><li>One</li><li>Two</li><li>Three</li></ol>\
<p>Remember.</p>\
<ol><li>Four</li></ol>\
<h2>Reset</h2>\
<ol><li>First</li></ol>\
</body></html>";

#[test]
fn test_continuity_asciidoc() {
    assert_eq!(
        adoc(INTERRUPTED),
        ". One\n. Two\n. Three\n\nRemember.\n\n[start=4]\n. Four\n\n== Reset\n\n. First\n"
    );
}

#[test]
fn test_continuity_markdown() {
    assert_eq!(
        md(INTERRUPTED),
        "1. One\n2. Two\n3. Three\n\nRemember.\n\n4. Four\n\n## Reset\n\n1. First\n"
    );
}

#[test]
fn test_explicit_start_wins() {
    let html = "<html><body><ol start=\"10\"><li>Ten</li></ol></body></html>";
    assert_eq!(adoc(html), "[start=10]\n. Ten\n");
    assert_eq!(md(html), "10. Ten\n");
}

#[test]
fn test_unordered_break_resets_numbering() {
    let html = "<html><body>\
        <ol><li>One</li><li>Two</li></ol>\
        <ul><li>Bullet</li></ul>\
        <ol><li>One again</li></ol>\
        </body></html>";
    let out = adoc(html);
    assert!(!out.contains("[start="), "bullet list must reset the run:\n{out}");
}

#[test]
fn test_wrapped_list_between_fragments_resets_numbering() {
    let html = "<html><body>\
        <ol><li>One</li><li>Two</li></ol>\
        <div><ol><li>Inner</li></ol></div>\
        <ol><li>Three</li></ol>\
        </body></html>";
    // The wrapped list renders between the fragments, so numbering must not
    // flow across it.
    assert_eq!(adoc(html), ". One\n. Two\n\n. Inner\n\n. Three\n");
}

// ============================================================================
// Nesting Depth and Ordinal Styles
// ============================================================================

#[test]
fn test_depth_styles_markdown() {
    let html = "<html><body>\
        <ol><li>Top<ol><li>Mid<ol><li>Deep</li></ol></li></ol></li></ol>\
        </body></html>";
    assert_eq!(md(html), "1. Top\n\n   a. Mid\n\n      i. Deep\n");
}

#[test]
fn test_depth_styles_asciidoc() {
    let html = "<html><body>\
        <ol><li>Top<ol><li>Mid<ol><li>Deep</li></ol></li></ol></li></ol>\
        </body></html>";
    // Depth carries the style; no attribute lines for inferred styles.
    assert_eq!(adoc(html), ". Top\n\n.. Mid\n\n... Deep\n");
}

#[test]
fn test_declared_alpha_at_top_level() {
    let html = "<html><body><ol type=\"a\"><li>First</li><li>Second</li></ol></body></html>";
    assert_eq!(adoc(html), "[loweralpha]\n. First\n. Second\n");
    assert_eq!(md(html), "a. First\nb. Second\n");
}

#[test]
fn test_nested_list_attaches_to_item() {
    let html = "<html><body>\
        <ol><li>Parent</li><ol type=\"a\"><li>Child</li></ol><li>Next</li></ol>\
        </body></html>";
    // The sibling list is repaired into the preceding item.
    assert_eq!(adoc(html), ". Parent\n\n.. Child\n. Next\n");
}

// ============================================================================
// Orphan Content and Continuations
// ============================================================================

#[test]
fn test_orphan_becomes_continuation_asciidoc() {
    let html =
        "<html><body><ol><li>First</li><p>Careful now.</p><li>Second</li></ol></body></html>";
    assert_eq!(adoc(html), ". First\n+\nCareful now.\n. Second\n");
}

#[test]
fn test_orphan_becomes_continuation_markdown() {
    let html =
        "<html><body><ol><li>First</li><p>Careful now.</p><li>Second</li></ol></body></html>";
    assert_eq!(md(html), "1. First\n\n   Careful now.\n2. Second\n");
}

#[test]
fn test_item_with_lead_paragraph_and_note() {
    let html = "<html><body>\
        <ol><li><p>Step one</p><p class=\"note\">Watch out.</p></li><li><p>Step two</p></li></ol>\
        </body></html>";
    assert_eq!(
        adoc(html),
        ". Step one\n+\nNOTE: Watch out.\n. Step two\n"
    );
}

#[test]
fn test_text_after_lead_paragraph_stays_with_item() {
    let html = "<html><body>\
        <ol><li><p>Step one</p>stray tail text</li><li><p>Step two</p></li></ol>\
        </body></html>";
    assert_eq!(adoc(html), ". Step one\n+\nstray tail text\n. Step two\n");
    assert_eq!(md(html), "1. Step one\n\n   stray tail text\n2. Step two\n");
}

// ============================================================================
// Inline Formatting
// ============================================================================

#[test]
fn test_word_boundary_spacing() {
    let html = "<html><body><p>Run<b>now</b>please or <i>wait</i>.</p></body></html>";
    assert_eq!(adoc(html), "Run *now* please or _wait_.\n");
    assert_eq!(md(html), "Run **now** please or *wait*.\n");
}

#[test]
fn test_whitespace_collapse() {
    let html = "<html><body><p>Too   many\n   spaces.</p></body></html>";
    assert_eq!(adoc(html), "Too many spaces.\n");
}

#[test]
fn test_inline_code_is_verbatim() {
    let html = "<html><body><p>Use <code>cargo *build*</code> now.</p></body></html>";
    assert_eq!(md(html), "Use `cargo *build*` now.\n");
}

#[test]
fn test_markdown_escapes_formatting_chars() {
    let html = "<html><body><p>a *b* and [c]</p></body></html>";
    assert_eq!(md(html), "a \\*b\\* and \\[c\\]\n");
}

#[test]
fn test_asciidoc_escapes_attribute_braces() {
    let html = "<html><body><p>set {name} here</p></body></html>";
    assert_eq!(adoc(html), "set \\{name} here\n");
}

// ============================================================================
// Links
// ============================================================================

#[test]
fn test_link_targets_asciidoc() {
    let html = "<html><body><p><a href=\"https://example.com\">Site</a> \
        and <a href=\"other.htm#sec\">Other</a> \
        and <a href=\"#here\">Here</a>.</p></body></html>";
    assert_eq!(
        adoc(html),
        "https://example.com[Site] and xref:other.adoc#sec[Other] and <<here,Here>>.\n"
    );
}

#[test]
fn test_link_targets_markdown() {
    let html = "<html><body><p><a href=\"other.htm\">Other</a></p></body></html>";
    assert_eq!(md(html), "[Other](other.md)\n");
}

// ============================================================================
// Admonitions, Drop-Downs, Quotes, Rules
// ============================================================================

#[test]
fn test_admonition_paragraph() {
    let html = "<html><body><p class=\"note\">Mind the gap.</p></body></html>";
    assert_eq!(adoc(html), "NOTE: Mind the gap.\n");
    assert_eq!(md(html), ":::note\nMind the gap.\n:::\n");
}

#[test]
fn test_admonition_block() {
    let html =
        "<html><body><div class=\"warning\"><p>One.</p><p>Two.</p></div></body></html>";
    assert_eq!(adoc(html), "[WARNING]\n====\nOne.\n\nTwo.\n====\n");
}

const DROPDOWN: &str = "<html><body>\
<MadCap:dropDown><MadCap:dropDownHead>\
<MadCap:dropDownHotspot>More details</MadCap:dropDownHotspot>\
</MadCap:dropDownHead><MadCap:dropDownBody>\
<p>Hidden text.</p>\
</MadCap:dropDownBody></MadCap:dropDown>\
</body></html>";

#[test]
fn test_dropdown_collapsible() {
    assert_eq!(
        adoc(DROPDOWN),
        ".More details\n[%collapsible]\n====\nHidden text.\n====\n"
    );
    assert_eq!(md(DROPDOWN), ":::collapsible[More details]\nHidden text.\n:::\n");
}

#[test]
fn test_dropdown_fallback_heading() {
    let options = ConvertOptions::new(Format::AsciiDoc).with_collapsible(false);
    let out = convert_str(DROPDOWN, &options).unwrap().text;
    assert_eq!(out, "=== More details\n\nHidden text.\n");
}

#[test]
fn test_blockquote_markdown() {
    let html = "<html><body><blockquote><p>Quoted line.</p></blockquote></body></html>";
    assert_eq!(md(html), "> Quoted line.\n");
}

#[test]
fn test_thematic_break() {
    let html = "<html><body><p>a</p><hr/><p>b</p></body></html>";
    assert_eq!(adoc(html), "a\n\n'''\n\nb\n");
    assert_eq!(md(html), "a\n\n---\n\nb\n");
}

// ============================================================================
// Conditions
// ============================================================================

#[test]
fn test_excluded_condition_drops_subtree() {
    let html = "<html><body>\
        <p madcap:conditions=\"General.Deprecated\">Old stuff.</p>\
        <p>Current.</p>\
        </body></html>";
    let out = adoc(html);
    assert!(!out.contains("Old stuff"));
    assert_eq!(out, "Current.\n");
}

#[test]
fn test_condition_cascade_through_wrapper() {
    let html = "<html><body>\
        <div madcap:conditions=\"Output.PrintOnly\"><p>Print only.</p></div>\
        <p>Always.</p>\
        </body></html>";
    assert_eq!(adoc(html), "Always.\n");
}

// ============================================================================
// Variables (no project context)
// ============================================================================

#[test]
fn test_missing_variable_degrades_with_warning() {
    let html = "<html><body><p>Made by \
        <MadCap:variable name=\"General.Company\" />.</p></body></html>";
    let conversion = convert_str(html, &ConvertOptions::new(Format::AsciiDoc)).unwrap();
    assert_eq!(conversion.text, "Made by General.Company.\n");
    assert_eq!(conversion.meta.warnings.len(), 1);
    assert_eq!(conversion.meta.warnings[0].kind, WarningKind::MissingVariable);
}

#[test]
fn test_reference_mode_token_without_project() {
    // With no source on disk, even reference mode falls back to the name.
    let options =
        ConvertOptions::new(Format::Markdown).with_variable_mode(VariableMode::Reference);
    let html =
        "<html><body><p><MadCap:variable name=\"General.Company\" /></p></body></html>";
    let conversion = convert_str(html, &options).unwrap();
    assert_eq!(conversion.text, "General.Company\n");
    assert!(conversion.variables.is_none());
}

// ============================================================================
// Index and Concept Markers
// ============================================================================

#[test]
fn test_bare_keyword_marker_vanishes() {
    let html = "<html><body><p>Install \
        <MadCap:keyword term=\"setup\" />it.</p></body></html>";
    let conversion = convert_str(html, &ConvertOptions::new(Format::AsciiDoc)).unwrap();
    assert_eq!(conversion.text, "Install it.\n");
    assert!(conversion.meta.warnings.is_empty());
}

#[test]
fn test_keyword_wrapping_text_warns() {
    let html = "<html><body><p>Install the \
        <MadCap:keyword term=\"widget\">widget</MadCap:keyword> kit.</p></body></html>";
    let conversion = convert_str(html, &ConvertOptions::new(Format::AsciiDoc)).unwrap();
    assert_eq!(conversion.text, "Install the kit.\n");
    assert_eq!(conversion.meta.warnings.len(), 1);
    assert_eq!(conversion.meta.warnings[0].kind, WarningKind::UnknownElement);
}

#[test]
fn test_concept_block_with_text_warns() {
    let html = "<html><body>\
        <MadCap:concept term=\"widgets\">Widget concepts</MadCap:concept>\
        <p>Body.</p></body></html>";
    let conversion = convert_str(html, &ConvertOptions::new(Format::AsciiDoc)).unwrap();
    assert_eq!(conversion.text, "Body.\n");
    assert_eq!(conversion.meta.warnings.len(), 1);
    assert_eq!(conversion.meta.warnings[0].kind, WarningKind::UnknownElement);
}

// ============================================================================
// Code, Images, Tables
// ============================================================================

#[test]
fn test_code_block_with_language() {
    let html =
        "<html><body><pre><code class=\"language-rust\">fn main() {}</code></pre></body></html>";
    assert_eq!(adoc(html), "[source,rust]\n----\nfn main() {}\n----\n");
    assert_eq!(md(html), "```rust\nfn main() {}\n```\n");
}

#[test]
fn test_figure_image() {
    let html = "<html><body><p>\
        <img src=\"shot.png\" alt=\"Screen\" width=\"600\" height=\"400\"/>\
        </p></body></html>";
    assert_eq!(adoc(html), "image::shot.png[Screen,600]\n");
    assert_eq!(md(html), "![Screen](shot.png){width=600}\n");
}

#[test]
fn test_icon_image_stays_inline() {
    let html = "<html><body><p>Press \
        <img src=\"gear.png\" class=\"icon\" alt=\"gear\"/> now.</p></body></html>";
    assert_eq!(adoc(html), "Press image:gear.png[gear] now.\n");
}

#[test]
fn test_table_markdown() {
    let html = "<html><body><table>\
        <tr><th>Key</th><th>Value</th></tr>\
        <tr><td>a</td><td>1</td></tr>\
        </table></body></html>";
    assert_eq!(md(html), "| Key | Value |\n| --- | --- |\n| a | 1 |\n");
}

// ============================================================================
// Document Shape
// ============================================================================

#[test]
fn test_title_becomes_heading() {
    let html = "<html><head><title>Install Guide</title></head>\
        <body><p>Body.</p></body></html>";
    let conversion = convert_str(html, &ConvertOptions::new(Format::AsciiDoc)).unwrap();
    assert_eq!(conversion.text, "= Install Guide\n\nBody.\n");
    assert_eq!(conversion.meta.word_count, 3);
}

#[test]
fn test_existing_h1_suppresses_title() {
    let html = "<html><head><title>Install Guide</title></head>\
        <body><h1>Installing</h1><p>Body.</p></body></html>";
    assert_eq!(adoc(html), "= Installing\n\nBody.\n");
}

#[test]
fn test_empty_body() {
    let conversion =
        convert_str("<html><body></body></html>", &ConvertOptions::new(Format::AsciiDoc))
            .unwrap();
    assert_eq!(conversion.text, "");
    assert_eq!(conversion.meta.word_count, 0);
}

#[test]
fn test_format_identifier_in_meta() {
    let html = "<html><body><p>x</p></body></html>";
    let conversion = convert_str(html, &ConvertOptions::new(Format::Markdown)).unwrap();
    assert_eq!(conversion.meta.format, "markdown");
}
