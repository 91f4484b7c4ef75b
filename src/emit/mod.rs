//! Format emitters.
//!
//! The list/block converter makes all structural decisions (nesting depth,
//! ordinals, what is a continuation, what is an admonition) and hands them to
//! a [`Syntax`] implementation that knows only how to spell those decisions
//! in one target format. Both backends consume the same calls, so converter
//! behavior cannot drift between formats.

mod asciidoc;
mod markdown;

pub use asciidoc::AsciiDocSyntax;
pub use markdown::MarkdownSyntax;

/// Ordered or unordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// Ordinal marker style for ordered lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrdinalStyle {
    Arabic,
    LowerAlpha,
    UpperAlpha,
    LowerRoman,
    UpperRoman,
}

impl OrdinalStyle {
    /// Default style for a nesting depth: numbers, then letters, then
    /// roman numerals, repeating below that.
    pub fn for_depth(depth: usize) -> Self {
        match depth % 3 {
            0 => OrdinalStyle::Arabic,
            1 => OrdinalStyle::LowerAlpha,
            _ => OrdinalStyle::LowerRoman,
        }
    }

    /// Render an ordinal (1-based) in this style.
    pub fn format(self, ordinal: u64) -> String {
        match self {
            OrdinalStyle::Arabic => ordinal.to_string(),
            OrdinalStyle::LowerAlpha => alpha(ordinal, false),
            OrdinalStyle::UpperAlpha => alpha(ordinal, true),
            OrdinalStyle::LowerRoman => roman(ordinal, false),
            OrdinalStyle::UpperRoman => roman(ordinal, true),
        }
    }

    /// AsciiDoc attribute name for an explicit style declaration.
    pub fn asciidoc_name(self) -> Option<&'static str> {
        match self {
            OrdinalStyle::Arabic => None,
            OrdinalStyle::LowerAlpha => Some("loweralpha"),
            OrdinalStyle::UpperAlpha => Some("upperalpha"),
            OrdinalStyle::LowerRoman => Some("lowerroman"),
            OrdinalStyle::UpperRoman => Some("upperroman"),
        }
    }
}

fn alpha(ordinal: u64, upper: bool) -> String {
    // 1 → a, 26 → z, 27 → aa.
    let mut n = ordinal;
    let mut out = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        out.push(if upper { b'A' + rem } else { b'a' + rem });
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn roman(ordinal: u64, upper: bool) -> String {
    const TABLE: [(u64, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut n = ordinal;
    let mut out = String::new();
    for (value, numeral) in TABLE {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    if upper { out } else { out.to_ascii_lowercase() }
}

/// Admonition category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admonition {
    Note,
    Warning,
    Tip,
    Important,
    Caution,
}

impl Admonition {
    /// Match a CSS class against the known admonition categories.
    pub fn from_class(class: &str) -> Option<Self> {
        match class.to_ascii_lowercase().as_str() {
            "note" => Some(Admonition::Note),
            "warning" => Some(Admonition::Warning),
            "tip" => Some(Admonition::Tip),
            "important" => Some(Admonition::Important),
            "caution" => Some(Admonition::Caution),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Admonition::Note => "NOTE",
            Admonition::Warning => "WARNING",
            Admonition::Tip => "TIP",
            Admonition::Important => "IMPORTANT",
            Admonition::Caution => "CAUTION",
        }
    }
}

/// Everything an item marker needs to know.
#[derive(Debug, Clone, Copy)]
pub struct ItemSpec {
    pub kind: ListKind,
    pub style: OrdinalStyle,
    pub depth: usize,
    /// 1-based ordinal of this item, already offset for continuity.
    pub ordinal: u64,
}

/// A target syntax back end.
///
/// Inline methods return tokens; block methods return complete block text
/// without a trailing blank line. Admonition and collapsible primitives are
/// public so collaborators rendering glossary terms can reuse them.
pub trait Syntax {
    /// Output file extension, also used when rewriting sibling links.
    fn extension(&self) -> &'static str;

    /// Stable identifier carried in result metadata.
    fn id(&self) -> &'static str;

    // --- inline ---

    /// Escape plain text for this syntax.
    fn escape(&self, text: &str) -> String;
    fn emphasis(&self, text: &str) -> String;
    fn strong(&self, text: &str) -> String;
    fn code(&self, text: &str) -> String;
    fn link(&self, text: &str, target: &str) -> String;
    fn image_inline(&self, src: &str, alt: &str) -> String;
    /// Reference-mode variable token.
    fn variable_ref(&self, name: &str) -> String;
    /// Hard line break within a paragraph (emitted before a newline).
    fn line_break(&self) -> &'static str;

    // --- blocks ---

    fn heading(&self, level: u8, text: &str) -> String;

    /// Attribute/front line(s) emitted before a list, e.g. `[loweralpha]` or
    /// `[start=4]`. `declared` is set only when the source declares a style
    /// that the depth convention would not infer.
    fn list_prelude(
        &self,
        declared: Option<OrdinalStyle>,
        start: u64,
    ) -> Option<String>;

    /// Marker text for a list item, without indentation and with a trailing
    /// space.
    fn item_marker(&self, item: &ItemSpec) -> String;

    /// Separator line placed before continuation blocks of a list item.
    /// `None` means the format expresses continuation purely by indentation.
    fn continuation_separator(&self) -> Option<&'static str>;

    fn figure(&self, src: &str, alt: &str, title: Option<&str>, width: Option<u32>) -> String;
    fn admonition(&self, kind: Admonition, body: &str) -> String;
    fn collapsible(&self, title: &str, body: &str) -> String;
    /// Include directive for reference-mode snippets.
    fn include(&self, path: &str) -> String;
    fn code_block(&self, code: &str, language: Option<&str>) -> String;
    fn quote(&self, body: &str) -> String;
    fn thematic_break(&self) -> &'static str;

    /// Render a table from pre-rendered inline cell text.
    fn table(&self, header: Option<&[String]>, rows: &[Vec<String>]) -> String;
}
