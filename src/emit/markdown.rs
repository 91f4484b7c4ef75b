//! Semantic-Markdown back end.
//!
//! The dialect is CommonMark plus container directives (`:::note` … `:::`,
//! `:::collapsible[Title]`) and the leaf include directive
//! (`::include{src="…"}`), with Pandoc-style fancy list markers (`a.`, `i.`)
//! carrying ordinal styles that AsciiDoc would express as attributes.

use super::{Admonition, ItemSpec, ListKind, Syntax};
use super::OrdinalStyle;

/// Emits the directive-extended Markdown dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkdownSyntax;

impl Syntax for MarkdownSyntax {
    fn extension(&self) -> &'static str {
        "md"
    }

    fn id(&self) -> &'static str {
        "markdown"
    }

    fn escape(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + text.len() / 10);
        for c in text.chars() {
            match c {
                '\\' | '*' | '_' | '[' | ']' | '`' | '|' | '<' | '>' => {
                    out.push('\\');
                    out.push(c);
                }
                '{' => out.push_str("\\{"),
                _ => out.push(c),
            }
        }
        out
    }

    fn emphasis(&self, text: &str) -> String {
        format!("*{text}*")
    }

    fn strong(&self, text: &str) -> String {
        format!("**{text}**")
    }

    fn code(&self, text: &str) -> String {
        if text.contains('`') {
            format!("`` {text} ``")
        } else {
            format!("`{text}`")
        }
    }

    fn link(&self, text: &str, target: &str) -> String {
        format!("[{text}]({target})")
    }

    fn image_inline(&self, src: &str, alt: &str) -> String {
        format!("![{alt}]({src})")
    }

    fn variable_ref(&self, name: &str) -> String {
        format!("{{{{{name}}}}}")
    }

    fn line_break(&self) -> &'static str {
        "\\"
    }

    fn heading(&self, level: u8, text: &str) -> String {
        format!("{} {text}", "#".repeat(level.clamp(1, 6) as usize))
    }

    fn list_prelude(&self, _declared: Option<OrdinalStyle>, _start: u64) -> Option<String> {
        // Styles and starting ordinals are carried by the markers themselves.
        None
    }

    fn item_marker(&self, item: &ItemSpec) -> String {
        match item.kind {
            ListKind::Ordered => format!("{}. ", item.style.format(item.ordinal)),
            ListKind::Unordered => "- ".to_string(),
        }
    }

    fn continuation_separator(&self) -> Option<&'static str> {
        // Continuation is expressed by indenting under the item marker.
        None
    }

    fn figure(&self, src: &str, alt: &str, title: Option<&str>, width: Option<u32>) -> String {
        let mut out = match width {
            Some(width) => format!("![{alt}]({src}){{width={width}}}"),
            None => format!("![{alt}]({src})"),
        };
        if let Some(title) = title {
            out.push_str(&format!("\n*{title}*"));
        }
        out
    }

    fn admonition(&self, kind: Admonition, body: &str) -> String {
        format!(":::{}\n{body}\n:::", kind.label().to_ascii_lowercase())
    }

    fn collapsible(&self, title: &str, body: &str) -> String {
        format!(":::collapsible[{title}]\n{body}\n:::")
    }

    fn include(&self, path: &str) -> String {
        format!("::include{{src=\"{path}\"}}")
    }

    fn code_block(&self, code: &str, language: Option<&str>) -> String {
        let lang = language.unwrap_or("");
        format!("```{lang}\n{code}\n```")
    }

    fn quote(&self, body: &str) -> String {
        body.lines()
            .map(|line| {
                if line.is_empty() {
                    ">".to_string()
                } else {
                    format!("> {line}")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn thematic_break(&self) -> &'static str {
        "---"
    }

    fn table(&self, header: Option<&[String]>, rows: &[Vec<String>]) -> String {
        let columns = header
            .map(<[String]>::len)
            .or_else(|| rows.first().map(Vec::len))
            .unwrap_or(0);
        if columns == 0 {
            return String::new();
        }

        let mut out = String::new();
        let empty = vec![String::new(); columns];
        let header = header.unwrap_or(&empty);
        out.push_str(&format!("| {} |", header.join(" | ")));
        out.push('\n');
        out.push_str(&format!("|{}", " --- |".repeat(columns)));
        for row in rows {
            out.push('\n');
            out.push_str(&format!("| {} |", row.join(" | ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fancy_markers_carry_style() {
        let syntax = MarkdownSyntax;
        let spec = ItemSpec {
            kind: ListKind::Ordered,
            style: OrdinalStyle::LowerAlpha,
            depth: 1,
            ordinal: 2,
        };
        assert_eq!(syntax.item_marker(&spec), "b. ");

        let continued = ItemSpec {
            kind: ListKind::Ordered,
            style: OrdinalStyle::Arabic,
            depth: 0,
            ordinal: 4,
        };
        assert_eq!(syntax.item_marker(&continued), "4. ");
    }

    #[test]
    fn test_admonition_directive() {
        let syntax = MarkdownSyntax;
        assert_eq!(
            syntax.admonition(Admonition::Tip, "helpful"),
            ":::tip\nhelpful\n:::"
        );
    }

    #[test]
    fn test_include_directive() {
        let syntax = MarkdownSyntax;
        assert_eq!(
            syntax.include("shared/warning.md"),
            "::include{src=\"shared/warning.md\"}"
        );
    }

    #[test]
    fn test_table() {
        let syntax = MarkdownSyntax;
        let rendered = syntax.table(
            Some(&["A".to_string(), "B".to_string()]),
            &[vec!["1".to_string(), "2".to_string()]],
        );
        assert_eq!(rendered, "| A | B |\n| --- | --- |\n| 1 | 2 |");
    }

    #[test]
    fn test_escape() {
        let syntax = MarkdownSyntax;
        assert_eq!(syntax.escape("*bold* [x]"), "\\*bold\\* \\[x\\]");
    }
}
