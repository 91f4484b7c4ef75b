//! AsciiDoc back end.

use super::{Admonition, ItemSpec, ListKind, OrdinalStyle, Syntax};

/// Emits standard Asciidoctor syntax.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsciiDocSyntax;

impl Syntax for AsciiDocSyntax {
    fn extension(&self) -> &'static str {
        "adoc"
    }

    fn id(&self) -> &'static str {
        "asciidoc"
    }

    fn escape(&self, text: &str) -> String {
        // Only attribute references need defusing; AsciiDoc formatting marks
        // are word-boundary constrained and harmless inside prose.
        text.replace('{', "\\{")
    }

    fn emphasis(&self, text: &str) -> String {
        format!("_{text}_")
    }

    fn strong(&self, text: &str) -> String {
        format!("*{text}*")
    }

    fn code(&self, text: &str) -> String {
        format!("`{text}`")
    }

    fn link(&self, text: &str, target: &str) -> String {
        if target.starts_with('#') {
            let anchor = target.trim_start_matches('#');
            format!("<<{anchor},{text}>>")
        } else if target.contains("://") || target.starts_with("mailto:") {
            format!("{target}[{text}]")
        } else {
            format!("xref:{target}[{text}]")
        }
    }

    fn image_inline(&self, src: &str, alt: &str) -> String {
        format!("image:{src}[{alt}]")
    }

    fn variable_ref(&self, name: &str) -> String {
        format!("{{{name}}}")
    }

    fn line_break(&self) -> &'static str {
        " +"
    }

    fn heading(&self, level: u8, text: &str) -> String {
        format!("{} {text}", "=".repeat(level.clamp(1, 6) as usize))
    }

    fn list_prelude(&self, declared: Option<OrdinalStyle>, start: u64) -> Option<String> {
        let mut attrs: Vec<String> = Vec::new();
        if let Some(name) = declared.and_then(OrdinalStyle::asciidoc_name) {
            attrs.push(name.to_string());
        }
        if start > 1 {
            attrs.push(format!("start={start}"));
        }
        if attrs.is_empty() {
            None
        } else {
            Some(format!("[{}]", attrs.join(",")))
        }
    }

    fn item_marker(&self, item: &ItemSpec) -> String {
        let marker = match item.kind {
            ListKind::Ordered => ".",
            ListKind::Unordered => "*",
        };
        format!("{} ", marker.repeat(item.depth + 1))
    }

    fn continuation_separator(&self) -> Option<&'static str> {
        Some("+")
    }

    fn figure(&self, src: &str, alt: &str, title: Option<&str>, width: Option<u32>) -> String {
        let mut out = String::new();
        if let Some(title) = title {
            out.push_str(&format!(".{title}\n"));
        }
        match width {
            Some(width) => out.push_str(&format!("image::{src}[{alt},{width}]")),
            None => out.push_str(&format!("image::{src}[{alt}]")),
        }
        out
    }

    fn admonition(&self, kind: Admonition, body: &str) -> String {
        if body.contains('\n') {
            format!("[{}]\n====\n{body}\n====", kind.label())
        } else {
            format!("{}: {body}", kind.label())
        }
    }

    fn collapsible(&self, title: &str, body: &str) -> String {
        format!(".{title}\n[%collapsible]\n====\n{body}\n====")
    }

    fn include(&self, path: &str) -> String {
        format!("include::{path}[]")
    }

    fn code_block(&self, code: &str, language: Option<&str>) -> String {
        match language {
            Some(lang) => format!("[source,{lang}]\n----\n{code}\n----"),
            None => format!("----\n{code}\n----"),
        }
    }

    fn quote(&self, body: &str) -> String {
        format!("[quote]\n____\n{body}\n____")
    }

    fn thematic_break(&self) -> &'static str {
        "'''"
    }

    fn table(&self, header: Option<&[String]>, rows: &[Vec<String>]) -> String {
        let mut out = String::from("|===\n");
        if let Some(header) = header {
            for cell in header {
                out.push_str(&format!("| {cell} "));
            }
            out.push_str("\n\n");
        }
        for row in rows {
            for cell in row {
                out.push_str(&format!("| {cell}\n"));
            }
            out.push('\n');
        }
        let trimmed = out.trim_end().to_string();
        format!("{trimmed}\n|===")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_prelude() {
        let syntax = AsciiDocSyntax;
        assert_eq!(syntax.list_prelude(None, 1), None);
        assert_eq!(syntax.list_prelude(None, 4), Some("[start=4]".to_string()));
        assert_eq!(
            syntax.list_prelude(Some(OrdinalStyle::LowerAlpha), 1),
            Some("[loweralpha]".to_string())
        );
        assert_eq!(
            syntax.list_prelude(Some(OrdinalStyle::LowerRoman), 3),
            Some("[lowerroman,start=3]".to_string())
        );
    }

    #[test]
    fn test_markers_by_depth() {
        let syntax = AsciiDocSyntax;
        let spec = |depth| ItemSpec {
            kind: ListKind::Ordered,
            style: OrdinalStyle::Arabic,
            depth,
            ordinal: 1,
        };
        assert_eq!(syntax.item_marker(&spec(0)), ". ");
        assert_eq!(syntax.item_marker(&spec(2)), "... ");
    }

    #[test]
    fn test_admonition_forms() {
        let syntax = AsciiDocSyntax;
        assert_eq!(
            syntax.admonition(Admonition::Note, "short text"),
            "NOTE: short text"
        );
        let block = syntax.admonition(Admonition::Warning, "one\n\ntwo");
        assert!(block.starts_with("[WARNING]\n====\n"));
        assert!(block.ends_with("\n===="));
    }

    #[test]
    fn test_collapsible() {
        let syntax = AsciiDocSyntax;
        let block = syntax.collapsible("Details", "body");
        assert_eq!(block, ".Details\n[%collapsible]\n====\nbody\n====");
    }

    #[test]
    fn test_links() {
        let syntax = AsciiDocSyntax;
        assert_eq!(
            syntax.link("Guide", "setup.adoc#install"),
            "xref:setup.adoc#install[Guide]"
        );
        assert_eq!(
            syntax.link("site", "https://example.com"),
            "https://example.com[site]"
        );
        assert_eq!(syntax.link("here", "#anchor"), "<<anchor,here>>");
    }
}
