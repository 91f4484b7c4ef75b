//! Link classification and rewriting.
//!
//! Authored links point at sibling topics (`../Setup/install.htm#step-3`),
//! external URLs, or in-document anchors. Sibling-document targets get the
//! target format's extension; anchors are preserved as-is. Relative targets
//! that do not exist on disk are reported as broken links in the result
//! metadata.

use percent_encoding::percent_decode_str;

/// A classified link target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Absolute URL (or mailto etc); emitted unchanged.
    External(String),
    /// Relative path to another authored document, with optional anchor.
    Sibling { path: String, anchor: Option<String> },
    /// Fragment-only link within the same document.
    Anchor(String),
}

/// Source-file extensions that convert alongside this document.
const AUTHORED_EXTENSIONS: [&str; 3] = ["htm", "html", "flsnp"];

/// Classify a raw href.
pub fn classify(href: &str) -> LinkTarget {
    if href.contains("://") || href.starts_with("mailto:") || href.starts_with("tel:") {
        return LinkTarget::External(href.to_string());
    }
    if let Some(anchor) = href.strip_prefix('#') {
        return LinkTarget::Anchor(anchor.to_string());
    }
    let (path, anchor) = match href.split_once('#') {
        Some((path, anchor)) => (path, Some(anchor.to_string())),
        None => (href, None),
    };
    let path = percent_decode_str(path)
        .decode_utf8()
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| path.to_string());
    LinkTarget::Sibling { path, anchor }
}

/// Whether a sibling path points at an authored document that will itself be
/// converted (and therefore needs its extension rewritten).
pub fn is_authored(path: &str) -> bool {
    path.rsplit('.')
        .next()
        .is_some_and(|ext| AUTHORED_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)))
}

/// Replace an authored extension with the target format's.
pub fn translate_extension(path: &str, extension: &str) -> String {
    match path.rsplit_once('.') {
        Some((stem, ext)) if AUTHORED_EXTENSIONS.iter().any(|a| ext.eq_ignore_ascii_case(a)) => {
            format!("{stem}.{extension}")
        }
        _ => path.to_string(),
    }
}

/// Produce the emitted href for a classified target.
pub fn emit_target(target: &LinkTarget, extension: &str) -> String {
    match target {
        LinkTarget::External(url) => url.clone(),
        LinkTarget::Anchor(anchor) => format!("#{anchor}"),
        LinkTarget::Sibling { path, anchor } => {
            let path = if is_authored(path) {
                translate_extension(path, extension)
            } else {
                path.clone()
            };
            match anchor {
                Some(anchor) => format!("{path}#{anchor}"),
                None => path,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(
            classify("https://example.com/x"),
            LinkTarget::External("https://example.com/x".to_string())
        );
        assert_eq!(classify("#top"), LinkTarget::Anchor("top".to_string()));
        assert_eq!(
            classify("../Setup/install.htm#step-3"),
            LinkTarget::Sibling {
                path: "../Setup/install.htm".to_string(),
                anchor: Some("step-3".to_string()),
            }
        );
    }

    #[test]
    fn test_percent_decoding() {
        assert_eq!(
            classify("My%20Topic.htm"),
            LinkTarget::Sibling {
                path: "My Topic.htm".to_string(),
                anchor: None,
            }
        );
    }

    #[test]
    fn test_extension_rewriting_preserves_anchor() {
        let target = classify("guide.html#intro");
        assert_eq!(emit_target(&target, "adoc"), "guide.adoc#intro");
        assert_eq!(emit_target(&target, "md"), "guide.md#intro");
    }

    #[test]
    fn test_non_authored_paths_unchanged() {
        let target = classify("../Images/diagram.png");
        assert_eq!(emit_target(&target, "adoc"), "../Images/diagram.png");
    }
}
