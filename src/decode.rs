//! Byte decoding for authored source files.
//!
//! Exports from old authoring projects are not reliably UTF-8; declared
//! encodings and Windows-1252 content both occur in practice. Decoding tries
//! UTF-8 first, then any encoding declared in the document itself, then falls
//! back to Windows-1252.

use std::borrow::Cow;

/// Decode bytes to a string, handling the encodings seen in authored exports.
pub fn decode_source(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);
    if !malformed {
        return result;
    }

    if let Some(name) = sniff_declared_encoding(bytes)
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, malformed) = encoding.decode(bytes);
        if !malformed {
            return result;
        }
    }

    // Windows-1252 maps every byte, so this cannot fail.
    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Pull a declared encoding out of an XML declaration or `<meta charset=…>`.
///
/// Only the first kilobyte is inspected; declarations beyond that are not
/// seen in real exports.
fn sniff_declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(1024)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    for marker in ["encoding=\"", "encoding='", "charset=\"", "charset='"] {
        if let Some(pos) = head.find(marker) {
            let rest = &head[pos + marker.len()..];
            let quote = marker.as_bytes()[marker.len() - 1] as char;
            if let Some(end) = rest.find(quote) {
                let name = rest[..end].trim();
                if !name.is_empty() {
                    return Some(name.to_string());
                }
            }
        }
    }
    // Bare form: <meta charset=utf-8>
    if let Some(pos) = head.find("charset=") {
        let rest = &head[pos + "charset=".len()..];
        let name: String = rest
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if !name.is_empty() {
            return Some(name);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_utf8_is_borrowed() {
        let text = "Héllo wörld";
        let decoded = decode_source(text.as_bytes());
        assert_eq!(decoded, text);
        assert!(matches!(decoded, Cow::Borrowed(_)));
    }

    #[test]
    fn test_cp1252_fallback() {
        // 0x93/0x94 are curly quotes in CP1252, invalid as UTF-8.
        let bytes = b"<p>\x93quoted\x94</p>";
        let decoded = decode_source(bytes);
        assert!(decoded.contains('\u{201C}'));
        assert!(decoded.contains('\u{201D}'));
    }

    #[test]
    fn test_declared_encoding_sniff() {
        let bytes = b"<?xml version=\"1.0\" encoding=\"windows-1252\"?><p>\x93q\x94</p>";
        assert_eq!(
            sniff_declared_encoding(bytes).as_deref(),
            Some("windows-1252")
        );
        let decoded = decode_source(bytes);
        assert!(decoded.contains('\u{201C}'));
    }
}
