//! Conversion results and side-channel metadata.

use serde::Serialize;

/// Non-fatal problems encountered during a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    MissingVariable,
    MissingSnippet,
    InvalidSource,
    UnknownElement,
}

/// A single recorded warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub detail: String,
}

impl Warning {
    pub fn new(kind: WarningKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            WarningKind::MissingVariable => "missing variable",
            WarningKind::MissingSnippet => "missing snippet",
            WarningKind::InvalidSource => "invalid source",
            WarningKind::UnknownElement => "unknown element",
        };
        f.write_str(label)
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Structured metadata attached to a conversion result.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentMeta {
    /// Words of visible text in the output.
    pub word_count: usize,
    /// Target format identifier ("asciidoc" or "markdown").
    pub format: String,
    pub warnings: Vec<Warning>,
    /// Relative link targets that do not exist on disk.
    pub broken_links: Vec<String>,
}

/// Extracted variable definitions for reference-mode conversions.
///
/// Already serialized for the selected format: an AsciiDoc attributes
/// fragment (`:name: value` lines) or a JSON object for Markdown toolchains.
/// Persisting it next to the output is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariablesSidecar {
    /// Suggested file name, e.g. `variables.adoc` or `variables.json`.
    pub file_name: &'static str,
    pub content: String,
}

/// The result of converting one document.
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The converted document text.
    pub text: String,
    pub meta: DocumentMeta,
    /// Present only in reference mode when at least one variable was kept
    /// symbolic.
    pub variables: Option<VariablesSidecar>,
}
