//! Conversion options.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Target output syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// AsciiDoc with admonition and collapsible blocks.
    AsciiDoc,
    /// Markdown with container-directive extensions (`:::note` etc).
    Markdown,
}

impl Format {
    /// File extension for output documents (and rewritten sibling links).
    pub fn extension(self) -> &'static str {
        match self {
            Format::AsciiDoc => "adoc",
            Format::Markdown => "md",
        }
    }

    /// Stable identifier carried in result metadata.
    pub fn id(self) -> &'static str {
        match self {
            Format::AsciiDoc => "asciidoc",
            Format::Markdown => "markdown",
        }
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asciidoc" | "adoc" => Ok(Format::AsciiDoc),
            "markdown" | "md" => Ok(Format::Markdown),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// How variable placeholders are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableMode {
    /// Substitute the literal value; the output carries no variable artifacts.
    #[default]
    Replace,
    /// Keep a symbolic reference token and collect definitions in a sidecar.
    Reference,
}

/// Transform applied to variable names in reference tokens and sidecar keys.
///
/// The lookup key is always the exact `Namespace.Name` from the source; the
/// transform only shapes what gets emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingConvention {
    #[default]
    Identity,
    CamelCase,
    KebabCase,
}

/// Which condition tags exclude content from conversion.
///
/// An entry matches either a full tag (`Default.Deprecated`) or a bare
/// category that is compared against the part after the last dot
/// (`deprecated`), case-insensitively and ignoring `-`/`_` separators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionConfig {
    pub excluded: Vec<String>,
}

impl Default for ConditionConfig {
    fn default() -> Self {
        Self {
            excluded: vec![
                "deprecated".to_string(),
                "internal".to_string(),
                "internalonly".to_string(),
                "printonly".to_string(),
                "hidden".to_string(),
            ],
        }
    }
}

impl ConditionConfig {
    fn normalize(tag: &str) -> String {
        tag.chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '.')
            .collect::<String>()
            .to_ascii_lowercase()
    }

    /// Check whether a single condition tag is excluded.
    pub fn is_excluded(&self, tag: &str) -> bool {
        let tag = Self::normalize(tag);
        let category = tag.rsplit('.').next().unwrap_or(&tag);
        self.excluded.iter().any(|entry| {
            let entry = Self::normalize(entry);
            entry == tag || entry == category
        })
    }

    /// Check whether any tag in an effective condition set is excluded.
    pub fn excludes_any<'a>(&self, tags: impl IntoIterator<Item = &'a str>) -> bool {
        tags.into_iter().any(|t| self.is_excluded(t))
    }
}

/// Options for a single conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub format: Format,
    pub variable_mode: VariableMode,
    pub naming: NamingConvention,
    /// Wildcard patterns selecting which variables may stay symbolic in
    /// reference mode. Empty means all are eligible.
    pub variable_include: Vec<String>,
    /// Wildcard patterns forcing literal substitution even in reference mode.
    pub variable_exclude: Vec<String>,
    pub conditions: ConditionConfig,
    /// When false, drop-downs render as plain heading + section instead of
    /// collapsible syntax.
    pub collapsible: bool,
    /// Merge snippet content inline instead of emitting include directives.
    pub merge_snippets: bool,
    /// Images at or below this pixel size (width and height) render inline.
    pub inline_image_max_px: u32,
    /// Project root for variable/snippet discovery and link checking.
    /// Discovered from the input path when not set.
    pub project_root: Option<PathBuf>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            format: Format::AsciiDoc,
            variable_mode: VariableMode::Replace,
            naming: NamingConvention::Identity,
            variable_include: Vec::new(),
            variable_exclude: Vec::new(),
            conditions: ConditionConfig::default(),
            collapsible: true,
            merge_snippets: true,
            inline_image_max_px: 32,
            project_root: None,
        }
    }
}

impl ConvertOptions {
    pub fn new(format: Format) -> Self {
        Self {
            format,
            ..Self::default()
        }
    }

    pub fn with_variable_mode(mut self, mode: VariableMode) -> Self {
        self.variable_mode = mode;
        self
    }

    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn with_collapsible(mut self, enabled: bool) -> Self {
        self.collapsible = enabled;
        self
    }

    /// Validate option combinations that cannot be applied.
    pub fn validate(&self) -> Result<()> {
        for pattern in self.variable_include.iter().chain(&self.variable_exclude) {
            glob::Pattern::new(pattern)
                .map_err(|e| Error::InvalidOptions(format!("bad pattern {pattern:?}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_str() {
        assert_eq!("adoc".parse::<Format>().unwrap(), Format::AsciiDoc);
        assert_eq!("Markdown".parse::<Format>().unwrap(), Format::Markdown);
        assert!(matches!(
            "docx".parse::<Format>(),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_condition_matching() {
        let config = ConditionConfig::default();
        assert!(config.is_excluded("Default.Deprecated"));
        assert!(config.is_excluded("Primary.PrintOnly"));
        assert!(config.is_excluded("print-only"));
        assert!(!config.is_excluded("Default.Online"));
        assert!(config.excludes_any(["Default.Online", "Default.Hidden"]));
        assert!(!config.excludes_any(["Default.Online"]));
    }

    #[test]
    fn test_full_tag_entries() {
        let config = ConditionConfig {
            excluded: vec!["Default.Beta".to_string()],
        };
        assert!(config.is_excluded("Default.Beta"));
        assert!(!config.is_excluded("Other.Beta2"));
    }

    #[test]
    fn test_validate_rejects_bad_pattern() {
        let mut options = ConvertOptions::default();
        options.variable_include.push("[".to_string());
        assert!(matches!(
            options.validate(),
            Err(Error::InvalidOptions(_))
        ));
    }
}
