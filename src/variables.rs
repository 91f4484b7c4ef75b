//! Variable loading and resolution.
//!
//! Variable definitions live in `*.flvar` XML sources under the project root:
//!
//! ```xml
//! <CatapultVariableSet>
//!   <Variable Name="Company" EvaluatedDefinition="Acme Corp">Acme Corp</Variable>
//!   <Variable Name="Year" Type="DateTime">2024</Variable>
//! </CatapultVariableSet>
//! ```
//!
//! The file stem is the namespace, so the first entry above (from
//! `General.flvar`) is addressed as `General.Company`. All sources reachable
//! from the project root are loaded once per conversion run; the set is
//! immutable afterwards and never shared across documents.
//!
//! Resolution walks the tree replacing placeholder elements. In replace mode
//! the placeholder becomes a literal text node. In reference mode eligible
//! placeholders become an internal reference marker the emitters turn into
//! `{name}` (AsciiDoc) or `{{name}}` (Markdown), and the referenced
//! definitions are collected into a sidecar payload.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use crate::dom::{Element, Node};
use crate::meta::{VariablesSidecar, Warning, WarningKind};
use crate::options::{ConvertOptions, Format, NamingConvention, VariableMode};
use crate::project::Project;

/// Internal marker element for reference-mode tokens. The converter treats it
/// as an opaque inline reference; it never appears in parsed input.
pub(crate) const VARREF_TAG: &str = "x-varref";

/// Declared type of a variable definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableKind {
    #[default]
    Text,
    /// Computed date/time definitions; the evaluated value is stored.
    Date,
}

/// A single variable definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub value: String,
    pub kind: VariableKind,
}

/// All variable definitions for one conversion run, keyed by
/// `Namespace.Name`.
#[derive(Debug, Clone, Default)]
pub struct VariableSet {
    entries: HashMap<String, Variable>,
}

impl VariableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every variable source reachable from the project root.
    ///
    /// Unreadable or unparseable sources degrade to warnings; they never fail
    /// the conversion.
    pub fn load(project: &Project) -> (Self, Vec<Warning>) {
        let mut set = Self::new();
        let mut warnings = Vec::new();
        for path in project.variable_sources() {
            match std::fs::read(&path) {
                Ok(bytes) => {
                    let source = crate::decode::decode_source(&bytes);
                    if let Err(message) = set.load_source(&path, &source) {
                        warnings.push(Warning::new(
                            WarningKind::InvalidSource,
                            format!("{}: {message}", path.display()),
                        ));
                    }
                }
                Err(e) => warnings.push(Warning::new(
                    WarningKind::InvalidSource,
                    format!("{}: {e}", path.display()),
                )),
            }
        }
        debug!(variables = set.entries.len(), "loaded variable sources");
        (set, warnings)
    }

    /// Parse one variable source; the file stem becomes the namespace.
    pub fn load_source(&mut self, path: &Path, source: &str) -> Result<(), String> {
        let namespace = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut reader = Reader::from_str(source);
        reader.config_mut().trim_text(true);

        let mut current: Option<PendingVariable> = None;
        let mut buf_text = String::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) if is_variable_tag(e.name().as_ref()) => {
                    current = parse_variable_attrs(&e);
                    buf_text.clear();
                }
                Ok(Event::Empty(e)) if is_variable_tag(e.name().as_ref()) => {
                    if let Some(var) = parse_variable_attrs(&e) {
                        self.insert(&namespace, &var.name, var.evaluated.unwrap_or_default(), var.kind);
                    }
                }
                Ok(Event::Text(e)) => {
                    if current.is_some() {
                        buf_text.push_str(&String::from_utf8_lossy(e.as_ref()));
                    }
                }
                Ok(Event::GeneralRef(e)) => {
                    if current.is_some()
                        && let Some(resolved) = resolve_entity(&String::from_utf8_lossy(e.as_ref()))
                    {
                        buf_text.push_str(&resolved);
                    }
                }
                Ok(Event::End(e)) if is_variable_tag(e.name().as_ref()) => {
                    if let Some(var) = current.take() {
                        // The pre-evaluated attribute wins over element text.
                        let value = var.evaluated.unwrap_or_else(|| buf_text.clone());
                        self.insert(&namespace, &var.name, value, var.kind);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.to_string()),
                _ => {}
            }
        }
        Ok(())
    }

    fn insert(&mut self, namespace: &str, name: &str, value: String, kind: VariableKind) {
        let key = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{namespace}.{name}")
        };
        self.entries.insert(key, Variable { value, kind });
    }

    pub fn get(&self, key: &str) -> Option<&Variable> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct PendingVariable {
    name: String,
    evaluated: Option<String>,
    kind: VariableKind,
}

fn is_variable_tag(name: &[u8]) -> bool {
    let local = name
        .iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name);
    local.eq_ignore_ascii_case(b"variable")
}

fn parse_variable_attrs(tag: &quick_xml::events::BytesStart<'_>) -> Option<PendingVariable> {
    let mut name = None;
    let mut evaluated = None;
    let mut kind = VariableKind::Text;
    for attr in tag.attributes().flatten() {
        let value = attr
            .unescape_value()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| String::from_utf8_lossy(attr.value.as_ref()).into_owned());
        if attr.key.as_ref().eq_ignore_ascii_case(b"name") {
            name = Some(value);
        } else if attr.key.as_ref().eq_ignore_ascii_case(b"evaluateddefinition") {
            evaluated = Some(value);
        } else if attr.key.as_ref().eq_ignore_ascii_case(b"type")
            && value.to_ascii_lowercase().contains("date")
        {
            kind = VariableKind::Date;
        }
    }
    name.map(|name| PendingVariable {
        name,
        evaluated,
        kind,
    })
}

/// Resolve XML entity references appearing in definition text.
fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code).map(|c| c.to_string())
}

/// Outcome of the resolution pass.
#[derive(Debug, Default)]
pub struct ResolveOutcome {
    /// Referenced definitions in first-use order: (emitted key, value).
    pub referenced: Vec<(String, String)>,
    pub warnings: Vec<Warning>,
}

/// Resolve every variable placeholder in the tree.
pub fn resolve(root: &mut Element, vars: &VariableSet, options: &ConvertOptions) -> ResolveOutcome {
    let filters = NameFilters::compile(options);
    let mut outcome = ResolveOutcome::default();
    resolve_children(root, vars, options, &filters, &mut outcome);
    outcome
}

struct NameFilters {
    include: Vec<glob::Pattern>,
    exclude: Vec<glob::Pattern>,
}

impl NameFilters {
    /// Compile the configured wildcard filters. Options are validated up
    /// front, so invalid patterns are simply skipped here.
    fn compile(options: &ConvertOptions) -> Self {
        let compile = |patterns: &[String]| {
            patterns
                .iter()
                .filter_map(|p| glob::Pattern::new(p).ok())
                .collect()
        };
        Self {
            include: compile(&options.variable_include),
            exclude: compile(&options.variable_exclude),
        }
    }

    /// Whether a variable name may stay symbolic in reference mode.
    fn eligible(&self, name: &str) -> bool {
        let included = self.include.is_empty() || self.include.iter().any(|p| p.matches(name));
        included && !self.exclude.iter().any(|p| p.matches(name))
    }
}

fn resolve_children(
    parent: &mut Element,
    vars: &VariableSet,
    options: &ConvertOptions,
    filters: &NameFilters,
    outcome: &mut ResolveOutcome,
) {
    for child in &mut parent.children {
        let Node::Element(el) = child else { continue };
        match placeholder_name(el) {
            Some(name) => {
                *child = resolve_one(&name, vars, options, filters, outcome);
            }
            None => resolve_children(el, vars, options, filters, outcome),
        }
    }
}

/// Extract the requested variable name if this element is a placeholder.
///
/// Two shapes occur: the namespaced `<MadCap:variable name="Ns.Name"/>`
/// element, and the plain-HTML variant `<span class="mc-variable Ns.Name …">`
/// where the dotted class component carries the name.
fn placeholder_name(el: &Element) -> Option<String> {
    if el.tag == "madcap:variable" {
        return Some(el.attr("name").unwrap_or_default().to_string());
    }
    if el.tag == "span" && el.has_class("mc-variable") {
        if let Some(name) = el.attr("data-name") {
            return Some(name.to_string());
        }
        return el
            .classes()
            .find(|c| c.contains('.'))
            .map(|c| c.to_string());
    }
    None
}

fn resolve_one(
    name: &str,
    vars: &VariableSet,
    options: &ConvertOptions,
    filters: &NameFilters,
    outcome: &mut ResolveOutcome,
) -> Node {
    let Some(variable) = vars.get(name) else {
        outcome
            .warnings
            .push(Warning::new(WarningKind::MissingVariable, name));
        // Degrade to the literal requested name; never fail the document.
        return Node::Text(name.to_string());
    };

    match options.variable_mode {
        VariableMode::Replace => Node::Text(variable.value.clone()),
        VariableMode::Reference => {
            if !filters.eligible(name) {
                return Node::Text(variable.value.clone());
            }
            let emitted = transform_name(name, options.naming);
            if !outcome.referenced.iter().any(|(k, _)| *k == emitted) {
                outcome.referenced.push((emitted.clone(), variable.value.clone()));
            }
            let mut marker = Element::new(VARREF_TAG);
            marker.set_attr("name", &emitted);
            Node::Element(marker)
        }
    }
}

/// Apply a naming convention to an emitted variable name.
///
/// The transform shapes only the reference token and sidecar key; lookups
/// always use the exact source name.
pub fn transform_name(name: &str, naming: NamingConvention) -> String {
    match naming {
        NamingConvention::Identity => name.to_string(),
        NamingConvention::CamelCase => {
            let mut out = String::new();
            for (i, word) in split_words(name).iter().enumerate() {
                if i == 0 {
                    out.push_str(&word.to_ascii_lowercase());
                } else {
                    let mut chars = word.chars();
                    if let Some(first) = chars.next() {
                        out.extend(first.to_uppercase());
                        out.push_str(&chars.as_str().to_ascii_lowercase());
                    }
                }
            }
            out
        }
        NamingConvention::KebabCase => split_words(name)
            .iter()
            .map(|w| w.to_ascii_lowercase())
            .collect::<Vec<_>>()
            .join("-"),
    }
}

/// Split a dotted/camel-cased name into words.
fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in name.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Serialize referenced definitions into the format-appropriate sidecar.
pub fn sidecar(referenced: &[(String, String)], format: Format) -> Option<VariablesSidecar> {
    if referenced.is_empty() {
        return None;
    }
    match format {
        Format::AsciiDoc => {
            let mut content = String::new();
            for (key, value) in referenced {
                content.push_str(&format!(":{key}: {value}\n"));
            }
            Some(VariablesSidecar {
                file_name: "variables.adoc",
                content,
            })
        }
        Format::Markdown => {
            let map: serde_json::Map<String, serde_json::Value> = referenced
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            let content = serde_json::to_string_pretty(&serde_json::Value::Object(map))
                .unwrap_or_default();
            Some(VariablesSidecar {
                file_name: "variables.json",
                content,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse::body_of;
    use crate::dom::parse_document;

    const FLVAR: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<CatapultVariableSet>
  <Variable Name="Company" EvaluatedDefinition="Acme Corp">Acme Corp</Variable>
  <Variable Name="Phone">555-0100</Variable>
  <Variable Name="Year" Type="DateTime">2024</Variable>
  <Variable Name="Empty" />
</CatapultVariableSet>"#;

    fn loaded() -> VariableSet {
        let mut set = VariableSet::new();
        set.load_source(Path::new("General.flvar"), FLVAR).unwrap();
        set
    }

    #[test]
    fn test_load_source() {
        let set = loaded();
        assert_eq!(set.len(), 4);
        assert_eq!(set.get("General.Company").unwrap().value, "Acme Corp");
        assert_eq!(set.get("General.Phone").unwrap().value, "555-0100");
        assert_eq!(set.get("General.Year").unwrap().kind, VariableKind::Date);
        assert_eq!(set.get("General.Empty").unwrap().value, "");
        assert!(set.get("Other.Company").is_none());
    }

    fn resolve_body(html: &str, options: &ConvertOptions) -> (Element, ResolveOutcome) {
        let root = parse_document(html);
        let mut body = body_of(&root).unwrap().clone();
        let outcome = resolve(&mut body, &loaded(), options);
        (body, outcome)
    }

    #[test]
    fn test_replace_mode_substitutes_literal() {
        let (body, outcome) = resolve_body(
            r#"<body><p>Call <MadCap:variable name="General.Phone" /> today</p></body>"#,
            &ConvertOptions::default(),
        );
        assert_eq!(body.text_content(), "Call 555-0100 today");
        assert!(outcome.referenced.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_missing_variable_degrades_to_name() {
        let (body, outcome) = resolve_body(
            r#"<body><p><MadCap:variable name="General.Nope" /></p></body>"#,
            &ConvertOptions::default(),
        );
        assert_eq!(body.text_content(), "General.Nope");
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].kind, WarningKind::MissingVariable);
    }

    #[test]
    fn test_reference_mode_collects_sidecar_entries() {
        let options = ConvertOptions::default()
            .with_variable_mode(VariableMode::Reference)
            .with_naming(NamingConvention::KebabCase);
        let (body, outcome) = resolve_body(
            r#"<body><p><MadCap:variable name="General.Company" /> and
               <MadCap:variable name="General.Company" /></p></body>"#,
            &options,
        );
        let marker = body.find(VARREF_TAG).expect("reference marker");
        assert_eq!(marker.attr("name"), Some("general-company"));
        // Deduplicated across repeated references.
        assert_eq!(outcome.referenced, vec![(
            "general-company".to_string(),
            "Acme Corp".to_string()
        )]);
    }

    #[test]
    fn test_exclude_filter_forces_literal() {
        let mut options = ConvertOptions::default().with_variable_mode(VariableMode::Reference);
        options.variable_exclude.push("General.*".to_string());
        let (body, outcome) = resolve_body(
            r#"<body><p><MadCap:variable name="General.Company" /></p></body>"#,
            &options,
        );
        assert_eq!(body.text_content(), "Acme Corp");
        assert!(outcome.referenced.is_empty());
    }

    #[test]
    fn test_plain_variant_span() {
        let (body, _) = resolve_body(
            r#"<body><p><span class="mc-variable General.Company variable">stale</span></p></body>"#,
            &ConvertOptions::default(),
        );
        assert_eq!(body.text_content(), "Acme Corp");
    }

    #[test]
    fn test_naming_transforms() {
        assert_eq!(
            transform_name("General.ProductName", NamingConvention::Identity),
            "General.ProductName"
        );
        assert_eq!(
            transform_name("General.ProductName", NamingConvention::CamelCase),
            "generalProductName"
        );
        assert_eq!(
            transform_name("General.ProductName", NamingConvention::KebabCase),
            "general-product-name"
        );
    }

    #[test]
    fn test_sidecar_formats() {
        let refs = vec![("company".to_string(), "Acme".to_string())];
        let adoc = sidecar(&refs, Format::AsciiDoc).unwrap();
        assert_eq!(adoc.file_name, "variables.adoc");
        assert_eq!(adoc.content, ":company: Acme\n");

        let md = sidecar(&refs, Format::Markdown).unwrap();
        assert_eq!(md.file_name, "variables.json");
        assert!(md.content.contains("\"company\": \"Acme\""));
        assert!(sidecar(&[], Format::AsciiDoc).is_none());
    }
}
