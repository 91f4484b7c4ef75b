//! # helpdown
//!
//! A fast, lightweight converter from help-authoring-tool HTML exports to
//! AsciiDoc and semantic Markdown.
//!
//! ## Features
//!
//! - Handles authoring-tool namespaced elements: variables, condition tags,
//!   snippets, drop-downs, cross-references
//! - Repairs broken list structure and keeps numbering continuity across
//!   interrupted ordered lists
//! - Variables either substituted literally or kept as symbolic references
//!   with a generated sidecar of definitions
//! - Snippets merged in place or emitted as include directives
//! - Batch conversion of whole directory trees with per-file isolation
//!
//! ## Quick Start
//!
//! ```no_run
//! use helpdown::{convert_file, ConvertOptions, Format};
//!
//! let options = ConvertOptions::new(Format::AsciiDoc);
//! let conversion = convert_file("Content/install.htm", &options).unwrap();
//! println!("{}", conversion.text);
//! ```
//!
//! ## Pipeline
//!
//! Every conversion runs the same passes over a parsed HTML tree: condition
//! filtering, variable resolution, snippet resolution, structure
//! normalization, then emission through a [`emit::Syntax`] back end. The
//! passes are public, so callers can run any subset against their own trees.

pub mod batch;
pub mod condition;
pub mod continuity;
pub mod convert;
pub mod decode;
pub mod dom;
pub mod emit;
pub mod error;
pub mod meta;
pub mod normalize;
pub mod options;
pub mod project;
pub mod snippets;
pub mod variables;

use std::path::{Path, PathBuf};

use tracing::debug;

use convert::DocumentContext;
use emit::{AsciiDocSyntax, MarkdownSyntax};

pub use batch::{convert_dir, BatchOptions, BatchReport, FileOutcome};
pub use error::{Error, Result};
pub use meta::{Conversion, DocumentMeta, VariablesSidecar, Warning, WarningKind};
pub use options::{
    ConditionConfig, ConvertOptions, Format, NamingConvention, VariableMode,
};
pub use project::Project;

/// Convert one exported document read from disk.
///
/// The containing project is discovered by walking up from the document
/// unless `options.project_root` pins it, and supplies variable definitions,
/// snippet sources, and link-target checking.
pub fn convert_file(path: impl AsRef<Path>, options: &ConvertOptions) -> Result<Conversion> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    let source = decode::decode_source(&bytes);
    let project = match &options.project_root {
        Some(root) => Project::at(root),
        None => Project::discover(path),
    };
    let document_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    run_pipeline(&source, options, Some(project), Some(document_dir))
}

/// Convert a document already held in memory.
///
/// Without `options.project_root` there is no project context: variables
/// resolve to their own names with a warning, snippet sources cannot be
/// read, and links are not checked.
pub fn convert_str(source: &str, options: &ConvertOptions) -> Result<Conversion> {
    let project = options.project_root.as_ref().map(Project::at);
    let document_dir = project.as_ref().map(|p| p.root().to_path_buf());
    run_pipeline(source, options, project, document_dir)
}

fn run_pipeline(
    source: &str,
    options: &ConvertOptions,
    project: Option<Project>,
    document_dir: Option<PathBuf>,
) -> Result<Conversion> {
    options.validate()?;

    let root = dom::parse_document(source);
    let title = root
        .as_element()
        .and_then(|html| html.find("title"))
        .map(|t| t.text_content());
    let mut body = dom::parse::body_of(&root)
        .cloned()
        .unwrap_or_else(|| dom::Element::new("body"));

    let dropped = condition::apply(&mut body, &options.conditions);
    if dropped > 0 {
        debug!(dropped, "condition filter removed elements");
    }

    let mut warnings = Vec::new();
    let vars = match &project {
        Some(project) => {
            let (vars, load_warnings) = variables::VariableSet::load(project);
            warnings.extend(load_warnings);
            vars
        }
        None => variables::VariableSet::new(),
    };
    let mut outcome = variables::resolve(&mut body, &vars, options);

    if let (Some(project), Some(dir)) = (&project, &document_dir) {
        let ctx = snippets::SnippetContext {
            project,
            document_dir: dir.clone(),
            vars: &vars,
            options,
        };
        let mut cache = snippets::SnippetCache::new();
        snippets::resolve(&mut body, &ctx, &mut cache, &mut outcome);
    }

    normalize::normalize(&mut body);

    let doc = DocumentContext {
        project: project.as_ref(),
        document_dir,
    };
    let output = match options.format {
        Format::AsciiDoc => convert::emit_document(
            &AsciiDocSyntax,
            &body,
            title.as_deref(),
            options,
            &doc,
        ),
        Format::Markdown => convert::emit_document(
            &MarkdownSyntax,
            &body,
            title.as_deref(),
            options,
            &doc,
        ),
    };

    warnings.extend(outcome.warnings);
    warnings.extend(output.warnings);
    let variables = variables::sidecar(&outcome.referenced, options.format);

    Ok(Conversion {
        text: output.text,
        meta: DocumentMeta {
            word_count: output.word_count,
            format: options.format.id().to_string(),
            warnings,
            broken_links: output.broken_links,
        },
        variables,
    })
}
