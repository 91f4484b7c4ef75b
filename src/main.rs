//! helpdown - help-export to AsciiDoc/Markdown converter

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use helpdown::{
    convert_dir, convert_file, BatchOptions, ConditionConfig, ConvertOptions, Format,
    NamingConvention, VariableMode,
};

#[derive(Parser)]
#[command(name = "helpdown")]
#[command(version, about = "Convert help-authoring HTML exports to AsciiDoc or Markdown", long_about = None)]
#[command(after_help = "EXAMPLES:
    helpdown Content/install.htm install.adoc      Convert one topic
    helpdown -f markdown Content/ out/             Convert a whole export
    helpdown --variables reference Content/ out/   Keep variables symbolic")]
struct Cli {
    /// Input file or directory
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file or directory (stdout when omitted for a single file)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Target format (asciidoc, markdown)
    #[arg(short, long, default_value = "asciidoc")]
    format: Format,

    /// Variable handling (replace, reference)
    #[arg(long = "variables", value_parser = parse_mode, default_value = "replace")]
    variable_mode: VariableMode,

    /// Naming convention for reference-mode variable names
    /// (identity, camel, kebab)
    #[arg(long, value_parser = parse_naming, default_value = "identity")]
    naming: NamingConvention,

    /// Wildcard pattern of variables to keep symbolic (repeatable)
    #[arg(long = "var-include", value_name = "PATTERN")]
    var_include: Vec<String>,

    /// Wildcard pattern of variables to substitute literally (repeatable)
    #[arg(long = "var-exclude", value_name = "PATTERN")]
    var_exclude: Vec<String>,

    /// Condition tag or category to exclude, replacing the default
    /// blacklist (repeatable)
    #[arg(long = "exclude-condition", value_name = "TAG")]
    exclude_conditions: Vec<String>,

    /// Render drop-downs as plain sections instead of collapsible blocks
    #[arg(long)]
    no_collapsible: bool,

    /// Emit include directives for snippets instead of merging them
    #[arg(long)]
    no_merge_snippets: bool,

    /// Project root (discovered from the input path when omitted)
    #[arg(long, value_name = "DIR")]
    project: Option<PathBuf>,

    /// Worker threads for directory conversion (0 = auto)
    #[arg(short, long, default_value_t = 0)]
    jobs: usize,

    /// Suppress log output
    #[arg(short, long)]
    quiet: bool,
}

fn parse_mode(s: &str) -> Result<VariableMode, String> {
    match s {
        "replace" => Ok(VariableMode::Replace),
        "reference" => Ok(VariableMode::Reference),
        _ => Err(format!("unknown variable mode: {s}")),
    }
}

fn parse_naming(s: &str) -> Result<NamingConvention, String> {
    match s {
        "identity" => Ok(NamingConvention::Identity),
        "camel" => Ok(NamingConvention::CamelCase),
        "kebab" => Ok(NamingConvention::KebabCase),
        _ => Err(format!("unknown naming convention: {s}")),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let mut options = ConvertOptions::new(cli.format)
        .with_variable_mode(cli.variable_mode)
        .with_naming(cli.naming)
        .with_collapsible(!cli.no_collapsible);
    options.variable_include = cli.var_include.clone();
    options.variable_exclude = cli.var_exclude.clone();
    options.merge_snippets = !cli.no_merge_snippets;
    if !cli.exclude_conditions.is_empty() {
        options.conditions = ConditionConfig {
            excluded: cli.exclude_conditions.clone(),
        };
    }
    if let Some(project) = &cli.project {
        options = options.with_project_root(project);
    }

    let result = if cli.input.is_dir() {
        run_batch(&cli, &options)
    } else {
        run_single(&cli, &options)
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(quiet: bool) {
    let default = if quiet { "error" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_single(cli: &Cli, options: &ConvertOptions) -> Result<(), String> {
    let conversion = convert_file(&cli.input, options).map_err(|e| e.to_string())?;
    for warning in &conversion.meta.warnings {
        if !cli.quiet {
            eprintln!("warning: {warning}");
        }
    }

    match &cli.output {
        Some(output) => {
            std::fs::write(output, &conversion.text).map_err(|e| e.to_string())?;
            if let Some(sidecar) = &conversion.variables {
                let path = sidecar_path(output, sidecar.file_name);
                std::fs::write(path, &sidecar.content).map_err(|e| e.to_string())?;
            }
        }
        None => print!("{}", conversion.text),
    }
    Ok(())
}

fn run_batch(cli: &Cli, options: &ConvertOptions) -> Result<(), String> {
    let output = cli
        .output
        .as_ref()
        .ok_or("output directory required when converting a directory")?;
    let batch = BatchOptions { jobs: cli.jobs };
    let report =
        convert_dir(&cli.input, output, options, &batch).map_err(|e| e.to_string())?;

    if !cli.quiet {
        eprintln!(
            "{} converted, {} failed, {} skipped, {} warnings",
            report.converted(),
            report.failed(),
            report.skipped,
            report.warning_count()
        );
    }
    if report.failed() > 0 {
        return Err("some documents failed to convert".to_string());
    }
    Ok(())
}

fn sidecar_path(output: &Path, file_name: &str) -> PathBuf {
    match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}
