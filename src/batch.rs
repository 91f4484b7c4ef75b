//! Batch conversion of a directory tree.
//!
//! Documents are discovered under the input directory, converted on a
//! bounded rayon pool, and written to mirrored paths under the output
//! directory with translated extensions. Documents do not share mutable
//! state; each failure is recorded and the batch continues.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{info, warn};

use crate::convert::links;
use crate::error::{Error, Result};
use crate::meta::VariablesSidecar;
use crate::options::{ConvertOptions, Format};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Worker thread limit. Zero lets rayon size the pool.
    pub jobs: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { jobs: 0 }
    }
}

/// What happened to one input document.
#[derive(Debug)]
pub struct FileOutcome {
    pub input: PathBuf,
    /// Written output path, absent when conversion or writing failed.
    pub output: Option<PathBuf>,
    pub warning_count: usize,
    pub error: Option<String>,
}

/// Aggregated result of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<FileOutcome>,
    /// Files under the input tree that are not authored documents.
    pub skipped: usize,
}

impl BatchReport {
    pub fn converted(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_none()).count()
    }

    pub fn failed(&self) -> usize {
        self.files.iter().filter(|f| f.error.is_some()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.files.iter().map(|f| f.warning_count).sum()
    }
}

/// Convert every `.htm`/`.html` document under `input_dir` into
/// `output_dir`, mirroring the directory layout.
///
/// In reference mode the extracted variables of all documents are merged
/// into a single sidecar at the output root, first definition wins.
pub fn convert_dir(
    input_dir: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
    batch: &BatchOptions,
) -> Result<BatchReport> {
    options.validate()?;
    let (documents, skipped) = discover(input_dir)?;
    fs::create_dir_all(output_dir)?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(batch.jobs)
        .build()
        .map_err(|e| Error::InvalidOptions(e.to_string()))?;

    let outcomes: Vec<(FileOutcome, Option<VariablesSidecar>)> = pool.install(|| {
        documents
            .par_iter()
            .map(|input| convert_one(input, input_dir, output_dir, options))
            .collect()
    });

    let mut report = BatchReport {
        files: Vec::with_capacity(outcomes.len()),
        skipped,
    };
    let mut sidecars = Vec::new();
    for (outcome, sidecar) in outcomes {
        sidecars.extend(sidecar);
        report.files.push(outcome);
    }

    if let Some(sidecar) = merge_sidecars(&sidecars, options.format) {
        fs::write(output_dir.join(sidecar.file_name), &sidecar.content)?;
    }

    info!(
        converted = report.converted(),
        failed = report.failed(),
        skipped = report.skipped,
        "batch finished"
    );
    Ok(report)
}

fn discover(input_dir: &Path) -> Result<(Vec<PathBuf>, usize)> {
    let pattern = input_dir.join("**/*").to_string_lossy().into_owned();
    let mut documents = Vec::new();
    let mut skipped = 0;
    let entries = glob::glob(&pattern).map_err(|e| Error::InvalidOptions(e.to_string()))?;
    for entry in entries {
        let path = entry.map_err(glob::GlobError::into_error)?;
        if path.is_dir() {
            continue;
        }
        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("htm") | Some("html") => documents.push(path),
            _ => skipped += 1,
        }
    }
    documents.sort();
    Ok((documents, skipped))
}

fn convert_one(
    input: &Path,
    input_dir: &Path,
    output_dir: &Path,
    options: &ConvertOptions,
) -> (FileOutcome, Option<VariablesSidecar>) {
    let conversion = match crate::convert_file(input, options) {
        Ok(conversion) => conversion,
        Err(e) => {
            warn!(input = %input.display(), error = %e, "conversion failed");
            return (failure(input, e.to_string()), None);
        }
    };

    let relative = input.strip_prefix(input_dir).unwrap_or(input);
    let translated = links::translate_extension(
        &relative.to_string_lossy(),
        options.format.extension(),
    );
    let output = output_dir.join(translated);
    if let Some(parent) = output.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        return (failure(input, e.to_string()), None);
    }
    if let Err(e) = fs::write(&output, &conversion.text) {
        warn!(output = %output.display(), error = %e, "write failed");
        return (failure(input, e.to_string()), None);
    }

    let outcome = FileOutcome {
        input: input.to_path_buf(),
        output: Some(output),
        warning_count: conversion.meta.warnings.len(),
        error: None,
    };
    (outcome, conversion.variables)
}

fn failure(input: &Path, error: String) -> FileOutcome {
    FileOutcome {
        input: input.to_path_buf(),
        output: None,
        warning_count: 0,
        error: Some(error),
    }
}

/// Merge per-document sidecars into one, keeping the first definition of
/// each key.
fn merge_sidecars(sidecars: &[VariablesSidecar], format: Format) -> Option<VariablesSidecar> {
    let first = sidecars.first()?;
    let content = match format {
        Format::AsciiDoc => {
            let mut seen = HashSet::new();
            let mut lines = Vec::new();
            for sidecar in sidecars {
                for line in sidecar.content.lines() {
                    let key = line.split(':').nth(1).unwrap_or(line).to_string();
                    if seen.insert(key) {
                        lines.push(line.to_string());
                    }
                }
            }
            let mut merged = lines.join("\n");
            merged.push('\n');
            merged
        }
        Format::Markdown => {
            let mut merged = serde_json::Map::new();
            for sidecar in sidecars {
                if let Ok(serde_json::Value::Object(map)) =
                    serde_json::from_str(&sidecar.content)
                {
                    for (key, value) in map {
                        merged.entry(key).or_insert(value);
                    }
                }
            }
            let mut content = serde_json::to_string_pretty(&serde_json::Value::Object(merged))
                .unwrap_or_else(|_| "{}".to_string());
            content.push('\n');
            content
        }
    };
    Some(VariablesSidecar {
        file_name: first.file_name,
        content,
    })
}
