//! Project root discovery and source-file scanning.
//!
//! Authoring projects keep variable sets (`*.flvar`) and snippets (`*.flsnp`)
//! in a `Project/` tree next to the exported content. Conversion only needs
//! two things from the project: the set of variable sources reachable from
//! the root, and a way to resolve snippet/link targets relative to the
//! document being converted.

use std::path::{Path, PathBuf};

use tracing::debug;

/// A resolved project root.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    /// Use an explicit root.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Discover the project root for a document.
    ///
    /// Walks up from the document's directory looking for a directory that
    /// contains a project marker (`*.flprj`) or a `Project` subdirectory.
    /// Falls back to the document's own directory.
    pub fn discover(document: &Path) -> Self {
        let start = document.parent().unwrap_or(Path::new("."));
        let mut dir = start;
        loop {
            if Self::is_project_root(dir) {
                debug!(root = %dir.display(), "discovered project root");
                return Self::at(dir);
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        Self::at(start)
    }

    fn is_project_root(dir: &Path) -> bool {
        if dir.join("Project").is_dir() {
            return true;
        }
        std::fs::read_dir(dir)
            .map(|entries| {
                entries.flatten().any(|e| {
                    e.path()
                        .extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("flprj"))
                })
            })
            .unwrap_or(false)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All variable-definition sources reachable from the root.
    pub fn variable_sources(&self) -> Vec<PathBuf> {
        self.sources_with_extension("flvar")
    }

    fn sources_with_extension(&self, ext: &str) -> Vec<PathBuf> {
        let pattern = format!("{}/**/*.{ext}", self.root.display());
        let mut paths: Vec<PathBuf> = glob::glob(&pattern)
            .map(|entries| entries.flatten().collect())
            .unwrap_or_default();
        // Deterministic load order so later sources override earlier ones
        // reproducibly.
        paths.sort();
        paths
    }

    /// Resolve a source-relative path (snippet src, link target) against the
    /// directory of the referencing document.
    pub fn resolve_relative(&self, document_dir: &Path, relative: &str) -> PathBuf {
        let mut path = document_dir.to_path_buf();
        for part in relative.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    path.pop();
                }
                other => path.push(other),
            }
        }
        path
    }

    /// Check whether a relative link target exists on disk.
    pub fn target_exists(&self, document_dir: &Path, relative: &str) -> bool {
        self.resolve_relative(document_dir, relative).exists()
    }
}
