//! ChangeLog scaffolds built from the repository diff.

use std::path::PathBuf;

use tracing::debug;

use crate::changelog::scaffold::{ScaffoldEntry, ScaffoldGenerator, render_scaffold};
use crate::error::DiffError;
use crate::git::diff::{ChangedFile, FileStatus, collect_diff, open_repository};

/// Scaffold generator reading the staged (or working tree) diff of a repository.
pub struct GitScaffold {
    repo_path: PathBuf,
}

impl GitScaffold {
    /// Scaffold the repository containing `repo_path`.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }
}

impl ScaffoldGenerator for GitScaffold {
    fn scaffold(&self) -> Result<String, DiffError> {
        let repo = open_repository(&self.repo_path)?;
        let summary = collect_diff(&repo)?;
        debug!(
            "Scaffolding {} changed files (+{} -{})",
            summary.changed_files.len(),
            summary.additions,
            summary.deletions
        );

        let entries: Vec<ScaffoldEntry> = summary.changed_files.iter().map(entry_for).collect();
        Ok(render_scaffold(&entries))
    }
}

/// New and deleted files are described as a whole, so they list no symbols.
/// A renamed file names its old path before the new one.
fn entry_for(file: &ChangedFile) -> ScaffoldEntry {
    match (&file.status, &file.old_path) {
        (FileStatus::Added | FileStatus::Deleted, _) => ScaffoldEntry {
            path: file.path.clone(),
            symbols: Vec::new(),
        },
        (FileStatus::Renamed, Some(old_path)) => ScaffoldEntry {
            path: format!("{}, {}", old_path, file.path),
            symbols: file.symbols.clone(),
        },
        _ => ScaffoldEntry {
            path: file.path.clone(),
            symbols: file.symbols.clone(),
        },
    }
}
