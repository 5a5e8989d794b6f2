//! Diff collection from the repository using git2.
//!
//! Staged changes are what the commit message describes. When nothing is
//! staged, the working tree (including untracked files) is used instead.

use std::sync::LazyLock;

use git2::{Delta, Diff, DiffFindOptions, DiffFormat, DiffOptions, ErrorCode, Repository, Tree};
use regex_lite::Regex;
use tracing::{debug, warn};

use crate::error::DiffError;

/// Maximum characters for the unified diff text before truncation.
const MAX_DIFF_LENGTH: usize = 30_000;

/// A definition line: optional modifiers, a defining keyword, then the name.
static DEFINITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\(?(?:(?:pub(?:\([^)]*\))?|export|async|static|public|private|protected|unsafe|const|default)\s+)*",
        r"(?:cl-defun|cl-defmacro|cl-defmethod|cl-defgeneric|defun|defmacro|defsubst|defvar-local|defvar|defcustom|defconst|defface|define-minor-mode|define-derived-mode|fn|def|func|function|class|struct|enum|trait|interface|mod)",
        r"\s+([A-Za-z_][A-Za-z0-9_!?*=/-]*)",
    ))
    .expect("definition pattern is valid")
});

/// Status of a changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// A file touched by the diff.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    pub path: String,
    pub status: FileStatus,
    /// Old path for renamed files (None for non-rename changes).
    pub old_path: Option<String>,
    /// Functions, variables or types touched, in order of first appearance.
    pub symbols: Vec<String>,
}

/// Summary of the changes being described.
#[derive(Debug, Clone)]
pub struct DiffSummary {
    pub diff_text: String,
    pub changed_files: Vec<ChangedFile>,
    /// True when the staged diff was empty and the working tree was used.
    pub from_worktree: bool,
    pub truncated: bool,
    pub additions: usize,
    pub deletions: usize,
}

/// Extract the name defined on a line of code, if any.
pub fn definition_name(line: &str) -> Option<&str> {
    DEFINITION
        .captures(line.trim_start())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// `Ok(Some(tree))` for repos with a valid HEAD, or `Err(DiffError::DiffFailed)`
/// for real errors (corrupt HEAD, permission issues, missing objects).
fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, DiffError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(DiffError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(DiffError::DiffFailed)?;
    Ok(Some(tree))
}

/// Open the repository containing `path`.
pub fn open_repository(path: &std::path::Path) -> Result<Repository, DiffError> {
    Repository::discover(path).map_err(DiffError::OpenRepository)
}

/// Collect the staged diff, or the working tree diff when nothing is staged.
pub fn collect_diff(repo: &Repository) -> Result<DiffSummary, DiffError> {
    let head_tree = resolve_head_tree(repo)?;

    let mut staged = repo
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(DiffError::DiffFailed)?;
    detect_renames(&mut staged)?;
    if staged.deltas().len() > 0 {
        return build_summary(&staged, false);
    }

    debug!("Nothing staged, describing the working tree");
    let mut opts = DiffOptions::new();
    opts.include_untracked(true)
        .recurse_untracked_dirs(true)
        .show_untracked_content(true);
    let mut unstaged = repo
        .diff_index_to_workdir(None, Some(&mut opts))
        .map_err(DiffError::DiffFailed)?;
    detect_renames(&mut unstaged)?;

    build_summary(&unstaged, true)
}

/// Pair deleted and added files with similar content into renames.
fn detect_renames(diff: &mut Diff<'_>) -> Result<(), DiffError> {
    let mut opts = DiffFindOptions::new();
    opts.renames(true).for_untracked(true);
    diff.find_similar(Some(&mut opts)).map_err(DiffError::DiffFailed)
}

fn build_summary(diff: &Diff<'_>, from_worktree: bool) -> Result<DiffSummary, DiffError> {
    let mut changed_files = collect_files_from_diff(diff);
    if changed_files.is_empty() {
        return Err(DiffError::NoChanges);
    }

    let mut summary = DiffSummary {
        diff_text: String::new(),
        changed_files: Vec::new(),
        from_worktree,
        truncated: false,
        additions: 0,
        deletions: 0,
    };
    append_diff_text(diff, &mut summary, &mut changed_files);

    summary.changed_files = changed_files;
    Ok(summary)
}

/// Collect changed file entries from a diff, in diff order.
fn collect_files_from_diff(diff: &Diff<'_>) -> Vec<ChangedFile> {
    let mut files = Vec::new();

    for delta in diff.deltas() {
        let status = match delta.status() {
            Delta::Added | Delta::Untracked => FileStatus::Added,
            Delta::Deleted => FileStatus::Deleted,
            Delta::Renamed => FileStatus::Renamed,
            _ => FileStatus::Modified,
        };

        let new_path = delta
            .new_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());
        let old_path = delta
            .old_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());

        let (path, old_path) = match status {
            FileStatus::Renamed => (new_path.clone().or_else(|| old_path.clone()), old_path),
            FileStatus::Deleted => (old_path.or(new_path), None),
            _ => (new_path.or(old_path), None),
        };

        if let Some(path) = path.filter(|p| !p.is_empty()) {
            files.push(ChangedFile {
                path,
                status,
                old_path,
                symbols: Vec::new(),
            });
        }
    }

    files
}

/// Append unified diff text, counting lines and recording touched symbols.
///
/// Symbols come from hunk header context (the enclosing definition git
/// reports after `@@`) and from definitions on added or removed lines.
fn append_diff_text(diff: &Diff<'_>, summary: &mut DiffSummary, files: &mut [ChangedFile]) {
    let result = diff.print(DiffFormat::Patch, |delta, _hunk, line| {
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().to_string());
        let file = match path {
            Some(p) => files
                .iter_mut()
                .find(|f| f.path == p || f.old_path.as_deref() == Some(p.as_str())),
            None => None,
        };

        let origin = line.origin();
        let content = std::str::from_utf8(line.content()).unwrap_or("");

        if let Some(file) = file {
            if origin == 'H' {
                if let Some(name) = hunk_context(line.content()).and_then(definition_name) {
                    push_symbol(&mut file.symbols, name);
                }
            } else if (origin == '+' || origin == '-')
                && let Some(name) = definition_name(content)
            {
                push_symbol(&mut file.symbols, name);
            }
        }

        match origin {
            '+' => summary.additions += 1,
            '-' => summary.deletions += 1,
            _ => {}
        }

        if summary.truncated {
            return true;
        }
        if summary.diff_text.len() + content.len() + 2 > MAX_DIFF_LENGTH {
            summary.truncated = true;
            return true;
        }

        // Include the origin character for context
        if origin == '+' || origin == '-' || origin == ' ' {
            summary.diff_text.push(origin);
        }
        summary.diff_text.push_str(content);

        true
    });

    if let Err(e) = result {
        warn!("Failed to collect diff text: {e}");
        summary.truncated = true;
    }
}

/// The text git places after the closing `@@` of a hunk header.
fn hunk_context(header: &[u8]) -> Option<&str> {
    let header = std::str::from_utf8(header).ok()?;
    let rest = header.strip_prefix("@@")?;
    let end = rest.find("@@")?;
    let context = rest[end + 2..].trim();
    if context.is_empty() { None } else { Some(context) }
}

fn push_symbol(symbols: &mut Vec<String>, name: &str) {
    if !symbols.iter().any(|s| s == name) {
        symbols.push(name.to_string());
    }
}
