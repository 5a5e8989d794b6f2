//! Rendering of context sources into prompt text.

use std::path::PathBuf;

use tracing::{debug, warn};

use super::{ContentFormatter, ContextSource};
use crate::error::DiffError;
use crate::git::diff::{collect_diff, open_repository};

/// Maximum bytes of a single source before truncation.
pub const MAX_SOURCE_LENGTH: usize = 30_000;

/// Renders each source as a header line followed by a fenced block.
///
/// ````text
/// ### lisp/util.el
/// ```
/// (defun helper () ...)
/// ```
/// ````
pub struct FencedFormatter {
    repo_path: PathBuf,
}

impl FencedFormatter {
    /// Format sources relative to the repository containing `repo_path`.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    fn render(&self, source: &ContextSource) -> Option<Rendered> {
        match source {
            ContextSource::Diff => self.render_diff(),
            ContextSource::File(path) => match std::fs::read_to_string(path) {
                Ok(content) => Some(Rendered {
                    title: path.display().to_string(),
                    content,
                    language: "",
                    truncated: false,
                }),
                Err(e) => {
                    warn!("Skipping unreadable context file {}: {}", path.display(), e);
                    None
                }
            },
        }
    }

    fn render_diff(&self) -> Option<Rendered> {
        let summary = match open_repository(&self.repo_path).and_then(|repo| collect_diff(&repo)) {
            Ok(summary) => summary,
            Err(DiffError::NoChanges) => {
                debug!("No changes to include in the context");
                return None;
            }
            Err(e) => {
                warn!("Skipping diff context: {}", e);
                return None;
            }
        };

        let title = if summary.from_worktree {
            "Working tree diff"
        } else {
            "Staged diff"
        };
        Some(Rendered {
            title: title.to_string(),
            content: summary.diff_text,
            language: "diff",
            truncated: summary.truncated,
        })
    }
}

/// One source ready to be fenced.
struct Rendered {
    title: String,
    content: String,
    language: &'static str,
    truncated: bool,
}

impl ContentFormatter for FencedFormatter {
    fn format(&self, sources: &[ContextSource]) -> String {
        let mut out = String::new();

        for source in sources {
            let Some(rendered) = self.render(source) else {
                continue;
            };
            if rendered.content.trim().is_empty() {
                debug!("Skipping empty context source {}", source);
                continue;
            }

            let truncated = rendered.truncated || rendered.content.len() > MAX_SOURCE_LENGTH;
            let content = truncate(&rendered.content, MAX_SOURCE_LENGTH);
            let fence = fence_for(content);

            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("### {}\n{}{}\n", rendered.title, fence, rendered.language));
            out.push_str(content);
            if !content.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&fence);
            out.push('\n');
            if truncated {
                out.push_str("[truncated]\n");
            }
        }

        out
    }
}

/// Formatter that never renders anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFormatter;

impl ContentFormatter for NullFormatter {
    fn format(&self, _sources: &[ContextSource]) -> String {
        String::new()
    }
}

/// Cut `text` to at most `max` bytes on a char boundary.
fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// A backtick fence longer than any backtick run inside `content`.
fn fence_for(content: &str) -> String {
    let longest = content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat(longest.max(2) + 1)
}
