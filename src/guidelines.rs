//! Extraction of commit-message guidelines from a project policy document.
//!
//! Policy documents (such as a `CONTRIBUTE` file) are plain text split into
//! sections by org-style level-2 headings:
//!
//! ```text
//! ** Commit messages
//! Use imperative mood.
//!
//! ** Coding style
//! ...
//! ```

use std::path::Path;

use tracing::{debug, warn};

/// Section consumed when no other heading is configured.
pub const DEFAULT_HEADING: &str = "Commit messages";

/// Guidelines used when the policy document or its section is missing.
pub const DEFAULT_GUIDELINES: &str = "\
Write the commit message in the GNU ChangeLog style.

- Start with a summary line of at most 72 characters, in imperative mood,
  without a trailing period.
- Leave one blank line after the summary.
- Describe each changed file in an entry that starts with `* FILE (SYMBOL):`
  followed by a complete sentence describing what changed.
- When several functions or variables in the same file change, start each
  additional description on its own line with `(SYMBOL):`.
- Say what changed, not why; the rationale belongs in comments or the summary.
- Use two spaces after a sentence-ending period.";

/// Whether `line` is a level-2 heading (`** Title`, but not `*** Title`).
fn is_level_two_heading(line: &str) -> bool {
    line.strip_prefix("**")
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_whitespace)
}

/// Find the section introduced by `** <heading>` in `document`.
///
/// The section runs from the line after the heading to the next level-2
/// heading, or to the end of the document. Leading blank lines and trailing
/// whitespace are dropped. Returns `None` if the heading does not appear or
/// the section has no content.
pub fn find_section(document: &str, heading: &str) -> Option<String> {
    let wanted = heading.trim();
    let mut lines = document.lines();

    lines
        .by_ref()
        .find(|line| {
            is_level_two_heading(line) && line.get(2..).is_some_and(|title| title.trim() == wanted)
        })?;

    let body: Vec<&str> = lines
        .take_while(|line| !is_level_two_heading(line))
        .skip_while(|line| line.trim().is_empty())
        .collect();

    let section = body.join("\n").trim_end().to_string();
    if section.is_empty() { None } else { Some(section) }
}

/// Read the policy document at `path` and extract the section named `heading`.
///
/// A missing or unreadable document is not an error: it yields `None` and the
/// caller falls back to [`DEFAULT_GUIDELINES`].
pub fn extract_section(path: &Path, heading: &str) -> Option<String> {
    let document = match std::fs::read_to_string(path) {
        Ok(document) => document,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Policy document {} does not exist", path.display());
            return None;
        }
        Err(e) => {
            warn!("Cannot read policy document {}: {}", path.display(), e);
            return None;
        }
    };

    let section = find_section(&document, heading);
    if section.is_none() {
        debug!("No '** {}' section in {}", heading, path.display());
    }
    section
}

/// Load the guideline text, substituting [`DEFAULT_GUIDELINES`] when absent.
pub fn load_guidelines(path: Option<&Path>, heading: &str) -> String {
    match path.and_then(|p| extract_section(p, heading)) {
        Some(section) => section,
        None => {
            debug!("Using built-in commit message guidelines");
            DEFAULT_GUIDELINES.to_string()
        }
    }
}
