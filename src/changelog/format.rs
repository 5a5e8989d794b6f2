//! Reformatting of generated text into ChangeLog commit message conventions.
//!
//! A ChangeLog-style commit message looks like:
//!
//! ```text
//! Summary line in imperative mood
//!
//! * lisp/util.el (util-helper): New function.
//! (util-other): Use it.
//! * lisp/main.el (main-run): Call util-helper.
//! ```
//!
//! Models rarely get the line structure right: they put several
//! `(symbol):` descriptions on one line, overflow the fill column, or leave
//! stray whitespace. [`format_message`] fixes all of that without touching
//! the wording.

use std::sync::LazyLock;

use regex_lite::Regex;

use super::fill::{fill_words, leading_whitespace};

/// `* <file-ref>:` optionally followed by parenthesized symbols before the colon.
static ENTRY_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\s+[^\s:(][^:(]*?(?:\s*\([^()]*\))*:").expect("entry header pattern is valid")
});

/// A symbol reference that opens a description: `(symbol):` or `(a) (b):`.
static SYMBOL_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\([^()]+\)(?:\s*\([^()]+\))*:").expect("symbol reference pattern is valid")
});

/// Widths used when filling a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOptions {
    /// Maximum width of the summary line.
    pub summary_width: usize,
    /// Maximum width of ChangeLog entry lines.
    pub fill_column: usize,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            summary_width: 72,
            fill_column: 72,
        }
    }
}

/// Whether `line` starts a ChangeLog entry (`* file (symbol):`).
pub fn is_entry_header(line: &str) -> bool {
    ENTRY_HEADER.is_match(line)
}

/// Reformat raw model output into a ChangeLog commit message.
///
/// - A message wrapped in a single code fence is unwrapped.
/// - The summary (the first non-blank line before any entry that does not
///   start with `*`) is filled to `summary_width`.
/// - Every entry, from its header to the next line starting with `*`, is
///   reflowed: each `(symbol):` description starts its own line and every
///   line is filled to `fill_column`.
/// - Blank lines are emptied, and leading and trailing blank lines dropped.
///
/// Formatting is idempotent.
pub fn format_message(raw: &str, options: &FillOptions) -> String {
    let lines: Vec<&str> = strip_code_fence(raw).lines().collect();
    let mut out: Vec<String> = Vec::with_capacity(lines.len());
    let mut summary_pending = true;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if is_entry_header(line) {
            summary_pending = false;
            let end = lines[i + 1..]
                .iter()
                .position(|l| l.starts_with('*'))
                .map_or(lines.len(), |offset| i + 1 + offset);
            out.extend(reflow_entry(&lines[i..end], options.fill_column));
            i = end;
            continue;
        }

        if line.trim().is_empty() {
            out.push(String::new());
        } else if summary_pending && !line.trim_start().starts_with('*') {
            let indent = leading_whitespace(line);
            out.extend(fill_words(
                line.split_whitespace(),
                indent,
                indent,
                options.summary_width,
            ));
            summary_pending = false;
        } else {
            out.push(line.to_string());
        }
        i += 1;
    }

    let Some(start) = out.iter().position(|l| !l.is_empty()) else {
        return String::new();
    };
    let end = out.iter().rposition(|l| !l.is_empty()).map_or(start, |p| p + 1);

    let mut message = out[start..end].join("\n");
    message.push('\n');
    message
}

/// Reflow one entry: its header line and the lines up to the next entry.
fn reflow_entry(region: &[&str], width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();

    for &line in region {
        if line.trim().is_empty() {
            if !paragraph.is_empty() {
                out.extend(reflow_paragraph(&paragraph, width));
                paragraph.clear();
            }
            out.push(String::new());
        } else {
            paragraph.push(line);
        }
    }
    if !paragraph.is_empty() {
        out.extend(reflow_paragraph(&paragraph, width));
    }

    out
}

fn reflow_paragraph(lines: &[&str], width: usize) -> Vec<String> {
    let first_indent = leading_whitespace(lines[0]);
    let rest_indent = lines.get(1).map_or(first_indent, |l| leading_whitespace(l));

    let text = lines
        .iter()
        .flat_map(|l| l.split_whitespace())
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = Vec::new();
    for (n, segment) in split_descriptions(&text).into_iter().enumerate() {
        let indent = if n == 0 { first_indent } else { rest_indent };
        out.extend(fill_words(segment.split_whitespace(), indent, rest_indent, width));
    }
    out
}

/// Split a paragraph before every `(symbol):` that opens a new description.
///
/// The symbol list belonging to an entry header stays on the header line.
fn split_descriptions(text: &str) -> Vec<&str> {
    let protected_end = ENTRY_HEADER.find(text).map_or(0, |m| m.end());

    let mut segments = Vec::new();
    let mut start = 0;
    for m in SYMBOL_REF.find_iter(text) {
        let at = m.start();
        if at > start && at >= protected_end && text[..at].ends_with(' ') {
            segments.push(text[start..at].trim());
            start = at;
        }
    }
    segments.push(text[start..].trim());

    segments.retain(|s| !s.is_empty());
    segments
}

/// Unwrap a message the model wrapped in a single Markdown code fence.
///
/// Text holding more than one fenced block is returned unchanged.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix("```")
        .and_then(|rest| rest.strip_suffix("```"))
        && let Some(newline) = inner.find('\n')
    {
        let body = &inner[newline + 1..];
        if !body.lines().any(|l| l.trim_start().starts_with("```")) {
            return body;
        }
    }
    raw
}
