//! Prompt construction for ChangeLog commit messages.

use std::sync::LazyLock;

use regex_lite::Regex;

/// Introduces the addendum block. Absent from the prompt when there is no addendum.
pub const EMPHASIS_MARKER: &str = "## IMPORTANT: additional rules";

/// Formatting rules sent along with the guidelines unless disabled.
pub const DEFAULT_ADDENDUM: &str = r#"Format the message exactly like this example:

    Summary line in imperative mood

    * lisp/file.el (file-function): Describe the change.
    (file-variable): Describe this change.
    * src/other.c (other_function): Describe the change.

- Start every file entry with "* " followed by the file's path.
- Name each changed function, variable or type in parentheses before its description.
- Describe what changed, not why.
- Write complete sentences that end with a period."#;

/// CSI and OSC escape sequences.
static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)")
        .expect("ANSI escape pattern is valid")
});

/// Build the prompt asking the model for a ChangeLog commit message.
///
/// Sections appear in a fixed order: task framing, guidelines, the optional
/// addendum, the context (only when non-empty), the scaffold and the closing
/// instruction. Context is sanitized; everything else is inserted verbatim.
pub fn build_prompt(guidelines: &str, addendum: &str, context: &str, scaffold: &str) -> String {
    let mut prompt = String::from(
        "You are writing a git commit message in ChangeLog style for the changes below.\n\
         The message is a one-line summary, a blank line, then one entry per changed file.\n",
    );

    push_section(&mut prompt, "## Guidelines", guidelines);

    if !addendum.trim().is_empty() {
        push_section(&mut prompt, EMPHASIS_MARKER, addendum);
    }

    let context = sanitize_context(context);
    if !context.trim().is_empty() {
        push_section(&mut prompt, "## Context", &context);
    }

    push_section(&mut prompt, "## ChangeLog scaffold", scaffold);

    prompt.push_str(
        "\n## Output\n\n\
         Complete the scaffold with a description for every entry, merge or drop \
         entries where that reads better, and put the summary line first.\n\
         Respond with ONLY the commit message text: no code fences, no commentary.\n",
    );
    prompt
}

fn push_section(prompt: &mut String, title: &str, body: &str) {
    prompt.push('\n');
    prompt.push_str(title);
    prompt.push_str("\n\n");
    prompt.push_str(body);
    if !body.ends_with('\n') {
        prompt.push('\n');
    }
}

/// Strip terminal escapes and control characters from collected context.
pub fn sanitize_context(text: &str) -> String {
    remove_control_chars(&remove_ansi_escapes(text))
}

/// Remove control characters except newlines and tabs.
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t')
        .collect()
}

/// Remove ANSI escape sequences.
pub fn remove_ansi_escapes(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").into_owned()
}
