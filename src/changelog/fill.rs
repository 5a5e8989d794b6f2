//! Greedy paragraph filling.

use unicode_width::UnicodeWidthChar;

/// Columns between tab stops.
pub const TAB_WIDTH: usize = 8;

/// Column width of `text` on a terminal.
///
/// Tabs advance to the next tab stop, wide (East Asian) characters take two
/// columns and zero-width or control characters none.
pub fn display_width(text: &str) -> usize {
    text.chars().fold(0, |col, ch| {
        if ch == '\t' {
            col + TAB_WIDTH - col % TAB_WIDTH
        } else {
            col + ch.width().unwrap_or(0)
        }
    })
}

/// The run of spaces and tabs at the start of `line`.
pub fn leading_whitespace(line: &str) -> &str {
    let rest = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - rest.len()]
}

/// Fill `words` into lines no wider than `width` columns.
///
/// Words are separated by single spaces and broken greedily. The first line
/// starts with `first_indent`, the others with `rest_indent`. A word wider
/// than the remaining space on an empty line is placed on it anyway. A word
/// starting with `*` never begins a continuation line, so filling cannot
/// turn text into an entry header; such a word overflows its line instead.
///
/// Greedy filling is stable: filling the words of already-filled lines with
/// the same indentation and width reproduces the same lines.
pub fn fill_words<'a>(
    words: impl IntoIterator<Item = &'a str>,
    first_indent: &str,
    rest_indent: &str,
    width: usize,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = first_indent.to_string();
    let mut column = display_width(first_indent);
    let mut has_word = false;

    for word in words {
        let word_width = display_width(word);
        if has_word && column + 1 + word_width > width && !word.starts_with('*') {
            lines.push(std::mem::replace(&mut current, rest_indent.to_string()));
            column = display_width(rest_indent);
            has_word = false;
        }
        if has_word {
            current.push(' ');
            column += 1;
        }
        current.push_str(word);
        column += word_width;
        has_word = true;
    }

    if has_word {
        lines.push(current);
    }
    lines
}
