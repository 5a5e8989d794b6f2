//! ChangeLog scaffolds: entry skeletons with empty descriptions.

use crate::error::DiffError;

/// Produces a ChangeLog skeleton for the change set being described.
#[cfg_attr(test, mockall::automock)]
pub trait ScaffoldGenerator: Send + Sync {
    fn scaffold(&self) -> Result<String, DiffError>;
}

/// One file of a scaffold and the symbols touched in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaffoldEntry {
    pub path: String,
    pub symbols: Vec<String>,
}

/// Render scaffold entries.
///
/// The first symbol of a file shares the `* file` line; every further symbol
/// gets its own `(symbol):` line, the layout the formatter produces.
///
/// ```text
/// * lisp/util.el (util-helper):
/// (util-other):
/// * README:
/// ```
pub fn render_scaffold(entries: &[ScaffoldEntry]) -> String {
    let mut out = String::new();

    for entry in entries {
        match entry.symbols.split_first() {
            Some((first, rest)) => {
                out.push_str(&format!("* {} ({}):\n", entry.path, first));
                for symbol in rest {
                    out.push_str(&format!("({}):\n", symbol));
                }
            }
            None => out.push_str(&format!("* {}:\n", entry.path)),
        }
    }

    out
}
