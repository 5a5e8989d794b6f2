//! ChangeLog commit messages: scaffolds, filling and formatting.

pub mod fill;
pub mod format;
pub mod scaffold;

pub use format::{FillOptions, format_message, is_entry_header};
pub use scaffold::{ScaffoldEntry, ScaffoldGenerator, render_scaffold};
