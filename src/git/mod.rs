//! Git operations using git2-rs.

pub mod diff;
pub mod scaffold;

pub use diff::{ChangedFile, DiffSummary, FileStatus, collect_diff, open_repository};
pub use scaffold::GitScaffold;
