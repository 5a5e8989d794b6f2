//! Change context gathered for the prompt.
//!
//! The diff being described is always part of the context. With
//! `--all-visible`, the sources the user listed are added in front of it.

pub mod formatter;
pub mod sources;

use std::fmt;
use std::path::PathBuf;

use tracing::debug;

pub use formatter::{FencedFormatter, MAX_SOURCE_LENGTH, NullFormatter};
pub use sources::{FileSources, NoVisibleSources};

/// Something whose content can be shown to the model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContextSource {
    /// The diff being described.
    Diff,
    /// A file on disk.
    File(PathBuf),
}

impl fmt::Display for ContextSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextSource::Diff => write!(f, "diff"),
            ContextSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Enumerates the sources currently visible to the user.
#[cfg_attr(test, mockall::automock)]
pub trait VisibleSources: Send + Sync {
    /// The visible sources, or `None` when they cannot be determined.
    fn visible_sources(&self) -> Option<Vec<ContextSource>>;
}

/// Renders sources into a single text blob.
#[cfg_attr(test, mockall::automock)]
pub trait ContentFormatter: Send + Sync {
    /// Render `sources` in order. Unavailable sources are skipped.
    fn format(&self, sources: &[ContextSource]) -> String;
}

/// Gathers the context text for a generation.
pub struct ContextCollector {
    visible: Box<dyn VisibleSources>,
    formatter: Box<dyn ContentFormatter>,
}

impl ContextCollector {
    pub fn new(visible: Box<dyn VisibleSources>, formatter: Box<dyn ContentFormatter>) -> Self {
        Self { visible, formatter }
    }

    /// A collector that never produces any context.
    pub fn empty() -> Self {
        Self::new(Box::new(NoVisibleSources), Box::new(NullFormatter))
    }

    /// Collect the context text.
    ///
    /// Without `use_all_visible` only the diff is rendered. Otherwise the
    /// visible sources come first, without duplicates, followed by the diff
    /// unless it is already among them. Never fails; an empty string means
    /// no context is available.
    pub fn collect(&self, use_all_visible: bool) -> String {
        let sources = if use_all_visible {
            match self.visible.visible_sources() {
                Some(visible) => with_diff(visible),
                None => {
                    debug!("Visible sources unavailable, using the diff only");
                    vec![ContextSource::Diff]
                }
            }
        } else {
            vec![ContextSource::Diff]
        };

        let context = self.formatter.format(&sources);
        if context.is_empty() {
            debug!("No context available for {} sources", sources.len());
        }
        context
    }
}

/// De-duplicate `visible` (first occurrence wins) and append the diff if absent.
fn with_diff(visible: Vec<ContextSource>) -> Vec<ContextSource> {
    let mut sources: Vec<ContextSource> = Vec::with_capacity(visible.len() + 1);
    for source in visible {
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    if !sources.contains(&ContextSource::Diff) {
        sources.push(ContextSource::Diff);
    }
    sources
}
