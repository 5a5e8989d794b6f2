//! Visible-source enumerators.

use std::path::PathBuf;

use super::{ContextSource, VisibleSources};

/// Sources named explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct FileSources {
    paths: Vec<PathBuf>,
}

impl FileSources {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl VisibleSources for FileSources {
    fn visible_sources(&self) -> Option<Vec<ContextSource>> {
        if self.paths.is_empty() {
            return None;
        }
        Some(
            self.paths
                .iter()
                .cloned()
                .map(ContextSource::File)
                .collect(),
        )
    }
}

/// No visible sources are ever known.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVisibleSources;

impl VisibleSources for NoVisibleSources {
    fn visible_sources(&self) -> Option<Vec<ContextSource>> {
        None
    }
}
