//! Run configuration passed explicitly into a deployment.

use std::path::{Path, PathBuf};

use crate::deploy::CompareStrategy;

/// Where and how a deployment runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployOptions {
    destination: PathBuf,
    staging_parent: Option<PathBuf>,
    strategy: CompareStrategy,
}

impl DeployOptions {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            staging_parent: None,
            strategy: CompareStrategy::default(),
        }
    }

    /// Create staging roots under `parent` instead of the system temp directory.
    pub fn staging_parent(mut self, parent: impl Into<PathBuf>) -> Self {
        self.staging_parent = Some(parent.into());
        self
    }

    pub fn strategy(mut self, strategy: CompareStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn staging_parent_dir(&self) -> Option<&Path> {
        self.staging_parent.as_deref()
    }

    pub fn compare_strategy(&self) -> CompareStrategy {
        self.strategy
    }
}
