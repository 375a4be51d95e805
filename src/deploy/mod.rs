//! The diff-and-apply pipeline.
//!
//! A run asks the planner which archive entries differ from the destination,
//! extracts only those into a fresh staging root, overlays the staging tree
//! onto the destination and finally removes the staging root. All slow work
//! (hashing, decompression) happens before the destination is touched, which
//! keeps the window in which it is partially updated short.

pub mod compare;
pub mod hasher;
pub mod merge;
pub mod orchestrator;
pub mod planner;
pub mod staging;

pub use compare::{ByteCompareDetector, ChangeDetector, CompareStrategy, ContentHashDetector};
pub use hasher::Digest;
pub use merge::{MergeStats, merge_tree};
pub use orchestrator::{DeployReport, deploy, deploy_file};
pub use planner::{ChangeSet, PlannedEntry, plan};
pub use staging::StagingRoot;
