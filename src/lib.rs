//! # zipdeploy
//!
//! Differential, near-atomic deployment of a ZIP archive onto a live
//! directory tree.
//!
//! Only entries whose content differs from the destination (by MD5 digest,
//! or a full byte comparison) are extracted. They are first written into a
//! private staging directory and then overlaid onto the destination in one
//! pass, so the destination spends as little time as possible in a
//! half-updated state. Files in the destination that the archive does not
//! mention are left alone.
//!
//! ## Features
//!
//! - Content-based change detection with a pluggable [`ChangeDetector`]
//! - ZIP and ZIP64 archives, STORED and DEFLATE entries, CRC-32 verification
//! - Archives from the local filesystem or from HTTP URLs via Range requests
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use zipdeploy::{DeployOptions, deploy_file};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let options = DeployOptions::new("/srv/app");
//!     let report = deploy_file(Path::new("build.zip"), &options).await?;
//!     if report.is_up_to_date() {
//!         println!("nothing to do");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod deploy;
pub mod error;
pub mod io;
pub mod zip;

pub use cli::Cli;
pub use config::DeployOptions;
pub use deploy::{ChangeDetector, CompareStrategy, DeployReport, deploy, deploy_file};
pub use error::{ArchiveError, DeployError, ErrorKind};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use zip::{Archive, ArchiveEntry};
