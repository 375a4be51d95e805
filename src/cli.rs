use std::path::PathBuf;

use clap::Parser;

use crate::config::DeployOptions;
use crate::deploy::CompareStrategy;

#[derive(Parser, Debug)]
#[command(name = "zipdeploy")]
#[command(version)]
#[command(about = "Deploy a ZIP archive onto a directory, writing only what changed", long_about = None)]
#[command(after_help = "Examples:\n  \
  zipdeploy build.zip -d /srv/app          update /srv/app from build.zip\n  \
  zipdeploy https://ci.example.com/b.zip   deploy a remote archive into the current directory")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "ARCHIVE")]
    pub archive: Option<String>,

    /// Destination directory (default: current directory)
    #[arg(short = 'd', short_alias = 'D', value_name = "DIR")]
    pub destination: Option<PathBuf>,

    /// Directory in which to create the staging area (default: system temp dir)
    #[arg(long = "staging-dir", value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// How to decide whether an existing file is up to date
    #[arg(long = "compare", value_enum, default_value_t = CompareStrategy::Hash)]
    pub compare: CompareStrategy,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count, conflicts_with = "verbose")]
    pub quiet: u8,

    /// Show per-entry decisions
    #[arg(short = 'v')]
    pub verbose: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.archive
            .as_deref()
            .is_some_and(|a| a.starts_with("http://") || a.starts_with("https://"))
    }

    /// Log filter directive for the chosen verbosity.
    pub fn log_level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (true, _) => "debug",
            (false, 0) => "info",
            (false, 1) => "warn",
            (false, _) => "error",
        }
    }

    /// Build run options, defaulting the destination to `cwd`.
    pub fn options(&self, cwd: PathBuf) -> DeployOptions {
        let destination = self.destination.clone().unwrap_or(cwd);
        let options = DeployOptions::new(destination).strategy(self.compare);
        match &self.staging_dir {
            Some(dir) => options.staging_parent(dir),
            None => options,
        }
    }
}
