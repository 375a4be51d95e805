//! Command-line entry point for zipdeploy.

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use zipdeploy::{Cli, DeployError, DeployReport, HttpRangeReader, deploy, deploy_file};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cli.log_level()))
        .without_time()
        .with_target(false)
        .with_level(false)
        .init();

    match run(&cli).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            let code = err
                .downcast_ref::<DeployError>()
                .map(|e| e.kind().exit_code())
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: &Cli) -> Result<DeployReport> {
    let archive = cli.archive.as_deref().ok_or(DeployError::NoSource)?;
    let cwd = std::env::current_dir().context("cannot determine current directory")?;
    let options = cli.options(cwd);

    if cli.is_http_url() {
        let reader = HttpRangeReader::connect(archive)
            .await
            .map_err(|e| DeployError::OpenArchive {
                source_name: archive.to_string(),
                source: e.into(),
            })?;
        let reader = Arc::new(reader);
        let report = deploy(archive, reader.clone(), &options).await?;
        debug!("transferred {} bytes", reader.transferred_bytes());
        Ok(report)
    } else {
        Ok(deploy_file(Path::new(archive), &options).await?)
    }
}
