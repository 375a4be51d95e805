//! Progress lines a user sees on the console during a run.

mod common;

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use common::ZipBuilder;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;
use zipdeploy::{DeployOptions, deploy_file};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn take_lines(&self) -> Vec<String> {
        let bytes = std::mem::take(&mut *self.0.lock().unwrap());
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    }
}

/// Same formatting as the binary, writing into memory.
fn console(writer: Captured) -> impl tracing::Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("info"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_target(false)
        .with_level(false)
        .finish()
}

#[tokio::test]
async fn prints_progress_for_changed_entries_only() {
    let captured = Captured::default();
    let _guard = tracing::subscriber::set_default(console(captured.clone()));

    let work = TempDir::new().unwrap();
    let archive = work.path().join("build.zip");
    ZipBuilder::new()
        .dir("static/")
        .file("static/app.js", b"console.log('v2')")
        .file("index.html", b"<html>v2</html>")
        .write_to(&archive);
    let options = DeployOptions::new(work.path().join("dest")).staging_parent(work.path());

    deploy_file(&archive, &options).await.unwrap();
    assert_eq!(
        captured.take_lines(),
        [
            "Extracting: static/app.js",
            "Extracting: index.html",
            "Copying from temp dir to destination...",
            "Done.",
        ]
    );

    deploy_file(&archive, &options).await.unwrap();
    assert!(captured.take_lines().is_empty());
}
