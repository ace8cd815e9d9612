//! Error reports for responses that could not be decoded

use chrono::Local;
use comet_common::Result;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Writes `<service>-error-<timestamp>-<id>.log` files holding the request
/// URL, decoder error and raw body of an unparseable response.
#[derive(Debug, Clone)]
pub struct DiagnosticWriter {
    dir: PathBuf,
    service: String,
}

impl DiagnosticWriter {
    /// Writer for `service` reports under `dir`
    pub fn new(dir: impl Into<PathBuf>, service: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            service: service.into(),
        }
    }

    /// Report directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(&self) -> String {
        let timestamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
        let id = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-error-{timestamp}-{}.log", self.service, &id[..8])
    }

    fn render(&self, url: &str, error: &str, body: &str) -> String {
        format!(
            "time: {}\nservice: {}\nurl: {url}\nerror: {error}\n\n--- raw body ---\n{body}\n",
            Local::now().to_rfc3339(),
            self.service,
        )
    }

    /// Write a report and return its path
    pub async fn write_report(&self, url: &str, error: &str, body: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(self.file_name());
        tokio::fs::write(&path, self.render(url, error, body)).await?;

        info!(path = %path.display(), "Wrote diagnostic report");
        Ok(path)
    }

    /// Write a report in the background. Failures are logged, never returned.
    pub fn capture(&self, url: impl Into<String>, error: impl ToString, body: impl Into<String>) {
        let writer = self.clone();
        let (url, error, body) = (url.into(), error.to_string(), body.into());

        tokio::spawn(async move {
            if let Err(e) = writer.write_report(&url, &error, &body).await {
                error!(error = %e, "Failed to write diagnostic report");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DiagnosticWriter::new(dir.path().join("diag"), "twitter");

        let path = writer
            .write_report("https://api.example.com/x", "expected value", "<html>")
            .await
            .unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("twitter-error-"));
        assert!(name.ends_with(".log"));

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("url: https://api.example.com/x"));
        assert!(content.contains("error: expected value"));
        assert!(content.contains("<html>"));
    }

    #[tokio::test]
    async fn test_reports_get_distinct_names() {
        let dir = tempfile::tempdir().unwrap();
        let writer = DiagnosticWriter::new(dir.path(), "twitter");

        let first = writer.write_report("u", "e", "b").await.unwrap();
        let second = writer.write_report("u", "e", "b").await.unwrap();
        assert_ne!(first, second);
    }
}
