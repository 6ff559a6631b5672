//! Scraper service
//!
//! Runs the external browser-automation command as a child process and
//! picks up the CSV it leaves in the export directory. The scraper itself is
//! opaque: it reads its own saved session and writes exactly one export.

use async_trait::async_trait;
use staffing_core::domain::export::ExportArtifact;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ScraperConfig;
use crate::error::RunError;
use crate::service::export::{self, ExportSnapshot};

/// Service trait for producing an export
#[async_trait]
pub trait ScraperService: Send + Sync {
    /// Runs the scraper to completion and returns the export it produced
    ///
    /// A non-zero exit is an error; nothing is uploaded in that case.
    async fn run_scraper(&self) -> Result<ExportArtifact, RunError>;
}

/// Runs the scraper as a local subprocess
pub struct ProcessScraper {
    config: ScraperConfig,
}

impl ProcessScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self { config }
    }

    fn command_line(&self) -> String {
        std::iter::once(self.config.python.as_str())
            .chain(self.config.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl ScraperService for ProcessScraper {
    async fn run_scraper(&self) -> Result<ExportArtifact, RunError> {
        let export_dir = self.config.export_path();
        let export_error = |source| RunError::ExportDir {
            dir: export_dir.clone(),
            source,
        };

        tokio::fs::create_dir_all(&export_dir)
            .await
            .map_err(export_error)?;
        let before = ExportSnapshot::capture(&export_dir).map_err(export_error)?;
        debug!(
            "{} existing export(s) in {}",
            before.len(),
            export_dir.display()
        );

        let command_line = self.command_line();
        info!("Starting scraper: {}", command_line);

        let mut command = Command::new(&self.config.python);
        command.args(&self.config.args);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let status = command.status().await.map_err(|source| RunError::Spawn {
            command: command_line,
            source,
        })?;

        if !status.success() {
            return Err(RunError::ScraperFailed {
                code: status.code(),
            });
        }

        let path = before
            .detect_new(&export_dir)
            .map_err(export_error)?
            .ok_or_else(|| RunError::NoExport(export_dir.clone()))?;
        info!("Detected export {}", path.display());

        export::load_artifact(path).map_err(export_error)
    }
}
