//! Previous-day export
//!
//! A one-shot variant of the run cycle meant for cron: run the day-plan
//! scraper once, upload the CSV under the day it describes, exit. There is
//! no hub involved, so failures surface as the process exit status.

use chrono::{Days, NaiveDate};
use staffing_core::domain::export::ObjectKey;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::DailyExportConfig;
use crate::error::RunError;
use crate::service::{ScraperService, UploadService};

/// The day an export describes: `explicit` if given, else `days_back` before `today`
pub fn target_date(
    today: NaiveDate,
    days_back: u32,
    explicit: Option<NaiveDate>,
) -> Result<NaiveDate, RunError> {
    match explicit {
        Some(date) => Ok(date),
        None => today
            .checked_sub_days(Days::new(u64::from(days_back)))
            .ok_or_else(|| {
                RunError::InvalidFolderDate(format!("{} days before {}", days_back, today))
            }),
    }
}

pub struct DailyExport {
    config: DailyExportConfig,
    scraper: Arc<dyn ScraperService>,
    uploads: Arc<dyn UploadService>,
}

impl DailyExport {
    pub fn new(
        config: DailyExportConfig,
        scraper: Arc<dyn ScraperService>,
        uploads: Arc<dyn UploadService>,
    ) -> Self {
        Self {
            config,
            scraper,
            uploads,
        }
    }

    /// Runs the export once
    ///
    /// Returns the uploaded object, or `None` if no bucket is configured.
    pub async fn run(&self, today: NaiveDate) -> Result<Option<ObjectKey>, RunError> {
        let date = target_date(today, self.config.days_back, self.config.date)?;
        info!("Exporting day plan for {}", date);

        let artifact = self.scraper.run_scraper().await?;
        info!(
            "Export {} ready ({} rows)",
            artifact.file_name,
            artifact.data_rows()
        );

        let Some(bucket) = &self.config.storage.bucket else {
            warn!("No bucket configured, keeping {} local", artifact.path.display());
            return Ok(None);
        };

        let key = ObjectKey::new(
            bucket.as_str(),
            &self.config.storage.folder,
            date,
            &artifact.file_name,
        );
        self.uploads.upload(&artifact, &key).await?;
        info!("Uploaded export to {}", key);

        Ok(Some(key))
    }
}
