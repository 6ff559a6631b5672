//! Run poller
//!
//! Claims runs from the hub and executes them one at a time. Every claimed
//! run ends in exactly one report: `success` after the export was produced
//! and uploaded, `error` if any step failed. Failures never end the loop;
//! the only way out is the shutdown signal.

use chrono::{Local, NaiveDate, Utc};
use staffing_core::domain::export::{ExportArtifact, FOLDER_DATE_FORMAT, ObjectKey};
use staffing_core::domain::run::{ReportStatus, RunClaim, RunStatus, RunSummary};
use staffing_core::dto::run::{CompleteRunRequest, RunOutcome};
use std::future::{self, Future};
use std::sync::Arc;
use std::task::Poll;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};

use crate::config::{Config, parse_folder_date};
use crate::error::RunError;
use crate::repository::RunRepository;
use crate::service::{ScraperService, UploadService};

/// What a single poll cycle amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing pending, or the hub could not be asked
    Idle,
    /// The hub rejected the shared secret
    Forbidden,
    /// The hub answered with a claim that has no run id
    Skipped,
    /// A run was executed and its outcome reported
    Processed { run_id: String, status: ReportStatus },
}

/// Poller that continuously claims and executes runs
pub struct RunPoller {
    config: Config,
    runs: Arc<dyn RunRepository>,
    scraper: Arc<dyn ScraperService>,
    uploads: Arc<dyn UploadService>,
}

impl RunPoller {
    /// Creates a new run poller
    pub fn new(
        config: Config,
        runs: Arc<dyn RunRepository>,
        scraper: Arc<dyn ScraperService>,
        uploads: Arc<dyn UploadService>,
    ) -> Self {
        Self {
            config,
            runs,
            scraper,
            uploads,
        }
    }

    /// Polls until `shutdown` resolves
    ///
    /// Shutdown is only observed while waiting between cycles, so a claimed
    /// run is always carried through to its report. `shutdown` is polled
    /// once before the first claim so that a signal handler behind it is
    /// installed before any run starts.
    pub async fn run_until(&self, shutdown: impl Future<Output = ()>) {
        info!(
            "Starting run poller (interval: {:?})",
            self.config.poll_interval
        );
        tokio::pin!(shutdown);

        let requested =
            future::poll_fn(|cx| Poll::Ready(shutdown.as_mut().poll(cx).is_ready())).await;
        if requested {
            info!("Shutdown requested before the first poll");
            return;
        }

        loop {
            let outcome = self.poll_once().await;
            let delay = self.next_delay(&outcome);
            debug!("Cycle ended with {:?}, next poll in {:?}", outcome, delay);

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping poller");
                    return;
                }
                _ = time::sleep(delay) => {}
            }
        }
    }

    /// How long to wait before the next claim
    ///
    /// Fixed intervals, no backoff: idle polls wait `poll_interval`, a
    /// rejected secret waits `forbidden_backoff`, anything that touched a
    /// run waits `run_cooldown`.
    pub fn next_delay(&self, outcome: &CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::Idle => self.config.poll_interval,
            CycleOutcome::Forbidden => self.config.forbidden_backoff,
            CycleOutcome::Skipped | CycleOutcome::Processed { .. } => self.config.run_cooldown,
        }
    }

    /// Performs a single claim/execute/report cycle
    pub async fn poll_once(&self) -> CycleOutcome {
        let Some(claim) = self.poll().await else {
            return CycleOutcome::Idle;
        };

        let claim = match claim {
            Ok(claim) => claim,
            Err(outcome) => return outcome,
        };

        let Some(run_id) = claim.run_id().map(str::to_string) else {
            warn!("Claim response without runId: {:?}", claim);
            return CycleOutcome::Skipped;
        };

        info!("Claimed run {}", run_id);

        let request = match self.execute(&claim).await {
            Ok(outcome) => {
                info!("Run {} finished: {}", run_id, outcome.message);
                CompleteRunRequest::success(&run_id, outcome)
            }
            Err(e) => {
                error!("Run {} failed: {}", run_id, e);
                CompleteRunRequest::failure(&run_id, e.to_string())
            }
        };

        let status = request.status;
        self.report(&request).await;

        CycleOutcome::Processed { run_id, status }
    }

    /// Asks the hub for a run
    ///
    /// `None` means nothing to do this cycle. Transport failures and hub
    /// errors are logged and treated like an empty poll; a rejected secret
    /// is surfaced separately so the loop can hold off longer.
    async fn poll(&self) -> Option<Result<RunClaim, CycleOutcome>> {
        match self.runs.claim_run().await {
            Ok(Some(claim)) => Some(Ok(claim)),
            Ok(None) => {
                debug!("No pending run");
                None
            }
            Err(e) if e.is_forbidden() => {
                error!("Hub rejected the scraper secret (403)");
                Some(Err(CycleOutcome::Forbidden))
            }
            Err(e) if e.is_server_error() => {
                warn!("Claim endpoint unavailable: {}", e);
                None
            }
            Err(e) if e.is_client_error() => {
                error!("Hub refused the claim request: {}", e);
                None
            }
            Err(e) => {
                error!("Claim request failed: {}", e);
                None
            }
        }
    }

    /// Runs the scraper and uploads its export
    async fn execute(&self, claim: &RunClaim) -> Result<RunOutcome, RunError> {
        let folder_date = self.folder_date(claim)?;
        let artifact = self.scraper.run_scraper().await?;
        let file_key = self.upload(&artifact, folder_date).await?;

        let rows = artifact.data_rows();
        Ok(RunOutcome {
            file_key,
            file_name: artifact.file_name,
            folder_date: folder_date.format(FOLDER_DATE_FORMAT).to_string(),
            summary: RunSummary {
                total_rows: rows,
                generated_at: Utc::now(),
            },
            message: format!("{} Kontakte verarbeitet", rows),
        })
    }

    /// Date partition for this run: claim, then config, then today
    fn folder_date(&self, claim: &RunClaim) -> Result<NaiveDate, RunError> {
        match claim.folder_date.as_deref().map(str::trim) {
            Some(date) if !date.is_empty() => {
                parse_folder_date(date).map_err(|_| RunError::InvalidFolderDate(date.to_string()))
            }
            _ => Ok(self
                .config
                .folder_date
                .unwrap_or_else(|| Local::now().date_naive())),
        }
    }

    /// Uploads the export, returning its key, or `None` when no bucket is set
    async fn upload(
        &self,
        artifact: &ExportArtifact,
        folder_date: NaiveDate,
    ) -> Result<Option<String>, RunError> {
        let Some(bucket) = &self.config.storage.bucket else {
            warn!(
                "No bucket configured, skipping upload of {}",
                artifact.file_name
            );
            return Ok(None);
        };

        let key = ObjectKey::new(
            bucket.as_str(),
            &self.config.storage.folder,
            folder_date,
            &artifact.file_name,
        );
        self.uploads.upload(artifact, &key).await?;
        info!("Uploaded export to {}", key);

        Ok(Some(key.key().to_string()))
    }

    /// Sends the final report; failures are logged, not retried
    async fn report(&self, request: &CompleteRunRequest) {
        debug_assert!(RunStatus::Claimed.can_transition_to(request.status.run_status()));

        match self.runs.complete_run(request).await {
            Ok(()) => info!("Reported run {} as {}", request.run_id, request.status),
            Err(e) => error!("Failed to report run {}: {}", request.run_id, e),
        }
    }
}
