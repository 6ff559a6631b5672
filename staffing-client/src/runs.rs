//! Scraper-run API endpoints

use crate::error::{ClientError, Result};
use crate::{HubClient, SECRET_HEADER};
use reqwest::StatusCode;
use staffing_core::domain::run::RunClaim;
use staffing_core::dto::run::{ClaimRequest, CompleteRunRequest};
use tracing::debug;

/// Requests a new run (what the hub UI calls)
pub const RUN_PATH: &str = "/staffing/scraper/run";
/// Hands the next pending run to a poller
pub const CLAIM_PATH: &str = "/staffing/scraper/claim";
/// Records the outcome of a claimed run
pub const COMPLETE_PATH: &str = "/staffing/scraper/complete";

impl HubClient {
    // =============================================================================
    // Run Lifecycle (Poller-specific)
    // =============================================================================

    /// Claim the next pending run
    ///
    /// # Returns
    /// `None` when the hub has nothing pending (`204 No Content` or a JSON
    /// `null` body), otherwise the claimed run
    pub async fn claim_run(&self, req: &ClaimRequest) -> Result<Option<RunClaim>> {
        let url = self.endpoint(CLAIM_PATH);
        debug!("Claiming run at {}", url);

        let response = self
            .client
            .post(&url)
            .header(SECRET_HEADER, &self.secret)
            .json(req)
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        self.handle_response(response).await
    }

    /// Report the outcome of a claimed run
    ///
    /// # Arguments
    /// * `req` - Run id, `success`/`error` and the accompanying detail
    pub async fn complete_run(&self, req: &CompleteRunRequest) -> Result<()> {
        let url = self.endpoint(COMPLETE_PATH);
        debug!("Reporting run {} as {} to {}", req.run_id, req.status, url);

        let response = self
            .client
            .post(&url)
            .header(SECRET_HEADER, &self.secret)
            .json(req)
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    // =============================================================================
    // Run Requests (Operator-specific)
    // =============================================================================

    /// Ask the hub to schedule a new run
    ///
    /// # Returns
    /// The hub's response body, passed through as-is; `Value::Null` when
    /// the hub answers without a body
    pub async fn trigger_run(&self) -> Result<serde_json::Value> {
        let url = self.endpoint(RUN_PATH);
        debug!("Requesting run at {}", url);

        let response = self
            .client
            .post(&url)
            .header(SECRET_HEADER, &self.secret)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        let body = self.handle_text_response(response).await?;
        if body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}
