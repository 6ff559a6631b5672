//! Runs repository
//!
//! Handles communication with the hub for run-related operations:
//! - Claiming the next pending run
//! - Reporting the outcome of a claimed run

use async_trait::async_trait;
use staffing_client::HubClient;
use staffing_core::domain::run::RunClaim;
use staffing_core::dto::run::{ClaimRequest, CompleteRunRequest};

/// Repository trait for run-related operations with the hub
#[async_trait]
pub trait RunRepository: Send + Sync {
    /// Claims the next pending run
    ///
    /// Returns `None` when nothing is pending.
    async fn claim_run(&self) -> staffing_client::Result<Option<RunClaim>>;

    /// Reports the outcome of a claimed run
    async fn complete_run(&self, request: &CompleteRunRequest) -> staffing_client::Result<()>;
}

/// HTTP implementation of RunRepository
pub struct HttpRunRepository {
    client: HubClient,
    poller_id: String,
}

impl HttpRunRepository {
    /// Creates a new HTTP run repository
    ///
    /// # Arguments
    /// * `client` - Hub client carrying base URL and secret
    /// * `poller_id` - Identifier sent along with every claim
    pub fn new(client: HubClient, poller_id: String) -> Self {
        Self { client, poller_id }
    }
}

#[async_trait]
impl RunRepository for HttpRunRepository {
    async fn claim_run(&self) -> staffing_client::Result<Option<RunClaim>> {
        self.client
            .claim_run(&ClaimRequest {
                poller_id: Some(self.poller_id.clone()),
            })
            .await
    }

    async fn complete_run(&self, request: &CompleteRunRequest) -> staffing_client::Result<()> {
        self.client.complete_run(request).await
    }
}
