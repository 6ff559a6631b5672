//! Staffing Hub HTTP Client
//!
//! A small, type-safe client for the hub's scraper-run API.
//!
//! The poller uses it to claim pending runs and report their outcome; the
//! operator `trigger` command uses it to request a run the same way the hub
//! UI does. Every request carries the shared secret in the
//! `x-scraper-secret` header.
//!
//! # Example
//!
//! ```no_run
//! use staffing_client::HubClient;
//! use staffing_core::dto::run::ClaimRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = HubClient::new("https://api.example.com", "secret")?;
//!
//!     match client.claim_run(&ClaimRequest::default()).await? {
//!         Some(claim) => println!("Claimed run {:?}", claim.run_id()),
//!         None => println!("No pending run"),
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod runs;

pub use error::{ClientError, Result};
pub use runs::{CLAIM_PATH, COMPLETE_PATH, RUN_PATH};

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Header carrying the shared secret
pub const SECRET_HEADER: &str = "x-scraper-secret";

/// Per-request timeout applied by [`HubClient::new`]
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the hub's scraper API
#[derive(Debug, Clone)]
pub struct HubClient {
    /// Base URL of the hub (e.g., "https://api.example.com")
    base_url: String,
    /// Shared secret sent with every request
    secret: String,
    /// HTTP client instance
    client: Client,
}

impl HubClient {
    /// Create a new hub client with a 30 second request timeout
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the hub API, trailing slashes are ignored
    /// * `secret` - The shared scraper secret
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(base_url, secret, client))
    }

    /// Create a new hub client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        base_url: impl Into<String>,
        secret: impl Into<String>,
        client: Client,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            secret: secret.into(),
            client,
        }
    }

    /// Get the base URL of the hub
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Check the status code and deserialize the JSON body
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Check the status code and return the raw body
    async fn handle_text_response(&self, response: reqwest::Response) -> Result<String> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response.text().await?)
    }

    /// Check the status code of a response whose body is not needed
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}
