//! Service layer
//!
//! Services do the work of a run: starting the scraper, finding its export,
//! and uploading it. They know nothing about the hub.
//!
//! Services with external side effects are trait-based so the scheduler can
//! be driven by fakes in tests.

pub mod export;
mod scraper;
mod upload;

// Re-export traits
pub use scraper::ScraperService;
pub use upload::UploadService;

// Re-export implementations
pub use scraper::ProcessScraper;
pub use upload::S3UploadService;
