//! Core domain types
//!
//! These types describe what the poller works with: the run handed out by the
//! hub, the CSV the scraper leaves behind, and where that CSV ends up in
//! object storage.

pub mod export;
pub mod run;
