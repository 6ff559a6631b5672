//! Scheduler layer for the poller
//!
//! This layer polls the hub for claimed runs and carries each one from
//! claim to report. Runs are handled strictly one at a time.

pub mod poller;

pub use poller::RunPoller;
