//! Data Transfer Objects for the hub's scraper API
//!
//! Request bodies sent by the poller to the hub. Field names follow the
//! hub's camelCase JSON convention.

pub mod run;
