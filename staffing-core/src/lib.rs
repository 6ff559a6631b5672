//! Staffing Core
//!
//! Core types shared by the staffing hub client and the scraper poller.
//!
//! This crate contains:
//! - Domain types: Scrape runs, their status, export artifacts and object keys
//! - DTOs: Request bodies exchanged with the hub's scraper API

pub mod domain;
pub mod dto;
