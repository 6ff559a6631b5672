//! Repository layer
//!
//! Repositories are stateless wrappers around the hub client. They give the
//! scheduler a narrow, trait-based view of the hub API so it can be tested
//! without a network.

mod runs;

pub use runs::{HttpRunRepository, RunRepository};
