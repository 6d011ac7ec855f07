//! # External API Clients
//!
//! Thin HTTP clients for the prison source system and the probation recall
//! lookup. The traits are the seams the poller and calculators depend on;
//! tests substitute stub implementations, production wires the reqwest-backed
//! clients.

pub mod prison_api;
pub mod probation_api;

pub use prison_api::{HttpPrisonApiClient, PrisonApi};
pub use probation_api::{HttpProbationApiClient, ProbationApi};
