//! # Classification Engine
//!
//! Maps ambiguous prison source codes into canonical outcomes. The decision
//! tables themselves are pure (`rules`); the per-flow calculators (`receive`,
//! `release`, `merge`) orchestrate lookups against the prison and probation
//! APIs and apply the tables to the fetched data.

pub mod merge;
pub mod receive;
pub mod release;
pub mod rules;

pub use merge::MergeCalculator;
pub use receive::ReceiveReasonCalculator;
pub use release::ReleaseReasonCalculator;
