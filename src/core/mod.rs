//! Core pipeline algorithms
//!
//! Pure or near-pure components that can be tested without real network
//! clients: query construction, quota accounting, domain discovery, email
//! candidate selection, the dedup/publish pass, performance analysis, A/B
//! test math, and data-lifecycle housekeeping.

pub mod abtest;
pub mod analyzer;
pub mod discovery;
pub mod emails;
pub mod gdpr;
pub mod publish;
pub mod query;
pub mod rate;
pub mod summary;

pub use publish::{PublishContext, PublishOutcome};
pub use query::build_search_query;
pub use rate::RateGovernor;
