//! ICP-weighted B2B lead prospecting pipeline
//!
//! Builds a boolean search query from a weighted Ideal Customer Profile
//! table, discovers candidate company domains, finds personal emails per
//! domain, deduplicates against previously processed leads, publishes new
//! leads to a CRM list, and feeds engagement outcomes back into weight
//! recommendations.

pub mod core;
pub mod engine;
pub mod error;
pub mod schedule;
pub mod services;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use core::{build_search_query, RateGovernor};
pub use engine::{EngineConfig, ProspectingEngine};
pub use error::{EngineError, EngineResult};
pub use types::{ProspectingResult, TriggeredBy};
