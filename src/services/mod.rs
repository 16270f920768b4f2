//! Production service implementations
//!
//! Real HTTP clients for the external APIs plus the in-memory store used by
//! the CLI and tests. Everything here implements a trait from
//! `crate::traits`, so the engine never depends on these types directly.

pub mod crm;
pub mod emails;
pub mod engagement;
pub mod notify;
pub mod search;
pub mod store;

pub use crm::ActiveCampaignClient;
pub use emails::HunterClient;
pub use engagement::CrmEngagementSource;
pub use notify::EmailNotifier;
pub use search::GoogleSearchClient;
pub use store::MemoryStore;
