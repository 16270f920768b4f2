//! Collaborator traits with mockall annotations for testing
//!
//! Every external dependency of the pipeline is expressed as a trait here:
//! the three network APIs, the engagement source, the notification sink, and
//! the storage repositories. The engine can then be exercised end to end
//! with generated mocks.

use chrono::{DateTime, Utc};

use crate::error::EngineResult;
use crate::types::{
    AbTest, AbVariant, AuditEntry, EmailCandidate, EmailRecord, ExecutionLog, ExecutionLogUpdate,
    IcpRow, Lead, NotificationRecipient, RetentionPolicy, RunReport, TriggeredBy,
};

/// One page of search results.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    /// Canonical result links, at most ten per page.
    pub links: Vec<String>,
    /// Whether the API reports further pages after this one.
    pub has_more: bool,
}

/// Web search API abstraction (Google Custom Search in production).
///
/// Pagination is cursor-free: `start_index` is 1-based and advances in steps
/// of the fixed page size (10).
#[mockall::automock]
#[async_trait::async_trait]
pub trait SearchApi: Send + Sync {
    async fn search(&self, query: &str, start_index: u32) -> EngineResult<SearchPage>;
}

/// Email-discovery API abstraction (Hunter-style domain search).
///
/// Returns raw records including generic/role addresses; candidate selection
/// happens in the core.
#[mockall::automock]
#[async_trait::async_trait]
pub trait EmailDiscoveryApi: Send + Sync {
    async fn find_emails(&self, domain: &str, limit: u32) -> EngineResult<Vec<EmailRecord>>;
}

/// CRM abstraction (ActiveCampaign-style contact sync + list membership).
#[mockall::automock]
#[async_trait::async_trait]
pub trait CrmApi: Send + Sync {
    /// Create or update a contact by email, carrying enrichment fields.
    /// Returns the remote contact id.
    async fn upsert_contact(&self, candidate: &EmailCandidate, domain: &str)
        -> EngineResult<String>;

    /// Add an existing contact to the target list.
    async fn add_to_list(&self, contact_id: &str, list_id: u32) -> EngineResult<()>;
}

/// Per-contact engagement score source used by the analyzer.
#[mockall::automock]
#[async_trait::async_trait]
pub trait EngagementSource: Send + Sync {
    /// Engagement score (0-100) for a contact, `None` when the contact is
    /// unknown to the source.
    async fn score_for(&self, email: &str) -> EngineResult<Option<f64>>;
}

/// Notification sink; failures must never affect pipeline outcome, so the
/// engine logs and swallows any error returned here.
#[mockall::automock]
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, report: &RunReport) -> EngineResult<()>;

    /// Free-form operational notice (weekly summaries, cleanup reports).
    async fn notify_text(&self, subject: &str, body: &str) -> EngineResult<()>;
}

/// ICP attribute table repository.
#[mockall::automock]
#[async_trait::async_trait]
pub trait IcpStore: Send + Sync {
    async fn list_all(&self) -> EngineResult<Vec<IcpRow>>;

    /// Update the weight of one (attribute, value) pair.
    async fn upsert_weight(&self, attribute: &str, value: &str, weight: &str) -> EngineResult<()>;

    /// Replace the whole table, keeping the import contract of the original
    /// sheet sync.
    async fn bulk_replace(&self, rows: Vec<IcpRow>) -> EngineResult<()>;
}

/// Execution log repository.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ExecutionLogStore: Send + Sync {
    async fn create(&self, started_at: DateTime<Utc>, triggered_by: TriggeredBy)
        -> EngineResult<u64>;

    async fn update(&self, id: u64, update: ExecutionLogUpdate) -> EngineResult<()>;

    async fn get(&self, id: u64) -> EngineResult<Option<ExecutionLog>>;

    async fn list(&self, limit: usize) -> EngineResult<Vec<ExecutionLog>>;

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> EngineResult<u64>;
}

/// Lead repository; the unique constraint on lowercased email lives here and
/// is the pipeline's authoritative dedup/concurrency guard.
#[mockall::automock]
#[async_trait::async_trait]
pub trait LeadStore: Send + Sync {
    async fn exists_by_email(&self, email: &str) -> EngineResult<bool>;

    /// Idempotent on email: re-adding an existing lead refreshes only the
    /// `posted_at` timestamp.
    async fn upsert(&self, lead: Lead) -> EngineResult<()>;

    async fn count(&self) -> EngineResult<u64>;

    async fn list_all(&self) -> EngineResult<Vec<Lead>>;

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> EngineResult<u64>;

    /// Right-to-erasure: remove one lead by email. Returns whether a row
    /// existed.
    async fn delete_by_email(&self, email: &str) -> EngineResult<bool>;

    async fn get_by_email(&self, email: &str) -> EngineResult<Option<Lead>>;
}

/// A/B test repository.
#[mockall::automock]
#[async_trait::async_trait]
pub trait AbTestStore: Send + Sync {
    /// Create a test together with its two variants atomically.
    async fn create_test(&self, test: AbTest, variants: Vec<AbVariant>) -> EngineResult<u64>;

    async fn get_test(&self, test_id: u64) -> EngineResult<Option<AbTest>>;

    async fn list_tests(&self) -> EngineResult<Vec<AbTest>>;

    async fn update_test(&self, test: AbTest) -> EngineResult<()>;

    async fn variants_for(&self, test_id: u64) -> EngineResult<Vec<AbVariant>>;

    async fn get_variant(&self, variant_id: u64) -> EngineResult<Option<AbVariant>>;

    async fn update_variant(&self, variant: AbVariant) -> EngineResult<()>;
}

/// Audit trail + retention policy repository for GDPR housekeeping.
#[mockall::automock]
#[async_trait::async_trait]
pub trait ComplianceStore: Send + Sync {
    /// Append-only; callers swallow failures so audit problems never break
    /// the audited operation.
    async fn append_audit(&self, entry: AuditEntry) -> EngineResult<()>;

    async fn list_policies(&self) -> EngineResult<Vec<RetentionPolicy>>;

    async fn upsert_policy(&self, policy: RetentionPolicy) -> EngineResult<()>;

    async fn delete_audit_older_than(&self, cutoff: DateTime<Utc>) -> EngineResult<u64>;
}

/// Notification recipient list.
#[mockall::automock]
#[async_trait::async_trait]
pub trait RecipientStore: Send + Sync {
    async fn active_recipients(&self) -> EngineResult<Vec<NotificationRecipient>>;

    async fn upsert_recipient(&self, email: &str, is_active: bool) -> EngineResult<()>;
}
