//! Domain types shared across the prospecting pipeline
//!
//! Weights travel as strings end to end: the ICP table stores them as decimal
//! strings and lead snapshots must round-trip them without precision changes.
//! Parsing to f64 happens only at the point of use, with malformed values
//! treated as 0 (excluded from query construction).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One weighted attribute/value row of the Ideal Customer Profile table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcpRow {
    pub id: u64,
    pub attribute: String,
    pub value: String,
    /// Decimal weight as stored, e.g. "1.00". Parses to 0 when malformed.
    pub weight: String,
}

impl IcpRow {
    pub fn new(id: u64, attribute: &str, value: &str, weight: &str) -> Self {
        Self {
            id,
            attribute: attribute.to_string(),
            value: value.to_string(),
            weight: weight.to_string(),
        }
    }

    /// Numeric weight; malformed strings count as 0 by policy.
    pub fn weight_value(&self) -> f64 {
        self.weight.trim().parse().unwrap_or(0.0)
    }
}

/// Point-in-time copy of an ICP row, attached to each lead for attribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcpSnapshotEntry {
    pub attribute: String,
    pub value: String,
    pub weight: String,
}

impl From<&IcpRow> for IcpSnapshotEntry {
    fn from(row: &IcpRow) -> Self {
        Self {
            attribute: row.attribute.clone(),
            value: row.value.clone(),
            weight: row.weight.clone(),
        }
    }
}

/// A discovered email with enrichment data from the email-discovery API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailCandidate {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub seniority: Option<String>,
    pub department: Option<String>,
    pub linkedin: Option<String>,
    pub confidence: u32,
    pub verification_status: Option<String>,
}

impl EmailCandidate {
    pub fn bare(email: &str, confidence: u32) -> Self {
        Self {
            email: email.to_string(),
            first_name: None,
            last_name: None,
            position: None,
            seniority: None,
            department: None,
            linkedin: None,
            confidence,
            verification_status: None,
        }
    }
}

/// Raw record returned by the email-discovery API before candidate selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailRecord {
    pub email: String,
    /// "personal" or "generic"; only personal addresses become candidates.
    pub address_type: String,
    pub confidence: u32,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub seniority: Option<String>,
    pub department: Option<String>,
    pub linkedin: Option<String>,
    pub verification_status: Option<String>,
}

/// Durable record of a published lead; uniqueness on (lowercased) email is
/// the system's deduplication mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub email: String,
    pub domain: String,
    pub posted_at: DateTime<Utc>,
    pub execution_log_id: u64,
    pub search_query: String,
    /// JSON array of snapshot entries captured at publish time.
    pub icp_snapshot: String,
}

/// What started a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggeredBy {
    Scheduled,
    Manual,
}

impl std::fmt::Display for TriggeredBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriggeredBy::Scheduled => write!(f, "scheduled"),
            TriggeredBy::Manual => write!(f, "manual"),
        }
    }
}

/// Execution log lifecycle; terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// One record per pipeline run, updated incrementally as stages complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub domains_found: u32,
    pub emails_found: u32,
    pub leads_posted: u32,
    pub error_message: Option<String>,
    pub search_query: Option<String>,
    pub triggered_by: TriggeredBy,
}

/// Partial update applied to an execution log; `None` fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct ExecutionLogUpdate {
    pub completed_at: Option<DateTime<Utc>>,
    pub status: Option<RunStatus>,
    pub domains_found: Option<u32>,
    pub emails_found: Option<u32>,
    pub leads_posted: Option<u32>,
    pub error_message: Option<String>,
    pub search_query: Option<String>,
}

/// Structured result returned to whatever triggered a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProspectingResult {
    pub success: bool,
    pub domains_found: u32,
    pub emails_found: u32,
    pub leads_posted: u32,
    pub duplicates_skipped: u32,
    pub error: Option<String>,
    pub execution_log_id: Option<u64>,
}

/// Report pushed through the notification sink after a run reaches a
/// terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub execution_log_id: u64,
    pub status: RunStatus,
    pub domains_found: u32,
    pub emails_found: u32,
    pub leads_posted: u32,
    pub duplicates_skipped: u32,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// External services with metered daily quotas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Service {
    Search,
    EmailDiscovery,
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Service::Search => write!(f, "search"),
            Service::EmailDiscovery => write!(f, "email-discovery"),
        }
    }
}

/// Informational traffic-light tier; the hard gate is the remaining-capacity
/// check, not this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaHealth {
    Healthy,
    Warning,
    Critical,
}

/// Current usage snapshot for one metered service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub service: Service,
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub percentage: f64,
    pub health: QuotaHealth,
}

/// A/B test lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Draft,
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbTest {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub status: TestStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub winning_variant_id: Option<u64>,
}

/// One arm of an A/B test with its own ICP snapshot and running stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbVariant {
    pub id: u64,
    pub test_id: u64,
    pub name: String,
    pub icp_snapshot: String,
    pub execution_count: u32,
    pub total_leads: u32,
    pub avg_engagement: f64,
}

/// Weight-adjustment direction suggested by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Increase,
    Decrease,
    Maintain,
}

/// Aggregated engagement performance of one (attribute, value) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributePerformance {
    pub attribute: String,
    pub value: String,
    pub current_weight: f64,
    pub leads_generated: u32,
    pub avg_engagement: f64,
    pub suggested_weight: f64,
    pub recommendation: Recommendation,
    pub reason: String,
}

/// Full analyzer output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningInsights {
    pub total_leads_analyzed: u32,
    pub avg_engagement: f64,
    pub attribute_performance: Vec<AttributePerformance>,
    pub top_performers: Vec<AttributePerformance>,
    pub underperformers: Vec<AttributePerformance>,
    pub recommendations: Vec<String>,
}

/// Toggle-able notification recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecipient {
    pub id: u64,
    pub email: String,
    pub is_active: bool,
}

/// GDPR audit trail actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Read,
    Update,
    Delete,
    Export,
}

/// Append-only audit row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: uuid::Uuid,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: Option<String>,
    pub details: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Per-entity-type retention window consumed by the cleanup job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub entity_type: String,
    pub retention_days: i64,
}

/// Aggregation of the last seven days of execution logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub total_runs: u32,
    pub completed_runs: u32,
    pub failed_runs: u32,
    pub domains_found: u32,
    pub emails_found: u32,
    pub leads_posted: u32,
}
