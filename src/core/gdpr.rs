//! Data-lifecycle housekeeping: audit trail, retention cleanup, erasure
//!
//! Audit writes are best-effort: a failure to append an audit row is logged
//! and must never break the operation being audited. The cleanup job deletes
//! rows older than the per-entity-type retention window and is intended to
//! run daily.

use chrono::{Duration, Utc};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::EngineResult;
use crate::traits::{ComplianceStore, ExecutionLogStore, LeadStore};
use crate::types::{AuditAction, AuditEntry, Lead, RetentionPolicy};

/// Default retention windows seeded on startup.
pub fn default_policies() -> Vec<RetentionPolicy> {
    vec![
        RetentionPolicy { entity_type: "lead".to_string(), retention_days: 730 },
        RetentionPolicy { entity_type: "execution_log".to_string(), retention_days: 365 },
        RetentionPolicy { entity_type: "audit_log".to_string(), retention_days: 2555 },
    ]
}

/// Seed the default retention policies, overwriting stale windows.
pub async fn initialize_retention_policies<C: ComplianceStore>(store: &C) -> EngineResult<()> {
    for policy in default_policies() {
        store.upsert_policy(policy).await?;
    }
    info!("data retention policies initialized");
    Ok(())
}

/// Best-effort audit append.
pub async fn audit<C: ComplianceStore>(
    store: &C,
    action: AuditAction,
    entity_type: &str,
    entity_id: Option<&str>,
    details: Option<String>,
) {
    let entry = AuditEntry {
        id: uuid::Uuid::new_v4(),
        action,
        entity_type: entity_type.to_string(),
        entity_id: entity_id.map(|id| id.to_string()),
        details,
        recorded_at: Utc::now(),
    };

    if let Err(error) = store.append_audit(entry).await {
        warn!(%error, "failed to append audit row");
    }
}

/// Delete rows older than each entity type's retention window.
/// Returns deleted counts keyed by entity type.
pub async fn cleanup_expired<C, L, X>(
    compliance: &C,
    leads: &L,
    logs: &X,
) -> EngineResult<HashMap<String, u64>>
where
    C: ComplianceStore,
    L: LeadStore,
    X: ExecutionLogStore,
{
    let mut deleted = HashMap::new();

    for policy in compliance.list_policies().await? {
        let cutoff = Utc::now() - Duration::days(policy.retention_days);

        let count = match policy.entity_type.as_str() {
            "lead" => leads.delete_older_than(cutoff).await?,
            "execution_log" => logs.delete_older_than(cutoff).await?,
            "audit_log" => compliance.delete_audit_older_than(cutoff).await?,
            other => {
                warn!(entity_type = other, "no cleanup handler for retention policy");
                continue;
            }
        };

        if count > 0 {
            audit(
                compliance,
                AuditAction::Delete,
                &policy.entity_type,
                None,
                Some(format!("retention cleanup removed {count} rows")),
            )
            .await;
        }
        deleted.insert(policy.entity_type, count);
    }

    info!(?deleted, "retention cleanup finished");
    Ok(deleted)
}

/// Right-to-erasure: remove one contact's lead row, audited.
pub async fn erase_contact<C, L>(compliance: &C, leads: &L, email: &str) -> EngineResult<bool>
where
    C: ComplianceStore,
    L: LeadStore,
{
    let normalized = email.to_lowercase();
    let existed = leads.delete_by_email(&normalized).await?;

    if existed {
        audit(
            compliance,
            AuditAction::Delete,
            "lead",
            Some(&normalized),
            Some("right-to-erasure request".to_string()),
        )
        .await;
    }
    Ok(existed)
}

/// Data-export request for one contact, audited as an export access.
pub async fn export_contact<C, L>(
    compliance: &C,
    leads: &L,
    email: &str,
) -> EngineResult<Option<Lead>>
where
    C: ComplianceStore,
    L: LeadStore,
{
    let normalized = email.to_lowercase();
    let lead = leads.get_by_email(&normalized).await?;

    if lead.is_some() {
        audit(compliance, AuditAction::Export, "lead", Some(&normalized), None).await;
    }
    Ok(lead)
}
