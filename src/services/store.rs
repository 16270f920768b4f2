//! In-memory store implementing every storage trait
//!
//! Backs the CLI and the test harness. The leads map is keyed by lowercased
//! email, which is the unique constraint the dedup pipeline relies on:
//! upserting an existing key refreshes only the `posted_at` timestamp.
//! Durable/relational backing belongs behind the same traits.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::traits::{
    AbTestStore, ComplianceStore, ExecutionLogStore, IcpStore, LeadStore, RecipientStore,
};
use crate::types::{
    AbTest, AbVariant, AuditEntry, ExecutionLog, ExecutionLogUpdate, IcpRow, Lead,
    NotificationRecipient, RetentionPolicy, RunStatus, TriggeredBy,
};

#[derive(Default)]
struct StoreInner {
    icp_rows: Vec<IcpRow>,
    next_icp_id: u64,

    logs: HashMap<u64, ExecutionLog>,
    next_log_id: u64,

    // Keyed by lowercased email: the unique constraint itself.
    leads: HashMap<String, Lead>,

    tests: HashMap<u64, AbTest>,
    variants: HashMap<u64, AbVariant>,
    next_test_id: u64,
    next_variant_id: u64,

    audit: Vec<AuditEntry>,
    policies: HashMap<String, RetentionPolicy>,

    recipients: HashMap<String, NotificationRecipient>,
    next_recipient_id: u64,
}

/// Shared in-memory store; cheap to clone, all clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl IcpStore for MemoryStore {
    async fn list_all(&self) -> EngineResult<Vec<IcpRow>> {
        Ok(self.inner.read().await.icp_rows.clone())
    }

    async fn upsert_weight(&self, attribute: &str, value: &str, weight: &str) -> EngineResult<()> {
        let mut inner = self.inner.write().await;
        match inner
            .icp_rows
            .iter_mut()
            .find(|row| row.attribute == attribute && row.value == value)
        {
            Some(row) => row.weight = weight.to_string(),
            None => {
                inner.next_icp_id += 1;
                let id = inner.next_icp_id;
                inner.icp_rows.push(IcpRow::new(id, attribute, value, weight));
            }
        }
        Ok(())
    }

    async fn bulk_replace(&self, rows: Vec<IcpRow>) -> EngineResult<()> {
        let mut inner = self.inner.write().await;
        inner.next_icp_id = rows.iter().map(|row| row.id).max().unwrap_or(0);
        inner.icp_rows = rows;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ExecutionLogStore for MemoryStore {
    async fn create(
        &self,
        started_at: DateTime<Utc>,
        triggered_by: TriggeredBy,
    ) -> EngineResult<u64> {
        let mut inner = self.inner.write().await;
        inner.next_log_id += 1;
        let id = inner.next_log_id;
        inner.logs.insert(
            id,
            ExecutionLog {
                id,
                started_at,
                completed_at: None,
                status: RunStatus::Running,
                domains_found: 0,
                emails_found: 0,
                leads_posted: 0,
                error_message: None,
                search_query: None,
                triggered_by,
            },
        );
        Ok(id)
    }

    async fn update(&self, id: u64, update: ExecutionLogUpdate) -> EngineResult<()> {
        let mut inner = self.inner.write().await;
        let log = inner
            .logs
            .get_mut(&id)
            .ok_or_else(|| EngineError::storage(format!("execution log {id} not found")))?;

        if let Some(completed_at) = update.completed_at {
            log.completed_at = Some(completed_at);
        }
        if let Some(status) = update.status {
            log.status = status;
        }
        if let Some(domains_found) = update.domains_found {
            log.domains_found = domains_found;
        }
        if let Some(emails_found) = update.emails_found {
            log.emails_found = emails_found;
        }
        if let Some(leads_posted) = update.leads_posted {
            log.leads_posted = leads_posted;
        }
        if let Some(error_message) = update.error_message {
            log.error_message = Some(error_message);
        }
        if let Some(search_query) = update.search_query {
            log.search_query = Some(search_query);
        }
        Ok(())
    }

    async fn get(&self, id: u64) -> EngineResult<Option<ExecutionLog>> {
        Ok(self.inner.read().await.logs.get(&id).cloned())
    }

    async fn list(&self, limit: usize) -> EngineResult<Vec<ExecutionLog>> {
        let inner = self.inner.read().await;
        let mut logs: Vec<ExecutionLog> = inner.logs.values().cloned().collect();
        logs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        logs.truncate(limit);
        Ok(logs)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> EngineResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.logs.len();
        inner.logs.retain(|_, log| log.started_at >= cutoff);
        Ok((before - inner.logs.len()) as u64)
    }
}

#[async_trait::async_trait]
impl LeadStore for MemoryStore {
    async fn exists_by_email(&self, email: &str) -> EngineResult<bool> {
        Ok(self.inner.read().await.leads.contains_key(&email.to_lowercase()))
    }

    async fn upsert(&self, lead: Lead) -> EngineResult<()> {
        let mut inner = self.inner.write().await;
        let key = lead.email.to_lowercase();
        match inner.leads.get_mut(&key) {
            // Idempotent on email: only the timestamp refreshes.
            Some(existing) => existing.posted_at = lead.posted_at,
            None => {
                inner.leads.insert(key, lead);
            }
        }
        Ok(())
    }

    async fn count(&self) -> EngineResult<u64> {
        Ok(self.inner.read().await.leads.len() as u64)
    }

    async fn list_all(&self) -> EngineResult<Vec<Lead>> {
        Ok(self.inner.read().await.leads.values().cloned().collect())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> EngineResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.leads.len();
        inner.leads.retain(|_, lead| lead.posted_at >= cutoff);
        Ok((before - inner.leads.len()) as u64)
    }

    async fn delete_by_email(&self, email: &str) -> EngineResult<bool> {
        Ok(self.inner.write().await.leads.remove(&email.to_lowercase()).is_some())
    }

    async fn get_by_email(&self, email: &str) -> EngineResult<Option<Lead>> {
        Ok(self.inner.read().await.leads.get(&email.to_lowercase()).cloned())
    }
}

#[async_trait::async_trait]
impl AbTestStore for MemoryStore {
    async fn create_test(&self, test: AbTest, variants: Vec<AbVariant>) -> EngineResult<u64> {
        let mut inner = self.inner.write().await;
        inner.next_test_id += 1;
        let test_id = inner.next_test_id;

        let mut stored_test = test;
        stored_test.id = test_id;
        inner.tests.insert(test_id, stored_test);

        for mut variant in variants {
            inner.next_variant_id += 1;
            variant.id = inner.next_variant_id;
            variant.test_id = test_id;
            inner.variants.insert(variant.id, variant);
        }
        Ok(test_id)
    }

    async fn get_test(&self, test_id: u64) -> EngineResult<Option<AbTest>> {
        Ok(self.inner.read().await.tests.get(&test_id).cloned())
    }

    async fn list_tests(&self) -> EngineResult<Vec<AbTest>> {
        let inner = self.inner.read().await;
        let mut tests: Vec<AbTest> = inner.tests.values().cloned().collect();
        tests.sort_by_key(|test| test.id);
        Ok(tests)
    }

    async fn update_test(&self, test: AbTest) -> EngineResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.tests.contains_key(&test.id) {
            return Err(EngineError::storage(format!("A/B test {} not found", test.id)));
        }
        inner.tests.insert(test.id, test);
        Ok(())
    }

    async fn variants_for(&self, test_id: u64) -> EngineResult<Vec<AbVariant>> {
        let inner = self.inner.read().await;
        let mut variants: Vec<AbVariant> = inner
            .variants
            .values()
            .filter(|variant| variant.test_id == test_id)
            .cloned()
            .collect();
        variants.sort_by_key(|variant| variant.id);
        Ok(variants)
    }

    async fn get_variant(&self, variant_id: u64) -> EngineResult<Option<AbVariant>> {
        Ok(self.inner.read().await.variants.get(&variant_id).cloned())
    }

    async fn update_variant(&self, variant: AbVariant) -> EngineResult<()> {
        let mut inner = self.inner.write().await;
        if !inner.variants.contains_key(&variant.id) {
            return Err(EngineError::storage(format!("variant {} not found", variant.id)));
        }
        inner.variants.insert(variant.id, variant);
        Ok(())
    }
}

#[async_trait::async_trait]
impl ComplianceStore for MemoryStore {
    async fn append_audit(&self, entry: AuditEntry) -> EngineResult<()> {
        self.inner.write().await.audit.push(entry);
        Ok(())
    }

    async fn list_policies(&self) -> EngineResult<Vec<RetentionPolicy>> {
        let inner = self.inner.read().await;
        let mut policies: Vec<RetentionPolicy> = inner.policies.values().cloned().collect();
        policies.sort_by(|a, b| a.entity_type.cmp(&b.entity_type));
        Ok(policies)
    }

    async fn upsert_policy(&self, policy: RetentionPolicy) -> EngineResult<()> {
        self.inner
            .write()
            .await
            .policies
            .insert(policy.entity_type.clone(), policy);
        Ok(())
    }

    async fn delete_audit_older_than(&self, cutoff: DateTime<Utc>) -> EngineResult<u64> {
        let mut inner = self.inner.write().await;
        let before = inner.audit.len();
        inner.audit.retain(|entry| entry.recorded_at >= cutoff);
        Ok((before - inner.audit.len()) as u64)
    }
}

#[async_trait::async_trait]
impl RecipientStore for MemoryStore {
    async fn active_recipients(&self) -> EngineResult<Vec<NotificationRecipient>> {
        let inner = self.inner.read().await;
        let mut recipients: Vec<NotificationRecipient> = inner
            .recipients
            .values()
            .filter(|recipient| recipient.is_active)
            .cloned()
            .collect();
        recipients.sort_by_key(|recipient| recipient.id);
        Ok(recipients)
    }

    async fn upsert_recipient(&self, email: &str, is_active: bool) -> EngineResult<()> {
        let mut inner = self.inner.write().await;
        let key = email.to_lowercase();
        match inner.recipients.get_mut(&key) {
            Some(recipient) => recipient.is_active = is_active,
            None => {
                inner.next_recipient_id += 1;
                let id = inner.next_recipient_id;
                inner.recipients.insert(
                    key.clone(),
                    NotificationRecipient { id, email: key, is_active },
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lead(email: &str) -> Lead {
        Lead {
            email: email.to_string(),
            domain: "x.com".to_string(),
            posted_at: Utc::now(),
            execution_log_id: 1,
            search_query: "q".to_string(),
            icp_snapshot: "[]".to_string(),
        }
    }

    #[tokio::test]
    async fn test_lead_unique_constraint_is_case_insensitive() {
        let store = MemoryStore::new();

        store.upsert(lead("Alice@A.com")).await.unwrap();
        store.upsert(lead("alice@a.com")).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.exists_by_email("ALICE@A.COM").await.unwrap());
    }

    #[tokio::test]
    async fn test_lead_upsert_refreshes_timestamp_only() {
        let store = MemoryStore::new();

        let mut first = lead("a@a.com");
        first.domain = "original.com".to_string();
        store.upsert(first).await.unwrap();

        let mut second = lead("a@a.com");
        second.domain = "other.com".to_string();
        let refreshed_at = second.posted_at;
        store.upsert(second).await.unwrap();

        let stored = store.get_by_email("a@a.com").await.unwrap().unwrap();
        assert_eq!(stored.domain, "original.com");
        assert_eq!(stored.posted_at, refreshed_at);
    }

    #[tokio::test]
    async fn test_log_update_is_partial() {
        let store = MemoryStore::new();
        let id = store.create(Utc::now(), TriggeredBy::Manual).await.unwrap();

        store
            .update(id, ExecutionLogUpdate { domains_found: Some(9), ..Default::default() })
            .await
            .unwrap();

        let log = store.get(id).await.unwrap().unwrap();
        assert_eq!(log.domains_found, 9);
        assert_eq!(log.status, RunStatus::Running);
        assert_eq!(log.emails_found, 0);
    }

    #[tokio::test]
    async fn test_snapshot_weight_round_trips_exactly() {
        let store = MemoryStore::new();
        store
            .upsert_weight("Industry", "SaaS", "0.90")
            .await
            .unwrap();

        let rows = IcpStore::list_all(&store).await.unwrap();
        assert_eq!(rows[0].weight, "0.90");
    }

    #[tokio::test]
    async fn test_create_test_assigns_ids_atomically() {
        let store = MemoryStore::new();
        let test = AbTest {
            id: 0,
            name: "t".to_string(),
            description: None,
            status: crate::types::TestStatus::Draft,
            started_at: None,
            completed_at: None,
            winning_variant_id: None,
        };
        let variant = AbVariant {
            id: 0,
            test_id: 0,
            name: "a".to_string(),
            icp_snapshot: "[]".to_string(),
            execution_count: 0,
            total_leads: 0,
            avg_engagement: 0.0,
        };

        let test_id = store
            .create_test(test, vec![variant.clone(), variant])
            .await
            .unwrap();

        let variants = store.variants_for(test_id).await.unwrap();
        assert_eq!(variants.len(), 2);
        assert!(variants.iter().all(|v| v.test_id == test_id));
        assert_ne!(variants[0].id, variants[1].id);
    }

    #[tokio::test]
    async fn test_inactive_recipients_filtered() {
        let store = MemoryStore::new();
        store.upsert_recipient("on@x.com", true).await.unwrap();
        store.upsert_recipient("off@x.com", false).await.unwrap();

        let active = store.active_recipients().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].email, "on@x.com");
    }
}
