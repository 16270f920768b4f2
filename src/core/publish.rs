//! Dedup and publish pipeline
//!
//! For each discovered (domain, candidate) pair, in discovery order: check
//! the lead store first (no CRM traffic for duplicates), then upsert the
//! contact and add it to the target list, and only on full success record the
//! lead row. The store's unique-email constraint is the authoritative guard;
//! emails are normalized to lowercase at this boundary. A per-pair CRM
//! failure is logged and skipped, never fatal to the batch. The per-run cap
//! applies to the deduplicated set, not the raw discovered set.

use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::EngineResult;
use crate::traits::{CrmApi, LeadStore};
use crate::types::{EmailCandidate, Lead};

/// Mandatory inter-publish throttle for outbound CRM traffic.
pub const PUBLISH_DELAY: Duration = Duration::from_millis(100);

/// Counts produced by one publish pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    pub leads_posted: u32,
    pub duplicates_skipped: u32,
}

/// Inputs that are constant across the whole pass.
pub struct PublishContext {
    pub execution_log_id: u64,
    pub search_query: String,
    pub icp_snapshot: String,
    pub list_id: u32,
    pub target_leads: usize,
    pub delay: Duration,
}

/// Run the dedup + publish pass over discovered pairs.
pub async fn publish_leads<C, L>(
    crm: &C,
    leads: &L,
    pairs: &[(String, EmailCandidate)],
    ctx: &PublishContext,
) -> EngineResult<PublishOutcome>
where
    C: CrmApi,
    L: LeadStore,
{
    let mut outcome = PublishOutcome::default();
    let mut attempted = 0usize;

    for (domain, candidate) in pairs {
        if attempted >= ctx.target_leads {
            break;
        }

        let email = candidate.email.to_lowercase();

        // Dedup check must precede any CRM call.
        if leads.exists_by_email(&email).await? {
            outcome.duplicates_skipped += 1;
            debug!(email = %email, "skipping duplicate lead");
            continue;
        }

        attempted += 1;

        match post_to_crm(crm, candidate, domain, ctx.list_id).await {
            Ok(()) => {
                leads
                    .upsert(Lead {
                        email: email.clone(),
                        domain: domain.clone(),
                        posted_at: Utc::now(),
                        execution_log_id: ctx.execution_log_id,
                        search_query: ctx.search_query.clone(),
                        icp_snapshot: ctx.icp_snapshot.clone(),
                    })
                    .await?;
                outcome.leads_posted += 1;
            }
            Err(error) => {
                warn!(email = %email, %error, "CRM publish failed, continuing batch");
            }
        }

        // Throttle between consecutive publish attempts.
        if !ctx.delay.is_zero() {
            tokio::time::sleep(ctx.delay).await;
        }
    }

    info!(
        posted = outcome.leads_posted,
        duplicates = outcome.duplicates_skipped,
        "publish pass finished"
    );
    Ok(outcome)
}

/// Both sub-steps must succeed for the pair to count as published.
async fn post_to_crm<C: CrmApi>(
    crm: &C,
    candidate: &EmailCandidate,
    domain: &str,
    list_id: u32,
) -> EngineResult<()> {
    let contact_id = crm.upsert_contact(candidate, domain).await?;
    crm.add_to_list(&contact_id, list_id).await?;
    Ok(())
}
