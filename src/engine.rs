//! Prospecting orchestrator
//!
//! Sequences one execution: build query, discover domains, find emails,
//! dedup + publish, finalize the execution log, notify. All collaborators
//! are injected as traits so the whole run can be exercised with mocks.
//!
//! Per run the log transitions `running -> completed | failed` exactly once.
//! A single-flight guard rejects overlapping runs before any log row or
//! network activity exists; the lead store's unique-email constraint remains
//! the ultimate dedup guard underneath it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tracing::{error, info, warn};

use crate::core::discovery::discover_domains;
use crate::core::emails::find_emails_for_domain;
use crate::core::publish::{publish_leads, PublishContext};
use crate::core::query::build_search_query;
use crate::core::rate::RateGovernor;
use crate::error::{EngineError, EngineResult};
use crate::traits::{
    CrmApi, EmailDiscoveryApi, ExecutionLogStore, IcpStore, LeadStore, NotificationSink, SearchApi,
};
use crate::types::{
    EmailCandidate, ExecutionLogUpdate, IcpSnapshotEntry, ProspectingResult, RunReport, RunStatus,
    Service, TriggeredBy,
};

/// Tuning knobs for one engine instance.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// CRM list new contacts are added to.
    pub crm_list_id: u32,
    /// Per-domain email candidate cap.
    pub emails_per_domain: u32,
    /// Throttle between consecutive CRM publish calls.
    pub publish_delay: Duration,
    /// Overall wall-clock deadline for one run; exceeding it finalizes the
    /// run as failed like any other error.
    pub run_deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            crm_list_id: 4,
            emails_per_domain: crate::core::emails::DEFAULT_EMAILS_PER_DOMAIN,
            publish_delay: crate::core::publish::PUBLISH_DELAY,
            run_deadline: Duration::from_secs(30 * 60),
        }
    }
}

/// Stats accumulated as stages complete; reported even on failure.
#[derive(Debug, Default, Clone, Copy)]
struct RunStats {
    domains_found: u32,
    emails_found: u32,
    leads_posted: u32,
    duplicates_skipped: u32,
}

/// The prospecting engine with all injected dependencies.
pub struct ProspectingEngine<S, E, C, N, I, X, L>
where
    S: SearchApi,
    E: EmailDiscoveryApi,
    C: CrmApi,
    N: NotificationSink,
    I: IcpStore,
    X: ExecutionLogStore,
    L: LeadStore,
{
    config: EngineConfig,
    governor: RateGovernor,

    search: S,
    emails: E,
    crm: C,
    sink: N,
    icp: I,
    logs: X,
    leads: L,

    // Single-flight guard: only one run may be in flight at a time.
    run_active: AtomicBool,
}

impl<S, E, C, N, I, X, L> ProspectingEngine<S, E, C, N, I, X, L>
where
    S: SearchApi,
    E: EmailDiscoveryApi,
    C: CrmApi,
    N: NotificationSink,
    I: IcpStore,
    X: ExecutionLogStore,
    L: LeadStore,
{
    pub fn new(
        config: EngineConfig,
        governor: RateGovernor,
        search: S,
        emails: E,
        crm: C,
        sink: N,
        icp: I,
        logs: X,
        leads: L,
    ) -> Self {
        Self {
            config,
            governor,
            search,
            emails,
            crm,
            sink,
            icp,
            logs,
            leads,
            run_active: AtomicBool::new(false),
        }
    }

    pub fn governor(&self) -> &RateGovernor {
        &self.governor
    }

    /// Execute one prospecting run.
    ///
    /// Pre-flight failures (overlapping run, insufficient quota) return an
    /// error before any log row exists. Once a log row is created, every
    /// outcome finalizes it exactly once and comes back as a structured
    /// `ProspectingResult`.
    pub async fn run(
        &self,
        target_leads: u32,
        triggered_by: TriggeredBy,
    ) -> EngineResult<ProspectingResult> {
        if self
            .run_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(EngineError::RunInProgress);
        }
        let _guard = RunGuard(&self.run_active);

        self.governor.check_run_capacity(target_leads)?;

        let started_at = Utc::now();
        let log_id = self.logs.create(started_at, triggered_by).await?;
        info!(log_id, target_leads, %triggered_by, "prospecting run started");

        let mut stats = RunStats::default();
        let result = match tokio::time::timeout(
            self.config.run_deadline,
            self.run_stages(log_id, target_leads, &mut stats),
        )
        .await
        {
            Ok(staged) => staged,
            Err(_) => Err(EngineError::RunTimedOut {
                deadline_secs: self.config.run_deadline.as_secs(),
            }),
        };
        let completed_at = Utc::now();

        // Single-shot finalization out of `running`.
        let (status, error_message) = match &result {
            Ok(()) => (RunStatus::Completed, None),
            Err(error) => (RunStatus::Failed, Some(error.to_string())),
        };

        self.logs
            .update(
                log_id,
                ExecutionLogUpdate {
                    completed_at: Some(completed_at),
                    status: Some(status),
                    leads_posted: Some(stats.leads_posted),
                    error_message: error_message.clone(),
                    ..Default::default()
                },
            )
            .await?;

        // Terminal state is committed; notification is best-effort.
        let report = RunReport {
            execution_log_id: log_id,
            status,
            domains_found: stats.domains_found,
            emails_found: stats.emails_found,
            leads_posted: stats.leads_posted,
            duplicates_skipped: stats.duplicates_skipped,
            error: error_message.clone(),
            started_at,
            completed_at,
        };
        if let Err(notify_error) = self.sink.notify(&report).await {
            warn!(%notify_error, "run notification failed");
        }

        match result {
            Ok(()) => {
                info!(log_id, leads = stats.leads_posted, "prospecting run completed");
                Ok(ProspectingResult {
                    success: true,
                    domains_found: stats.domains_found,
                    emails_found: stats.emails_found,
                    leads_posted: stats.leads_posted,
                    duplicates_skipped: stats.duplicates_skipped,
                    error: None,
                    execution_log_id: Some(log_id),
                })
            }
            Err(run_error) => {
                error!(log_id, %run_error, "prospecting run failed");
                Ok(ProspectingResult {
                    success: false,
                    domains_found: stats.domains_found,
                    emails_found: stats.emails_found,
                    leads_posted: stats.leads_posted,
                    duplicates_skipped: stats.duplicates_skipped,
                    error: Some(run_error.to_string()),
                    execution_log_id: Some(log_id),
                })
            }
        }
    }

    /// Stages 3-7; stats are written incrementally so a failure still leaves
    /// a diagnosable record.
    async fn run_stages(
        &self,
        log_id: u64,
        target_leads: u32,
        stats: &mut RunStats,
    ) -> EngineResult<()> {
        // Stage: ICP data.
        let icp_rows = self.icp.list_all().await?;
        if icp_rows.is_empty() {
            return Err(EngineError::NoIcpData);
        }

        let snapshot: Vec<IcpSnapshotEntry> =
            icp_rows.iter().map(IcpSnapshotEntry::from).collect();
        let icp_snapshot = serde_json::to_string(&snapshot)?;

        // Stage: query; persisted before discovery begins.
        let search_query = build_search_query(&icp_rows);
        if search_query.is_empty() {
            return Err(EngineError::NoIcpData);
        }
        info!(log_id, query = %search_query, "search query built");
        self.logs
            .update(
                log_id,
                ExecutionLogUpdate {
                    search_query: Some(search_query.clone()),
                    ..Default::default()
                },
            )
            .await?;

        // Stage: domain discovery.
        let domains = discover_domains(
            &self.search,
            &self.governor,
            &search_query,
            target_leads as usize,
        )
        .await?;
        stats.domains_found = domains.len() as u32;
        info!(log_id, domains = domains.len(), "domains discovered");
        self.logs
            .update(
                log_id,
                ExecutionLogUpdate {
                    domains_found: Some(stats.domains_found),
                    ..Default::default()
                },
            )
            .await?;

        // Stage: email discovery, independent per domain. A failed domain
        // yields zero results and never aborts the batch.
        let lookups = domains
            .iter()
            .map(|domain| find_emails_for_domain(&self.emails, domain, self.config.emails_per_domain));
        let results = join_all(lookups).await;
        self.governor
            .record_usage(Service::EmailDiscovery, domains.len() as u32);

        let mut pairs: Vec<(String, EmailCandidate)> = Vec::new();
        for (domain, result) in domains.iter().zip(results) {
            match result {
                Ok(candidates) => {
                    for candidate in candidates {
                        pairs.push((domain.clone(), candidate));
                    }
                }
                Err(lookup_error) => {
                    warn!(domain = %domain, %lookup_error, "email lookup failed, continuing");
                }
            }
        }
        stats.emails_found = pairs.len() as u32;
        info!(log_id, emails = pairs.len(), "emails found");
        self.logs
            .update(
                log_id,
                ExecutionLogUpdate {
                    emails_found: Some(stats.emails_found),
                    ..Default::default()
                },
            )
            .await?;

        // Stage: dedup + publish.
        let outcome = publish_leads(
            &self.crm,
            &self.leads,
            &pairs,
            &PublishContext {
                execution_log_id: log_id,
                search_query,
                icp_snapshot,
                list_id: self.config.crm_list_id,
                target_leads: target_leads as usize,
                delay: self.config.publish_delay,
            },
        )
        .await?;
        stats.leads_posted = outcome.leads_posted;
        stats.duplicates_skipped = outcome.duplicates_skipped;

        Ok(())
    }
}

/// Releases the single-flight flag when the run leaves scope.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
