//! Daily API usage tracking and pre-run capacity checks
//!
//! Counters live in process memory, which is acceptable for a low-throughput
//! batch job but volatile and single-instance-only; a multi-instance
//! deployment needs these keyed by (service, UTC date) in shared storage.
//! Counters for all services reset together on UTC day rollover. Pure
//! bookkeeping: nothing here fails.
//!
//! State sits behind a std mutex taken only for the increment itself, so the
//! governor can be shared across concurrent lookups without ever holding a
//! lock across a network call.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::{EngineError, EngineResult};
use crate::types::{QuotaHealth, QuotaStatus, Service};

/// Default daily limits, matching the external APIs' free tiers.
pub const DEFAULT_SEARCH_DAILY_LIMIT: u32 = 100;
pub const DEFAULT_EMAIL_DAILY_LIMIT: u32 = 500;

struct GovernorState {
    counters: HashMap<Service, u32>,
    last_reset: DateTime<Utc>,
}

/// Tracks per-service daily call counts and answers capacity queries.
pub struct RateGovernor {
    limits: HashMap<Service, u32>,
    state: Mutex<GovernorState>,
}

impl RateGovernor {
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_SEARCH_DAILY_LIMIT, DEFAULT_EMAIL_DAILY_LIMIT)
    }

    pub fn with_limits(search_limit: u32, email_limit: u32) -> Self {
        Self {
            limits: HashMap::from([
                (Service::Search, search_limit),
                (Service::EmailDiscovery, email_limit),
            ]),
            state: Mutex::new(GovernorState {
                counters: HashMap::new(),
                last_reset: Utc::now(),
            }),
        }
    }

    /// Record `count` calls against a service's daily quota.
    pub fn record_usage(&self, service: Service, count: u32) {
        self.record_usage_at(service, count, Utc::now());
    }

    /// Clock-injected variant used by rollover tests.
    pub fn record_usage_at(&self, service: Service, count: u32, now: DateTime<Utc>) {
        let mut state = self.state.lock().expect("governor mutex poisoned");
        Self::reset_if_new_day(&mut state, now);
        *state.counters.entry(service).or_insert(0) += count;
    }

    /// Current usage snapshot for one service.
    pub fn status(&self, service: Service) -> QuotaStatus {
        self.status_at(service, Utc::now())
    }

    pub fn status_at(&self, service: Service, now: DateTime<Utc>) -> QuotaStatus {
        let mut state = self.state.lock().expect("governor mutex poisoned");
        Self::reset_if_new_day(&mut state, now);

        let limit = self.limits.get(&service).copied().unwrap_or(0);
        let used = state.counters.get(&service).copied().unwrap_or(0);
        let remaining = limit.saturating_sub(used);
        let percentage = if limit > 0 {
            (used as f64 / limit as f64) * 100.0
        } else {
            100.0
        };

        let health = if percentage >= 90.0 {
            QuotaHealth::Critical
        } else if percentage >= 70.0 {
            QuotaHealth::Warning
        } else {
            QuotaHealth::Healthy
        };

        QuotaStatus {
            service,
            used,
            limit,
            remaining,
            percentage,
            health,
        }
    }

    /// Pre-run gate: estimate the calls a run of `target_leads` needs and
    /// verify both quotas can cover them.
    ///
    /// One search page per ten leads, two email-discovery calls per lead.
    pub fn check_run_capacity(&self, target_leads: u32) -> EngineResult<()> {
        let estimated_search = target_leads.div_ceil(10);
        let estimated_email = target_leads.saturating_mul(2);

        let search = self.status(Service::Search);
        if search.remaining < estimated_search {
            return Err(EngineError::QuotaExceeded {
                service: Service::Search,
                needed: estimated_search,
                remaining: search.remaining,
            });
        }

        let email = self.status(Service::EmailDiscovery);
        if email.remaining < estimated_email {
            return Err(EngineError::QuotaExceeded {
                service: Service::EmailDiscovery,
                needed: estimated_email,
                remaining: email.remaining,
            });
        }

        Ok(())
    }

    fn reset_if_new_day(state: &mut GovernorState, now: DateTime<Utc>) {
        if now.date_naive() != state.last_reset.date_naive() {
            state.counters.clear();
            state.last_reset = now;
            tracing::info!("rate governor counters reset for new UTC day");
        }
    }
}

impl Default for RateGovernor {
    fn default() -> Self {
        Self::new()
    }
}
