//! Scheduled triggers
//!
//! Three recurring jobs, all in UTC: the daily prospecting run at 07:00
//! (target 100 leads), the daily retention cleanup at 02:00, and the weekly
//! summary on Monday 09:00. Next-occurrence times are computed with chrono
//! and awaited with the tokio timer; job failures are logged and the loop
//! keeps going.

use chrono::{DateTime, Datelike, Duration as ChronoDuration, TimeZone, Utc, Weekday};
use tracing::{error, info};

use crate::core::{gdpr, summary};
use crate::engine::ProspectingEngine;
use crate::error::EngineResult;
use crate::traits::{
    ComplianceStore, CrmApi, EmailDiscoveryApi, ExecutionLogStore, IcpStore, LeadStore,
    NotificationSink, SearchApi,
};
use crate::types::TriggeredBy;

/// Fixed target for the scheduled daily run.
pub const DAILY_TARGET_LEADS: u32 = 100;

const PROSPECTING_HOUR: u32 = 7;
const CLEANUP_HOUR: u32 = 2;
const SUMMARY_HOUR: u32 = 9;

/// Next occurrence of `hour:00` UTC strictly after `now`.
pub fn next_daily_occurrence(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let candidate = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), hour, 0, 0)
        .single()
        .expect("valid UTC timestamp");
    if candidate > now {
        candidate
    } else {
        candidate + ChronoDuration::days(1)
    }
}

/// Next occurrence of `weekday` at `hour:00` UTC strictly after `now`.
pub fn next_weekly_occurrence(now: DateTime<Utc>, weekday: Weekday, hour: u32) -> DateTime<Utc> {
    let mut candidate = next_daily_occurrence(now, hour);
    while candidate.weekday() != weekday {
        candidate += ChronoDuration::days(1);
    }
    candidate
}

async fn sleep_until(when: DateTime<Utc>) {
    let wait = (when - Utc::now()).to_std().unwrap_or_default();
    tokio::time::sleep(wait).await;
}

/// Run the three recurring jobs forever.
pub async fn run_scheduler<S, E, C, N, I, X, L, Co, Ld, Lg, Sk>(
    engine: &ProspectingEngine<S, E, C, N, I, X, L>,
    compliance: &Co,
    leads: &Ld,
    logs: &Lg,
    sink: &Sk,
) -> EngineResult<()>
where
    S: SearchApi,
    E: EmailDiscoveryApi,
    C: CrmApi,
    N: NotificationSink,
    I: IcpStore,
    X: ExecutionLogStore,
    L: LeadStore,
    Co: ComplianceStore,
    Ld: LeadStore,
    Lg: ExecutionLogStore,
    Sk: NotificationSink,
{
    info!(
        "scheduler started: prospecting {PROSPECTING_HOUR:02}:00, cleanup {CLEANUP_HOUR:02}:00, summary Monday {SUMMARY_HOUR:02}:00 (all UTC)"
    );

    loop {
        let now = Utc::now();
        let next_prospecting = next_daily_occurrence(now, PROSPECTING_HOUR);
        let next_cleanup = next_daily_occurrence(now, CLEANUP_HOUR);
        let next_summary = next_weekly_occurrence(now, Weekday::Mon, SUMMARY_HOUR);

        let next = next_prospecting.min(next_cleanup).min(next_summary);
        sleep_until(next).await;

        if next == next_prospecting {
            info!("starting scheduled prospecting run");
            match engine.run(DAILY_TARGET_LEADS, TriggeredBy::Scheduled).await {
                Ok(result) if result.success => {
                    info!(leads = result.leads_posted, "scheduled run completed");
                }
                Ok(result) => {
                    error!(error = ?result.error, "scheduled run failed");
                }
                Err(run_error) => {
                    error!(%run_error, "scheduled run rejected");
                }
            }
        } else if next == next_cleanup {
            info!("starting scheduled retention cleanup");
            match gdpr::cleanup_expired(compliance, leads, logs).await {
                Ok(deleted) => info!(?deleted, "retention cleanup completed"),
                Err(cleanup_error) => error!(%cleanup_error, "retention cleanup failed"),
            }
        } else {
            info!("sending weekly summary");
            match send_weekly_summary(logs, sink).await {
                Ok(()) => info!("weekly summary sent"),
                Err(summary_error) => error!(%summary_error, "weekly summary failed"),
            }
        }
    }
}

/// Aggregate the last week of execution logs and push through the sink.
pub async fn send_weekly_summary<Lg, Sk>(logs: &Lg, sink: &Sk) -> EngineResult<()>
where
    Lg: ExecutionLogStore,
    Sk: NotificationSink,
{
    let recent = logs.list(1000).await?;
    let weekly = summary::summarize_week(&recent, Utc::now());
    sink.notify_text("Weekly prospecting summary", &summary::render_summary(&weekly))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_daily_same_day_when_before_hour() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 5, 0, 0).unwrap();
        let next = next_daily_occurrence(now, 7);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 10, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_next_daily_rolls_to_tomorrow_after_hour() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 7, 0, 0).unwrap();
        let next = next_daily_occurrence(now, 7);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 11, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_next_weekly_lands_on_monday() {
        // 2024-05-10 is a Friday.
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let next = next_weekly_occurrence(now, Weekday::Mon, 9);
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 5, 13, 9, 0, 0).unwrap());
        assert_eq!(next.weekday(), Weekday::Mon);
    }

    #[tokio::test]
    async fn test_weekly_summary_pushes_through_sink() {
        let mut logs = crate::traits::MockExecutionLogStore::new();
        logs.expect_list().returning(|_| Ok(Vec::new()));

        let mut sink = crate::traits::MockNotificationSink::new();
        sink.expect_notify_text()
            .withf(|subject, _| subject.contains("Weekly"))
            .times(1)
            .returning(|_, _| Ok(()));

        send_weekly_summary(&logs, &sink).await.unwrap();
    }
}
