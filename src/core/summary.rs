//! Weekly execution summary aggregation

use chrono::{DateTime, Duration, Utc};

use crate::types::{ExecutionLog, RunStatus, WeeklySummary};

/// Aggregate execution logs from the seven days before `now`.
pub fn summarize_week(logs: &[ExecutionLog], now: DateTime<Utc>) -> WeeklySummary {
    let window_start = now - Duration::days(7);

    let mut summary = WeeklySummary {
        window_start,
        window_end: now,
        total_runs: 0,
        completed_runs: 0,
        failed_runs: 0,
        domains_found: 0,
        emails_found: 0,
        leads_posted: 0,
    };

    for log in logs {
        if log.started_at < window_start || log.started_at > now {
            continue;
        }

        summary.total_runs += 1;
        match log.status {
            RunStatus::Completed => summary.completed_runs += 1,
            RunStatus::Failed => summary.failed_runs += 1,
            RunStatus::Running => {}
        }
        summary.domains_found += log.domains_found;
        summary.emails_found += log.emails_found;
        summary.leads_posted += log.leads_posted;
    }

    summary
}

/// Plain-text rendering pushed through the notification sink.
pub fn render_summary(summary: &WeeklySummary) -> String {
    format!(
        "Weekly prospecting summary ({} to {})\n\
         Runs: {} ({} completed, {} failed)\n\
         Domains found: {}\n\
         Emails found: {}\n\
         Leads posted: {}\n",
        summary.window_start.format("%Y-%m-%d"),
        summary.window_end.format("%Y-%m-%d"),
        summary.total_runs,
        summary.completed_runs,
        summary.failed_runs,
        summary.domains_found,
        summary.emails_found,
        summary.leads_posted,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TriggeredBy;

    fn log(days_ago: i64, status: RunStatus, leads: u32) -> ExecutionLog {
        let started = Utc::now() - Duration::days(days_ago);
        ExecutionLog {
            id: 1,
            started_at: started,
            completed_at: Some(started),
            status,
            domains_found: 10,
            emails_found: 5,
            leads_posted: leads,
            error_message: None,
            search_query: None,
            triggered_by: TriggeredBy::Scheduled,
        }
    }

    #[test]
    fn test_summary_counts_only_window() {
        let logs = vec![
            log(1, RunStatus::Completed, 4),
            log(3, RunStatus::Failed, 0),
            log(10, RunStatus::Completed, 9), // outside the window
        ];

        let summary = summarize_week(&logs, Utc::now());

        assert_eq!(summary.total_runs, 2);
        assert_eq!(summary.completed_runs, 1);
        assert_eq!(summary.failed_runs, 1);
        assert_eq!(summary.leads_posted, 4);
        assert_eq!(summary.domains_found, 20);
    }

    #[test]
    fn test_render_mentions_totals() {
        let summary = summarize_week(&[log(2, RunStatus::Completed, 7)], Utc::now());
        let text = render_summary(&summary);

        assert!(text.contains("Leads posted: 7"));
        assert!(text.contains("1 completed, 0 failed"));
    }
}
