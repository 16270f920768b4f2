//! Unit tests for individual pipeline components
//!
//! Exercises the crate's public surface piece by piece: query construction,
//! quota gating, analyzer recommendations, A/B stat folding, weekly summary
//! aggregation, and retention cleanup.

use std::collections::HashMap;

use chrono::{Duration, Utc};

use prospector::core::abtest::fold_variant_sample;
use prospector::core::analyzer::compute_insights;
use prospector::core::gdpr::{cleanup_expired, initialize_retention_policies};
use prospector::core::query::build_search_query;
use prospector::core::rate::RateGovernor;
use prospector::core::summary::summarize_week;
use prospector::services::MemoryStore;
use prospector::traits::{ExecutionLogStore, LeadStore};
use prospector::types::{
    AbVariant, ExecutionLog, Lead, Recommendation, RunStatus, TriggeredBy,
};

mod common;
use common::{TestFixtures, TestHelpers};

fn lead_with_snapshot(email: &str, rows: &[prospector::types::IcpRow]) -> Lead {
    Lead {
        email: email.to_string(),
        domain: email.split('@').nth(1).unwrap_or("x.com").to_string(),
        posted_at: Utc::now(),
        execution_log_id: 1,
        search_query: String::new(),
        icp_snapshot: TestHelpers::snapshot_json(rows),
    }
}

/// Values group by attribute in first-seen order, strongest value first.
#[test]
fn test_query_groups_attributes_and_orders_by_weight() {
    let query = build_search_query(&TestFixtures::full_icp());

    // The zero-weight "Legacy" row must not appear.
    assert_eq!(query, r#"("SaaS" OR "Fintech") AND ("UK")"#);
}

/// Thresholds around the global average drive recommendations: well above
/// increases, well below decreases, close stays put.
#[test]
fn test_analyzer_recommendation_thresholds() {
    let strong = vec![prospector::types::IcpRow::new(1, "Industry", "SaaS", "1.0")];
    let weak = vec![prospector::types::IcpRow::new(2, "Industry", "Legacy", "0.5")];
    let steady = vec![prospector::types::IcpRow::new(3, "Region", "UK", "0.6")];

    let leads = vec![
        lead_with_snapshot("alice@a.com", &strong),
        lead_with_snapshot("bob@b.com", &weak),
        lead_with_snapshot("carol@c.com", &steady),
    ];
    // Global average lands near 48.3; 65 and 35 sit outside the 0.8-1.2
    // band while 45 sits inside it.
    let scores = HashMap::from([
        ("alice@a.com".to_string(), 65.0),
        ("bob@b.com".to_string(), 35.0),
        ("carol@c.com".to_string(), 45.0),
    ]);

    let insights = compute_insights(&leads, &scores).unwrap();

    assert_eq!(insights.total_leads_analyzed, 3);
    let by_value: HashMap<&str, Recommendation> = insights
        .attribute_performance
        .iter()
        .map(|perf| (perf.value.as_str(), perf.recommendation))
        .collect();
    assert_eq!(by_value["SaaS"], Recommendation::Increase);
    assert_eq!(by_value["Legacy"], Recommendation::Decrease);
    assert_eq!(by_value["UK"], Recommendation::Maintain);

    let saas = insights
        .attribute_performance
        .iter()
        .find(|perf| perf.value == "SaaS")
        .unwrap();
    assert_eq!(saas.suggested_weight, 1.3);
}

/// Leads whose emails have no engagement data fail the analysis outright.
#[test]
fn test_analyzer_requires_engagement_data() {
    let rows = TestFixtures::saas_icp();
    let leads = vec![lead_with_snapshot("ghost@a.com", &rows)];

    let result = compute_insights(&leads, &HashMap::new());

    assert!(result.is_err());
}

/// Variant stats fold as a running weighted average.
#[test]
fn test_variant_running_average() {
    let mut variant = AbVariant {
        id: 1,
        test_id: 1,
        name: "A".to_string(),
        icp_snapshot: "[]".to_string(),
        execution_count: 2,
        total_leads: 40,
        avg_engagement: 40.0,
    };

    fold_variant_sample(&mut variant, 10, 60.0);

    assert_eq!(variant.execution_count, 3);
    assert_eq!(variant.total_leads, 50);
    // (40 * 2 + 60) / 3
    assert!((variant.avg_engagement - 140.0 / 3.0).abs() < 1e-9);
}

/// Capacity estimates: ceil(target / 10) searches and target * 2 email calls.
#[test]
fn test_run_capacity_estimates() {
    let exact = RateGovernor::with_limits(10, 200);
    assert!(exact.check_run_capacity(100).is_ok());

    let short_on_search = RateGovernor::with_limits(9, 200);
    assert!(short_on_search.check_run_capacity(100).is_err());

    let short_on_email = RateGovernor::with_limits(10, 199);
    assert!(short_on_email.check_run_capacity(100).is_err());

    // 95 leads still need 10 pages.
    assert!(RateGovernor::with_limits(9, 200).check_run_capacity(95).is_err());
}

/// Weekly summary only counts runs inside the trailing seven days.
#[test]
fn test_weekly_summary_window() {
    let now = Utc::now();
    let log = |id: u64, days_ago: i64, status: RunStatus, leads: u32| ExecutionLog {
        id,
        started_at: now - Duration::days(days_ago),
        completed_at: Some(now - Duration::days(days_ago)),
        status,
        domains_found: 10,
        emails_found: 5,
        leads_posted: leads,
        error_message: None,
        search_query: None,
        triggered_by: TriggeredBy::Scheduled,
    };
    let logs = vec![
        log(1, 1, RunStatus::Completed, 20),
        log(2, 3, RunStatus::Failed, 0),
        log(3, 10, RunStatus::Completed, 50),
    ];

    let summary = summarize_week(&logs, now);

    assert_eq!(summary.total_runs, 2);
    assert_eq!(summary.completed_runs, 1);
    assert_eq!(summary.failed_runs, 1);
    assert_eq!(summary.leads_posted, 20);
}

/// Retention cleanup removes leads past the 730-day policy and leaves fresh
/// ones alone.
#[tokio::test]
async fn test_retention_cleanup_removes_expired_leads() {
    let store = MemoryStore::new();
    initialize_retention_policies(&store).await.unwrap();

    let rows = TestFixtures::saas_icp();
    let mut old = lead_with_snapshot("old@a.com", &rows);
    old.posted_at = Utc::now() - Duration::days(800);
    store.upsert(old).await.unwrap();
    store
        .upsert(lead_with_snapshot("fresh@b.com", &rows))
        .await
        .unwrap();

    cleanup_expired(&store, &store, &store).await.unwrap();

    assert!(!store.exists_by_email("old@a.com").await.unwrap());
    assert!(store.exists_by_email("fresh@b.com").await.unwrap());
}

/// Old execution logs fall under the 365-day policy.
#[tokio::test]
async fn test_retention_cleanup_removes_old_logs() {
    let store = MemoryStore::new();
    initialize_retention_policies(&store).await.unwrap();

    let old_id = store
        .create(Utc::now() - Duration::days(400), TriggeredBy::Scheduled)
        .await
        .unwrap();
    let fresh_id = store
        .create(Utc::now() - Duration::days(10), TriggeredBy::Scheduled)
        .await
        .unwrap();

    cleanup_expired(&store, &store, &store).await.unwrap();

    assert!(store.get(old_id).await.unwrap().is_none());
    assert!(store.get(fresh_id).await.unwrap().is_some());
}
