//! A/B test lifecycle over ICP weight sets
//!
//! A test is created with exactly two variants, both snapshotting the ICP
//! table as it stands. Variant stats accumulate as a running weighted
//! average; the winner is decided only at stop time, by highest average
//! engagement.

use chrono::Utc;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::traits::{AbTestStore, IcpStore};
use crate::types::{AbTest, AbVariant, IcpSnapshotEntry, TestStatus};

/// Create a draft test with two variants snapshotting the current ICP table.
pub async fn create_test<T, I>(
    tests: &T,
    icp: &I,
    name: &str,
    description: Option<&str>,
    variant_a: &str,
    variant_b: &str,
) -> EngineResult<u64>
where
    T: AbTestStore,
    I: IcpStore,
{
    let rows = icp.list_all().await?;
    let snapshot: Vec<IcpSnapshotEntry> = rows.iter().map(IcpSnapshotEntry::from).collect();
    let snapshot_json = serde_json::to_string(&snapshot)?;

    let test = AbTest {
        id: 0, // assigned by the store
        name: name.to_string(),
        description: description.map(|d| d.to_string()),
        status: TestStatus::Draft,
        started_at: None,
        completed_at: None,
        winning_variant_id: None,
    };

    let variants = vec![
        variant_stub(variant_a, &snapshot_json),
        variant_stub(variant_b, &snapshot_json),
    ];

    let test_id = tests.create_test(test, variants).await?;
    info!(test_id, name, "created A/B test with two variants");
    Ok(test_id)
}

fn variant_stub(name: &str, snapshot_json: &str) -> AbVariant {
    AbVariant {
        id: 0,
        test_id: 0,
        name: name.to_string(),
        icp_snapshot: snapshot_json.to_string(),
        execution_count: 0,
        total_leads: 0,
        avg_engagement: 0.0,
    }
}

pub async fn start_test<T: AbTestStore>(tests: &T, test_id: u64) -> EngineResult<()> {
    let mut test = tests
        .get_test(test_id)
        .await?
        .ok_or_else(|| EngineError::storage(format!("A/B test {test_id} not found")))?;

    test.status = TestStatus::Running;
    test.started_at = Some(Utc::now());
    tests.update_test(test).await
}

/// Stop a test and pick the winner: the variant with the highest average
/// engagement at stop time.
pub async fn stop_test<T: AbTestStore>(tests: &T, test_id: u64) -> EngineResult<Option<u64>> {
    let mut test = tests
        .get_test(test_id)
        .await?
        .ok_or_else(|| EngineError::storage(format!("A/B test {test_id} not found")))?;

    let variants = tests.variants_for(test_id).await?;
    let winning_variant_id = variants
        .iter()
        .max_by(|a, b| {
            a.avg_engagement
                .partial_cmp(&b.avg_engagement)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .filter(|_| variants.len() >= 2)
        .map(|variant| variant.id);

    test.status = TestStatus::Completed;
    test.completed_at = Some(Utc::now());
    test.winning_variant_id = winning_variant_id;
    tests.update_test(test).await?;

    info!(test_id, ?winning_variant_id, "A/B test stopped");
    Ok(winning_variant_id)
}

/// Cancel a test without picking a winner.
pub async fn cancel_test<T: AbTestStore>(tests: &T, test_id: u64) -> EngineResult<()> {
    let mut test = tests
        .get_test(test_id)
        .await?
        .ok_or_else(|| EngineError::storage(format!("A/B test {test_id} not found")))?;

    test.status = TestStatus::Cancelled;
    test.completed_at = Some(Utc::now());
    tests.update_test(test).await
}

/// Fold one run's outcome into a variant's running stats.
///
/// The average is a running weighted average, never recomputed from scratch:
/// `(prev_avg * prev_count + sample) / (prev_count + 1)`.
pub fn fold_variant_sample(variant: &mut AbVariant, leads_posted: u32, engagement_sample: f64) {
    let prev_count = variant.execution_count;
    variant.execution_count = prev_count + 1;
    variant.total_leads += leads_posted;
    variant.avg_engagement = (variant.avg_engagement * prev_count as f64 + engagement_sample)
        / variant.execution_count as f64;
}

/// Load, fold, and persist variant stats after a prospecting run.
pub async fn update_variant_stats<T: AbTestStore>(
    tests: &T,
    variant_id: u64,
    leads_posted: u32,
    engagement_sample: f64,
) -> EngineResult<()> {
    let Some(mut variant) = tests.get_variant(variant_id).await? else {
        return Ok(());
    };

    fold_variant_sample(&mut variant, leads_posted, engagement_sample);
    tests.update_variant(variant).await
}
