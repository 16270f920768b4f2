//! ICP performance analysis and weight recommendations
//!
//! Joins recorded leads (via their ICP snapshots) against engagement scores
//! and computes a suggested weight per (attribute, value) pair with a
//! ratio-to-average heuristic. A lead contributes to every pair in its own
//! snapshot, so pairs are multi-membership aggregates, not an exclusive
//! partitioning. This is deterministic arithmetic, not a trained model.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::traits::{EngagementSource, IcpStore, LeadStore};
use crate::types::{AttributePerformance, IcpSnapshotEntry, Lead, LearningInsights, Recommendation};

/// Ratio above which a weight increase is recommended.
const INCREASE_THRESHOLD: f64 = 1.2;
/// Ratio below which a weight decrease is recommended.
const DECREASE_THRESHOLD: f64 = 0.8;

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Pure aggregation over leads and their engagement scores, keyed by
/// lowercased email. Fails when nothing matches; an empty corpus has no
/// meaningful degraded output.
pub fn compute_insights(
    leads: &[Lead],
    scores: &HashMap<String, f64>,
) -> EngineResult<LearningInsights> {
    struct PairStats {
        attribute: String,
        value: String,
        current_weight: f64,
        total_engagement: f64,
        count: u32,
    }

    let mut stats: HashMap<String, PairStats> = HashMap::new();
    let mut matched = 0u32;

    for lead in leads {
        let Some(score) = scores.get(&lead.email.to_lowercase()).copied() else {
            continue;
        };

        let snapshot: Vec<IcpSnapshotEntry> = match serde_json::from_str(&lead.icp_snapshot) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(email = %lead.email, %error, "skipping lead with corrupt ICP snapshot");
                continue;
            }
        };

        matched += 1;
        for entry in snapshot {
            let key = format!("{}::{}", entry.attribute, entry.value);
            let pair = stats.entry(key).or_insert_with(|| PairStats {
                attribute: entry.attribute.clone(),
                value: entry.value.clone(),
                current_weight: entry.weight.trim().parse().unwrap_or(0.0),
                total_engagement: 0.0,
                count: 0,
            });
            pair.total_engagement += score;
            pair.count += 1;
        }
    }

    if matched == 0 {
        return Err(EngineError::Analysis {
            message: "no leads with engagement data available".to_string(),
        });
    }

    // Global average across all (lead, pair) contributions.
    let total_engagement: f64 = stats.values().map(|s| s.total_engagement).sum();
    let total_count: u32 = stats.values().map(|s| s.count).sum();
    let global_average = total_engagement / total_count as f64;

    let mut performance: Vec<AttributePerformance> = stats
        .into_values()
        .map(|pair| {
            let avg_engagement = pair.total_engagement / pair.count as f64;
            let ratio = avg_engagement / global_average;

            let (recommendation, suggested_weight, reason) = if ratio > INCREASE_THRESHOLD {
                (
                    Recommendation::Increase,
                    round_one_decimal((pair.current_weight * 1.3).min(10.0)),
                    format!("{:.0}% above average engagement", ratio * 100.0 - 100.0),
                )
            } else if ratio < DECREASE_THRESHOLD {
                (
                    Recommendation::Decrease,
                    round_one_decimal((pair.current_weight * 0.7).max(0.0)),
                    format!("{:.0}% below average engagement", 100.0 - ratio * 100.0),
                )
            } else {
                (
                    Recommendation::Maintain,
                    pair.current_weight,
                    "Performing at expected level".to_string(),
                )
            };

            AttributePerformance {
                attribute: pair.attribute,
                value: pair.value,
                current_weight: pair.current_weight,
                leads_generated: pair.count,
                avg_engagement,
                suggested_weight,
                recommendation,
                reason,
            }
        })
        .collect();

    performance.sort_by(|a, b| {
        b.avg_engagement
            .partial_cmp(&a.avg_engagement)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let top_performers: Vec<AttributePerformance> = performance
        .iter()
        .filter(|p| p.recommendation == Recommendation::Increase)
        .take(5)
        .cloned()
        .collect();

    // Underperformers come from the ascending end.
    let underperformers: Vec<AttributePerformance> = performance
        .iter()
        .rev()
        .filter(|p| p.recommendation == Recommendation::Decrease)
        .take(5)
        .cloned()
        .collect();

    let recommendations =
        build_recommendations(&top_performers, &underperformers, global_average);

    Ok(LearningInsights {
        total_leads_analyzed: leads.len() as u32,
        avg_engagement: global_average,
        attribute_performance: performance,
        top_performers,
        underperformers,
        recommendations,
    })
}

/// Narrative strings, reproducible from the computed values.
fn build_recommendations(
    top: &[AttributePerformance],
    under: &[AttributePerformance],
    global_average: f64,
) -> Vec<String> {
    let mut recommendations = Vec::new();

    if let Some(best) = top.first() {
        recommendations.push(format!(
            "Top performer: \"{}: {}\" ({:.1} engagement score). Increase weight from {} to {}.",
            best.attribute, best.value, best.avg_engagement, best.current_weight, best.suggested_weight,
        ));
    }

    if let Some(worst) = under.first() {
        recommendations.push(format!(
            "Underperformer: \"{}: {}\" ({:.1} engagement score). Decrease weight from {} to {}.",
            worst.attribute, worst.value, worst.avg_engagement, worst.current_weight, worst.suggested_weight,
        ));
    }

    if global_average < 30.0 {
        recommendations.push(
            "Overall engagement is low (< 30). Consider revising your ICP criteria or messaging strategy.".to_string(),
        );
    } else if global_average > 60.0 {
        recommendations.push(
            "Excellent engagement (> 60). Your ICP targeting is working well; consider scaling up lead volume.".to_string(),
        );
    }

    recommendations
}

/// Full analysis pass: load leads, fetch a score per lead, aggregate.
/// Per-email fetch failures are logged and skipped, not fatal.
pub async fn analyze_icp_performance<L, E>(
    leads_store: &L,
    engagement: &E,
) -> EngineResult<LearningInsights>
where
    L: LeadStore,
    E: EngagementSource,
{
    let leads = leads_store.list_all().await?;
    if leads.is_empty() {
        return Err(EngineError::Analysis {
            message: "no leads found for analysis".to_string(),
        });
    }

    info!(lead_count = leads.len(), "analyzing recorded leads");

    let mut scores: HashMap<String, f64> = HashMap::new();
    for lead in &leads {
        match engagement.score_for(&lead.email).await {
            Ok(Some(score)) => {
                scores.insert(lead.email.to_lowercase(), score);
            }
            Ok(None) => {}
            Err(error) => {
                warn!(email = %lead.email, %error, "failed to fetch engagement, skipping contact");
            }
        }
    }

    info!(matched = scores.len(), "retrieved engagement data");
    compute_insights(&leads, &scores)
}

/// Write suggested weights back into the ICP table for every non-maintain
/// recommendation.
pub async fn apply_recommendations<I: IcpStore>(
    icp: &I,
    insights: &LearningInsights,
) -> EngineResult<u32> {
    let mut applied = 0;
    for performance in &insights.attribute_performance {
        if performance.recommendation == Recommendation::Maintain {
            continue;
        }
        icp.upsert_weight(
            &performance.attribute,
            &performance.value,
            &format!("{:.2}", performance.suggested_weight),
        )
        .await?;
        applied += 1;
    }
    Ok(applied)
}
