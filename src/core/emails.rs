//! Email candidate selection per domain
//!
//! The email-discovery API returns both personal and generic (role-based)
//! addresses; only personal addresses are eligible. Survivors are ranked by
//! confidence descending and capped per domain. Per-domain failure isolation
//! is the orchestrator's job; this module just reports the error.

use crate::error::EngineResult;
use crate::traits::EmailDiscoveryApi;
use crate::types::{EmailCandidate, EmailRecord};

/// Default per-domain candidate cap.
pub const DEFAULT_EMAILS_PER_DOMAIN: u32 = 2;

/// Pure selection step: drop generic addresses, rank by confidence, cap.
pub fn select_candidates(records: Vec<EmailRecord>, cap: usize) -> Vec<EmailCandidate> {
    let mut personal: Vec<EmailRecord> = records
        .into_iter()
        .filter(|record| record.address_type != "generic")
        .collect();

    personal.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    personal.truncate(cap);

    personal
        .into_iter()
        .map(|record| EmailCandidate {
            email: record.email,
            first_name: record.first_name,
            last_name: record.last_name,
            position: record.position,
            seniority: record.seniority,
            department: record.department,
            linkedin: record.linkedin,
            confidence: record.confidence,
            verification_status: record.verification_status,
        })
        .collect()
}

/// Query the discovery API for one domain and select up to `cap` candidates.
pub async fn find_emails_for_domain<E: EmailDiscoveryApi>(
    api: &E,
    domain: &str,
    cap: u32,
) -> EngineResult<Vec<EmailCandidate>> {
    let records = api.find_emails(domain, cap).await?;
    Ok(select_candidates(records, cap as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(email: &str, address_type: &str, confidence: u32) -> EmailRecord {
        EmailRecord {
            email: email.to_string(),
            address_type: address_type.to_string(),
            confidence,
            first_name: None,
            last_name: None,
            position: None,
            seniority: None,
            department: None,
            linkedin: None,
            verification_status: None,
        }
    }

    #[test]
    fn test_generic_addresses_are_dropped() {
        let records = vec![
            record("info@acme.com", "generic", 99),
            record("alice@acme.com", "personal", 80),
        ];

        let candidates = select_candidates(records, 2);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].email, "alice@acme.com");
    }

    #[test]
    fn test_candidates_ranked_by_confidence_and_capped() {
        let records = vec![
            record("low@acme.com", "personal", 40),
            record("high@acme.com", "personal", 95),
            record("mid@acme.com", "personal", 70),
        ];

        let candidates = select_candidates(records, 2);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].email, "high@acme.com");
        assert_eq!(candidates[1].email, "mid@acme.com");
    }

    #[test]
    fn test_empty_records_yield_no_candidates() {
        assert!(select_candidates(Vec::new(), 2).is_empty());
    }

    #[tokio::test]
    async fn test_lookup_selects_through_api() {
        let mut api = crate::traits::MockEmailDiscoveryApi::new();
        api.expect_find_emails().times(1).returning(|_, _| {
            Ok(vec![
                record("support@acme.com", "generic", 90),
                record("bob@acme.com", "personal", 60),
            ])
        });

        let candidates = find_emails_for_domain(&api, "acme.com", 2).await.unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].email, "bob@acme.com");
    }
}
