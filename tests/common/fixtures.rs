//! Shared test data for the pipeline test suites

use prospector::traits::SearchPage;
use prospector::types::{EmailRecord, IcpRow};

pub struct TestFixtures;

impl TestFixtures {
    pub const CRM_LIST_ID: u32 = 4;

    /// Minimal single-attribute ICP table.
    pub fn saas_icp() -> Vec<IcpRow> {
        vec![IcpRow::new(1, "Industry", "SaaS", "1")]
    }

    /// Multi-attribute table exercising grouping and weight ordering.
    pub fn full_icp() -> Vec<IcpRow> {
        vec![
            IcpRow::new(1, "Industry", "SaaS", "1.00"),
            IcpRow::new(2, "Industry", "Fintech", "0.80"),
            IcpRow::new(3, "Region", "UK", "0.60"),
            IcpRow::new(4, "Industry", "Legacy", "0"),
        ]
    }

    pub fn search_page(links: &[&str], has_more: bool) -> SearchPage {
        SearchPage {
            links: links.iter().map(|link| link.to_string()).collect(),
            has_more,
        }
    }

    pub fn personal_email(email: &str, confidence: u32) -> EmailRecord {
        EmailRecord {
            email: email.to_string(),
            address_type: "personal".to_string(),
            confidence,
            first_name: Some("Alice".to_string()),
            last_name: Some("Example".to_string()),
            position: Some("CTO".to_string()),
            seniority: Some("executive".to_string()),
            department: Some("engineering".to_string()),
            linkedin: None,
            verification_status: Some("valid".to_string()),
        }
    }

    pub fn generic_email(email: &str) -> EmailRecord {
        EmailRecord {
            email: email.to_string(),
            address_type: "generic".to_string(),
            confidence: 99,
            first_name: None,
            last_name: None,
            position: None,
            seniority: None,
            department: None,
            linkedin: None,
            verification_status: None,
        }
    }
}
