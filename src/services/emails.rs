//! Hunter-style email-discovery client

use serde::Deserialize;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::traits::EmailDiscoveryApi;
use crate::types::EmailRecord;

const DISCOVERY_ENDPOINT: &str = "https://api.hunter.io/v2/domain-search";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct DomainSearchResponse {
    #[serde(default)]
    data: Option<DomainSearchData>,
}

#[derive(Debug, Deserialize)]
struct DomainSearchData {
    #[serde(default)]
    emails: Vec<RawEmail>,
}

#[derive(Debug, Deserialize)]
struct RawEmail {
    value: String,
    #[serde(rename = "type")]
    address_type: String,
    #[serde(default)]
    confidence: u32,
    first_name: Option<String>,
    last_name: Option<String>,
    position: Option<String>,
    seniority: Option<String>,
    department: Option<String>,
    linkedin: Option<String>,
    verification: Option<Verification>,
}

#[derive(Debug, Deserialize)]
struct Verification {
    status: Option<String>,
}

pub struct HunterClient {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl HunterClient {
    pub fn new(api_key: String) -> EngineResult<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            endpoint: DISCOVERY_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }
}

#[async_trait::async_trait]
impl EmailDiscoveryApi for HunterClient {
    async fn find_emails(&self, domain: &str, limit: u32) -> EngineResult<Vec<EmailRecord>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("domain", domain),
                ("api_key", self.api_key.as_str()),
                ("limit", &limit.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::EmailLookupFailed {
                domain: domain.to_string(),
                message: format!("discovery API returned {}", response.status()),
            });
        }

        let body: DomainSearchResponse = response.json().await?;
        let records = body
            .data
            .map(|data| data.emails)
            .unwrap_or_default()
            .into_iter()
            .map(|raw| EmailRecord {
                email: raw.value,
                address_type: raw.address_type,
                confidence: raw.confidence,
                first_name: raw.first_name,
                last_name: raw.last_name,
                position: raw.position,
                seniority: raw.seniority,
                department: raw.department,
                linkedin: raw.linkedin,
                verification_status: raw.verification.and_then(|v| v.status),
            })
            .collect();

        Ok(records)
    }
}
