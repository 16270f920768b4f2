//! ActiveCampaign-style CRM client
//!
//! Contact upsert goes through the `contact/sync` endpoint keyed by email;
//! list membership is a second call. Enrichment data rides along as custom
//! field values using the account's field ids.

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::traits::CrmApi;
use crate::types::EmailCandidate;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Custom field ids in the CRM account.
const FIELD_DOMAIN: &str = "6";
const FIELD_POSITION: &str = "11";
const FIELD_DEPARTMENT: &str = "12";
const FIELD_SENIORITY: &str = "13";
const FIELD_LINKEDIN: &str = "14";
const FIELD_CONFIDENCE: &str = "17";
const FIELD_VERIFICATION: &str = "18";

#[derive(Debug, Deserialize)]
struct ContactSyncResponse {
    contact: ContactBody,
}

#[derive(Debug, Deserialize)]
struct ContactBody {
    id: String,
}

pub struct ActiveCampaignClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl ActiveCampaignClient {
    pub fn new(base_url: String, api_token: String) -> EngineResult<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn field_values(candidate: &EmailCandidate, domain: &str) -> Vec<serde_json::Value> {
        let mut fields = vec![json!({ "field": FIELD_DOMAIN, "value": domain })];

        let mut push_opt = |field: &str, value: &Option<String>| {
            if let Some(value) = value {
                fields.push(json!({ "field": field, "value": value }));
            }
        };
        push_opt(FIELD_POSITION, &candidate.position);
        push_opt(FIELD_DEPARTMENT, &candidate.department);
        push_opt(FIELD_SENIORITY, &candidate.seniority);
        push_opt(FIELD_LINKEDIN, &candidate.linkedin);

        if candidate.confidence > 0 {
            fields.push(json!({ "field": FIELD_CONFIDENCE, "value": candidate.confidence.to_string() }));
        }
        if let Some(status) = &candidate.verification_status {
            fields.push(json!({ "field": FIELD_VERIFICATION, "value": status }));
        }

        fields
    }
}

#[async_trait::async_trait]
impl CrmApi for ActiveCampaignClient {
    async fn upsert_contact(
        &self,
        candidate: &EmailCandidate,
        domain: &str,
    ) -> EngineResult<String> {
        let body = json!({
            "contact": {
                "email": candidate.email,
                "firstName": candidate.first_name.clone().unwrap_or_default(),
                "lastName": candidate.last_name.clone().unwrap_or_default(),
                "fieldValues": Self::field_values(candidate, domain),
            }
        });

        let response = self
            .client
            .post(format!("{}/api/3/contact/sync", self.base_url))
            .header("Api-Token", &self.api_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::CrmFailed {
                message: format!("contact sync returned {}", response.status()),
            });
        }

        let parsed: ContactSyncResponse = response.json().await?;
        Ok(parsed.contact.id)
    }

    async fn add_to_list(&self, contact_id: &str, list_id: u32) -> EngineResult<()> {
        let body = json!({
            "contactList": {
                "list": list_id,
                "contact": contact_id,
                "status": 1, // active membership
            }
        });

        let response = self
            .client
            .post(format!("{}/api/3/contactLists", self.base_url))
            .header("Api-Token", &self.api_token)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::CrmFailed {
                message: format!("list add returned {}", response.status()),
            });
        }

        Ok(())
    }
}
