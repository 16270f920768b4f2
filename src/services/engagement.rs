//! CRM contact-score engagement source
//!
//! Uses the contact's score (0-100) as the engagement ground truth for the
//! analyzer. Lookups are per email with a small throttle applied by the
//! caller's loop; unknown contacts yield `None`.

use serde::Deserialize;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::traits::EngagementSource;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ContactsResponse {
    #[serde(default)]
    contacts: Vec<Contact>,
}

#[derive(Debug, Deserialize)]
struct Contact {
    #[serde(default)]
    score: Option<String>,
}

pub struct CrmEngagementSource {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl CrmEngagementSource {
    pub fn new(base_url: String, api_token: String) -> EngineResult<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }
}

#[async_trait::async_trait]
impl EngagementSource for CrmEngagementSource {
    async fn score_for(&self, email: &str) -> EngineResult<Option<f64>> {
        let response = self
            .client
            .get(format!("{}/api/3/contacts", self.base_url))
            .header("Api-Token", &self.api_token)
            .query(&[("filters[email]", email)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::CrmFailed {
                message: format!("contact lookup returned {}", response.status()),
            });
        }

        let body: ContactsResponse = response.json().await?;
        let score = body
            .contacts
            .first()
            .and_then(|contact| contact.score.as_deref())
            .and_then(|raw| raw.parse::<f64>().ok());

        Ok(score)
    }
}
