//! Google Custom Search client
//!
//! Thin wrapper over the JSON API. Quota rejections (HTTP 429) surface as a
//! typed quota error so the orchestrator can distinguish them from transient
//! request failures.

use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{EngineError, EngineResult};
use crate::traits::{SearchApi, SearchPage};
use crate::types::Service;

const SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    #[serde(default)]
    queries: SearchQueries,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
}

#[derive(Debug, Default, Deserialize)]
struct SearchQueries {
    #[serde(rename = "nextPage", default)]
    next_page: Vec<serde_json::Value>,
}

pub struct GoogleSearchClient {
    client: reqwest::Client,
    api_key: String,
    engine_id: String,
    endpoint: String,
}

impl GoogleSearchClient {
    pub fn new(api_key: String, engine_id: String) -> EngineResult<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            engine_id,
            endpoint: SEARCH_ENDPOINT.to_string(),
        })
    }

    /// Point the client at a different endpoint (test harnesses).
    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }
}

#[async_trait::async_trait]
impl SearchApi for GoogleSearchClient {
    async fn search(&self, query: &str, start_index: u32) -> EngineResult<SearchPage> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("start", &start_index.to_string()),
            ])
            .send()
            .await?;

        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(EngineError::QuotaExceeded {
                    service: Service::Search,
                    needed: 1,
                    remaining: 0,
                })
            }
            status if !status.is_success() => {
                return Err(EngineError::SearchFailed {
                    message: format!("search API returned {status}"),
                })
            }
            _ => {}
        }

        let body: SearchResponse = response.json().await?;
        Ok(SearchPage {
            links: body.items.into_iter().map(|item| item.link).collect(),
            has_more: !body.queries.next_page.is_empty(),
        })
    }
}
