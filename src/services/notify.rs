//! Email notification sink
//!
//! Sends run reports and operational notices through a Resend-style HTTP
//! email API. When no API key or no recipients are configured the report is
//! logged locally instead; the engine already treats any error from this
//! sink as non-fatal.

use serde_json::json;
use std::time::Duration;
use tracing::info;

use crate::error::{EngineError, EngineResult};
use crate::traits::NotificationSink;
use crate::types::{RunReport, RunStatus};

const SEND_ENDPOINT: &str = "https://api.resend.com/emails";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct EmailNotifier {
    client: reqwest::Client,
    api_key: Option<String>,
    from: String,
    recipients: Vec<String>,
    endpoint: String,
}

impl EmailNotifier {
    pub fn new(
        api_key: Option<String>,
        from: String,
        recipients: Vec<String>,
    ) -> EngineResult<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            from,
            recipients,
            endpoint: SEND_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint;
        self
    }

    fn subject(report: &RunReport) -> String {
        match report.status {
            RunStatus::Failed => {
                format!("Prospecting run #{} failed", report.execution_log_id)
            }
            _ => format!(
                "Prospecting run #{} completed successfully",
                report.execution_log_id
            ),
        }
    }

    fn body(report: &RunReport) -> String {
        let mut body = format!(
            "Prospecting run #{}\n\
             Status: {:?}\n\
             Started: {}\n\
             Completed: {}\n\n\
             Domains found: {}\n\
             Emails found: {}\n\
             Leads posted: {}\n\
             Duplicates skipped: {}\n",
            report.execution_log_id,
            report.status,
            report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.completed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            report.domains_found,
            report.emails_found,
            report.leads_posted,
            report.duplicates_skipped,
        );
        if let Some(error) = &report.error {
            body.push_str(&format!("\nError: {error}\n"));
        }
        body
    }

    async fn send(&self, subject: &str, text: &str) -> EngineResult<()> {
        if self.recipients.is_empty() {
            info!("no active notification recipients, skipping send");
            return Ok(());
        }

        let Some(api_key) = &self.api_key else {
            info!(subject, "email API key not configured, logging notification:\n{text}");
            return Ok(());
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&json!({
                "from": self.from,
                "to": self.recipients,
                "subject": subject,
                "text": text,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(EngineError::NotifyFailed {
                message: format!("email API returned {}", response.status()),
            });
        }

        info!(subject, recipients = self.recipients.len(), "notification sent");
        Ok(())
    }
}

#[async_trait::async_trait]
impl NotificationSink for EmailNotifier {
    async fn notify(&self, report: &RunReport) -> EngineResult<()> {
        self.send(&Self::subject(report), &Self::body(report)).await
    }

    async fn notify_text(&self, subject: &str, body: &str) -> EngineResult<()> {
        self.send(subject, body).await
    }
}
