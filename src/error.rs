//! Pipeline error types

use crate::types::Service;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {field}")]
    Configuration { field: String },

    #[error("No ICP data configured; sync or import attribute rows first")]
    NoIcpData,

    #[error("Insufficient {service} quota: need ~{needed} calls, have {remaining} remaining")]
    QuotaExceeded {
        service: Service,
        needed: u32,
        remaining: u32,
    },

    #[error("Domain search failed: {message}")]
    SearchFailed { message: String },

    #[error("Email lookup failed for {domain}: {message}")]
    EmailLookupFailed { domain: String, message: String },

    #[error("CRM operation failed: {message}")]
    CrmFailed { message: String },

    #[error("Notification delivery failed: {message}")]
    NotifyFailed { message: String },

    #[error("Storage operation failed: {message}")]
    Storage { message: String },

    #[error("Analysis failed: {message}")]
    Analysis { message: String },

    #[error("A prospecting run is already in progress")]
    RunInProgress,

    #[error("Run exceeded its {deadline_secs}s deadline")]
    RunTimedOut { deadline_secs: u64 },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn config(field: impl Into<String>) -> Self {
        EngineError::Configuration { field: field.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        EngineError::Storage { message: message.into() }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
