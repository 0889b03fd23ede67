//! Traits and interfaces for provider-agnostic stock checks and alerting

use anyhow::Result;
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::models::{Gpu, StockCheckResult};

/// Trait for retailer-specific stock APIs
#[async_trait]
pub trait StockClient: Send + Sync {
    /// Identity of this implementation, used in log lines
    fn name(&self) -> &str;

    /// Query the retailer for the given GPUs
    ///
    /// # Returns
    /// * `Result<Vec<StockCheckResult>>` - One result per requested GPU, in request order
    async fn check_stock(&self, gpus: &[Gpu]) -> Result<Vec<StockCheckResult>>;
}

/// Trait for messaging providers that deliver alert text to a fixed set of recipients
#[async_trait]
pub trait SenderClient: Send + Sync {
    /// Send `message` to every configured recipient
    ///
    /// Recipients are handled independently; a failure for one never aborts
    /// the others.
    async fn send(&self, message: &str) -> SendReport;
}

/// Outcome of one `SenderClient::send` call.
#[derive(Debug, Default)]
pub struct SendReport {
    pub successes: Vec<String>,
    pub errors: Vec<SendError>,
}

impl SendReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Failure to deliver to one recipient.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("\"{recipient}\" err -> {source}")]
    Transport {
        recipient: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("\"{recipient}\" -> {status}")]
    Rejected { recipient: String, status: StatusCode },
}

impl SendError {
    pub fn recipient(&self) -> &str {
        match self {
            Self::Transport { recipient, .. } | Self::Rejected { recipient, .. } => recipient,
        }
    }
}
