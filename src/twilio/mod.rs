//! # Twilio SMS Integration
//!
//! This module delivers stock alerts as text messages through Twilio's
//! Programmable Messaging REST API.
//!
//! ## Request Shape
//!
//! Every recipient gets its own request:
//! - **Method**: `POST {base}/2010-04-01/Accounts/{sid}/Messages.json`
//! - **Auth**: HTTP basic auth with the account SID and auth token
//! - **Body**: form-encoded `To`, `From` and `Body` fields
//!
//! Twilio answers `201 Created` once a message is queued. Anything else is
//! treated as a failed delivery for that recipient only.
//!
//! ## Test Credentials
//!
//! Twilio test credentials never deliver anything and are not charged. They
//! only accept the magic sender number [`MAGIC_TEST_SENDER`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::ACCEPT};
use tracing::{debug, info};

use crate::traits::{SendError, SendReport, SenderClient};

pub const API_BASE: &str = "https://api.twilio.com";

/// Sender number Twilio accepts for test credentials.
pub const MAGIC_TEST_SENDER: &str = "+15005550006";

/// Twilio SMS client bound to one account, one sender and a fixed recipient list.
///
/// ## Fields
///
/// - `client`: Reusable HTTP client shared by every request
/// - `sid` / `auth_token`: Account credentials, also used for basic auth
/// - `from`: Sender number
/// - `to`: Recipients, messaged in order
///
/// All fields are set once at construction and never change afterwards.
#[derive(Clone)]
pub struct TwilioSmsClient {
    client: Client,
    base_url: String,
    sid: String,
    auth_token: String,
    from: String,
    to: Vec<String>,
}

impl TwilioSmsClient {
    /// Creates a client against the public Twilio API.
    pub fn new(
        sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
        to: Vec<String>,
    ) -> Self {
        Self::with_base_url(API_BASE, sid, auth_token, from, to)
    }

    /// Creates a client against another API host, e.g. a local mock server.
    pub fn with_base_url(
        base_url: impl Into<String>,
        sid: impl Into<String>,
        auth_token: impl Into<String>,
        from: impl Into<String>,
        to: Vec<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            sid: sid.into(),
            auth_token: auth_token.into(),
            from: from.into(),
            to,
        }
    }

    pub fn recipients(&self) -> &[String] {
        &self.to
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.base_url.trim_end_matches('/'),
            self.sid
        )
    }

    async fn send_one(&self, url: &str, recipient: &str, message: &str) -> Result<String, SendError> {
        let response = self
            .client
            .post(url)
            .basic_auth(&self.sid, Some(&self.auth_token))
            .header(ACCEPT, "application/json")
            .form(&[("To", recipient), ("From", self.from.as_str()), ("Body", message)])
            .send()
            .await
            .map_err(|source| SendError::Transport {
                recipient: recipient.to_string(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::CREATED {
            Ok(format!("\"{recipient}\" -> {status}"))
        } else {
            debug!("Twilio rejected message to {}: {}", recipient, status);
            Err(SendError::Rejected {
                recipient: recipient.to_string(),
                status,
            })
        }
    }
}

#[async_trait]
impl SenderClient for TwilioSmsClient {
    async fn send(&self, message: &str) -> SendReport {
        let url = self.messages_url();
        let mut report = SendReport::default();

        for recipient in &self.to {
            match self.send_one(&url, recipient, message).await {
                Ok(success) => report.successes.push(success),
                Err(e) => report.errors.push(e),
            }
        }

        info!(
            "Twilio delivered {}/{} messages",
            report.successes.len(),
            self.to.len()
        );

        report
    }
}
