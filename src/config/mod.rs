//! Command line flags, environment lookup and startup validation

use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::models::Gpu;

pub const ENV_TWILIO_NUM_FROM: &str = "TWILIO_NUM_FROM";
pub const ENV_TWILIO_NUM_TO: &str = "TWILIO_NUM_TO";
pub const ENV_TWILIO_SID: &str = "TWILIO_SID";
pub const ENV_TWILIO_AUTH_TOKEN: &str = "TWILIO_AUTH_TOKEN";
pub const ENV_TWILIO_TEST_SID: &str = "TWILIO_TEST_SID";
pub const ENV_TWILIO_TEST_AUTH_TOKEN: &str = "TWILIO_TEST_AUTH_TOKEN";
pub const ENV_POLL_INTERVAL: &str = "POLL_INTERVAL";

/// Polls GPU stock and texts recipients when a card becomes available.
#[derive(Debug, Clone, Default, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Test the Twilio SMS api with test credentials
    #[arg(long)]
    pub faketest: bool,

    /// Test the Twilio SMS api with live credentials. Recipients receive a real SMS and you will be charged for it
    #[arg(long)]
    pub livetest: bool,

    /// Interval at which GPU availability is checked, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub pollint: u64,

    /// Read configuration from the environment: TWILIO_NUM_FROM, TWILIO_NUM_TO (space separated),
    /// TWILIO_SID, TWILIO_AUTH_TOKEN, TWILIO_TEST_SID, TWILIO_TEST_AUTH_TOKEN and POLL_INTERVAL
    #[arg(long)]
    pub env: bool,

    /// Twilio sender number
    #[arg(long)]
    pub from: Option<String>,

    /// Recipient numbers
    #[arg(long, num_args = 1..)]
    pub to: Vec<String>,

    /// Twilio account SID
    #[arg(long)]
    pub sid: Option<String>,

    /// Twilio auth token
    #[arg(long)]
    pub auth_token: Option<String>,

    /// Twilio test account SID
    #[arg(long)]
    pub test_sid: Option<String>,

    /// Twilio test auth token
    #[arg(long)]
    pub test_auth_token: Option<String>,

    /// GPUs to watch, all of them if omitted
    #[arg(long, value_enum, num_args = 1..)]
    pub gpu: Vec<Gpu>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Please provide the sender tel. number")]
    MissingSender,
    #[error("Please provide at least one recipient tel. number")]
    MissingRecipients,
    #[error("Invalid POLL_INTERVAL environment variable {0:?}, define it as a number of milliseconds")]
    InvalidPollInterval(String),
    #[error("Poll interval must be greater than zero")]
    ZeroPollInterval,
    #[error("Please supply Twilio SID and authentication token via flags or the environment variables")]
    MissingLiveCredentials,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub sid: String,
    pub auth_token: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("sid", &self.sid)
            .field("auth_token", &"***")
            .finish()
    }
}

impl Credentials {
    fn from_parts(sid: Option<String>, auth_token: Option<String>) -> Option<Self> {
        let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        match (present(sid), present(auth_token)) {
            (Some(sid), Some(auth_token)) => Some(Self { sid, auth_token }),
            _ => None,
        }
    }
}

/// Validated runtime configuration, immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub sender: String,
    pub recipients: Vec<String>,
    pub live: Credentials,
    pub test: Option<Credentials>,
    pub poll_interval: Duration,
    pub gpus: Vec<Gpu>,
    pub fake_test: bool,
    pub live_test: bool,
}

impl Settings {
    /// Resolve settings from the process environment.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        Self::resolve(cli, |key| std::env::var(key).ok())
    }

    /// Merge flags with values from `lookup` (only consulted when `--env` is
    /// set) and check that everything needed to poll and alert is present.
    pub fn resolve<F>(cli: Cli, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| {
            if cli.env {
                lookup(key).filter(|value| !value.trim().is_empty())
            } else {
                None
            }
        };

        let sender = env(ENV_TWILIO_NUM_FROM)
            .or_else(|| cli.from.clone())
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingSender)?;

        let recipients: Vec<String> = match env(ENV_TWILIO_NUM_TO) {
            Some(value) => value.split_whitespace().map(str::to_string).collect(),
            None => cli
                .to
                .iter()
                .filter(|value| !value.trim().is_empty())
                .cloned()
                .collect(),
        };
        if recipients.is_empty() {
            return Err(ConfigError::MissingRecipients);
        }

        let poll_ms = if cli.env {
            let raw = lookup(ENV_POLL_INTERVAL).unwrap_or_default();
            raw.trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidPollInterval(raw))?
        } else {
            cli.pollint
        };
        if poll_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }

        let live = Credentials::from_parts(
            env(ENV_TWILIO_SID).or_else(|| cli.sid.clone()),
            env(ENV_TWILIO_AUTH_TOKEN).or_else(|| cli.auth_token.clone()),
        )
        .ok_or(ConfigError::MissingLiveCredentials)?;

        let test = Credentials::from_parts(
            env(ENV_TWILIO_TEST_SID).or_else(|| cli.test_sid.clone()),
            env(ENV_TWILIO_TEST_AUTH_TOKEN).or_else(|| cli.test_auth_token.clone()),
        );

        let gpus = if cli.gpu.is_empty() {
            Gpu::ALL.to_vec()
        } else {
            cli.gpu.clone()
        };

        Ok(Self {
            sender,
            recipients,
            live,
            test,
            poll_interval: Duration::from_millis(poll_ms),
            gpus,
            fake_test: cli.faketest,
            live_test: cli.livetest,
        })
    }
}
