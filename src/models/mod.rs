//! Data models for GPU stock checks and the alerts derived from them

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Graphics cards whose availability can be polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
pub enum Gpu {
    #[value(name = "3090")]
    #[serde(rename = "3090")]
    Rtx3090,
    #[value(name = "3080")]
    #[serde(rename = "3080")]
    Rtx3080,
    #[value(name = "3070")]
    #[serde(rename = "3070")]
    Rtx3070,
    #[value(name = "3060Ti")]
    #[serde(rename = "3060Ti")]
    Rtx3060Ti,
}

impl Gpu {
    pub const ALL: [Self; 4] = [Self::Rtx3060Ti, Self::Rtx3070, Self::Rtx3080, Self::Rtx3090];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Rtx3090 => "3090",
            Self::Rtx3080 => "3080",
            Self::Rtx3070 => "3070",
            Self::Rtx3060Ti => "3060Ti",
        }
    }
}

impl fmt::Display for Gpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StockMsg {
    Available,
    Unavailable,
}

impl fmt::Display for StockMsg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => f.write_str("Stock Available"),
            Self::Unavailable => f.write_str("Stock Unavailable"),
        }
    }
}

/// One retailer's quoted stock for one GPU.
///
/// The alert flag and status are derived from the stock count when the value
/// is built, so a zero count can never carry an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetailerResult {
    stock: u32,
    name: String,
    msg: StockMsg,
    link: String,
    alert: bool,
}

impl RetailerResult {
    pub fn new(name: impl Into<String>, stock: u32, link: impl Into<String>) -> Self {
        let alert = stock > 0;
        let msg = if alert {
            StockMsg::Available
        } else {
            StockMsg::Unavailable
        };

        Self {
            stock,
            name: name.into(),
            msg,
            link: link.into(),
            alert,
        }
    }

    pub fn stock(&self) -> u32 {
        self.stock
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn msg(&self) -> StockMsg {
        self.msg
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    pub fn alert(&self) -> bool {
        self.alert
    }
}

impl fmt::Display for RetailerResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Retailer: {} Stock: {} Link: {}",
            self.name, self.stock, self.link
        )
    }
}

/// Stock status of one GPU across every retailer the API reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockCheckResult {
    gpu: Gpu,
    retailers: Vec<RetailerResult>,
    checked_at: DateTime<Utc>,
}

impl StockCheckResult {
    pub fn new(gpu: Gpu, retailers: Vec<RetailerResult>) -> Self {
        Self {
            gpu,
            retailers,
            checked_at: Utc::now(),
        }
    }

    pub fn gpu(&self) -> Gpu {
        self.gpu
    }

    pub fn retailers(&self) -> &[RetailerResult] {
        &self.retailers
    }

    pub fn checked_at(&self) -> DateTime<Utc> {
        self.checked_at
    }

    /// Whether any retailer currently has this GPU in stock.
    pub fn should_alert(&self) -> bool {
        self.retailers.iter().any(RetailerResult::alert)
    }

    /// Text sent to recipients: the GPU label followed by one block per
    /// retailer with stock.
    pub fn alert_string(&self) -> String {
        let mut text = format!("[{}] ", self.gpu);
        for retailer in self.retailers.iter().filter(|r| r.alert()) {
            text.push_str(&format!("\n||{retailer}||\n"));
        }
        text
    }
}
