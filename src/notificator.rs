use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::models::Gpu;
use crate::traits::{SenderClient, StockClient};

/// Drives the stock checks and dispatches alerts.
///
/// Only one poll runs at a time: a tick that fires while the previous poll is
/// still waiting on the network is dropped.
#[derive(Clone)]
pub struct Notificator {
    stock: Arc<dyn StockClient>,
    sender: Arc<dyn SenderClient>,
    gpus: Arc<[Gpu]>,
    in_flight: Arc<Mutex<()>>,
}

impl Notificator {
    pub fn new(stock: Arc<dyn StockClient>, sender: Arc<dyn SenderClient>, gpus: &[Gpu]) -> Self {
        Self {
            stock,
            sender,
            gpus: gpus.into(),
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    /// Check stock once and alert for every GPU a retailer has in stock.
    ///
    /// Returns the number of alerts dispatched.
    pub async fn poll(&self) -> Result<usize> {
        let results = self.stock.check_stock(&self.gpus).await?;

        let mut alerts = 0;

        for result in &results {
            if result.should_alert() {
                for retailer in result.retailers().iter().filter(|r| r.alert()) {
                    debug!(
                        target: "poll",
                        "{} {} ({}) at {}, checked {}",
                        retailer.name(),
                        retailer.msg(),
                        retailer.stock(),
                        retailer.link(),
                        result.checked_at()
                    );
                }

                let message = result.alert_string();
                let report = self.sender.send(&message).await;

                info!(
                    target: "poll",
                    "Alert sent for {} result: {:?}\n\tSentContent: {}",
                    result.gpu(),
                    report.successes,
                    message
                );
                for e in &report.errors {
                    warn!(
                        target: "poll",
                        recipient = e.recipient(),
                        "Alert for {} not delivered: {}",
                        result.gpu(),
                        e
                    );
                }

                alerts += 1;
            }
        }

        info!(target: "poll", "Result from {}: {:?}", self.stock.name(), results);

        Ok(alerts)
    }

    /// Spawn one poll unless the previous one is still running.
    ///
    /// Returns the handle of the spawned poll, or `None` if the tick was skipped.
    pub fn tick(&self) -> Option<tokio::task::JoinHandle<()>> {
        let Ok(guard) = self.in_flight.clone().try_lock_owned() else {
            warn!(target: "poll", "Previous poll still in flight, skipping tick");
            return None;
        };

        let notificator = self.clone();
        Some(tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = notificator.poll().await {
                error!(target: "poll", "Polling error: {:#}", e);
            }
        }))
    }

    /// Poll every `period` until the process is killed.
    pub async fn run(self, period: Duration) -> Result<()> {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            target: "poll",
            "Polling {} every {:?} for {:?}",
            self.stock.name(),
            period,
            self.gpus
        );

        loop {
            ticker.tick().await;
            self.tick();
        }
    }
}
