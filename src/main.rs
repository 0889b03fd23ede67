use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

mod config;
mod models;
mod notificator;
mod stock_clients;
mod traits;
mod twilio;

use config::{Cli, Settings};
use notificator::Notificator;
use stock_clients::NvidiaDeStockClient;
use traits::SenderClient;
use twilio::{MAGIC_TEST_SENDER, TwilioSmsClient};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let settings = match Settings::from_cli(cli) {
        Ok(settings) => settings,
        Err(e) => {
            error!(target: "startup", "{}", e);
            std::process::exit(1);
        }
    };

    if settings.fake_test {
        fake_test(&settings).await;
    }

    let sms = TwilioSmsClient::new(
        settings.live.sid.clone(),
        settings.live.auth_token.clone(),
        settings.sender.clone(),
        settings.recipients.clone(),
    );

    if settings.live_test {
        let message = format!(
            "RtxNotificator is running! {}",
            chrono::Local::now().format("%H:%M:%S")
        );
        report_self_test(SelfTest::Live, &sms, &message).await;
    }

    info!(
        target: "startup",
        "RtxNotificator started with parameters: \n\tSender -> {} \n\tRecipients -> {:?}\n\tPolling Interval -> {:?}",
        settings.sender,
        sms.recipients(),
        settings.poll_interval
    );

    let notificator = Notificator::new(
        Arc::new(NvidiaDeStockClient::new()?),
        Arc::new(sms),
        &settings.gpus,
    );

    notificator.run(settings.poll_interval).await
}

/// Send through the Twilio sandbox, which only accepts its magic sender number.
async fn fake_test(settings: &Settings) {
    let Some(test) = &settings.test else {
        warn!(target: "fake_test", "Please provide test credentials before running the fake test");
        return;
    };

    let client = TwilioSmsClient::new(
        test.sid.clone(),
        test.auth_token.clone(),
        MAGIC_TEST_SENDER,
        settings.recipients.clone(),
    );

    report_self_test(
        SelfTest::Fake,
        &client,
        "If every phone number has 201 CREATED status then the test passed.",
    )
    .await;
}

#[derive(Clone, Copy)]
enum SelfTest {
    Fake,
    Live,
}

async fn report_self_test(test: SelfTest, client: &dyn SenderClient, message: &str) {
    let report = client.send(message).await;
    let errors: Vec<String> = report.errors.iter().map(ToString::to_string).collect();

    match (test, report.is_clean()) {
        (SelfTest::Fake, true) => {
            info!(target: "fake_test", "Successful, result: {:?}", report.successes);
        }
        (SelfTest::Fake, false) => error!(target: "fake_test", "Failed, errors: {:?}", errors),
        (SelfTest::Live, true) => {
            info!(target: "live_test", "Successful, result: {:?}", report.successes);
        }
        (SelfTest::Live, false) => error!(target: "live_test", "Failed, errors: {:?}", errors),
    }
}
