//! Forex Calendar Notifier — Binary Entrypoint
//! Loads configuration, runs one pipeline pass at startup, then hands
//! control to the daily scheduler.

use anyhow::Context;
use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use forex_calendar_notifier::config::Config;
use forex_calendar_notifier::feed::FeedClient;
use forex_calendar_notifier::notify::discord::DiscordNotifier;
use forex_calendar_notifier::scheduler::Scheduler;
use forex_calendar_notifier::pipeline;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op where the environment is already set.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env().context("loading configuration")?;
    config.log_summary();

    let feed = FeedClient::new(&config.feed_url)
        .with_user_agent(&config.user_agent)
        .with_timeout(config.request_timeout)
        .with_retry(config.retry);
    let notifier = DiscordNotifier::new(&config.webhook_url)
        .with_timeout(config.request_timeout)
        .with_retry(config.retry);

    tracing::info!("startup run");
    match pipeline::run_once(&config, &feed, &notifier).await {
        Ok(report) => tracing::info!(
            today = report.today,
            upcoming = report.upcoming,
            "startup run complete"
        ),
        Err(e) => tracing::error!(error = ?e, "startup run failed"),
    }

    let scheduler = Scheduler::new(
        config.schedule_hour,
        config.schedule_minute,
        config.filter.timezone,
        Utc::now(),
    );
    scheduler.run(&config, &feed, &notifier).await;
    Ok(())
}
