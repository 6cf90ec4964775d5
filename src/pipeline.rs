//! One complete run: fetch the feed, filter and bucket the events, render
//! the embed, deliver it. Invoked at startup and from the scheduler; every
//! run is independent.

use anyhow::Result;
use chrono::Utc;

use crate::config::Config;
use crate::feed::CalendarSource;
use crate::filter;
use crate::notify::discord::DiscordNotifier;
use crate::notify::embed;

#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub today: usize,
    pub upcoming: usize,
}

pub async fn run_once(
    config: &Config,
    source: &dyn CalendarSource,
    notifier: &DiscordNotifier,
) -> Result<RunReport> {
    let raw = source.fetch().await?;
    tracing::info!(count = raw.len(), source = source.name(), "fetched calendar events");

    let now = Utc::now();
    let buckets = filter::bucket_events(&raw, &config.filter, now);
    let payload = embed::build_payload(&buckets, &config.filter, &config.format, now);
    notifier.deliver(&payload).await?;

    Ok(RunReport {
        today: buckets.today.len(),
        upcoming: buckets.upcoming.len(),
    })
}
