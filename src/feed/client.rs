use std::time::Duration;

use async_trait::async_trait;
use quick_xml::de::from_str;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{FeedError, FetchError};
use crate::feed::types::{non_blank, RawEvent};
use crate::feed::CalendarSource;
use crate::retry::RetryPolicy;

#[derive(Debug, Deserialize)]
struct WeeklyEvents {
    #[serde(rename = "event", default)]
    events: Vec<RawEvent>,
}

/// Fetches and parses the weekly economic-calendar XML document.
pub struct FeedClient {
    url: String,
    user_agent: String,
    client: Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl FeedClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: format!("forex-calendar-notifier/{}", env!("CARGO_PKG_VERSION")),
            client: Client::new(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(&self) -> Result<Vec<RawEvent>, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status));
        }

        let body = response.text().await?;
        parse_feed(&body)
    }
}

#[async_trait]
impl CalendarSource for FeedClient {
    /// One GET per attempt; non-2xx, network errors, and malformed documents
    /// are all retried until the policy gives up.
    async fn fetch(&self) -> Result<Vec<RawEvent>, FetchError> {
        self.retry
            .run("feed fetch", |_: &FeedError| true, || self.fetch_once())
            .await
            .map_err(FetchError::from)
    }

    fn name(&self) -> &'static str {
        "forex-factory"
    }
}

/// Deserialize a `<weeklyevents>` document. Records carrying neither a title
/// nor a date are useless downstream and are dropped here with a warning;
/// anything else is kept for normalization to judge.
pub fn parse_feed(xml: &str) -> Result<Vec<RawEvent>, FeedError> {
    let doc: WeeklyEvents = from_str(xml)?;
    let total = doc.events.len();

    let events: Vec<RawEvent> = doc
        .events
        .into_iter()
        .filter(|ev| {
            let usable = non_blank(&ev.title).is_some() || non_blank(&ev.date).is_some();
            if !usable {
                tracing::warn!("feed record has neither title nor date, dropping");
            }
            usable
        })
        .collect();

    tracing::debug!(total, kept = events.len(), "parsed feed document");
    Ok(events)
}
