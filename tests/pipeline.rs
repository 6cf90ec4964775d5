// tests/pipeline.rs
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::UTC;
use forex_calendar_notifier::config::{Config, DEFAULT_FEED_URL};
use forex_calendar_notifier::error::FetchError;
use forex_calendar_notifier::feed::types::RawEvent;
use forex_calendar_notifier::feed::CalendarSource;
use forex_calendar_notifier::filter::{FilterCriteria, ImpactThreshold};
use forex_calendar_notifier::notify::discord::DiscordNotifier;
use forex_calendar_notifier::notify::FormatOptions;
use forex_calendar_notifier::pipeline;
use forex_calendar_notifier::retry::RetryPolicy;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct MockSource(Vec<RawEvent>);

#[async_trait]
impl CalendarSource for MockSource {
    async fn fetch(&self) -> Result<Vec<RawEvent>, FetchError> {
        Ok(self.0.clone())
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

fn raw(title: &str, country: &str, date: &str, time: &str, impact: &str) -> RawEvent {
    RawEvent {
        title: Some(title.to_string()),
        country: Some(country.to_string()),
        date: Some(date.to_string()),
        time: Some(time.to_string()),
        impact: Some(impact.to_string()),
        ..RawEvent::default()
    }
}

fn config(webhook_url: String) -> Config {
    Config {
        webhook_url,
        feed_url: DEFAULT_FEED_URL.to_string(),
        user_agent: "pipeline-test/1.0".to_string(),
        request_timeout: Duration::from_secs(5),
        retry: RetryPolicy {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        },
        schedule_hour: 7,
        schedule_minute: 0,
        filter: FilterCriteria {
            min_impact: ImpactThreshold::All,
            currencies: vec![],
            timezone: UTC,
            max_upcoming: 5,
        },
        format: FormatOptions {
            username: "Forex Notifier".to_string(),
            embed_title: "Forex Alerts".to_string(),
            server_name: "Forex News".to_string(),
            embed_color: 0xFF4500,
            max_title_len: 30,
        },
    }
}

#[tokio::test]
async fn smoke_run_fetches_buckets_and_delivers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .and(body_partial_json(serde_json::json!({
            "username": "Forex Notifier"
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(format!("{}/webhook", server.uri()));
    let today = Utc::now().format("%m-%d-%Y").to_string();
    let source = MockSource(vec![
        raw("Core CPI m/m", "USD", &today, "All Day", "High"),
        raw("Stale", "EUR", "01-01-2020", "08:00", "High"),
    ]);
    let notifier = DiscordNotifier::new(config.webhook_url.clone())
        .with_timeout(config.request_timeout)
        .with_retry(config.retry);

    let report = pipeline::run_once(&config, &source, &notifier)
        .await
        .expect("run succeeds");
    assert_eq!(report.today, 1);
    assert_eq!(report.upcoming, 0);
}

#[tokio::test]
async fn a_failed_delivery_surfaces_as_the_run_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .respond_with(ResponseTemplate::new(403).set_body_string("unknown webhook"))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(format!("{}/webhook", server.uri()));
    let source = MockSource(vec![]);
    let notifier = DiscordNotifier::new(config.webhook_url.clone())
        .with_timeout(config.request_timeout)
        .with_retry(config.retry);

    let err = pipeline::run_once(&config, &source, &notifier)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("403"), "got: {err}");
}
