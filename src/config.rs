//! Environment-backed configuration, read once at startup into an immutable
//! [`Config`] that is passed by reference into every component. Components
//! never read the process environment themselves.

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;

use crate::error::ConfigError;
use crate::filter::{FilterCriteria, ImpactThreshold};
use crate::notify::FormatOptions;
use crate::retry::RetryPolicy;

/// This week's economic calendar, published as one XML document.
pub const DEFAULT_FEED_URL: &str = "https://nfs.faireconomy.media/ff_calendar_thisweek.xml";

// The feed occasionally rejects non-browser user agents.
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_url: String,
    pub feed_url: String,
    pub user_agent: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Daily trigger, local to `filter.timezone`.
    pub schedule_hour: u32,
    pub schedule_minute: u32,
    pub filter: FilterCriteria,
    pub format: FormatOptions,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let webhook_url = require("DISCORD_WEBHOOK_URL")?;

        let schedule_hour: u32 = parse_or("SCHEDULE_HOUR", 7)?;
        if schedule_hour > 23 {
            return Err(ConfigError::Invalid {
                name: "SCHEDULE_HOUR",
                reason: format!("expected 0-23, got {schedule_hour}"),
            });
        }
        let schedule_minute: u32 = parse_or("SCHEDULE_MINUTE", 0)?;
        if schedule_minute > 59 {
            return Err(ConfigError::Invalid {
                name: "SCHEDULE_MINUTE",
                reason: format!("expected 0-59, got {schedule_minute}"),
            });
        }

        let timezone_raw = string_or("TIMEZONE", "Asia/Jakarta");
        let timezone: Tz = timezone_raw.parse().map_err(|e| ConfigError::Invalid {
            name: "TIMEZONE",
            reason: format!("{e}"),
        })?;

        let impact_raw = string_or("MIN_IMPACT", "all");
        let min_impact =
            ImpactThreshold::parse(&impact_raw).ok_or_else(|| ConfigError::Invalid {
                name: "MIN_IMPACT",
                reason: format!("expected high|medium|low|all, got `{impact_raw}`"),
            })?;

        let color_raw = string_or("EMBED_COLOR", "FF4500");
        let embed_color =
            u32::from_str_radix(&color_raw, 16).map_err(|e| ConfigError::Invalid {
                name: "EMBED_COLOR",
                reason: format!("expected hex RGB without prefix: {e}"),
            })?;

        Ok(Self {
            webhook_url,
            feed_url: string_or("FEED_URL", DEFAULT_FEED_URL),
            user_agent: string_or("USER_AGENT", DEFAULT_USER_AGENT),
            request_timeout: Duration::from_secs(parse_or("REQUEST_TIMEOUT", 10u64)?),
            retry: RetryPolicy {
                max_retries: parse_or("MAX_RETRIES", 3)?,
                initial_backoff: Duration::from_secs(parse_or("INITIAL_SLEEP_SECONDS", 5u64)?),
            },
            schedule_hour,
            schedule_minute,
            filter: FilterCriteria {
                min_impact,
                currencies: parse_currencies(&string_or("CURRENCIES", "")),
                timezone,
                max_upcoming: parse_or("MAX_UPCOMING", 5)?,
            },
            format: FormatOptions {
                username: string_or("WEBHOOK_USERNAME", "Forex Notifier"),
                embed_title: string_or("EMBED_TITLE", "Forex Alerts"),
                server_name: string_or("SERVER_NAME", "Forex News"),
                embed_color,
                max_title_len: parse_or("MAX_EVENT_TITLE_LENGTH", 30)?,
            },
        })
    }

    pub fn log_summary(&self) {
        tracing::info!(
            feed_url = %self.feed_url,
            timezone = %self.filter.timezone,
            min_impact = self.filter.min_impact.label(),
            currencies = ?self.filter.currencies,
            max_upcoming = self.filter.max_upcoming,
            schedule = %format!("{:02}:{:02}", self.schedule_hour, self.schedule_minute),
            max_retries = self.retry.max_retries,
            initial_backoff_secs = self.retry.initial_backoff.as_secs(),
            request_timeout_secs = self.request_timeout.as_secs(),
            embed_color = %format!("{:06X}", self.format.embed_color),
            max_title_len = self.format.max_title_len,
            "configuration loaded"
        );
    }
}

fn lookup(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    lookup(name).ok_or(ConfigError::Missing(name))
}

fn string_or(name: &str, default: &str) -> String {
    lookup(name).unwrap_or_else(|| default.to_string())
}

fn parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
    }
}

fn parse_currencies(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .collect()
}
