use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

/// One `<event>` element from the weekly calendar feed, exactly as parsed.
/// Every field is optional at this stage; normalization decides what is
/// usable. Discarded after the run completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawEvent {
    pub title: Option<String>,
    pub country: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub impact: Option<String>,
    pub forecast: Option<String>,
    pub previous: Option<String>,
    pub actual: Option<String>,
    pub url: Option<String>,
}

/// Trimmed, non-empty text of an optional feed field.
pub(crate) fn non_blank(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Market significance of an event, ordered `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Some(Impact::Low),
            "medium" => Some(Impact::Medium),
            "high" => Some(Impact::High),
            _ => None,
        }
    }
}

/// When an event happens: a fixed UTC instant, or a calendar day with no
/// fixed time ("All Day", "Tentative", missing or unparseable time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    At(DateTime<Utc>),
    AllDay(NaiveDate),
}

/// A feed event with its fields converted to typed values.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub title: String,
    /// Uppercase 3-letter code.
    pub currency: String,
    pub impact: Impact,
    pub when: EventTime,
    pub link: String,
}
