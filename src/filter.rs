//! Normalization and bucketing of raw feed events: impact and currency
//! filters, then a "today" / "upcoming" split on the configured timezone's
//! calendar date. Pure given `now_utc`; identical inputs produce identical
//! output.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

use crate::feed::types::{non_blank, EventTime, Impact, NormalizedEvent, RawEvent};

const DATE_FORMAT: &str = "%m-%d-%Y";
const TIME_FORMATS: &[&str] = &["%I:%M%p", "%H:%M", "%I:%M %p"];

/// Read-only filter settings for one run.
#[derive(Debug, Clone)]
pub struct FilterCriteria {
    pub min_impact: ImpactThreshold,
    /// Uppercase allow-list; empty admits every currency.
    pub currencies: Vec<String>,
    pub timezone: Tz,
    pub max_upcoming: usize,
}

/// Minimum impact to keep, or no impact filtering at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactThreshold {
    All,
    AtLeast(Impact),
}

impl ImpactThreshold {
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("all") {
            return Some(ImpactThreshold::All);
        }
        Impact::parse(s).map(ImpactThreshold::AtLeast)
    }

    pub fn admits(&self, impact: Impact) -> bool {
        match self {
            ImpactThreshold::All => true,
            ImpactThreshold::AtLeast(min) => impact >= *min,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImpactThreshold::All => "ALL",
            ImpactThreshold::AtLeast(Impact::Low) => "LOW",
            ImpactThreshold::AtLeast(Impact::Medium) => "MEDIUM",
            ImpactThreshold::AtLeast(Impact::High) => "HIGH",
        }
    }
}

/// The filtered view of one run: today's events and the truncated upcoming
/// tail, both sorted ascending. `upcoming_total` is the pre-truncation count.
#[derive(Debug, Clone, PartialEq)]
pub struct DayBuckets {
    pub today: Vec<NormalizedEvent>,
    pub upcoming: Vec<NormalizedEvent>,
    pub upcoming_total: usize,
}

fn is_fuzzy_time(t: &str) -> bool {
    t.eq_ignore_ascii_case("tba")
        || t.eq_ignore_ascii_case("tentative")
        || t.to_ascii_lowercase().contains("all day")
}

fn parse_time(t: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(t, fmt).ok())
}

/// The feed omits `<url>` on some records; point at the day page instead,
/// e.g. `calendar.php?day=mar11.2025`.
fn fallback_link(date: NaiveDate) -> String {
    format!(
        "https://www.forexfactory.com/calendar.php?day={}{:02}.{}",
        date.format("%b").to_string().to_lowercase(),
        date.day(),
        date.year()
    )
}

/// Convert one raw record into a typed event. Returns `None` (with a warning)
/// when the date is missing or unparseable; every produced event has either a
/// UTC instant or an explicit all-day marker.
pub fn normalize(raw: &RawEvent) -> Option<NormalizedEvent> {
    let title = non_blank(&raw.title).unwrap_or("Unknown").to_string();

    let Some(date_str) = non_blank(&raw.date) else {
        tracing::warn!(title = %title, "event has no date, dropping");
        return None;
    };
    let date = match NaiveDate::parse_from_str(date_str, DATE_FORMAT) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!(title = %title, date = date_str, error = %e, "unparseable event date, dropping");
            return None;
        }
    };

    // Feed times are UTC. Fuzzy values (missing, "All Day", "Tentative",
    // "TBA") and anything unparseable become an all-day marker.
    let when = match non_blank(&raw.time) {
        Some(t) if !is_fuzzy_time(t) => match parse_time(t) {
            Some(tod) => EventTime::At(date.and_time(tod).and_utc()),
            None => {
                tracing::warn!(title = %title, time = t, "unparseable event time, treating as all-day");
                EventTime::AllDay(date)
            }
        },
        _ => EventTime::AllDay(date),
    };

    let currency = non_blank(&raw.country)
        .map(str::to_uppercase)
        .unwrap_or_else(|| "USD".to_string());
    let impact = non_blank(&raw.impact)
        .and_then(Impact::parse)
        .unwrap_or(Impact::Medium);
    let link = non_blank(&raw.url)
        .map(str::to_string)
        .unwrap_or_else(|| fallback_link(date));

    Some(NormalizedEvent {
        title,
        currency,
        impact,
        when,
        link,
    })
}

fn local_date(ev: &NormalizedEvent, tz: Tz) -> NaiveDate {
    match ev.when {
        EventTime::At(at) => at.with_timezone(&tz).date_naive(),
        EventTime::AllDay(d) => d,
    }
}

// All-day events sort after timed events on the same local date.
fn sort_key(ev: &NormalizedEvent, tz: Tz) -> (NaiveDate, u8, i64) {
    match ev.when {
        EventTime::At(at) => (at.with_timezone(&tz).date_naive(), 0, at.timestamp()),
        EventTime::AllDay(d) => (d, 1, 0),
    }
}

/// Normalize, filter, and partition one fetch's events around `now_utc`.
/// Past events are discarded; `upcoming` keeps the earliest
/// `criteria.max_upcoming` entries (stable truncation).
pub fn bucket_events(
    raw: &[RawEvent],
    criteria: &FilterCriteria,
    now_utc: DateTime<Utc>,
) -> DayBuckets {
    let tz = criteria.timezone;
    let today_local = now_utc.with_timezone(&tz).date_naive();

    let mut dropped = 0usize;
    let mut filtered = 0usize;
    let mut past = 0usize;
    let mut today = Vec::new();
    let mut upcoming = Vec::new();

    for record in raw {
        let Some(ev) = normalize(record) else {
            dropped += 1;
            continue;
        };
        if !criteria.min_impact.admits(ev.impact) {
            filtered += 1;
            continue;
        }
        if !criteria.currencies.is_empty() && !criteria.currencies.contains(&ev.currency) {
            filtered += 1;
            continue;
        }

        let date = local_date(&ev, tz);
        if date < today_local {
            past += 1;
        } else if date == today_local {
            today.push(ev);
        } else {
            upcoming.push(ev);
        }
    }

    today.sort_by_key(|e| sort_key(e, tz));
    upcoming.sort_by_key(|e| sort_key(e, tz));
    let upcoming_total = upcoming.len();
    upcoming.truncate(criteria.max_upcoming);

    tracing::info!(
        today = today.len(),
        upcoming = upcoming.len(),
        upcoming_total,
        past,
        dropped,
        filtered,
        "bucketed calendar events"
    );

    DayBuckets {
        today,
        upcoming,
        upcoming_total,
    }
}
