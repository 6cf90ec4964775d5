//! Renders bucketed events into the webhook embed. Pure: the payload is
//! fully determined by the buckets, criteria, options, and `now_utc`.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::feed::types::{EventTime, Impact, NormalizedEvent};
use crate::filter::{DayBuckets, FilterCriteria};
use crate::notify::{Embed, EmbedField, EmbedFooter, FormatOptions, WebhookPayload};

const FULL_CALENDAR_URL: &str = "https://www.forexfactory.com/calendar";
const NO_NEWS_TODAY: &str = "No news found for today. 😌";
const NO_UPCOMING: &str = "Clear skies ahead. 🌤️";

// Discord caps embed field values at 1024 chars; five lines stays well under.
const LINES_PER_FIELD: usize = 5;

fn impact_glyph(impact: Impact) -> &'static str {
    match impact {
        Impact::High => "🔴",
        Impact::Medium => "🟡",
        Impact::Low => "🟢",
    }
}

fn truncate_title(title: &str, max: usize) -> String {
    if title.chars().count() > max {
        let head: String = title.chars().take(max).collect();
        format!("{head}...")
    } else {
        title.to_string()
    }
}

/// One bullet line. Today's section omits the date; the upcoming section
/// prefixes it because that section spans multiple days.
fn event_line(ev: &NormalizedEvent, tz: Tz, max_title: usize, with_date: bool) -> String {
    let glyph = impact_glyph(ev.impact);
    let title = truncate_title(&ev.title, max_title);
    let (date_str, time_cols) = match ev.when {
        EventTime::At(at) => {
            let local = at.with_timezone(&tz);
            (
                local.format("%d %B %Y").to_string(),
                format!("{} | {}", local.format("%H:%M %Z"), at.format("%H:%M UTC")),
            )
        }
        EventTime::AllDay(d) => (d.format("%d %B %Y").to_string(), "All Day".to_string()),
    };
    if with_date {
        format!(
            "• {date_str} | {time_cols} {glyph} {}: [{title}]({})",
            ev.currency, ev.link
        )
    } else {
        format!(
            "• {time_cols} {glyph} {}: [{title}]({})",
            ev.currency, ev.link
        )
    }
}

fn today_fields(buckets: &DayBuckets, tz: Tz, max_title: usize) -> Vec<EmbedField> {
    let total = buckets.today.len();
    let heading = format!("📊 Today's News ({total} total)");

    if buckets.today.is_empty() {
        return vec![EmbedField {
            name: heading,
            value: NO_NEWS_TODAY.to_string(),
            inline: false,
        }];
    }

    buckets
        .today
        .chunks(LINES_PER_FIELD)
        .enumerate()
        .map(|(idx, chunk)| {
            let value = chunk
                .iter()
                .map(|ev| event_line(ev, tz, max_title, false))
                .collect::<Vec<_>>()
                .join("\n");
            let name = if idx == 0 {
                heading.clone()
            } else {
                // Continuation fields get a zero-width-space name so Discord
                // renders them as one flowing section.
                "\u{200B}".to_string()
            };
            EmbedField {
                name,
                value,
                inline: false,
            }
        })
        .collect()
}

fn upcoming_field(buckets: &DayBuckets, tz: Tz, max_title: usize) -> EmbedField {
    let mut value = if buckets.upcoming.is_empty() {
        NO_UPCOMING.to_string()
    } else {
        buckets
            .upcoming
            .iter()
            .map(|ev| event_line(ev, tz, max_title, true))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let shown = buckets.upcoming.len();
    if buckets.upcoming_total > shown {
        let remaining = buckets.upcoming_total - shown;
        value.push_str(&format!("\n**+{remaining} more!** [Full]({FULL_CALENDAR_URL})"));
    }

    EmbedField {
        name: format!("🔮 Upcoming ({} total)", buckets.upcoming_total),
        value,
        inline: false,
    }
}

/// Build the full webhook payload for one run.
pub fn build_payload(
    buckets: &DayBuckets,
    criteria: &FilterCriteria,
    opts: &FormatOptions,
    now_utc: DateTime<Utc>,
) -> WebhookPayload {
    let tz = criteria.timezone;
    let now_local = now_utc.with_timezone(&tz);
    let tz_abbrev = now_local.format("%Z").to_string();

    let mut fields = today_fields(buckets, tz, opts.max_title_len);
    fields.push(upcoming_field(buckets, tz, opts.max_title_len));

    let currencies_display = if criteria.currencies.is_empty() {
        "All".to_string()
    } else {
        criteria.currencies.join(", ")
    };
    let footer = format!(
        "{} | Grouped by {} Day (UTC{}) | Min Impact: {} | Lines: {} | Currencies: {}",
        opts.server_name,
        tz_abbrev,
        now_local.format("%:z"),
        criteria.min_impact.label(),
        criteria.max_upcoming,
        currencies_display
    );

    WebhookPayload {
        username: opts.username.clone(),
        embeds: vec![Embed {
            title: format!(
                "🚨 {} - {} ({})",
                opts.embed_title,
                now_local.format("%Y-%m-%d"),
                tz_abbrev
            ),
            description: "Filtered weekly calendar. Stay sharp! 📈".to_string(),
            color: opts.embed_color,
            fields,
            footer: EmbedFooter { text: footer },
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ImpactThreshold;
    use chrono::TimeZone;
    use chrono_tz::UTC;

    fn event(title: &str, impact: Impact, when: EventTime) -> NormalizedEvent {
        NormalizedEvent {
            title: title.to_string(),
            currency: "USD".to_string(),
            impact,
            when,
            link: "https://example.test/ev".to_string(),
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> EventTime {
        EventTime::At(Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap())
    }

    fn criteria() -> FilterCriteria {
        FilterCriteria {
            min_impact: ImpactThreshold::AtLeast(Impact::Medium),
            currencies: vec!["USD".to_string(), "EUR".to_string()],
            timezone: UTC,
            max_upcoming: 5,
        }
    }

    fn opts() -> FormatOptions {
        FormatOptions {
            username: "Forex Notifier".to_string(),
            embed_title: "Forex Alerts".to_string(),
            server_name: "Forex News".to_string(),
            embed_color: 0xFF4500,
            max_title_len: 30,
        }
    }

    fn buckets(today: Vec<NormalizedEvent>, upcoming: Vec<NormalizedEvent>) -> DayBuckets {
        let upcoming_total = upcoming.len();
        DayBuckets {
            today,
            upcoming,
            upcoming_total,
        }
    }

    fn run_instant() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap()
    }

    #[test]
    fn header_carries_label_date_and_zone() {
        let payload = build_payload(&buckets(vec![], vec![]), &criteria(), &opts(), run_instant());
        assert_eq!(payload.username, "Forex Notifier");
        assert_eq!(payload.embeds[0].title, "🚨 Forex Alerts - 2025-03-10 (UTC)");
        assert_eq!(payload.embeds[0].color, 0xFF4500);
    }

    #[test]
    fn footer_summarizes_the_filter_settings() {
        let payload = build_payload(&buckets(vec![], vec![]), &criteria(), &opts(), run_instant());
        assert_eq!(
            payload.embeds[0].footer.text,
            "Forex News | Grouped by UTC Day (UTC+00:00) | Min Impact: MEDIUM | Lines: 5 | Currencies: USD, EUR"
        );
    }

    #[test]
    fn empty_sections_render_placeholders() {
        let payload = build_payload(&buckets(vec![], vec![]), &criteria(), &opts(), run_instant());
        let fields = &payload.embeds[0].fields;
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "📊 Today's News (0 total)");
        assert_eq!(fields[0].value, NO_NEWS_TODAY);
        assert_eq!(fields[1].name, "🔮 Upcoming (0 total)");
        assert_eq!(fields[1].value, NO_UPCOMING);
    }

    #[test]
    fn today_line_has_times_glyph_currency_and_link() {
        let b = buckets(
            vec![event("Core CPI m/m", Impact::High, at(2025, 3, 10, 8, 30))],
            vec![],
        );
        let payload = build_payload(&b, &criteria(), &opts(), run_instant());
        assert_eq!(
            payload.embeds[0].fields[0].value,
            "• 08:30 UTC | 08:30 UTC 🔴 USD: [Core CPI m/m](https://example.test/ev)"
        );
    }

    #[test]
    fn upcoming_lines_are_prefixed_with_their_date() {
        let b = buckets(
            vec![],
            vec![event("ECB Press Conference", Impact::Medium, at(2025, 3, 11, 8, 0))],
        );
        let payload = build_payload(&b, &criteria(), &opts(), run_instant());
        assert_eq!(
            payload.embeds[0].fields[1].value,
            "• 11 March 2025 | 08:00 UTC | 08:00 UTC 🟡 USD: [ECB Press Conference](https://example.test/ev)"
        );
    }

    #[test]
    fn all_day_events_render_without_clock_times() {
        let d = chrono::NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let b = buckets(vec![event("Bank Holiday", Impact::Low, EventTime::AllDay(d))], vec![]);
        let payload = build_payload(&b, &criteria(), &opts(), run_instant());
        assert_eq!(
            payload.embeds[0].fields[0].value,
            "• All Day 🟢 USD: [Bank Holiday](https://example.test/ev)"
        );
    }

    #[test]
    fn long_titles_are_truncated_with_an_ellipsis_marker() {
        let long = "a".repeat(40);
        let exact = "b".repeat(30);
        let b = buckets(
            vec![
                event(&long, Impact::High, at(2025, 3, 10, 8, 0)),
                event(&exact, Impact::High, at(2025, 3, 10, 9, 0)),
            ],
            vec![],
        );
        let payload = build_payload(&b, &criteria(), &opts(), run_instant());
        let value = &payload.embeds[0].fields[0].value;
        let truncated = format!("[{}...]", "a".repeat(30));
        assert!(value.contains(&truncated), "got: {value}");
        let untouched = format!("[{}]", "b".repeat(30));
        assert!(value.contains(&untouched), "got: {value}");
    }

    #[test]
    fn long_today_sections_are_chunked_into_continuation_fields() {
        let today: Vec<_> = (0..7)
            .map(|i| event(&format!("event {i}"), Impact::Medium, at(2025, 3, 10, 8, i)))
            .collect();
        let payload = build_payload(&buckets(today, vec![]), &criteria(), &opts(), run_instant());
        let fields = &payload.embeds[0].fields;
        // Two today fields plus the upcoming field.
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].name, "📊 Today's News (7 total)");
        assert_eq!(fields[0].value.lines().count(), 5);
        assert_eq!(fields[1].name, "\u{200B}");
        assert_eq!(fields[1].value.lines().count(), 2);
    }

    #[test]
    fn truncated_upcoming_gets_a_more_trailer() {
        let upcoming: Vec<_> = (0..3)
            .map(|i| event(&format!("event {i}"), Impact::Medium, at(2025, 3, 11 + i, 8, 0)))
            .collect();
        let b = DayBuckets {
            today: vec![],
            upcoming,
            upcoming_total: 9,
        };
        let payload = build_payload(&b, &criteria(), &opts(), run_instant());
        let field = &payload.embeds[0].fields[1];
        assert_eq!(field.name, "🔮 Upcoming (9 total)");
        assert!(field
            .value
            .ends_with("**+6 more!** [Full](https://www.forexfactory.com/calendar)"));
    }

    #[test]
    fn formatting_is_byte_deterministic() {
        let b = buckets(
            vec![event("Core CPI m/m", Impact::High, at(2025, 3, 10, 8, 30))],
            vec![event("ECB Presser", Impact::Medium, at(2025, 3, 11, 8, 0))],
        );
        let first = serde_json::to_string(&build_payload(&b, &criteria(), &opts(), run_instant()))
            .unwrap();
        let second = serde_json::to_string(&build_payload(&b, &criteria(), &opts(), run_instant()))
            .unwrap();
        assert_eq!(first, second);
    }
}
