//! Daily trigger for the notification pipeline. One run at a time: the loop
//! sleeps until the owned next-fire instant, drives a full run to completion,
//! then advances the next-fire instant from the trigger it just served — so a
//! trigger that passes while a run is still in progress is deferred, never
//! lost, and runs never overlap.

use chrono::{DateTime, Datelike, Days, Duration as ChronoDuration, TimeZone, Utc};
use chrono_tz::Tz;

use crate::config::Config;
use crate::feed::CalendarSource;
use crate::notify::discord::DiscordNotifier;
use crate::pipeline;

pub struct Scheduler {
    hour: u32,
    minute: u32,
    tz: Tz,
    next_fire: DateTime<Utc>,
}

impl Scheduler {
    pub fn new(hour: u32, minute: u32, tz: Tz, now: DateTime<Utc>) -> Self {
        Self {
            hour,
            minute,
            tz,
            next_fire: next_occurrence(now, tz, hour, minute),
        }
    }

    pub fn next_fire(&self) -> DateTime<Utc> {
        self.next_fire
    }

    /// Run forever. Pipeline failures are logged as the run's outcome and do
    /// not cancel future triggers.
    pub async fn run(
        mut self,
        config: &Config,
        source: &dyn CalendarSource,
        notifier: &DiscordNotifier,
    ) {
        loop {
            let now = Utc::now();
            if self.next_fire > now {
                let wait = (self.next_fire - now).to_std().unwrap_or_default();
                tracing::info!(next_fire = %self.next_fire, "waiting for next scheduled run");
                tokio::time::sleep(wait).await;
            }

            tracing::info!(fire = %self.next_fire, "scheduled run starting");
            match pipeline::run_once(config, source, notifier).await {
                Ok(report) => tracing::info!(
                    today = report.today,
                    upcoming = report.upcoming,
                    "scheduled run complete"
                ),
                Err(e) => tracing::error!(error = ?e, "scheduled run failed"),
            }

            self.next_fire = next_occurrence(self.next_fire, self.tz, self.hour, self.minute);
        }
    }
}

/// The first instant strictly after `after` that reads `hour:minute` on the
/// wall clock in `tz`. DST gaps skip forward to the next day; ambiguous
/// times resolve to the earlier offset.
pub fn next_occurrence(after: DateTime<Utc>, tz: Tz, hour: u32, minute: u32) -> DateTime<Utc> {
    let mut date = after.with_timezone(&tz).date_naive();
    // Two iterations settle the common case; a couple more cover DST gaps.
    for _ in 0..4 {
        if let Some(candidate) = tz
            .with_ymd_and_hms(date.year(), date.month(), date.day(), hour, minute, 0)
            .earliest()
        {
            let candidate_utc = candidate.with_timezone(&Utc);
            if candidate_utc > after {
                return candidate_utc;
            }
        }
        match date.checked_add_days(Days::new(1)) {
            Some(d) => date = d,
            None => break,
        }
    }
    after + ChronoDuration::hours(24)
}
