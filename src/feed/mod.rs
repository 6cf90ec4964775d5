pub mod client;
pub mod types;

use crate::error::FetchError;
use types::RawEvent;

/// Seam between the pipeline and the concrete feed, so tests can drive a run
/// from canned events.
#[async_trait::async_trait]
pub trait CalendarSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<RawEvent>, FetchError>;
    fn name(&self) -> &'static str;
}

pub use client::{parse_feed, FeedClient};
