//! Background live-feed refresh

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::LiveFeed;

/// Refresh `feed` every `period` until the task is aborted
pub fn spawn_feed_poller(feed: Arc<LiveFeed>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(period_secs = period.as_secs(), "Live feed poller started");
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if let Err(e) = feed.refresh().await {
                warn!(error = %e, "Live feed refresh failed");
            }
        }
    })
}
