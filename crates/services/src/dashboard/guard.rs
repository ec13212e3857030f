use std::time::Duration;
use tokio::time::Instant;

/// Remembers when a dashboard last loaded successfully and whether that is
/// old enough to load again on focus.
#[derive(Debug, Clone)]
pub struct RefetchGuard {
    stale_after: Duration,
    last_fetch: Option<Instant>,
}

impl RefetchGuard {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            stale_after,
            last_fetch: None,
        }
    }

    pub fn mark_fetched(&mut self) {
        self.last_fetch = Some(Instant::now());
    }

    pub fn last_fetch(&self) -> Option<Instant> {
        self.last_fetch
    }

    /// Never fetched, or fetched strictly longer ago than the threshold.
    pub fn is_stale(&self) -> bool {
        match self.last_fetch {
            None => true,
            Some(at) => at.elapsed() > self.stale_after,
        }
    }
}
