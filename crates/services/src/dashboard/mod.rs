//! Role dashboards: a few coarse fetches, then everything on screen is
//! derived client-side.
//!
//! A [`DashboardHook`] owns one loader's last result. Focus events only
//! trigger a load when the data is stale, and go through a debounce timer so
//! a burst of focus events costs a single fetch.

mod admin;
mod customer;
mod guard;
mod worker;

pub use admin::{AdminDashboard, AdminStats};
pub use customer::{CustomerDashboard, CustomerStats};
pub use guard::RefetchGuard;
pub use worker::{WorkerDashboard, WorkerStats};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, TimeZone, Utc};
use parking_lot::Mutex;
use servicehub_config::DashboardSettings;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::gateway::{ApiResult, GatewayError};
use crate::table::{ListSource, PageQuery};
use crate::toast::Toasts;

/// Page size used when a dashboard walks a whole listing.
pub(crate) const BOOKINGS_PAGE_SIZE: u64 = 100;

/// Fetches every page of `query` and concatenates the rows. Stops once the
/// reported total is reached or the server hands back an empty page.
pub(crate) async fn fetch_all<T, S: ListSource<T>>(source: &S, query: PageQuery) -> ApiResult<Vec<T>> {
    let mut query = query.with_page(1);
    let mut rows = Vec::new();
    loop {
        let page = source.fetch(&query).await?;
        let total = page.total_count;
        if page.items.is_empty() {
            break;
        }
        rows.extend(page.items);
        if rows.len() as u64 >= total {
            break;
        }
        query = query.with_page(query.page + 1);
    }
    debug!(rows = rows.len(), "Fetched full listing");
    Ok(rows)
}

#[async_trait]
pub trait DashboardLoader: Send + Sync + 'static {
    type Output: Clone + Send + Sync + 'static;

    async fn load(&self) -> ApiResult<Self::Output>;
}

struct HookState<O> {
    data: Option<O>,
    error: Option<GatewayError>,
    loading: bool,
    guard: RefetchGuard,
}

pub struct DashboardHook<L: DashboardLoader> {
    loader: L,
    state: Mutex<HookState<L::Output>>,
    debounce: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
    toasts: Toasts,
}

impl<L: DashboardLoader> DashboardHook<L> {
    pub fn new(loader: L, settings: &DashboardSettings, toasts: Toasts) -> Self {
        Self::with_timing(loader, settings.stale_after(), settings.focus_debounce(), toasts)
    }

    pub fn with_timing(loader: L, stale_after: Duration, debounce: Duration, toasts: Toasts) -> Self {
        Self {
            loader,
            state: Mutex::new(HookState {
                data: None,
                error: None,
                loading: false,
                guard: RefetchGuard::new(stale_after),
            }),
            debounce,
            pending: Mutex::new(None),
            toasts,
        }
    }

    pub fn data(&self) -> Option<L::Output> {
        self.state.lock().data.clone()
    }

    pub fn error(&self) -> Option<GatewayError> {
        self.state.lock().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn is_stale(&self) -> bool {
        self.state.lock().guard.is_stale()
    }

    /// Fetches now, regardless of staleness. A failure keeps the previous
    /// data and leaves the dashboard stale so the next focus retries.
    pub async fn load(&self) -> ApiResult<L::Output> {
        self.state.lock().loading = true;
        let result = self.loader.load().await;

        let mut state = self.state.lock();
        state.loading = false;
        match &result {
            Ok(data) => {
                state.data = Some(data.clone());
                state.error = None;
                state.guard.mark_fetched();
            }
            Err(e) => {
                warn!(error = %e, "Dashboard load failed");
                state.error = Some(e.clone());
                self.toasts.error(e.user_message());
            }
        }
        result
    }

    /// Manual refresh: cancels any scheduled focus fetch and loads now.
    pub async fn refresh(&self) -> ApiResult<L::Output> {
        self.cancel_pending();
        self.load().await
    }

    /// Window focus. Schedules a load after the debounce delay when the data
    /// is stale, replacing whatever load was already scheduled.
    pub fn on_focus(self: &Arc<Self>) {
        {
            let state = self.state.lock();
            if state.loading || !state.guard.is_stale() {
                debug!("Dashboard fresh, focus ignored");
                return;
            }
        }

        let hook: Weak<Self> = Arc::downgrade(self);
        let delay = self.debounce;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(hook) = hook.upgrade() else {
                return;
            };
            if !hook.is_stale() || hook.is_loading() {
                return;
            }
            let _ = hook.load().await;
        });

        if let Some(previous) = self.pending.lock().replace(task) {
            previous.abort();
        }
    }

    pub fn cancel_pending(&self) {
        if let Some(task) = self.pending.lock().take() {
            task.abort();
        }
    }
}

impl<L: DashboardLoader> Drop for DashboardHook<L> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

/// Percentage change from `previous` to `current`. 100 when growing from
/// nothing, 0 when both are empty.
pub fn growth_rate(current: usize, previous: usize) -> f64 {
    match (previous, current) {
        (0, 0) => 0.0,
        (0, _) => 100.0,
        (p, c) => round2((c as f64 - p as f64) / p as f64 * 100.0),
    }
}

/// `part` as a percentage of `whole`; 0 for an empty whole.
pub fn completion_rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// First instant of the calendar month containing `now`.
pub(crate) fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

/// First instant of the calendar month before the one containing `now`.
pub(crate) fn previous_month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = match now.month() {
        1 => (now.year() - 1, 12),
        m => (now.year(), m - 1),
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
