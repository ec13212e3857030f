use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use servicehub_models::{Booking, BookingStatus, Data, Payment, PaymentStatus, Review};
use std::sync::Arc;
use uuid::Uuid;

use super::{BOOKINGS_PAGE_SIZE, DashboardLoader, completion_rate, fetch_all, month_start, round2};
use crate::gateway::{ApiClient, ApiResult};
use crate::table::{EndpointSource, PageQuery};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WorkerStats {
    pub total_earnings: f64,
    pub month_earnings: f64,
    pub average_rating: f64,
    pub review_count: usize,
    pub completion_rate: f64,
    pub pending_requests: usize,
}

impl WorkerStats {
    pub fn derive(
        bookings: &[Booking],
        payments: &[Payment],
        reviews: &[Review],
        now: DateTime<Utc>,
    ) -> Self {
        let paid = || payments.iter().filter(|p| p.status == PaymentStatus::Paid);
        let since = month_start(now);

        let average_rating = if reviews.is_empty() {
            0.0
        } else {
            let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
            round2(f64::from(sum) / reviews.len() as f64)
        };

        let completed = bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .count();

        Self {
            total_earnings: round2(paid().map(|p| p.amount).sum()),
            month_earnings: round2(
                paid()
                    .filter(|p| p.created_at >= since)
                    .map(|p| p.amount)
                    .sum(),
            ),
            average_rating,
            review_count: reviews.len(),
            completion_rate: completion_rate(completed, bookings.len()),
            pending_requests: bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Pending)
                .count(),
        }
    }
}

pub struct WorkerDashboard {
    client: Arc<ApiClient>,
    bookings: EndpointSource<Booking>,
    worker_id: Uuid,
}

impl WorkerDashboard {
    pub fn new(client: Arc<ApiClient>, worker_id: Uuid) -> Self {
        Self {
            bookings: EndpointSource::bookings(Arc::clone(&client)),
            client,
            worker_id,
        }
    }
}

#[async_trait]
impl DashboardLoader for WorkerDashboard {
    type Output = WorkerStats;

    async fn load(&self) -> ApiResult<WorkerStats> {
        let query = PageQuery::new(1, BOOKINGS_PAGE_SIZE).filter("worker_id", self.worker_id.to_string());
        let (bookings, payments, reviews) = futures::try_join!(
            fetch_all(&self.bookings, query),
            self.client.get::<Data<Vec<Payment>>>(Payment::DASHBOARD_ENDPOINT),
            self.client.get::<Data<Vec<Review>>>(Review::DASHBOARD_ENDPOINT),
        )?;
        Ok(WorkerStats::derive(
            &bookings,
            &payments.data,
            &reviews.data,
            Utc::now(),
        ))
    }
}
