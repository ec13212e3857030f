use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use servicehub_models::{Booking, BookingStatus, Data, Payment, PaymentStatus, Review};
use std::sync::Arc;
use uuid::Uuid;

use super::{BOOKINGS_PAGE_SIZE, DashboardLoader, fetch_all, round2};
use crate::gateway::{ApiClient, ApiResult};
use crate::table::{EndpointSource, PageQuery};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CustomerStats {
    pub active_bookings: usize,
    pub completed_bookings: usize,
    pub total_spent: f64,
    pub reviews_written: usize,
    pub next_booking: Option<Booking>,
}

impl CustomerStats {
    pub fn derive(
        bookings: &[Booking],
        payments: &[Payment],
        reviews: &[Review],
        now: DateTime<Utc>,
    ) -> Self {
        let next_booking = bookings
            .iter()
            .filter(|b| b.status.is_active())
            .filter(|b| b.scheduled_at.is_some_and(|at| at > now))
            .min_by_key(|b| b.scheduled_at)
            .cloned();

        Self {
            active_bookings: bookings.iter().filter(|b| b.status.is_active()).count(),
            completed_bookings: bookings
                .iter()
                .filter(|b| b.status == BookingStatus::Completed)
                .count(),
            total_spent: round2(
                payments
                    .iter()
                    .filter(|p| p.status == PaymentStatus::Paid)
                    .map(|p| p.amount)
                    .sum(),
            ),
            reviews_written: reviews.len(),
            next_booking,
        }
    }
}

pub struct CustomerDashboard {
    client: Arc<ApiClient>,
    bookings: EndpointSource<Booking>,
    customer_id: Uuid,
}

impl CustomerDashboard {
    pub fn new(client: Arc<ApiClient>, customer_id: Uuid) -> Self {
        Self {
            bookings: EndpointSource::bookings(Arc::clone(&client)),
            client,
            customer_id,
        }
    }
}

#[async_trait]
impl DashboardLoader for CustomerDashboard {
    type Output = CustomerStats;

    async fn load(&self) -> ApiResult<CustomerStats> {
        let query = PageQuery::new(1, BOOKINGS_PAGE_SIZE).filter("customer_id", self.customer_id.to_string());
        let (bookings, payments, reviews) = futures::try_join!(
            fetch_all(&self.bookings, query),
            self.client.get::<Data<Vec<Payment>>>(Payment::DASHBOARD_ENDPOINT),
            self.client.get::<Data<Vec<Review>>>(Review::DASHBOARD_ENDPOINT),
        )?;
        Ok(CustomerStats::derive(
            &bookings,
            &payments.data,
            &reviews.data,
            Utc::now(),
        ))
    }
}
