use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use servicehub_models::{
    ActivationStatus, AdminData, BookingStatus, Data, PaymentStatus, ReportStatus, UserType,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{DashboardLoader, completion_rate, growth_rate, month_start, previous_month_start, round2};
use crate::gateway::{ApiClient, ApiResult};

const UNCATEGORISED: &str = "uncategorised";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdminStats {
    pub total_users: usize,
    pub total_customers: usize,
    pub total_workers: usize,
    pub pending_verifications: usize,
    pub pending_activation_requests: usize,
    pub open_reports: usize,
    pub total_bookings: usize,
    pub revenue: f64,
    pub user_growth_rate: f64,
    pub booking_completion_rate: f64,
    pub bookings_by_category: BTreeMap<String, usize>,
}

impl AdminStats {
    pub fn derive(data: &AdminData, now: DateTime<Utc>) -> Self {
        let this_month = month_start(now);
        let last_month = previous_month_start(now);
        let joined_this_month = data
            .users
            .iter()
            .filter(|u| u.created_at >= this_month && u.created_at <= now)
            .count();
        let joined_last_month = data
            .users
            .iter()
            .filter(|u| u.created_at >= last_month && u.created_at < this_month)
            .count();

        let completed = data
            .bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Completed)
            .count();

        let service_category: HashMap<_, _> = data
            .services
            .iter()
            .map(|s| (s.id, s.category.as_str()))
            .collect();
        let mut bookings_by_category = BTreeMap::new();
        for booking in &data.bookings {
            let category = booking
                .category
                .as_deref()
                .or_else(|| booking.service_id.and_then(|id| service_category.get(&id).copied()))
                .unwrap_or(UNCATEGORISED);
            *bookings_by_category.entry(category.to_string()).or_insert(0) += 1;
        }

        Self {
            total_users: data.users.len(),
            total_customers: data
                .users
                .iter()
                .filter(|u| u.user_type == UserType::Customer)
                .count(),
            total_workers: data.workers.len(),
            pending_verifications: data.workers.iter().filter(|w| !w.is_verified).count(),
            pending_activation_requests: data
                .activation_requests
                .iter()
                .filter(|r| r.status == ActivationStatus::Pending)
                .count(),
            open_reports: data
                .reports
                .iter()
                .filter(|r| r.status == ReportStatus::Open)
                .count(),
            total_bookings: data.bookings.len(),
            revenue: round2(
                data.payments
                    .iter()
                    .filter(|p| p.status == PaymentStatus::Paid)
                    .map(|p| p.amount)
                    .sum(),
            ),
            user_growth_rate: growth_rate(joined_this_month, joined_last_month),
            booking_completion_rate: completion_rate(completed, data.bookings.len()),
            bookings_by_category,
        }
    }
}

/// Loads `/admin/data` and derives [`AdminStats`] from it.
pub struct AdminDashboard {
    client: Arc<ApiClient>,
}

impl AdminDashboard {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DashboardLoader for AdminDashboard {
    type Output = AdminStats;

    async fn load(&self) -> ApiResult<AdminStats> {
        let resp: Data<AdminData> = self.client.get(AdminData::ENDPOINT).await?;
        Ok(AdminStats::derive(&resp.data, Utc::now()))
    }
}
