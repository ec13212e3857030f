use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub worker_id: Uuid,
    pub service_id: Option<Uuid>,
    /// Denormalised service category, present on admin listings.
    pub category: Option<String>,
    #[serde(default)]
    pub status: BookingStatus,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub price: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Pending, accepted or under way.
    pub fn is_active(self) -> bool {
        matches!(
            self,
            BookingStatus::Pending | BookingStatus::Accepted | BookingStatus::InProgress
        )
    }
}

impl Booking {
    pub const ENDPOINT: &'static str = "/bookings";
}

impl Entity for Booking {
    fn id(&self) -> Uuid {
        self.id
    }
}
