use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub offer_id: Option<Uuid>,
    pub amount: f64,
    #[serde(default)]
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl Payment {
    pub const ENDPOINT: &'static str = "/payments";
    /// Payments visible to the signed-in user, unpaginated.
    pub const DASHBOARD_ENDPOINT: &'static str = "/dashboard/payments";
}

impl Entity for Payment {
    fn id(&self) -> Uuid {
        self.id
    }
}
