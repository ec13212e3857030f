use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Option<Uuid>,
    pub worker_id: Uuid,
    pub customer_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Reviews written by (customers) or about (workers) the signed-in user.
    pub const DASHBOARD_ENDPOINT: &'static str = "/dashboard/reviews";
}

impl Entity for Review {
    fn id(&self) -> Uuid {
        self.id
    }
}
