use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub trade: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl WorkerProfile {
    /// Paginated admin listing, not the worker's own profile route.
    pub const ENDPOINT: &'static str = "/admin/workers-pagination";
}

impl Entity for WorkerProfile {
    fn id(&self) -> Uuid {
        self.id
    }
}
