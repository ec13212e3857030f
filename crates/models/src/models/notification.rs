use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Entity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    pub related_id: Option<Uuid>,
    pub related_type: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    Welcome,
    BookingRequest,
    BookingAccepted,
    BookingDeclined,
    BookingCompleted,
    OfferReceived,
    PaymentReceived,
    NewMessage,
    NewReview,
    WorkerVerified,
    ActivationRequest,
    #[serde(other)]
    System,
}

/// Body of a create call. The server assigns id, read flag and timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related_type: Option<String>,
}

impl Notification {
    pub const ENDPOINT: &'static str = "/notifications";
}

impl Entity for Notification {
    fn id(&self) -> Uuid {
        self.id
    }
}
