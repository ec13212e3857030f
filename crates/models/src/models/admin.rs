use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Booking, Entity, Payment, Profile, Service, WorkerProfile};

/// Payload of `/admin/data`: everything the admin dashboard aggregates over.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminData {
    #[serde(default)]
    pub users: Vec<Profile>,
    #[serde(default)]
    pub workers: Vec<WorkerProfile>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub activation_requests: Vec<ActivationRequest>,
    #[serde(default)]
    pub reports: Vec<Report>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationRequest {
    pub id: Uuid,
    pub worker_id: Uuid,
    #[serde(default)]
    pub status: ActivationStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub subject_type: String,
    pub subject_id: Uuid,
    pub reason: String,
    #[serde(default)]
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Open,
    Resolved,
    Dismissed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub total_paid: f64,
    pub total_pending: f64,
    pub total_refunded: f64,
    pub payment_count: u64,
}

impl Entity for ActivationRequest {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Entity for Report {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl AdminData {
    pub const ENDPOINT: &'static str = "/admin/data";
}

impl ActivationRequest {
    pub const ENDPOINT: &'static str = "/admin/activation-requests";
}

impl Report {
    pub const ENDPOINT: &'static str = "/admin/reports";
}

impl PaymentSummary {
    pub const ENDPOINT: &'static str = "/admin/payment-summary";
}
