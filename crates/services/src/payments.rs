//! Hosted-checkout handoff. The server creates the checkout session and
//! verifies the outcome; the client only redirects and reports back.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use servicehub_models::{Data, Payment, PaymentStatus};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::gateway::{ApiClient, ApiResult};
use crate::toast::Toasts;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutReturnError {
    #[error("Invalid return URL: {0}")]
    InvalidUrl(String),
    #[error("Return URL carries no session_id")]
    MissingSessionId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
    pub session_id: String,
}

/// Query parameters the checkout provider appends when it sends the user
/// back. Taken at face value; the server does the verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReturn {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_id: Option<Uuid>,
}

impl CheckoutReturn {
    pub fn parse(url: &str) -> Result<Self, CheckoutReturnError> {
        let url = Url::parse(url).map_err(|e| CheckoutReturnError::InvalidUrl(e.to_string()))?;

        let mut session_id = None;
        let mut status = None;
        let mut offer_id = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "session_id" if !value.is_empty() => session_id = Some(value.into_owned()),
                "status" => status = Some(value.into_owned()),
                "offer_id" => offer_id = Uuid::parse_str(&value).ok(),
                _ => {}
            }
        }

        Ok(Self {
            session_id: session_id.ok_or(CheckoutReturnError::MissingSessionId)?,
            status,
            offer_id,
        })
    }

    /// The provider reported the checkout as abandoned.
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref() == Some("cancelled")
    }
}

#[derive(Debug, Serialize)]
struct CreateCheckout {
    offer_id: Uuid,
}

#[derive(Debug, Serialize)]
struct SessionQuery<'a> {
    session_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutStatus {
    pub status: PaymentStatus,
    pub payment: Option<Payment>,
}

pub struct PaymentsApi {
    client: Arc<ApiClient>,
    toasts: Toasts,
}

impl PaymentsApi {
    pub fn new(client: Arc<ApiClient>, toasts: Toasts) -> Self {
        Self { client, toasts }
    }

    pub async fn create_checkout(&self, offer_id: Uuid) -> ApiResult<CheckoutSession> {
        let session: CheckoutSession = self
            .client
            .post("/payments/create-checkout", &CreateCheckout { offer_id })
            .await
            .inspect_err(|e| self.toasts.error(e.user_message()))?;
        debug!(%offer_id, session_id = %session.session_id, "Checkout session created");
        Ok(session)
    }

    pub async fn complete(&self, ret: &CheckoutReturn) -> ApiResult<Payment> {
        let resp: Data<Payment> = self
            .client
            .post("/payments/complete", ret)
            .await
            .inspect_err(|e| self.toasts.error(e.user_message()))?;
        info!(payment_id = %resp.data.id, status = ?resp.data.status, "Payment completed");
        if resp.data.status == PaymentStatus::Paid {
            self.toasts.success("Payment received");
        }
        Ok(resp.data)
    }

    pub async fn status(&self, session_id: &str) -> ApiResult<CheckoutStatus> {
        self.client
            .get_with_query("/payments/status", &SessionQuery { session_id })
            .await
    }
}
