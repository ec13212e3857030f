use serde::Serialize;
use servicehub_models::{Booking, BookingStatus, Data};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::gateway::{ApiClient, ApiResult};
use crate::table::{ListSource, PagedTable};

#[derive(Debug, Serialize)]
struct StatusUpdate {
    status: BookingStatus,
}

#[derive(Clone)]
pub struct BookingApi {
    client: Arc<ApiClient>,
}

impl BookingApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn get(&self, id: Uuid) -> ApiResult<Booking> {
        let resp: Data<Booking> = self
            .client
            .get(&format!("{}/{id}", Booking::ENDPOINT))
            .await?;
        Ok(resp.data)
    }

    pub async fn update_status(&self, id: Uuid, status: BookingStatus) -> ApiResult<Booking> {
        debug!(%id, ?status, "Updating booking status");
        let resp: Data<Booking> = self
            .client
            .put(&format!("{}/{id}", Booking::ENDPOINT), &StatusUpdate { status })
            .await?;
        Ok(resp.data)
    }
}

impl<S: ListSource<Booking>> PagedTable<Booking, S> {
    /// Accept, decline, complete or cancel a listed booking optimistically.
    pub async fn set_status(&self, api: &BookingApi, id: Uuid, status: BookingStatus) -> ApiResult<()> {
        self.update(
            id,
            move |b: &mut Booking| b.status = status,
            async { api.update_status(id, status).await.map(Some) },
        )
        .await
    }
}
