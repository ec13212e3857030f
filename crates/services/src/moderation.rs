//! Admin-only calls behind the moderation tables.

use serde::Serialize;
use servicehub_models::{
    ActivationRequest, ActivationStatus, Data, PaymentSummary, Report, ReportStatus, Service,
    WorkerProfile,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::gateway::{ApiClient, ApiResult};
use crate::table::{ListSource, PagedTable};

#[derive(Debug, Serialize)]
struct StatusBody<S> {
    status: S,
}

#[derive(Clone)]
pub struct AdminApi {
    client: Arc<ApiClient>,
}

impl AdminApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn verify_worker(&self, worker_id: Uuid) -> ApiResult<WorkerProfile> {
        let resp: Data<WorkerProfile> = self
            .client
            .put(&format!("/admin/workers/{worker_id}/verify"), &serde_json::json!({}))
            .await?;
        info!(%worker_id, "Worker verified");
        Ok(resp.data)
    }

    pub async fn set_activation(
        &self,
        request_id: Uuid,
        status: ActivationStatus,
    ) -> ApiResult<ActivationRequest> {
        let resp: Data<ActivationRequest> = self
            .client
            .put(
                &format!("{}/{request_id}", ActivationRequest::ENDPOINT),
                &StatusBody { status },
            )
            .await?;
        Ok(resp.data)
    }

    pub async fn resolve_report(&self, report_id: Uuid, status: ReportStatus) -> ApiResult<Report> {
        let resp: Data<Report> = self
            .client
            .put(&format!("{}/{report_id}", Report::ENDPOINT), &StatusBody { status })
            .await?;
        Ok(resp.data)
    }

    pub async fn delete_service(&self, service_id: Uuid) -> ApiResult<()> {
        let _: serde::de::IgnoredAny = self
            .client
            .delete(&format!("{}/{service_id}", Service::ENDPOINT))
            .await?;
        Ok(())
    }

    pub async fn payment_summary(&self) -> ApiResult<PaymentSummary> {
        let resp: Data<PaymentSummary> = self.client.get(PaymentSummary::ENDPOINT).await?;
        Ok(resp.data)
    }
}

impl<S: ListSource<WorkerProfile>> PagedTable<WorkerProfile, S> {
    /// Marks the row verified at once; the server's copy replaces it on
    /// success.
    pub async fn verify_worker(&self, api: &AdminApi, worker_id: Uuid) -> ApiResult<()> {
        self.update(
            worker_id,
            |w: &mut WorkerProfile| w.is_verified = true,
            async { api.verify_worker(worker_id).await.map(Some) },
        )
        .await
    }
}

impl<S: ListSource<Service>> PagedTable<Service, S> {
    pub async fn remove_service(&self, api: &AdminApi, service_id: Uuid) -> ApiResult<()> {
        self.delete(service_id, api.delete_service(service_id)).await
    }
}
