use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use servicehub_models::{Booking, ListPage, Paginated, Payment, Service, WorkerProfile};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::gateway::{ApiClient, ApiResult};

/// Page number, size and free-form filters of one listing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageQuery {
    pub page: u64,
    #[serde(rename = "per_page")]
    pub page_size: u64,
    #[serde(flatten)]
    pub filters: BTreeMap<String, String>,
}

impl PageQuery {
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
            filters: BTreeMap::new(),
        }
    }

    pub fn filter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(key.into(), value.into());
        self
    }

    pub fn with_page(&self, page: u64) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }
}

/// Where a table's pages come from.
#[async_trait]
pub trait ListSource<T>: Send + Sync {
    async fn fetch(&self, query: &PageQuery) -> ApiResult<ListPage<T>>;
}

/// A GET endpoint answering with a Laravel paginator.
pub struct EndpointSource<T> {
    client: Arc<ApiClient>,
    endpoint: String,
    _row: PhantomData<fn() -> T>,
}

impl<T> EndpointSource<T> {
    pub fn new(client: Arc<ApiClient>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            _row: PhantomData,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EndpointSource<Booking> {
    pub fn bookings(client: Arc<ApiClient>) -> Self {
        Self::new(client, Booking::ENDPOINT)
    }
}

impl EndpointSource<Service> {
    pub fn services(client: Arc<ApiClient>) -> Self {
        Self::new(client, Service::ENDPOINT)
    }
}

impl EndpointSource<Payment> {
    pub fn payments(client: Arc<ApiClient>) -> Self {
        Self::new(client, Payment::ENDPOINT)
    }
}

impl EndpointSource<WorkerProfile> {
    pub fn admin_workers(client: Arc<ApiClient>) -> Self {
        Self::new(client, WorkerProfile::ENDPOINT)
    }
}

#[async_trait]
impl<T> ListSource<T> for EndpointSource<T>
where
    T: DeserializeOwned + Send + 'static,
{
    async fn fetch(&self, query: &PageQuery) -> ApiResult<ListPage<T>> {
        let page: Paginated<T> = self.client.get_with_query(&self.endpoint, query).await?;
        Ok(page.into())
    }
}
