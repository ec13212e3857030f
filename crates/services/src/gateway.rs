//! Single choke point for network I/O against the marketplace REST API.
//!
//! Every call resolves to an [`ApiResult`]: transport failures, undecodable
//! bodies and non-2xx statuses all come back as a [`GatewayError`] value.
//! Nothing here retries, de-duplicates or panics.

use reqwest::{Method, header};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use servicehub_config::ApiSettings;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::storage::{AUTH_TOKEN_KEY, Storage, StorageError};

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("API error {status}: {}", .body.message.as_deref().unwrap_or("no message"))]
    Api { status: u16, body: ApiErrorBody },
}

pub type ApiResult<T> = Result<T, GatewayError>;

/// `{data, error}` view of a call outcome; exactly one side is set.
#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub error: Option<GatewayError>,
}

impl<T> From<ApiResult<T>> for Envelope<T> {
    fn from(result: ApiResult<T>) -> Self {
        match result {
            Ok(data) => Self {
                data: Some(data),
                error: None,
            },
            Err(error) => Self {
                data: None,
                error: Some(error),
            },
        }
    }
}

/// Laravel error body: `{"message": "...", "errors": {"field": ["..."]}}`.
/// Whatever the server sent is kept in `raw`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub message: Option<String>,
    pub errors: Option<serde_json::Value>,
    #[serde(skip)]
    pub raw: serde_json::Value,
}

impl ApiErrorBody {
    fn parse(bytes: &[u8]) -> Self {
        match serde_json::from_slice::<serde_json::Value>(bytes) {
            Ok(raw) => {
                let mut body: ApiErrorBody =
                    serde_json::from_value(raw.clone()).unwrap_or_default();
                body.raw = raw;
                body
            }
            Err(_) => {
                let text = String::from_utf8_lossy(bytes).trim().to_string();
                ApiErrorBody {
                    message: (!text.is_empty()).then(|| text.clone()),
                    errors: None,
                    raw: serde_json::Value::String(text),
                }
            }
        }
    }
}

impl GatewayError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 419))
    }

    /// Human-readable text for a toast.
    pub fn user_message(&self) -> String {
        match self {
            GatewayError::Api { body, .. } => body
                .message
                .clone()
                .unwrap_or_else(|| "Request failed".to_string()),
            GatewayError::Transport(_) => "Could not reach the server".to_string(),
            GatewayError::Decode(_) => "Unexpected response from the server".to_string(),
        }
    }
}

/// Query string and JSON body of a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RequestOptions {
    pub fn with_query<Q: Serialize + ?Sized>(mut self, query: &Q) -> ApiResult<Self> {
        self.query.extend(query_pairs(query)?);
        Ok(self)
    }

    pub fn with_body<B: Serialize + ?Sized>(mut self, body: &B) -> ApiResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| GatewayError::Decode(format!("Unserializable request body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }
}

/// Flattens a serializable struct or map into string pairs, skipping nulls.
fn query_pairs<Q: Serialize + ?Sized>(query: &Q) -> ApiResult<Vec<(String, String)>> {
    let value = serde_json::to_value(query)
        .map_err(|e| GatewayError::Decode(format!("Unserializable query: {e}")))?;
    let serde_json::Value::Object(map) = value else {
        return Err(GatewayError::Decode(
            "Query parameters must serialize to an object".to_string(),
        ));
    };
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| match v {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((k, s)),
            other => Some((k, other.to_string())),
        })
        .collect())
}

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    storage: Arc<dyn Storage>,
    token: watch::Sender<Option<String>>,
}

impl ApiClient {
    /// Builds a client and picks up any token already in `storage`.
    pub fn new(settings: &ApiSettings, storage: Arc<dyn Storage>) -> ApiResult<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let (token, _) = watch::channel(storage.get(AUTH_TOKEN_KEY));
        debug!(base_url = %settings.base_url, has_token = token.borrow().is_some(), "API client ready");

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            storage,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    /// Notified on every [`set_token`](Self::set_token), including clears.
    pub fn subscribe_token(&self) -> watch::Receiver<Option<String>> {
        self.token.subscribe()
    }

    /// Persists (or clears) the bearer token. The in-memory copy changes
    /// first, so later requests see the new value even if persisting fails.
    pub fn set_token(&self, token: Option<&str>) -> Result<(), StorageError> {
        self.token.send_replace(token.map(str::to_string));
        match token {
            Some(t) => self.storage.set(AUTH_TOKEN_KEY, t),
            None => self.storage.remove(AUTH_TOKEN_KEY),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let url = self.url(endpoint);
        let mut req = self
            .http
            .request(method.clone(), &url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");

        if let Some(token) = self.token() {
            req = req.bearer_auth(token);
        }
        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        if let Some(body) = &options.body {
            req = req.json(body);
        }

        let resp = req.send().await.map_err(|e| {
            warn!(%method, %url, error = %e, "Request failed");
            GatewayError::Transport(e.to_string())
        })?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            let body = ApiErrorBody::parse(&bytes);
            debug!(%method, %url, status = status.as_u16(), message = ?body.message, "API error");
            return Err(GatewayError::Api {
                status: status.as_u16(),
                body,
            });
        }

        debug!(%method, %url, status = status.as_u16(), "Request ok");
        let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(payload).map_err(|e| {
            warn!(%method, %url, error = %e, "Undecodable response");
            GatewayError::Decode(e.to_string())
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.request(Method::GET, endpoint, RequestOptions::default())
            .await
    }

    pub async fn get_with_query<T, Q>(&self, endpoint: &str, query: &Q) -> ApiResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let options = RequestOptions::default().with_query(query)?;
        self.request(Method::GET, endpoint, options).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let options = RequestOptions::default().with_body(body)?;
        self.request(Method::POST, endpoint, options).await
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let options = RequestOptions::default().with_body(body)?;
        self.request(Method::PUT, endpoint, options).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> ApiResult<T> {
        self.request(Method::DELETE, endpoint, RequestOptions::default())
            .await
    }
}
