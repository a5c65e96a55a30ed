//! JSON/HTTP implementation of the remote data source.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{Page, PageQuery, Pagination, RemoteSource};
use crate::config::ClientConfig;
use crate::error::{Error, Result, SyncError, SyncResult};
use crate::models::{CollectionKey, ItemId, Record};
use crate::util::{compact_text, is_http_url, normalize_text_option};

/// API path serving a collection.
pub fn endpoint_path(collection: &CollectionKey) -> String {
    match collection.as_str() {
        CollectionKey::ENTRIES => "/logs".to_string(),
        CollectionKey::TRANSACTIONS => "/accounting".to_string(),
        CollectionKey::RECENT => "/recent".to_string(),
        other => format!("/{}", urlencoding::encode(other)),
    }
}

#[derive(Clone)]
pub struct HttpSource {
    base_url: String,
    access_token: Option<String>,
    client: Client,
}

impl fmt::Debug for HttpSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("HttpSource")
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish_non_exhaustive()
    }
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| Error::Config(format!("failed to build HTTP client: {error}")))?;
        Ok(Self {
            base_url,
            access_token: None,
            client,
        })
    }

    /// Build a source from resolved client configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let base_url = config
            .api_base_url
            .clone()
            .ok_or_else(|| Error::Config("API base URL is not configured".to_string()))?;
        let source = Self::new(base_url, config.request_timeout())?;
        Ok(match config.access_token.clone() {
            Some(token) => source.with_access_token(token),
            None => source,
        })
    }

    /// Send `token` as a bearer credential on every request.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = normalize_text_option(Some(token.into()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self, collection: &CollectionKey) -> String {
        format!("{}{}", self.base_url, endpoint_path(collection))
    }

    fn item_url(&self, collection: &CollectionKey, id: &ItemId) -> String {
        format!(
            "{}/{}",
            self.collection_url(collection),
            urlencoding::encode(id.as_str())
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header(reqwest::header::ACCEPT, "application/json");
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<D: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> SyncResult<Envelope<D>> {
        let response = self.authorize(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        decode_envelope(status, &body)
    }
}

impl<T: Record> RemoteSource<T> for HttpSource {
    async fn fetch_page(
        &self,
        collection: &CollectionKey,
        query: &PageQuery,
    ) -> SyncResult<Page<T>> {
        let mut params = vec![
            ("page", query.page.to_string()),
            ("limit", query.page_size.to_string()),
        ];
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }

        let request = self.client.get(self.collection_url(collection)).query(&params);
        let envelope = self.send::<Vec<T>>(request).await?;
        let pagination = envelope.pagination;
        let items = envelope.into_data()?;
        tracing::debug!(
            "GET {} page {} returned {} items",
            endpoint_path(collection),
            query.page,
            items.len()
        );
        Ok(Page { items, pagination })
    }

    async fn create_item(&self, collection: &CollectionKey, draft: &T::Draft) -> SyncResult<T> {
        let request = self.client.post(self.collection_url(collection)).json(draft);
        self.send::<T>(request).await?.into_data()
    }

    async fn update_item(
        &self,
        collection: &CollectionKey,
        id: &ItemId,
        draft: &T::Draft,
    ) -> SyncResult<T> {
        let request = self.client.put(self.item_url(collection, id)).json(draft);
        self.send::<T>(request).await?.into_data()
    }

    async fn delete_item(&self, collection: &CollectionKey, id: &ItemId) -> SyncResult<()> {
        let request = self.client.delete(self.item_url(collection, id));
        self.send::<serde_json::Value>(request).await.map(|_| ())
    }
}

/// Response wrapper used by every API route.
#[derive(Debug, Deserialize)]
struct Envelope<D> {
    #[serde(default)]
    success: Option<bool>,
    data: Option<D>,
    #[serde(default)]
    pagination: Option<Pagination>,
    error: Option<String>,
    message: Option<String>,
}

impl<D> Envelope<D> {
    fn into_data(self) -> SyncResult<D> {
        self.data.ok_or_else(|| {
            SyncError::InvalidPayload("response did not include data".to_string())
        })
    }
}

fn decode_envelope<D: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> SyncResult<Envelope<D>> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SyncError::Auth(parse_api_error(status, body)));
    }
    if !status.is_success() {
        return Err(SyncError::Api(parse_api_error(status, body)));
    }

    let envelope: Envelope<D> = serde_json::from_str(body)?;
    if envelope.success == Some(false) {
        let message = envelope
            .error
            .or(envelope.message)
            .unwrap_or_else(|| "request failed".to_string());
        return Err(SyncError::Api(message));
    }
    Ok(envelope)
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = payload.error.or(payload.message) {
            return format!("{} ({})", message.trim(), status.as_u16());
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        format!("{} ({})", trimmed, status.as_u16())
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let base_url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Config("API base URL must not be empty".to_string()))?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}
