//! reqwest-backed lesson service client.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;

use storefront_catalog::CatalogItem;
use storefront_core::{LessonId, OrderId, RequestId};

use crate::config::ClientConfig;
use crate::service::{
    LessonService, OrderRequest, OrderResponse, ServiceError, ServiceResult, UpdateSpacesRequest,
    UpdateSpacesResponse,
};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Client for the lesson service REST API.
///
/// Makes exactly one attempt per call; retry policy belongs to the user.
#[derive(Debug, Clone)]
pub struct HttpLessonService {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl HttpLessonService {
    pub fn new(config: &ClientConfig) -> ServiceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            token: None,
        })
    }

    pub fn with_token(config: &ClientConfig, token: String) -> ServiceResult<Self> {
        let mut service = Self::new(config)?;
        service.token = Some(token);
        Ok(service)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// `{api_url}/lessons/{id}` with the id percent-encoded as one path segment.
    fn lesson_url(&self, item_id: &LessonId) -> ServiceResult<Url> {
        if matches!(item_id.as_str(), "." | "..") {
            return Err(ServiceError::Parse(format!(
                "lesson id {item_id:?} cannot be used as a path segment"
            )));
        }

        let mut url = Url::parse(&self.url("/lessons"))
            .map_err(|e| ServiceError::Network(format!("invalid lesson service url: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ServiceError::Network(format!("{} cannot carry a path", self.api_url)))?
            .push(item_id.as_str());
        Ok(url)
    }

    /// Send one request and decode a JSON body.
    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder, op: &'static str) -> ServiceResult<T> {
        let request_id = RequestId::new();
        let mut req = req.header(REQUEST_ID_HEADER, request_id.to_string());
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        tracing::debug!(%request_id, op, "sending request to lesson service");

        let resp = req.send().await.map_err(|e| {
            tracing::warn!(%request_id, op, error = %e, "lesson service unreachable");
            ServiceError::Network(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::warn!(%request_id, op, status = status.as_u16(), "lesson service returned an error");
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }

        resp.json::<T>().await.map_err(|e| {
            tracing::warn!(%request_id, op, error = %e, "undecodable lesson service response");
            ServiceError::Parse(e.to_string())
        })
    }
}

#[async_trait]
impl LessonService for HttpLessonService {
    async fn list_lessons(&self) -> ServiceResult<Vec<CatalogItem>> {
        let req = self.client.get(self.url("/lessons"));
        self.send(req, "list_lessons").await
    }

    async fn search_lessons(&self, query: &str) -> ServiceResult<Vec<CatalogItem>> {
        let req = self.client.get(self.url("/search")).query(&[("q", query)]);
        self.send(req, "search_lessons").await
    }

    async fn update_spaces(&self, item_id: &LessonId, spaces: u32) -> ServiceResult<()> {
        let req = self
            .client
            .put(self.lesson_url(item_id)?)
            .json(&UpdateSpacesRequest { spaces });

        let resp: UpdateSpacesResponse = self.send(req, "update_spaces").await?;
        if !resp.success {
            return Err(ServiceError::Rejected(format!(
                "spaces update for lesson {item_id} was not accepted"
            )));
        }
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> ServiceResult<OrderId> {
        let req = self.client.post(self.url("/orders")).json(order);
        let resp: OrderResponse = self.send(req, "place_order").await?;
        resp.into_order_id()
    }
}
