//! Remote lesson/order service contract.
//!
//! The `LessonService` trait is async because every call is a network round
//! trip. Implementations report failures as `ServiceError`; callers treat any
//! error as "the service did not confirm", so local state must stay untouched.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use storefront_catalog::{CartLine, CatalogItem, Price};
use storefront_core::{LessonId, OrderId};

use crate::checkout::CustomerDetails;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from lesson service calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Network or connection error (including timeouts).
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// The service answered but reported `success: false`.
    #[error("rejected by service: {0}")]
    Rejected(String),
}

/// Body of `PUT /lessons/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSpacesRequest {
    pub spaces: u32,
}

/// Body returned by `PUT /lessons/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSpacesResponse {
    pub success: bool,
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    #[serde(flatten)]
    pub customer: CustomerDetails,
    pub items: Vec<CartLine>,
    pub total: Price,
    pub date: DateTime<Utc>,
}

/// Body returned by `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    pub success: bool,
    #[serde(rename = "orderId", default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<OrderId>,
}

impl OrderResponse {
    /// Turn the wire response into the assigned order id.
    pub fn into_order_id(self) -> ServiceResult<OrderId> {
        if !self.success {
            return Err(ServiceError::Rejected("order was not accepted".to_string()));
        }
        self.order_id
            .ok_or_else(|| ServiceError::Parse("order response is missing orderId".to_string()))
    }
}

/// The remote lesson/order service.
#[async_trait]
pub trait LessonService: Send + Sync {
    /// `GET /lessons`.
    async fn list_lessons(&self) -> ServiceResult<Vec<CatalogItem>>;

    /// `GET /search?q=<text>`.
    async fn search_lessons(&self, query: &str) -> ServiceResult<Vec<CatalogItem>>;

    /// `PUT /lessons/{id}` with the absolute number of spaces left.
    async fn update_spaces(&self, item_id: &LessonId, spaces: u32) -> ServiceResult<()>;

    /// `POST /orders`.
    async fn place_order(&self, order: &OrderRequest) -> ServiceResult<OrderId>;
}

#[async_trait]
impl<S: LessonService + ?Sized> LessonService for std::sync::Arc<S> {
    async fn list_lessons(&self) -> ServiceResult<Vec<CatalogItem>> {
        (**self).list_lessons().await
    }

    async fn search_lessons(&self, query: &str) -> ServiceResult<Vec<CatalogItem>> {
        (**self).search_lessons(query).await
    }

    async fn update_spaces(&self, item_id: &LessonId, spaces: u32) -> ServiceResult<()> {
        (**self).update_spaces(item_id, spaces).await
    }

    async fn place_order(&self, order: &OrderRequest) -> ServiceResult<OrderId> {
        (**self).place_order(order).await
    }
}
