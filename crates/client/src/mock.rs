//! In-memory lesson service for deterministic testing.
//!
//! Stores lessons and orders in memory, records every call, and can be told
//! to fail a given operation. Calls can also be held open to observe a
//! request while it is outstanding.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::Notify;

use storefront_catalog::CatalogItem;
use storefront_catalog::view::{matches_query, normalize_query};
use storefront_core::{LessonId, OrderId};

use crate::service::{LessonService, OrderRequest, ServiceError, ServiceResult};

/// Thread-safe via internal `Arc<Mutex<...>>`; clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLessonService {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Debug, Default)]
struct Inner {
    lessons: Vec<CatalogItem>,
    orders: Vec<(OrderId, OrderRequest)>,
    fail_on: Option<FailOn>,
    holds: HashMap<Hold, Arc<Notify>>,
    operations: Vec<ServiceOperation>,
}

/// Which operation should fail, and how.
#[derive(Debug, Clone)]
pub enum FailOn {
    ListLessons(ServiceError),
    SearchLessons(ServiceError),
    UpdateSpaces(ServiceError),
    PlaceOrder(ServiceError),
}

/// Which operation to park until released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hold {
    ListLessons,
    UpdateSpaces,
    PlaceOrder,
}

/// Recorded call, for verification.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceOperation {
    ListLessons,
    SearchLessons { query: String },
    UpdateSpaces { item_id: LessonId, spaces: u32 },
    PlaceOrder { order: OrderRequest },
}

impl InMemoryLessonService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lessons(lessons: Vec<CatalogItem>) -> Self {
        let service = Self::new();
        service.state().lessons = lessons;
        service
    }

    fn state(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent call of the given kind fail until cleared.
    pub fn fail_on(&self, fail: FailOn) {
        self.state().fail_on = Some(fail);
    }

    pub fn clear_failure(&self) {
        self.state().fail_on = None;
    }

    /// Park every subsequent call of the given kind until the returned handle
    /// is notified (one `notify_one` releases one call). The call is recorded
    /// in `operations` before it parks.
    pub fn hold(&self, op: Hold) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.state().holds.insert(op, gate.clone());
        gate
    }

    /// Stop parking new calls of this kind. Calls already parked still need
    /// their notify.
    pub fn stop_holding(&self, op: Hold) {
        self.state().holds.remove(&op);
    }

    /// Record `operation` and return the gate to wait on, if `op` is held.
    fn record(&self, operation: ServiceOperation, op: Hold) -> Option<Arc<Notify>> {
        let mut state = self.state();
        state.operations.push(operation);
        state.holds.get(&op).cloned()
    }

    /// Replace the server-side lesson set (simulates other shoppers).
    pub fn set_lessons(&self, lessons: Vec<CatalogItem>) {
        self.state().lessons = lessons;
    }

    pub fn lessons(&self) -> Vec<CatalogItem> {
        self.state().lessons.clone()
    }

    pub fn spaces_of(&self, item_id: &LessonId) -> Option<u32> {
        self.state()
            .lessons
            .iter()
            .find(|l| &l.id == item_id)
            .map(|l| l.available_spaces)
    }

    pub fn orders(&self) -> Vec<(OrderId, OrderRequest)> {
        self.state().orders.clone()
    }

    pub fn operations(&self) -> Vec<ServiceOperation> {
        self.state().operations.clone()
    }
}

#[async_trait]
impl LessonService for InMemoryLessonService {
    async fn list_lessons(&self) -> ServiceResult<Vec<CatalogItem>> {
        if let Some(gate) = self.record(ServiceOperation::ListLessons, Hold::ListLessons) {
            gate.notified().await;
        }

        let state = self.state();
        if let Some(FailOn::ListLessons(err)) = &state.fail_on {
            return Err(err.clone());
        }
        Ok(state.lessons.clone())
    }

    async fn search_lessons(&self, query: &str) -> ServiceResult<Vec<CatalogItem>> {
        let mut state = self.state();
        state.operations.push(ServiceOperation::SearchLessons {
            query: query.to_string(),
        });
        if let Some(FailOn::SearchLessons(err)) = &state.fail_on {
            return Err(err.clone());
        }
        Ok(match normalize_query(query) {
            None => state.lessons.clone(),
            Some(q) => state
                .lessons
                .iter()
                .filter(|l| matches_query(l, &q))
                .cloned()
                .collect(),
        })
    }

    async fn update_spaces(&self, item_id: &LessonId, spaces: u32) -> ServiceResult<()> {
        let operation = ServiceOperation::UpdateSpaces {
            item_id: item_id.clone(),
            spaces,
        };
        if let Some(gate) = self.record(operation, Hold::UpdateSpaces) {
            gate.notified().await;
        }

        let mut state = self.state();
        if let Some(FailOn::UpdateSpaces(err)) = &state.fail_on {
            return Err(err.clone());
        }
        let lesson = state
            .lessons
            .iter_mut()
            .find(|l| &l.id == item_id)
            .ok_or_else(|| ServiceError::Api {
                status: 404,
                message: format!("lesson {item_id} not found"),
            })?;
        lesson.available_spaces = spaces;
        Ok(())
    }

    async fn place_order(&self, order: &OrderRequest) -> ServiceResult<OrderId> {
        let operation = ServiceOperation::PlaceOrder {
            order: order.clone(),
        };
        if let Some(gate) = self.record(operation, Hold::PlaceOrder) {
            gate.notified().await;
        }

        let mut state = self.state();
        if let Some(FailOn::PlaceOrder(err)) = &state.fail_on {
            return Err(err.clone());
        }
        let order_id = OrderId::from(state.orders.len() as u64 + 1);
        state.orders.push((order_id.clone(), order.clone()));
        Ok(order_id)
    }
}
