//! Cart/inventory reconciler.
//!
//! Drives the `Storefront` aggregate against a `LessonService`:
//! 1. decide with `handle` (pure; `SoldOut`/`NotFound` never reach the network)
//! 2. send the resulting availability update to the service
//! 3. `apply` the events only once the service confirmed
//!
//! A failed call therefore leaves local state exactly as it was. Requests are
//! serialized per lesson: while one is outstanding, further mutations of the
//! same lesson are refused with `Busy`, so responses can never arrive out of
//! order for a lesson. Checkout and refresh need the whole store and are
//! refused while anything else is outstanding (and vice versa).

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use storefront_catalog::view::normalize_query;
use storefront_catalog::{
    AddToCart, Cart, CartLine, CatalogItem, DecreaseQuantity, Price, RemoveFromCart,
    ReplaceCatalog, SortKey, Storefront, StorefrontCommand, StorefrontEvent,
};
use storefront_core::{Aggregate, DomainError, DomainResult, LessonId, OrderId};

use crate::checkout::OrderForm;
use crate::error::StoreError;
use crate::service::{LessonService, OrderRequest};

/// Outcome of applying a catalog snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Number of lessons in the snapshot.
    pub items: usize,
    /// Cart lines removed because their lesson disappeared.
    pub dropped_lines: Vec<CartLine>,
}

/// A placed order, as confirmed by the order service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub lines: Vec<CartLine>,
    pub total: Price,
}

pub struct Reconciler<S> {
    service: S,
    state: Mutex<Inner>,
    outstanding: AtomicUsize,
}

#[derive(Debug, Default)]
struct Inner {
    store: Storefront,
    in_flight: HashSet<LessonId>,
    exclusive: Option<&'static str>,
}

/// What a pending request holds on to.
#[derive(Debug)]
enum Claim {
    Lesson(LessonId),
    Exclusive(&'static str),
}

impl Inner {
    fn try_claim(&mut self, claim: &Claim) -> DomainResult<()> {
        if let Some(op) = self.exclusive {
            return Err(DomainError::busy(format_args!("{op} in progress")));
        }
        match claim {
            Claim::Lesson(id) => {
                if !self.in_flight.insert(id.clone()) {
                    return Err(DomainError::busy(format_args!("request for lesson {id} in flight")));
                }
            }
            Claim::Exclusive(op) => {
                self.ensure_idle()?;
                self.exclusive = Some(op);
            }
        }
        Ok(())
    }

    fn release(&mut self, claim: &Claim) {
        match claim {
            Claim::Lesson(id) => {
                self.in_flight.remove(id);
            }
            Claim::Exclusive(_) => self.exclusive = None,
        }
    }

    fn ensure_idle(&self) -> DomainResult<()> {
        if let Some(op) = self.exclusive {
            return Err(DomainError::busy(format_args!("{op} in progress")));
        }
        if !self.in_flight.is_empty() {
            return Err(DomainError::busy(format_args!(
                "{} lesson request(s) in flight",
                self.in_flight.len()
            )));
        }
        Ok(())
    }
}

fn lock(state: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Outstanding remote request. Releases its claim and the loading count on
/// drop, including when the caller abandons the future mid-request.
///
/// Never create or drop one while holding the state lock.
struct PendingRequest<'a> {
    state: &'a Mutex<Inner>,
    outstanding: &'a AtomicUsize,
    claim: Option<Claim>,
}

impl<'a> PendingRequest<'a> {
    fn start(state: &'a Mutex<Inner>, outstanding: &'a AtomicUsize, claim: Option<Claim>) -> Self {
        outstanding.fetch_add(1, Ordering::SeqCst);
        Self {
            state,
            outstanding,
            claim,
        }
    }
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        if let Some(claim) = self.claim.take() {
            lock(self.state).release(&claim);
        }
        self.outstanding.fetch_sub(1, Ordering::SeqCst);
    }
}

fn apply_snapshot(store: &mut Storefront, items: Vec<CatalogItem>) -> Result<ReconcileReport, StoreError> {
    let events = store.handle(&StorefrontCommand::ReplaceCatalog(ReplaceCatalog { items }))?;

    let mut report = ReconcileReport::default();
    for event in &events {
        if let StorefrontEvent::CatalogReplaced(e) = event {
            report.items = e.items.len();
            report.dropped_lines = e.dropped_lines.clone();
        }
        store.apply(event);
    }

    if !report.dropped_lines.is_empty() {
        tracing::warn!(
            dropped = report.dropped_lines.len(),
            "cart lines dropped: lessons no longer offered"
        );
    }
    tracing::info!(items = report.items, "catalog reconciled from server");

    Ok(report)
}

impl<S: LessonService> Reconciler<S> {
    /// Reconciler with an empty catalog; call [`Reconciler::refresh`] to load it.
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: Mutex::new(Inner::default()),
            outstanding: AtomicUsize::new(0),
        }
    }

    pub fn with_catalog(service: S, items: Vec<CatalogItem>) -> Result<Self, StoreError> {
        let reconciler = Self::new(service);
        reconciler.reconcile_from_server(items)?;
        Ok(reconciler)
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Copy of the current local state.
    pub fn snapshot(&self) -> Storefront {
        lock(&self.state).store.clone()
    }

    pub fn items(&self) -> Vec<CatalogItem> {
        lock(&self.state).store.items().to_vec()
    }

    pub fn item(&self, item_id: &LessonId) -> Option<CatalogItem> {
        lock(&self.state).store.item(item_id).cloned()
    }

    pub fn cart(&self) -> Cart {
        lock(&self.state).store.cart().clone()
    }

    pub fn cart_total(&self) -> Result<Price, StoreError> {
        Ok(lock(&self.state).store.cart_total()?)
    }

    pub fn cart_item_count(&self) -> u32 {
        lock(&self.state).store.cart_item_count()
    }

    /// True while any remote request is outstanding.
    pub fn is_loading(&self) -> bool {
        self.outstanding.load(Ordering::SeqCst) > 0
    }

    pub fn sort_by(&self, key: SortKey) {
        lock(&self.state).store.sort_by(key);
    }

    /// Local text filter over the catalog, in display order.
    pub fn filter(&self, query: &str) -> Vec<CatalogItem> {
        lock(&self.state)
            .store
            .filter(query)
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn add_to_cart(&self, item_id: &LessonId) -> Result<(), StoreError> {
        let command = StorefrontCommand::AddToCart(AddToCart {
            item_id: item_id.clone(),
        });
        self.confirm_and_apply(item_id, command, "add_to_cart").await
    }

    /// Release one space. At quantity 1 this is exactly `remove_from_cart`.
    pub async fn decrease_quantity(&self, item_id: &LessonId) -> Result<(), StoreError> {
        let command = StorefrontCommand::DecreaseQuantity(DecreaseQuantity {
            item_id: item_id.clone(),
        });
        self.confirm_and_apply(item_id, command, "decrease_quantity").await
    }

    pub async fn remove_from_cart(&self, item_id: &LessonId) -> Result<(), StoreError> {
        let command = StorefrontCommand::RemoveFromCart(RemoveFromCart {
            item_id: item_id.clone(),
        });
        self.confirm_and_apply(item_id, command, "remove_from_cart").await
    }

    async fn confirm_and_apply(
        &self,
        item_id: &LessonId,
        command: StorefrontCommand,
        op: &'static str,
    ) -> Result<(), StoreError> {
        let claim = Claim::Lesson(item_id.clone());

        let (events, update) = {
            let mut inner = lock(&self.state);
            let events = inner.store.handle(&command)?;
            let update = events
                .iter()
                .find_map(StorefrontEvent::spaces_update)
                .ok_or_else(|| StoreError::Invariant(format!("{op} produced no spaces update")))?;
            inner.try_claim(&claim)?;
            (events, update)
        };
        let _pending = PendingRequest::start(&self.state, &self.outstanding, Some(claim));

        if let Err(err) = self.service.update_spaces(&update.item_id, update.spaces).await {
            tracing::warn!(lesson = %item_id, op, error = %err, "spaces update not confirmed; local state unchanged");
            return Err(err.into());
        }

        let (spaces, quantity) = {
            let mut inner = lock(&self.state);
            for event in &events {
                inner.store.apply(event);
            }
            (update.spaces, inner.store.cart().quantity_of(item_id))
        };

        tracing::info!(lesson = %item_id, op, spaces, quantity, "cart updated");
        Ok(())
    }

    /// Replace the local catalog with a snapshot fetched elsewhere.
    ///
    /// Cart lines survive (their spaces are already held by the service);
    /// lines whose lesson vanished are dropped and reported. Refused while any
    /// request is outstanding, since the snapshot may predate its effect.
    pub fn reconcile_from_server(&self, items: Vec<CatalogItem>) -> Result<ReconcileReport, StoreError> {
        let mut inner = lock(&self.state);
        inner.ensure_idle()?;
        apply_snapshot(&mut inner.store, items)
    }

    /// Fetch `GET /lessons` and reconcile. Cart operations are refused with
    /// `Busy` until the snapshot is applied.
    pub async fn refresh(&self) -> Result<ReconcileReport, StoreError> {
        let claim = Claim::Exclusive("refresh");
        lock(&self.state).try_claim(&claim)?;
        let _pending = PendingRequest::start(&self.state, &self.outstanding, Some(claim));

        let items = self.service.list_lessons().await.map_err(|err| {
            tracing::warn!(error = %err, "catalog refresh failed");
            StoreError::from(err)
        })?;

        let mut inner = lock(&self.state);
        let report = apply_snapshot(&mut inner.store, items);
        drop(inner);
        report
    }

    /// Ask the service for matching lessons. Results are a view only; local
    /// availability is not touched.
    pub async fn search(&self, query: &str) -> Result<Vec<CatalogItem>, StoreError> {
        let _pending = PendingRequest::start(&self.state, &self.outstanding, None);

        let result = match normalize_query(query) {
            None => self.service.list_lessons().await,
            Some(_) => self.service.search_lessons(query.trim()).await,
        };
        result.map_err(|err| {
            tracing::warn!(query, error = %err, "search failed");
            StoreError::from(err)
        })
    }

    /// Validate the form and place an order for the whole cart.
    ///
    /// On confirmation the cart is emptied; the reserved spaces stay taken
    /// since they now belong to the order.
    pub async fn checkout(&self, form: &OrderForm) -> Result<OrderConfirmation, StoreError> {
        let customer = form.validate()?;
        let claim = Claim::Exclusive("checkout");

        let (events, request) = {
            let mut inner = lock(&self.state);
            let events = inner.store.handle(&StorefrontCommand::ClearCart)?;
            let request = OrderRequest {
                customer,
                items: inner.store.cart().lines().to_vec(),
                total: inner.store.cart_total()?,
                date: Utc::now(),
            };
            inner.try_claim(&claim)?;
            (events, request)
        };
        let _pending = PendingRequest::start(&self.state, &self.outstanding, Some(claim));

        let order_id = self.service.place_order(&request).await.map_err(|err| {
            tracing::warn!(error = %err, "order not confirmed; cart kept");
            StoreError::from(err)
        })?;

        {
            let mut inner = lock(&self.state);
            for event in &events {
                inner.store.apply(event);
            }
        }

        tracing::info!(order = %order_id, lines = request.items.len(), total = %request.total, "order placed");
        Ok(OrderConfirmation {
            order_id,
            lines: request.items,
            total: request.total,
        })
    }
}
