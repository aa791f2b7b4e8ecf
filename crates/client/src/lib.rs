//! `storefront-client`
//!
//! **Responsibility:** the storefront's cart/inventory reconciler and its
//! connection to the remote lesson/order service.
//!
//! This crate provides:
//! - `LessonService`: the remote service contract, with a reqwest-backed
//!   implementation and an in-memory one for tests
//! - `Reconciler`: cart operations that only change local state after the
//!   service confirmed them
//! - `SearchBox`: search input debounced by `Debouncer` before it reaches
//!   the service
//! - Checkout form validation, icon fallback and env configuration
//!
//! The lesson service remains the authority on availability; the client keeps
//! a mirror of it.

pub mod checkout;
pub mod config;
pub mod debounce;
pub mod error;
pub mod http;
pub mod icon;
pub mod mock;
pub mod reconciler;
pub mod search;
pub mod service;

pub use checkout::{CustomerDetails, OrderForm};
pub use config::{ClientConfig, ConfigError};
pub use debounce::Debouncer;
pub use error::StoreError;
pub use http::HttpLessonService;
pub use icon::ItemIcon;
pub use mock::{Hold, InMemoryLessonService};
pub use reconciler::{OrderConfirmation, ReconcileReport, Reconciler};
pub use search::{SearchBox, SearchResults};
pub use service::{LessonService, OrderRequest, ServiceError, ServiceResult};
