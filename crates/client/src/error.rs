//! Errors surfaced to callers of the reconciler.

use thiserror::Error;

use storefront_core::DomainError;

use crate::service::ServiceError;

/// Outcome of a failed storefront action.
///
/// Every variant is terminal for the action that triggered it: nothing is
/// retried and no local state was changed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Add attempted on a lesson with no spaces left. No remote call was made.
    #[error("sold out: {0}")]
    SoldOut(String),

    /// The lesson service did not confirm the change.
    #[error("sync failed: {0}")]
    SyncFailed(#[from] ServiceError),

    /// Input (order form, cart, snapshot) failed validation.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// The lesson is absent from the catalog or the cart.
    #[error("not found: {0}")]
    NotFound(String),

    /// A request touching the same lesson (or the whole cart) is outstanding.
    #[error("busy: {0}")]
    Busy(String),

    /// Local state disagrees with itself; indicates a bug.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::SoldOut(msg) => StoreError::SoldOut(msg),
            DomainError::NotFound(msg) => StoreError::NotFound(msg),
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => {
                StoreError::ValidationFailed(msg)
            }
            DomainError::Busy(msg) => StoreError::Busy(msg),
            DomainError::InvariantViolation(msg) => StoreError::Invariant(msg),
        }
    }
}
