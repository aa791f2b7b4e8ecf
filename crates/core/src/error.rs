//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// availability, missing references). Transport concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. empty).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The referenced item is absent from the catalog or the cart.
    #[error("not found: {0}")]
    NotFound(String),

    /// The item has no available spaces left.
    #[error("sold out: {0}")]
    SoldOut(String),

    /// A request for the same item, or one needing the whole store, is still
    /// outstanding.
    #[error("busy: {0}")]
    Busy(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl core::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn sold_out(what: impl core::fmt::Display) -> Self {
        Self::SoldOut(what.to_string())
    }

    pub fn busy(what: impl core::fmt::Display) -> Self {
        Self::Busy(what.to_string())
    }
}
