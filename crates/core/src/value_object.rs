//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values. To
/// "modify" one, build a new one (e.g. `Price::checked_add` returns a new price).
///
/// - **Value Object**: `Price` (two prices of 100 cents are the same price)
/// - **Entity**: `CatalogItem` (two items with the same id are the same lesson)
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
