//! Catalog and cart domain module.
//!
//! This crate contains the storefront's business rules (availability, cart
//! lines, sorted/filtered views), implemented purely as deterministic domain
//! logic (no IO, no HTTP, no timers).

pub mod cart;
pub mod item;
pub mod store;
pub mod view;

pub use cart::{Cart, CartLine};
pub use item::{CatalogItem, Price};
pub use store::{
    AddToCart, CartCleared, CatalogReplaced, DecreaseQuantity, RemoveFromCart, ReplaceCatalog,
    SpacesReleased, SpacesReserved, SpacesUpdate, Storefront, StorefrontCommand, StorefrontEvent,
};
pub use view::{SortField, SortKey, SortOrder};
