use serde::{Deserialize, Serialize};

use storefront_core::entity::first_duplicate_id;
use storefront_core::{Aggregate, DomainError, DomainResult, LessonId};

use crate::cart::{Cart, CartLine};
use crate::item::{CatalogItem, Price};
use crate::view::{self, SortKey};

/// Aggregate root: the local mirror of lesson availability plus the cart.
///
/// Invariant: for every lesson, `available_spaces` equals what the lesson
/// service holds after every confirmed cart operation, so for one lesson
/// `available_spaces + cart quantity` only changes when a new catalog snapshot
/// is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Storefront {
    items: Vec<CatalogItem>,
    cart: Cart,
    sort: Option<SortKey>,
    version: u64,
}

impl Storefront {
    /// Empty storefront (no catalog loaded yet).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Storefront seeded with a catalog snapshot and an empty cart.
    pub fn with_catalog(items: Vec<CatalogItem>) -> Result<Self, DomainError> {
        let mut store = Self::empty();
        let events = store.handle(&StorefrontCommand::ReplaceCatalog(ReplaceCatalog { items }))?;
        for event in &events {
            store.apply(event);
        }
        Ok(store)
    }

    /// Catalog in its current display order.
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn item(&self, item_id: &LessonId) -> Option<&CatalogItem> {
        self.items.iter().find(|i| &i.id == item_id)
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort
    }

    /// Sum of `price x quantity` over the cart.
    ///
    /// Overflow is an invariant violation; a partial sum is never returned.
    pub fn cart_total(&self) -> DomainResult<Price> {
        self.cart.lines().iter().try_fold(Price::ZERO, |total, line| {
            let item = self.item(&line.item_id).ok_or_else(|| {
                DomainError::invariant(format!("cart line for lesson {} has no catalog item", line.item_id))
            })?;
            item.price
                .checked_mul(line.quantity)
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or_else(|| DomainError::invariant("cart total overflows"))
        })
    }

    pub fn cart_item_count(&self) -> u32 {
        self.cart.item_count()
    }

    /// Reorder the catalog view. Ties keep the current relative order.
    ///
    /// Display order is not availability state, so this does not go through
    /// `handle`/`apply` and does not bump the version.
    pub fn sort_by(&mut self, key: SortKey) {
        view::sort_items(&mut self.items, key);
        self.sort = Some(key);
    }

    /// Items matching `query`, in display order.
    pub fn filter(&self, query: &str) -> Vec<&CatalogItem> {
        view::filter_items(&self.items, query)
    }

    fn require_item(&self, item_id: &LessonId) -> Result<&CatalogItem, DomainError> {
        self.item(item_id)
            .ok_or_else(|| DomainError::not_found(format!("lesson {item_id}")))
    }

    fn require_line(&self, item_id: &LessonId) -> Result<&CartLine, DomainError> {
        self.cart
            .line(item_id)
            .ok_or_else(|| DomainError::not_found(format!("cart line for lesson {item_id}")))
    }
}

/// Command: AddToCart (reserve one space).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddToCart {
    pub item_id: LessonId,
}

/// Command: DecreaseQuantity (release one space; removes the line at quantity 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecreaseQuantity {
    pub item_id: LessonId,
}

/// Command: RemoveFromCart (release the whole line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveFromCart {
    pub item_id: LessonId,
}

/// Command: ReplaceCatalog (apply a fresh snapshot from the lesson service).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceCatalog {
    pub items: Vec<CatalogItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorefrontCommand {
    AddToCart(AddToCart),
    DecreaseQuantity(DecreaseQuantity),
    RemoveFromCart(RemoveFromCart),
    ReplaceCatalog(ReplaceCatalog),
    ClearCart,
}

/// Event: SpacesReserved (spaces moved from the lesson into the cart).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacesReserved {
    pub item_id: LessonId,
    pub quantity: u32,
    pub spaces_after: u32,
}

/// Event: SpacesReleased (spaces moved from the cart back to the lesson).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpacesReleased {
    pub item_id: LessonId,
    pub quantity: u32,
    pub spaces_after: u32,
}

/// Event: CatalogReplaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogReplaced {
    pub items: Vec<CatalogItem>,
    /// Cart lines whose lesson is absent from the snapshot.
    pub dropped_lines: Vec<CartLine>,
}

/// Event: CartCleared (the cart was committed to an order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartCleared {
    pub lines: Vec<CartLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorefrontEvent {
    SpacesReserved(SpacesReserved),
    SpacesReleased(SpacesReleased),
    CatalogReplaced(CatalogReplaced),
    CartCleared(CartCleared),
}

/// Availability update the lesson service has to confirm before an event may
/// be applied locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpacesUpdate {
    pub item_id: LessonId,
    pub spaces: u32,
}

impl StorefrontEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            StorefrontEvent::SpacesReserved(_) => "storefront.spaces.reserved",
            StorefrontEvent::SpacesReleased(_) => "storefront.spaces.released",
            StorefrontEvent::CatalogReplaced(_) => "storefront.catalog.replaced",
            StorefrontEvent::CartCleared(_) => "storefront.cart.cleared",
        }
    }

    pub fn spaces_update(&self) -> Option<SpacesUpdate> {
        match self {
            StorefrontEvent::SpacesReserved(e) => Some(SpacesUpdate {
                item_id: e.item_id.clone(),
                spaces: e.spaces_after,
            }),
            StorefrontEvent::SpacesReleased(e) => Some(SpacesUpdate {
                item_id: e.item_id.clone(),
                spaces: e.spaces_after,
            }),
            StorefrontEvent::CatalogReplaced(_) | StorefrontEvent::CartCleared(_) => None,
        }
    }
}

impl Aggregate for Storefront {
    type Command = StorefrontCommand;
    type Event = StorefrontEvent;
    type Error = DomainError;

    fn version(&self) -> u64 {
        self.version
    }

    fn apply(&mut self, event: &Self::Event) {
        match event {
            StorefrontEvent::SpacesReserved(e) => {
                if let Some(item) = self.items.iter_mut().find(|i| i.id == e.item_id) {
                    item.available_spaces = e.spaces_after;
                }
                self.cart.add(&e.item_id, e.quantity);
            }
            StorefrontEvent::SpacesReleased(e) => {
                if let Some(item) = self.items.iter_mut().find(|i| i.id == e.item_id) {
                    item.available_spaces = e.spaces_after;
                }
                self.cart.release(&e.item_id, e.quantity);
            }
            StorefrontEvent::CatalogReplaced(e) => self.merge_snapshot(&e.items),
            StorefrontEvent::CartCleared(_) => self.cart.clear(),
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            StorefrontCommand::AddToCart(cmd) => self.handle_add(cmd),
            StorefrontCommand::DecreaseQuantity(cmd) => self.handle_decrease(cmd),
            StorefrontCommand::RemoveFromCart(cmd) => self.handle_remove(&cmd.item_id),
            StorefrontCommand::ReplaceCatalog(cmd) => self.handle_replace(cmd),
            StorefrontCommand::ClearCart => self.handle_clear(),
        }
    }
}

impl Storefront {
    fn handle_add(&self, cmd: &AddToCart) -> Result<Vec<StorefrontEvent>, DomainError> {
        let item = self.require_item(&cmd.item_id)?;
        if item.is_sold_out() {
            return Err(DomainError::sold_out(format!("lesson {}", item.id)));
        }

        Ok(vec![StorefrontEvent::SpacesReserved(SpacesReserved {
            item_id: item.id.clone(),
            quantity: 1,
            spaces_after: item.available_spaces - 1,
        })])
    }

    fn handle_decrease(&self, cmd: &DecreaseQuantity) -> Result<Vec<StorefrontEvent>, DomainError> {
        let line = self.require_line(&cmd.item_id)?;
        if line.quantity <= 1 {
            return self.handle_remove(&cmd.item_id);
        }
        self.release(&cmd.item_id, 1)
    }

    fn handle_remove(&self, item_id: &LessonId) -> Result<Vec<StorefrontEvent>, DomainError> {
        let line = self.require_line(item_id)?;
        self.release(item_id, line.quantity)
    }

    fn release(&self, item_id: &LessonId, quantity: u32) -> Result<Vec<StorefrontEvent>, DomainError> {
        let item = self.item(item_id).ok_or_else(|| {
            DomainError::invariant(format!("cart line for lesson {item_id} has no catalog item"))
        })?;
        let spaces_after = item
            .available_spaces
            .checked_add(quantity)
            .ok_or_else(|| DomainError::invariant("available spaces overflow"))?;

        Ok(vec![StorefrontEvent::SpacesReleased(SpacesReleased {
            item_id: item_id.clone(),
            quantity,
            spaces_after,
        })])
    }

    fn handle_replace(&self, cmd: &ReplaceCatalog) -> Result<Vec<StorefrontEvent>, DomainError> {
        if let Some(dup) = first_duplicate_id(&cmd.items) {
            return Err(DomainError::validation(format!(
                "catalog snapshot contains lesson {dup} more than once"
            )));
        }

        let dropped_lines = self
            .cart
            .lines()
            .iter()
            .filter(|line| !cmd.items.iter().any(|i| i.id == line.item_id))
            .cloned()
            .collect();

        Ok(vec![StorefrontEvent::CatalogReplaced(CatalogReplaced {
            items: cmd.items.clone(),
            dropped_lines,
        })])
    }

    fn handle_clear(&self) -> Result<Vec<StorefrontEvent>, DomainError> {
        if self.cart.is_empty() {
            return Err(DomainError::validation("cart is empty"));
        }
        Ok(vec![StorefrontEvent::CartCleared(CartCleared {
            lines: self.cart.lines().to_vec(),
        })])
    }

    /// Known lessons keep their display position (with fresh values), vanished
    /// ones are dropped along with their cart lines, new ones are appended in
    /// snapshot order. An active sort is re-applied afterwards.
    fn merge_snapshot(&mut self, snapshot: &[CatalogItem]) {
        let mut merged: Vec<CatalogItem> = self
            .items
            .iter()
            .filter_map(|current| snapshot.iter().find(|s| s.id == current.id).cloned())
            .collect();
        for fresh in snapshot {
            if !merged.iter().any(|m| m.id == fresh.id) {
                merged.push(fresh.clone());
            }
        }

        self.cart
            .retain(|line| merged.iter().any(|i| i.id == line.item_id));
        self.items = merged;

        if let Some(key) = self.sort {
            view::sort_items(&mut self.items, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::SortField;

    fn id(n: u64) -> LessonId {
        LessonId::from(n)
    }

    fn lesson(n: u64, subject: &str, price: u64, spaces: u32) -> CatalogItem {
        CatalogItem::new(id(n), subject, "Deira", Price::from_minor(price * 100), spaces)
    }

    fn run(store: &mut Storefront, command: StorefrontCommand) -> Result<(), DomainError> {
        let events = store.handle(&command)?;
        for e in &events {
            store.apply(e);
        }
        Ok(())
    }

    fn add(n: u64) -> StorefrontCommand {
        StorefrontCommand::AddToCart(AddToCart { item_id: id(n) })
    }

    fn decrease(n: u64) -> StorefrontCommand {
        StorefrontCommand::DecreaseQuantity(DecreaseQuantity { item_id: id(n) })
    }

    fn remove(n: u64) -> StorefrontCommand {
        StorefrontCommand::RemoveFromCart(RemoveFromCart { item_id: id(n) })
    }

    #[test]
    fn single_space_scenario() {
        let mut store = Storefront::with_catalog(vec![lesson(1, "Art", 75, 1)]).unwrap();

        run(&mut store, add(1)).unwrap();
        assert_eq!(store.item(&id(1)).unwrap().available_spaces, 0);
        assert_eq!(store.cart().lines(), &[CartLine { item_id: id(1), quantity: 1 }]);

        let before = store.clone();
        let err = run(&mut store, add(1)).unwrap_err();
        assert!(matches!(err, DomainError::SoldOut(_)));
        assert_eq!(store, before);

        run(&mut store, remove(1)).unwrap();
        assert_eq!(store.item(&id(1)).unwrap().available_spaces, 1);
        assert!(store.cart().is_empty());
    }

    #[test]
    fn add_emits_target_spaces_for_the_service() {
        let store = Storefront::with_catalog(vec![lesson(1, "Art", 75, 3)]).unwrap();
        let events = store.handle(&add(1)).unwrap();

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "storefront.spaces.reserved");
        assert_eq!(
            events[0].spaces_update(),
            Some(SpacesUpdate { item_id: id(1), spaces: 2 })
        );
    }

    #[test]
    fn unknown_item_and_missing_line_are_not_found() {
        let store = Storefront::with_catalog(vec![lesson(1, "Art", 75, 3)]).unwrap();

        assert!(matches!(store.handle(&add(9)), Err(DomainError::NotFound(_))));
        assert!(matches!(store.handle(&decrease(1)), Err(DomainError::NotFound(_))));
        assert!(matches!(store.handle(&remove(1)), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn decrease_at_quantity_one_equals_remove() {
        let mut a = Storefront::with_catalog(vec![lesson(1, "Art", 75, 3)]).unwrap();
        run(&mut a, add(1)).unwrap();
        let mut b = a.clone();

        assert_eq!(a.handle(&decrease(1)).unwrap(), b.handle(&remove(1)).unwrap());

        run(&mut a, decrease(1)).unwrap();
        run(&mut b, remove(1)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn decrease_releases_one_space() {
        let mut store = Storefront::with_catalog(vec![lesson(1, "Art", 75, 3)]).unwrap();
        run(&mut store, add(1)).unwrap();
        run(&mut store, add(1)).unwrap();

        run(&mut store, decrease(1)).unwrap();
        assert_eq!(store.cart().quantity_of(&id(1)), 1);
        assert_eq!(store.item(&id(1)).unwrap().available_spaces, 2);
    }

    #[test]
    fn totals_follow_cart() {
        let mut store =
            Storefront::with_catalog(vec![lesson(1, "Art", 75, 3), lesson(2, "Music", 110, 3)])
                .unwrap();
        run(&mut store, add(1)).unwrap();
        run(&mut store, add(1)).unwrap();
        run(&mut store, add(2)).unwrap();

        assert_eq!(store.cart_item_count(), 3);
        assert_eq!(store.cart_total(), Ok(Price::from_minor(26_000)));
    }

    #[test]
    fn total_overflow_is_reported() {
        let pricey = CatalogItem::new(id(1), "Art", "Deira", Price::from_minor(u64::MAX / 2 + 1), 3);
        let mut store =
            Storefront::with_catalog(vec![pricey, lesson(2, "Music", 110, 3)]).unwrap();
        assert_eq!(store.cart_total(), Ok(Price::ZERO));

        run(&mut store, add(1)).unwrap();
        assert_eq!(store.cart_total(), Ok(Price::from_minor(u64::MAX / 2 + 1)));

        // Second unit overflows the multiplication.
        run(&mut store, add(1)).unwrap();
        assert!(matches!(store.cart_total(), Err(DomainError::InvariantViolation(_))));

        // Back to one unit, then another line overflows the sum instead.
        run(&mut store, decrease(1)).unwrap();
        let huge = CatalogItem::new(id(2), "Music", "Deira", Price::from_minor(u64::MAX / 2 + 1), 3);
        let items = vec![store.item(&id(1)).unwrap().clone(), huge];
        run(&mut store, StorefrontCommand::ReplaceCatalog(ReplaceCatalog { items })).unwrap();
        run(&mut store, add(2)).unwrap();
        assert!(matches!(store.cart_total(), Err(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let store = Storefront::with_catalog(vec![lesson(1, "Art", 75, 3)]).unwrap();
        let before = store.clone();

        let events1 = store.handle(&add(1)).unwrap();
        let events2 = store.handle(&add(1)).unwrap();

        assert_eq!(store, before);
        assert_eq!(events1, events2);
    }

    #[test]
    fn snapshot_keeps_cart_and_drops_vanished_lessons() {
        let mut store =
            Storefront::with_catalog(vec![lesson(1, "Art", 75, 3), lesson(2, "Music", 110, 3)])
                .unwrap();
        run(&mut store, add(1)).unwrap();
        run(&mut store, add(2)).unwrap();

        let snapshot = vec![lesson(3, "Chemistry", 105, 5), lesson(1, "Art", 75, 1)];
        let events = store
            .handle(&StorefrontCommand::ReplaceCatalog(ReplaceCatalog { items: snapshot }))
            .unwrap();
        match &events[0] {
            StorefrontEvent::CatalogReplaced(e) => {
                assert_eq!(e.dropped_lines, vec![CartLine { item_id: id(2), quantity: 1 }]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        store.apply(&events[0]);

        let order: Vec<_> = store.items().iter().map(|i| i.id.clone()).collect();
        assert_eq!(order, vec![id(1), id(3)]);
        assert_eq!(store.item(&id(1)).unwrap().available_spaces, 1);
        assert_eq!(store.cart().lines(), &[CartLine { item_id: id(1), quantity: 1 }]);
    }

    #[test]
    fn snapshot_with_duplicate_ids_is_rejected() {
        let err = Storefront::with_catalog(vec![lesson(1, "Art", 75, 3), lesson(1, "Art", 75, 3)])
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn active_sort_survives_snapshot() {
        let mut store =
            Storefront::with_catalog(vec![lesson(1, "Music", 110, 3), lesson(2, "Art", 75, 3)])
                .unwrap();
        store.sort_by(SortKey::ascending(SortField::Price));

        run(
            &mut store,
            StorefrontCommand::ReplaceCatalog(ReplaceCatalog {
                items: vec![lesson(1, "Music", 110, 3), lesson(2, "Art", 75, 3), lesson(3, "Chemistry", 90, 3)],
            }),
        )
        .unwrap();

        let order: Vec<_> = store.items().iter().map(|i| i.id.clone()).collect();
        assert_eq!(order, vec![id(2), id(3), id(1)]);
    }

    #[test]
    fn clear_cart_requires_lines_and_keeps_spaces() {
        let mut store = Storefront::with_catalog(vec![lesson(1, "Art", 75, 3)]).unwrap();
        assert!(matches!(
            run(&mut store, StorefrontCommand::ClearCart),
            Err(DomainError::Validation(_))
        ));

        run(&mut store, add(1)).unwrap();
        run(&mut store, StorefrontCommand::ClearCart).unwrap();
        assert!(store.cart().is_empty());
        assert_eq!(store.item(&id(1)).unwrap().available_spaces, 2);
    }

    #[test]
    fn version_increments_on_apply() {
        let mut store = Storefront::empty();
        assert_eq!(store.version(), 0);

        run(
            &mut store,
            StorefrontCommand::ReplaceCatalog(ReplaceCatalog { items: vec![lesson(1, "Art", 75, 3)] }),
        )
        .unwrap();
        assert_eq!(store.version(), 1);

        run(&mut store, add(1)).unwrap();
        assert_eq!(store.version(), 2);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 512,
                ..ProptestConfig::default()
            })]

            /// Property: spaces + cart quantity is conserved for any sequence of
            /// cart operations, and rejected operations leave state untouched.
            #[test]
            fn spaces_plus_cart_is_conserved(
                initial in 0u32..6,
                ops in prop::collection::vec(0u8..3, 0..40)
            ) {
                let mut store = Storefront::with_catalog(vec![lesson(1, "Art", 75, initial)]).unwrap();

                for op in ops {
                    let command = match op {
                        0 => add(1),
                        1 => decrease(1),
                        _ => remove(1),
                    };
                    let before = store.clone();
                    match store.handle(&command) {
                        Ok(events) => {
                            for e in &events {
                                store.apply(e);
                            }
                        }
                        Err(_) => prop_assert_eq!(&store, &before),
                    }

                    let spaces = store.item(&id(1)).unwrap().available_spaces;
                    prop_assert_eq!(spaces + store.cart().quantity_of(&id(1)), initial);
                    prop_assert!(store.cart().lines().iter().all(|l| l.quantity > 0));
                }
            }
        }
    }
}
