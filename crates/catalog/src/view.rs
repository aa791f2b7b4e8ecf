//! Sorted and filtered views over the catalog.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::item::CatalogItem;

/// Field a catalog view can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Subject,
    Location,
    Price,
    Spaces,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortKey {
    pub fn ascending(field: SortField) -> Self {
        Self {
            field,
            order: SortOrder::Ascending,
        }
    }

    pub fn descending(field: SortField) -> Self {
        Self {
            field,
            order: SortOrder::Descending,
        }
    }

    pub fn toggled(self) -> Self {
        Self {
            field: self.field,
            order: self.order.toggled(),
        }
    }
}

fn compare_field(a: &CatalogItem, b: &CatalogItem, field: SortField) -> Ordering {
    match field {
        SortField::Subject => a.subject.to_lowercase().cmp(&b.subject.to_lowercase()),
        SortField::Location => a.location.to_lowercase().cmp(&b.location.to_lowercase()),
        SortField::Price => a.price.cmp(&b.price),
        SortField::Spaces => a.available_spaces.cmp(&b.available_spaces),
    }
}

/// Stable in-place sort.
///
/// Items with equal keys keep the relative order they had in `items`, which is
/// the previously sorted sequence, not the order the service returned.
pub fn sort_items(items: &mut [CatalogItem], key: SortKey) {
    match key.order {
        SortOrder::Ascending => items.sort_by(|a, b| compare_field(a, b, key.field)),
        SortOrder::Descending => items.sort_by(|a, b| compare_field(b, a, key.field)),
    }
}

/// Lowercased, trimmed search text. `None` means "match everything".
pub fn normalize_query(query: &str) -> Option<String> {
    let q = query.trim().to_lowercase();
    (!q.is_empty()).then_some(q)
}

/// Case-insensitive match against subject and location, and against price
/// and spaces rendered as text.
pub fn matches_query(item: &CatalogItem, normalized: &str) -> bool {
    item.subject.to_lowercase().contains(normalized)
        || item.location.to_lowercase().contains(normalized)
        || item.price.to_string().contains(normalized)
        || item.available_spaces.to_string().contains(normalized)
}

pub fn filter_items<'a>(items: &'a [CatalogItem], query: &str) -> Vec<&'a CatalogItem> {
    match normalize_query(query) {
        None => items.iter().collect(),
        Some(q) => items.iter().filter(|item| matches_query(item, &q)).collect(),
    }
}
