use serde::{Deserialize, Serialize};

use storefront_core::{DomainError, Entity, LessonId, ValueObject};

/// Price in smallest currency unit (e.g. cents).
///
/// The lesson service speaks major units (`100`, `99.5`); conversion happens at
/// the serde boundary so arithmetic stays exact.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Price(u64);

impl ValueObject for Price {}

impl Price {
    pub const ZERO: Price = Price(0);

    pub fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub fn minor(self) -> u64 {
        self.0
    }

    pub fn checked_add(self, other: Price) -> Option<Price> {
        self.0.checked_add(other.0).map(Price)
    }

    pub fn checked_mul(self, quantity: u32) -> Option<Price> {
        self.0.checked_mul(u64::from(quantity)).map(Price)
    }
}

impl TryFrom<f64> for Price {
    type Error = DomainError;

    fn try_from(major: f64) -> Result<Self, Self::Error> {
        if !major.is_finite() || major < 0.0 {
            return Err(DomainError::validation(format!(
                "price must be a non-negative number, got {major}"
            )));
        }
        let minor = (major * 100.0).round();
        if minor > u64::MAX as f64 {
            return Err(DomainError::validation("price is out of range"));
        }
        Ok(Price(minor as u64))
    }
}

impl From<Price> for f64 {
    fn from(price: Price) -> f64 {
        price.0 as f64 / 100.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// A purchasable lesson slot with bounded availability (read model from the
/// lesson service).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    #[serde(alias = "_id")]
    pub id: LessonId,
    pub subject: String,
    pub location: String,
    pub price: Price,
    #[serde(rename = "spaces")]
    pub available_spaces: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl CatalogItem {
    pub fn new(
        id: LessonId,
        subject: impl Into<String>,
        location: impl Into<String>,
        price: Price,
        available_spaces: u32,
    ) -> Self {
        Self {
            id,
            subject: subject.into(),
            location: location.into(),
            price,
            available_spaces,
            icon: None,
        }
    }

    pub fn is_sold_out(&self) -> bool {
        self.available_spaces == 0
    }
}

impl Entity for CatalogItem {
    type Id = LessonId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
