//! Checkout form validation.

use serde::{Deserialize, Serialize};

use storefront_core::DomainError;

const PHONE_MIN_DIGITS: usize = 7;
const PHONE_MAX_DIGITS: usize = 15;

/// Raw checkout form input, as typed by the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderForm {
    pub name: String,
    pub phone: String,
}

/// Validated customer fields sent with an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
}

impl OrderForm {
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }

    /// Name: required, letters and spaces only. Phone: required, digits only,
    /// 7 to 15 of them.
    pub fn validate(&self) -> Result<CustomerDetails, DomainError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }
        if !name.chars().all(|c| c.is_alphabetic() || c == ' ') {
            return Err(DomainError::validation("name may only contain letters and spaces"));
        }

        let phone = self.phone.trim();
        if phone.is_empty() {
            return Err(DomainError::validation("phone is required"));
        }
        if !phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::validation("phone may only contain digits"));
        }
        if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&phone.len()) {
            return Err(DomainError::validation(format!(
                "phone must have between {PHONE_MIN_DIGITS} and {PHONE_MAX_DIGITS} digits"
            )));
        }

        Ok(CustomerDetails {
            name: name.to_string(),
            phone: phone.to_string(),
        })
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
