//! Value objects for the order domain.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Variant;

/// Number of hex characters taken from a UUID when generating an order number.
const ORDER_NUMBER_LEN: usize = 12;

/// External-facing order identifier (e.g. `ORD-3F2A9C01B7D4`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Wraps an order number supplied by a caller or read from storage.
    pub fn new(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Generates a fresh order number.
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string().to_uppercase();
        Self(format!("ORD-{}", &simple[..ORDER_NUMBER_LEN]))
    }

    /// Returns the order number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderNumber {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A line of an order: one variant and the quantity ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub variant: Variant,
    pub quantity: u32,
}

impl OrderItem {
    pub fn new(variant: Variant, quantity: u32) -> Self {
        Self { variant, quantity }
    }

    /// Returns the SKU of the ordered variant.
    pub fn sku(&self) -> &str {
        &self.variant.sku
    }
}
