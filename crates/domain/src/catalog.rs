//! Read-only catalog entities.

use common::{ProductId, VariantId};
use serde::{Deserialize, Serialize};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
        }
    }
}

/// A sellable variant of a product, identified externally by its SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub id: VariantId,

    /// Unique stock keeping unit, stored as given.
    pub sku: String,

    pub product: Product,
}

impl Variant {
    pub fn new(sku: impl Into<String>, product: Product) -> Self {
        Self {
            id: VariantId::new(),
            sku: sku.into(),
            product,
        }
    }
}
