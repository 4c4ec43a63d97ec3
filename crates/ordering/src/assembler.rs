//! Turning requested SKUs and quantities into order lines.

use std::collections::{HashMap, HashSet};

use domain::Variant;
use order_store::OrderStore;

use crate::{OrderItemRequest, OrderingError, Result, ValidationErrors};

/// Resolves requested order lines to catalog variants.
#[derive(Debug, Clone)]
pub struct OrderAssembler<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> OrderAssembler<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns one `(variant, quantity)` pair per requested line, in request order.
    ///
    /// The variant lookup matches SKUs exactly as stored, but lines are joined
    /// to the found variants on the uppercased SKU. When the catalog holds SKUs
    /// differing only in case, a line may therefore be joined to a variant
    /// whose stored SKU differs in case from the one requested.
    #[tracing::instrument(skip_all, fields(line_count = items.len()))]
    pub async fn assemble(&self, items: &[OrderItemRequest]) -> Result<Vec<(Variant, u32)>> {
        check_lines(items).map_err(validation_failure)?;

        let skus: Vec<String> = items.iter().map(|item| item.sku.clone()).collect();
        let variants = self.store.find_variants_by_sku(&skus).await?;

        let mut missing: Vec<&str> = Vec::new();
        for sku in &skus {
            let found = variants.iter().any(|v| v.sku == *sku);
            if !found && !missing.contains(&sku.as_str()) {
                missing.push(sku);
            }
        }
        if !missing.is_empty() {
            tracing::warn!(missing = %missing.join(","), "requested SKUs not found");
            return Err(validation_failure(ValidationErrors::single(
                "missingSkus",
                missing.join(","),
            )));
        }

        let by_upper_sku: HashMap<String, &Variant> = variants
            .iter()
            .map(|variant| (variant.sku.to_uppercase(), variant))
            .collect();

        items
            .iter()
            .map(|item| {
                by_upper_sku
                    .get(&item.sku.to_uppercase())
                    .map(|variant| ((*variant).clone(), item.quantity.unsigned_abs()))
                    .ok_or_else(|| {
                        validation_failure(ValidationErrors::single("missingSkus", item.sku.clone()))
                    })
            })
            .collect()
    }
}

/// Rejects non-positive quantities and SKUs requested more than once.
fn check_lines(items: &[OrderItemRequest]) -> std::result::Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let non_positive: Vec<&str> = items
        .iter()
        .filter(|item| item.quantity < 1)
        .map(|item| item.sku.as_str())
        .collect();
    if !non_positive.is_empty() {
        errors.insert(
            "items.quantity",
            format!("Quantity must be at least 1 for SKUs: {}", non_positive.join(",")),
        );
    }

    let mut seen = HashSet::new();
    let mut duplicates: Vec<&str> = Vec::new();
    for item in items {
        let key = item.sku.to_uppercase();
        if !seen.insert(key) && !duplicates.iter().any(|d| d.eq_ignore_ascii_case(&item.sku)) {
            duplicates.push(&item.sku);
        }
    }
    if !duplicates.is_empty() {
        errors.insert(
            "items.sku",
            format!("SKUs requested more than once: {}", duplicates.join(",")),
        );
    }

    errors.into_result()
}

fn validation_failure(errors: ValidationErrors) -> OrderingError {
    metrics::counter!("order_validation_failures_total").increment(1);
    OrderingError::Validation(errors)
}
