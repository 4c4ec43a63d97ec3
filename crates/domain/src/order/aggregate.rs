//! Order aggregate implementation.

use chrono::{DateTime, Utc};
use common::OrderId;
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::catalog::Variant;
use crate::customer::Customer;

use super::{OrderError, OrderItem, OrderNumber};

/// Order aggregate root.
///
/// An order owns its items; the customer and both addresses are shared
/// reference data. Billing and shipping may be the same stored address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,

    /// External identifier, unique across orders.
    order_number: OrderNumber,

    customer: Customer,

    billing_address: Address,

    shipping_address: Address,

    /// Items in request order.
    items: Vec<OrderItem>,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order with no items and a freshly generated order number.
    pub fn new(customer: Customer, billing_address: Address, shipping_address: Address) -> Self {
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            order_number: OrderNumber::generate(),
            customer,
            billing_address,
            shipping_address,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a hydrated order from storage.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: OrderId,
        order_number: OrderNumber,
        customer: Customer,
        billing_address: Address,
        shipping_address: Address,
        items: Vec<OrderItem>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            order_number,
            customer,
            billing_address,
            shipping_address,
            items,
            created_at,
            updated_at,
        }
    }
}

// Query methods
impl Order {
    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn order_number(&self) -> &OrderNumber {
        &self.order_number
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn billing_address(&self) -> &Address {
        &self.billing_address
    }

    pub fn shipping_address(&self) -> &Address {
        &self.shipping_address
    }

    /// Returns all items in the order.
    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    /// Returns the number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

// Mutations
impl Order {
    /// Replaces the whole item collection.
    ///
    /// Lines not present in `lines` disappear; nothing is merged with the
    /// previous collection. Fails without modifying the order if any
    /// quantity is zero.
    pub fn replace_items(
        &mut self,
        lines: impl IntoIterator<Item = (Variant, u32)>,
    ) -> Result<(), OrderError> {
        let items = lines
            .into_iter()
            .map(|(variant, quantity)| {
                if quantity == 0 {
                    return Err(OrderError::InvalidQuantity {
                        sku: variant.sku,
                        quantity,
                    });
                }
                Ok(OrderItem::new(variant, quantity))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.items = items;
        self.touch();
        Ok(())
    }

    /// Points the order at a different shipping address.
    ///
    /// The previous address row is left untouched, so other orders sharing it
    /// are unaffected.
    pub fn change_shipping_address(&mut self, address: Address) {
        self.shipping_address = address;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
