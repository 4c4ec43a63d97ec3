//! Outbound presentation of an order.

use chrono::{DateTime, Utc};
use domain::{Address, Customer, Order, OrderItem};
use serde::{Deserialize, Serialize};

/// External view of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_number: String,
    pub customer: CustomerView,
    pub billing_address: AddressView,
    pub shipping_address: AddressView,
    pub items: Vec<OrderLineView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub email: String,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressView {
    pub line_one: String,
    pub line_two: Option<String>,
    pub line_three: Option<String>,
    pub post_code: String,
}

/// One order line with its resolved variant and product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineView {
    pub sku: String,
    pub product_name: String,
    pub quantity: u32,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            order_number: order.order_number().to_string(),
            customer: order.customer().into(),
            billing_address: order.billing_address().into(),
            shipping_address: order.shipping_address().into(),
            items: order.items().iter().map(OrderLineView::from).collect(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

impl From<&Customer> for CustomerView {
    fn from(customer: &Customer) -> Self {
        Self {
            email: customer.email.clone(),
            name: customer.name.clone(),
            phone: customer.phone.clone(),
        }
    }
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        Self {
            line_one: address.line_one().to_string(),
            line_two: address.line_two().map(str::to_string),
            line_three: address.line_three().map(str::to_string),
            post_code: address.post_code().to_string(),
        }
    }
}

impl From<&OrderItem> for OrderLineView {
    fn from(item: &OrderItem) -> Self {
        Self {
            sku: item.sku().to_string(),
            product_name: item.variant.product.name.clone(),
            quantity: item.quantity,
        }
    }
}
