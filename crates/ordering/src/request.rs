//! Inbound request shapes.

use domain::{Address, AddressHash};
use serde::{Deserialize, Serialize};

/// Customer details supplied with a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRequest {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

impl CustomerRequest {
    pub fn new(email: impl Into<String>, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            phone: phone.into(),
        }
    }
}

/// A postal address as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub line_one: String,
    #[serde(default)]
    pub line_two: Option<String>,
    #[serde(default)]
    pub line_three: Option<String>,
    pub post_code: String,
}

impl AddressRequest {
    pub fn new(line_one: impl Into<String>, post_code: impl Into<String>) -> Self {
        Self {
            line_one: line_one.into(),
            line_two: None,
            line_three: None,
            post_code: post_code.into(),
        }
    }

    pub fn with_line_two(mut self, line_two: impl Into<String>) -> Self {
        self.line_two = Some(line_two.into());
        self
    }

    pub fn with_line_three(mut self, line_three: impl Into<String>) -> Self {
        self.line_three = Some(line_three.into());
        self
    }

    /// Content hash of this address, identical to the hash of the stored row.
    pub fn hash(&self) -> AddressHash {
        AddressHash::compute(
            &self.line_one,
            self.line_two.as_deref(),
            self.line_three.as_deref(),
            &self.post_code,
        )
    }

    /// Builds a new, not yet stored, address from this request.
    pub fn to_address(&self) -> Address {
        Address::new(
            self.line_one.clone(),
            self.line_two.clone(),
            self.line_three.clone(),
            self.post_code.clone(),
        )
    }
}

/// A requested order line.
///
/// Quantity is signed so that non-positive values reach validation instead of
/// failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub sku: String,
    pub quantity: i32,
}

impl OrderItemRequest {
    pub fn new(sku: impl Into<String>, quantity: i32) -> Self {
        Self {
            sku: sku.into(),
            quantity,
        }
    }
}

/// Request to place a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer: CustomerRequest,
    pub billing_address: AddressRequest,
    pub shipping_address: AddressRequest,
    pub items: Vec<OrderItemRequest>,
}

/// Request to change the shipping address and lines of an existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    pub order_number: String,
    pub shipping_address: AddressRequest,
    pub items: Vec<OrderItemRequest>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_from_camel_case_json() {
        let json = serde_json::json!({
            "customer": { "email": "A@Test.com", "name": "Jane Doe", "phone": "0123" },
            "billingAddress": { "lineOne": "1 High St", "postCode": "SW1A 1AA" },
            "shippingAddress": { "lineOne": "1 High St", "lineTwo": "Flat 2", "postCode": "SW1A 1AA" },
            "items": [{ "sku": "SKU1", "quantity": 2 }]
        });

        let request: CreateOrderRequest = serde_json::from_value(json).unwrap();
        assert_eq!(request.customer.email, "A@Test.com");
        assert_eq!(request.billing_address.line_two, None);
        assert_eq!(request.shipping_address.line_two.as_deref(), Some("Flat 2"));
        assert_eq!(request.items, vec![OrderItemRequest::new("SKU1", 2)]);
    }

    #[test]
    fn test_hash_matches_built_address() {
        let request = AddressRequest::new("1 High St", "SW1A 1AA").with_line_three("London");
        assert_eq!(&request.hash(), request.to_address().hash());
    }

    #[test]
    fn test_negative_quantity_deserializes() {
        let item: OrderItemRequest =
            serde_json::from_str(r#"{"sku":"SKU1","quantity":-1}"#).unwrap();
        assert_eq!(item.quantity, -1);
    }
}
