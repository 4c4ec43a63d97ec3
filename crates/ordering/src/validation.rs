//! Business-rule validation of resolved customers and addresses.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::Utc;
use domain::{Address, Customer};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("Invalid regex"));

static UK_POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(r"^(GIR 0AA|[A-Z]{1,2}[0-9][0-9A-Z]?\s?[0-9][A-Z]{2})$")
        .case_insensitive(true)
        .build()
        .expect("Invalid regex")
});

/// Field-keyed validation failures.
///
/// Keys are stable identifiers such as `customer.email` or
/// `shippingAddress.postCode`; values are human-readable messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set holding a single failure.
    pub fn single(key: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.insert(key, message);
        errors
    }

    /// Records a failure. A later message for the same key replaces the earlier one.
    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.0.insert(key.into(), message.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `Ok` if nothing was recorded, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (key, message)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{key}: {message}")?;
        }
        Ok(())
    }
}

/// Validates the entities a create request resolved to.
///
/// Every rule is evaluated; all failures are collected.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestValidator;

impl RequestValidator {
    pub fn new() -> Self {
        Self
    }

    #[tracing::instrument(skip_all, fields(customer_id = %customer.id))]
    pub fn validate(
        &self,
        customer: &Customer,
        billing_address: &Address,
        shipping_address: &Address,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if customer.name.trim().is_empty() {
            errors.insert("customer.name", "Name is required");
        }
        if !EMAIL_RE.is_match(&customer.email) {
            errors.insert("customer.email", "Email is not valid");
        }
        if customer.created_at > Utc::now() {
            errors.insert("customer.created", "Customer cannot be from the future");
        }

        validate_address(&mut errors, "billingAddress", billing_address);
        validate_address(&mut errors, "shippingAddress", shipping_address);

        if !errors.is_empty() {
            metrics::counter!("order_validation_failures_total").increment(1);
            tracing::warn!(errors = %errors, "request failed validation");
        }
        errors.into_result()
    }
}

fn validate_address(errors: &mut ValidationErrors, prefix: &str, address: &Address) {
    if address.line_one().trim().is_empty() {
        errors.insert(format!("{prefix}.lineOne"), "First address line is required");
    }

    let post_code = address.post_code();
    if post_code.trim().is_empty() {
        errors.insert(format!("{prefix}.postCode"), "Postcode is required");
    } else if !UK_POSTCODE_RE.is_match(post_code) {
        errors.insert(format!("{prefix}.postCode"), "Postcode is not valid");
    }
}
