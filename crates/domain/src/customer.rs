//! Customer entity.

use chrono::{DateTime, Utc};
use common::CustomerId;
use serde::{Deserialize, Serialize};

/// A customer, unique by normalised email address.
///
/// Customers are created on the first order that references a new email and
/// are never updated or deleted by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,

    /// Lowercased, trimmed email. This is the lookup key.
    pub email: String,

    pub name: String,

    pub phone: String,

    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Creates a new customer stamped with the current time.
    ///
    /// The email is normalised so the stored value always matches the key
    /// used by lookups.
    pub fn new(email: &str, name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: CustomerId::new(),
            email: Self::normalize_email(email),
            name: name.into(),
            phone: phone.into(),
            created_at: Utc::now(),
        }
    }

    /// Normalises an email address for storage and lookup.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}
