use thiserror::Error;

/// Errors that can occur when interacting with the order store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness rule (email, address hash, SKU, order number, id) was violated.
    #[error("Unique constraint violated for {entity}: {key}")]
    UniqueViolation { entity: &'static str, key: String },

    /// A staged change references a row that does not exist.
    #[error("{entity} not found: {id}")]
    MissingReference { entity: &'static str, id: String },

    /// A stored row could not be mapped back into a domain value.
    #[error("Corrupt {table} row: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    /// The store refused to process the request.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns true for a uniqueness violation, which callers resolving
    /// shared reference data may treat as "someone else inserted it first".
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation { .. })
    }
}

/// Result type for order store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
