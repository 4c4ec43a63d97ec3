//! Error types for the ordering workflows.

use domain::OrderError;
use order_store::StoreError;
use outbox::OutboxError;
use thiserror::Error;
use uuid::Uuid;

use crate::ValidationErrors;

/// Internal error taxonomy of the ordering workflows.
#[derive(Debug, Error)]
pub enum OrderingError {
    /// The request broke one or more business rules.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// No order has the requested order number.
    #[error("Order not found: {order_number}")]
    NotFound { order_number: String },

    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Outbox message could not be created.
    #[error("Outbox error: {0}")]
    Outbox(#[from] OutboxError),
}

impl From<ValidationErrors> for OrderingError {
    fn from(errors: ValidationErrors) -> Self {
        OrderingError::Validation(errors)
    }
}

impl From<OrderError> for OrderingError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::InvalidQuantity { .. } => {
                OrderingError::Validation(ValidationErrors::single("items.quantity", e.to_string()))
            }
        }
    }
}

/// Convenience type alias for ordering results.
pub type Result<T> = std::result::Result<T, OrderingError>;

/// Error returned across the service boundary.
///
/// Validation and not-found failures carry their detail. Everything else is
/// reduced to an opaque reference id; the detail is only written to the log.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Order not found: {order_number}")]
    NotFound { order_number: String },

    #[error("internal error (reference {reference})")]
    Internal { reference: Uuid },
}

impl ServiceError {
    /// HTTP-equivalent status code for a transport layer.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::NotFound { .. } => 404,
            ServiceError::Internal { .. } => 500,
        }
    }

    /// Returns the validation failures, if this is a validation error.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            ServiceError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<OrderingError> for ServiceError {
    fn from(err: OrderingError) -> Self {
        match err {
            OrderingError::Validation(errors) => ServiceError::Validation(errors),
            OrderingError::NotFound { order_number } => ServiceError::NotFound { order_number },
            internal => {
                let reference = Uuid::new_v4();
                tracing::error!(%reference, error = %internal, "internal error");
                ServiceError::Internal { reference }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_400() {
        let err = ServiceError::from(OrderingError::Validation(ValidationErrors::single(
            "missingSkus",
            "SKU9",
        )));
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.validation_errors().unwrap().get("missingSkus"), Some("SKU9"));
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ServiceError::from(OrderingError::NotFound {
            order_number: "ORD-1".to_string(),
        });
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "Order not found: ORD-1");
    }

    #[test]
    fn test_internal_error_is_opaque() {
        let err = ServiceError::from(OrderingError::Store(StoreError::Unavailable(
            "connection refused to db-primary:5432".to_string(),
        )));

        assert_eq!(err.status_code(), 500);
        let ServiceError::Internal { reference } = err else {
            panic!("expected internal error");
        };
        let message = ServiceError::Internal { reference }.to_string();
        assert_eq!(message, format!("internal error (reference {reference})"));
        assert!(!message.contains("db-primary"));
    }

    #[test]
    fn test_invalid_quantity_becomes_validation() {
        let err = OrderingError::from(OrderError::InvalidQuantity {
            sku: "SKU1".to_string(),
            quantity: 0,
        });
        let OrderingError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains_key("items.quantity"));
    }
}
