//! Order lookup for presentation.

use domain::OrderNumber;
use order_store::OrderStore;

use crate::{OrderView, OrderingError, Result};

/// Loads orders by order number. Never writes.
#[derive(Debug, Clone)]
pub struct OrderReader<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> OrderReader<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn read(&self, order_number: &str) -> Result<OrderView> {
        match self
            .store
            .find_order_by_number(&OrderNumber::new(order_number))
            .await?
        {
            Some(order) => Ok(OrderView::from(&order)),
            None => {
                tracing::warn!("order not found");
                Err(OrderingError::NotFound {
                    order_number: order_number.to_string(),
                })
            }
        }
    }
}
