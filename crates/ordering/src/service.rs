//! Boundary facade over the ordering workflows.

use order_store::OrderStore;
use outbox::OutboxSender;

use crate::{
    CreateOrderRequest, OrderCreator, OrderReader, OrderUpdater, OrderView, ServiceError,
    UpdateOrderRequest,
};

/// Service exposing the create, update and read operations.
///
/// Every failure is returned as a [`ServiceError`]; internal failures are
/// logged here and reach the caller only as a reference id.
#[derive(Debug, Clone)]
pub struct OrderService<S: OrderStore + Clone, D: OutboxSender + Clone> {
    creator: OrderCreator<S, D>,
    updater: OrderUpdater<S, D>,
    reader: OrderReader<S>,
}

impl<S: OrderStore + Clone, D: OutboxSender + Clone> OrderService<S, D> {
    /// Creates a new order service over the given store and outbox sender.
    pub fn new(store: S, sender: D) -> Self {
        Self {
            creator: OrderCreator::new(store.clone(), sender.clone()),
            updater: OrderUpdater::new(store.clone(), sender),
            reader: OrderReader::new(store),
        }
    }

    /// Places a new order.
    #[tracing::instrument(skip_all)]
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<OrderView, ServiceError> {
        Ok(self.creator.create(&request).await?)
    }

    /// Replaces the lines and shipping address of an existing order.
    #[tracing::instrument(skip_all, fields(order_number = %request.order_number))]
    pub async fn update_order(&self, request: UpdateOrderRequest) -> Result<OrderView, ServiceError> {
        Ok(self.updater.update(&request).await?)
    }

    /// Loads an order by its order number.
    #[tracing::instrument(skip(self))]
    pub async fn read_order(&self, order_number: &str) -> Result<OrderView, ServiceError> {
        Ok(self.reader.read(order_number).await?)
    }
}
