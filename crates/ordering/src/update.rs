//! Order updates.

use std::time::Instant;

use domain::{OrderNumber, OutboxStatus};
use order_store::{OrderStore, UnitOfWork};
use outbox::{OutboxMessageCreator, OutboxSender};

use crate::{
    AddressResolver, ORDER_UPDATED, OrderAssembler, OrderView, OrderingError, OutboxPublisher,
    Result, UpdateOrderRequest,
};

/// Replaces the lines and shipping address of existing orders.
///
/// The shipping address is re-resolved by content hash and the order is
/// pointed at the result. Stored addresses are never edited, so other orders
/// sharing the previous address keep it.
#[derive(Debug, Clone)]
pub struct OrderUpdater<S: OrderStore + Clone, D: OutboxSender> {
    store: S,
    addresses: AddressResolver<S>,
    assembler: OrderAssembler<S>,
    messages: OutboxMessageCreator,
    publisher: OutboxPublisher<S, D>,
}

impl<S: OrderStore + Clone, D: OutboxSender> OrderUpdater<S, D> {
    pub fn new(store: S, sender: D) -> Self {
        Self {
            addresses: AddressResolver::new(store.clone()),
            assembler: OrderAssembler::new(store.clone()),
            messages: OutboxMessageCreator::new(),
            publisher: OutboxPublisher::new(store.clone(), sender),
            store,
        }
    }

    #[tracing::instrument(skip_all, fields(order_number = %request.order_number, line_count = request.items.len()))]
    pub async fn update(&self, request: &UpdateOrderRequest) -> Result<OrderView> {
        let started = Instant::now();
        let order_number = OrderNumber::new(request.order_number.as_str());

        let Some(mut order) = self.store.find_order_by_number(&order_number).await? else {
            tracing::warn!("update of unknown order");
            return Err(OrderingError::NotFound {
                order_number: request.order_number.clone(),
            });
        };

        let lines = self.assembler.assemble(&request.items).await?;
        let shipping = self.addresses.resolve_one(&request.shipping_address).await?;

        order.change_shipping_address(shipping);
        order.replace_items(lines)?;

        let message = self.messages.snapshot(&order, ORDER_UPDATED)?;
        let mut work = UnitOfWork::new();
        work.save_order(order.clone())
            .insert_outbox_message(message.clone());
        self.store.commit(work).await?;

        metrics::counter!("orders_updated_total").increment(1);
        tracing::info!(item_count = order.item_count(), "order updated");

        let outbox_status = self.publisher.publish(&message).await;
        if outbox_status == OutboxStatus::Failed {
            tracing::warn!(
                order_number = %order.order_number(),
                message_id = %message.id,
                "order updated but its outbox message was not delivered"
            );
        }

        metrics::histogram!("order_write_duration_seconds").record(started.elapsed().as_secs_f64());
        Ok(OrderView::from(&order))
    }
}
