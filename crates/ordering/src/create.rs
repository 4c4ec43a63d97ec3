//! Order creation.

use std::time::Instant;

use domain::{Order, OutboxStatus};
use order_store::{OrderStore, UnitOfWork};
use outbox::{OutboxMessageCreator, OutboxSender};

use crate::{
    AddressResolver, CreateOrderRequest, CustomerResolver, ORDER_CREATED, OrderAssembler,
    OrderView, OutboxPublisher, RequestValidator, Result,
};

/// Places new orders.
///
/// Customer and addresses are resolved (and, when new, committed) before the
/// request is validated, so a rejected request can leave those rows behind.
/// The order and its outbox message are committed together.
#[derive(Debug, Clone)]
pub struct OrderCreator<S: OrderStore + Clone, D: OutboxSender> {
    store: S,
    customers: CustomerResolver<S>,
    addresses: AddressResolver<S>,
    validator: RequestValidator,
    assembler: OrderAssembler<S>,
    messages: OutboxMessageCreator,
    publisher: OutboxPublisher<S, D>,
}

impl<S: OrderStore + Clone, D: OutboxSender> OrderCreator<S, D> {
    pub fn new(store: S, sender: D) -> Self {
        Self {
            customers: CustomerResolver::new(store.clone()),
            addresses: AddressResolver::new(store.clone()),
            validator: RequestValidator::new(),
            assembler: OrderAssembler::new(store.clone()),
            messages: OutboxMessageCreator::new(),
            publisher: OutboxPublisher::new(store.clone(), sender),
            store,
        }
    }

    #[tracing::instrument(skip_all, fields(line_count = request.items.len()))]
    pub async fn create(&self, request: &CreateOrderRequest) -> Result<OrderView> {
        let started = Instant::now();

        let customer = self.customers.resolve(&request.customer).await?;
        let addresses = self
            .addresses
            .resolve(&request.billing_address, &request.shipping_address)
            .await?;

        self.validator
            .validate(&customer, &addresses.billing, &addresses.shipping)?;

        let lines = self.assembler.assemble(&request.items).await?;

        let mut order = Order::new(customer, addresses.billing, addresses.shipping);
        order.replace_items(lines)?;

        let message = self.messages.snapshot(&order, ORDER_CREATED)?;
        let mut work = UnitOfWork::new();
        work.save_order(order.clone())
            .insert_outbox_message(message.clone());
        self.store.commit(work).await?;

        metrics::counter!("orders_created_total").increment(1);
        tracing::info!(
            order_number = %order.order_number(),
            item_count = order.item_count(),
            "order created"
        );

        let outbox_status = self.publisher.publish(&message).await;
        if outbox_status == OutboxStatus::Failed {
            tracing::warn!(
                order_number = %order.order_number(),
                message_id = %message.id,
                "order created but its outbox message was not delivered"
            );
        }

        metrics::histogram!("order_write_duration_seconds").record(started.elapsed().as_secs_f64());
        Ok(OrderView::from(&order))
    }
}
