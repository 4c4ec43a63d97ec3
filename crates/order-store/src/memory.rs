use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    Address, AddressHash, AddressId, Customer, CustomerId, Order, OrderId, OrderItem, OrderNumber,
    OutboxMessage, OutboxMessageId, Product, Variant, VariantId,
};
use tokio::sync::RwLock;

use crate::{
    Result, StoreError,
    store::{Change, OrderStore, UnitOfWork},
};

/// An order as stored: references instead of embedded entities.
#[derive(Debug)]
struct OrderRecord {
    id: OrderId,
    order_number: OrderNumber,
    customer_id: CustomerId,
    billing_address_id: AddressId,
    shipping_address_id: AddressId,
    items: Vec<(VariantId, u32)>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// How to reverse one applied change.
#[derive(Debug)]
enum Undo {
    RemoveCustomer(CustomerId),
    RemoveAddress(AddressId),
    RestoreOrder {
        id: OrderId,
        previous: Option<OrderRecord>,
    },
    PopOutboxMessage,
    RestoreOutboxMessage {
        index: usize,
        previous: OutboxMessage,
    },
}

#[derive(Debug, Default)]
struct State {
    customers: HashMap<CustomerId, Customer>,
    addresses: HashMap<AddressId, Address>,
    variants: HashMap<VariantId, Variant>,
    orders: HashMap<OrderId, OrderRecord>,
    outbox: Vec<OutboxMessage>,
}

impl State {
    /// Applies one change to the live state and returns its inverse.
    ///
    /// A change that fails leaves the state as it found it.
    fn apply(&mut self, change: Change) -> Result<Undo> {
        match change {
            Change::InsertCustomer(customer) => self.insert_customer(customer),
            Change::InsertAddress(address) => self.insert_address(address),
            Change::SaveOrder(order) => self.save_order(order),
            Change::InsertOutboxMessage(message) => self.insert_outbox_message(message),
            Change::MarkOutboxDelivered { id, at } => {
                self.update_outbox_message(id, |message| message.mark_delivered(at))
            }
            Change::MarkOutboxFailed { id, error } => {
                self.update_outbox_message(id, |message| message.mark_failed(error))
            }
        }
    }

    fn revert(&mut self, undo: Undo) {
        match undo {
            Undo::RemoveCustomer(id) => {
                self.customers.remove(&id);
            }
            Undo::RemoveAddress(id) => {
                self.addresses.remove(&id);
            }
            Undo::RestoreOrder { id, previous } => match previous {
                Some(record) => {
                    self.orders.insert(id, record);
                }
                None => {
                    self.orders.remove(&id);
                }
            },
            Undo::PopOutboxMessage => {
                self.outbox.pop();
            }
            Undo::RestoreOutboxMessage { index, previous } => {
                if let Some(slot) = self.outbox.get_mut(index) {
                    *slot = previous;
                }
            }
        }
    }

    fn insert_customer(&mut self, customer: Customer) -> Result<Undo> {
        if self.customers.contains_key(&customer.id)
            || self.customers.values().any(|c| c.email == customer.email)
        {
            return Err(StoreError::UniqueViolation {
                entity: "customer",
                key: customer.email,
            });
        }
        let id = customer.id;
        self.customers.insert(id, customer);
        Ok(Undo::RemoveCustomer(id))
    }

    fn insert_address(&mut self, address: Address) -> Result<Undo> {
        if self.addresses.contains_key(&address.id())
            || self.addresses.values().any(|a| a.hash() == address.hash())
        {
            return Err(StoreError::UniqueViolation {
                entity: "address",
                key: address.hash().to_string(),
            });
        }
        let id = address.id();
        self.addresses.insert(id, address);
        Ok(Undo::RemoveAddress(id))
    }

    fn save_order(&mut self, order: Order) -> Result<Undo> {
        let customer_id = order.customer().id;
        if !self.customers.contains_key(&customer_id) {
            return Err(missing("customer", customer_id));
        }
        for address in [order.billing_address(), order.shipping_address()] {
            if !self.addresses.contains_key(&address.id()) {
                return Err(missing("address", address.id()));
            }
        }
        for item in order.items() {
            if !self.variants.contains_key(&item.variant.id) {
                return Err(missing("variant", item.variant.id));
            }
        }
        if self
            .orders
            .values()
            .any(|o| o.order_number == *order.order_number() && o.id != order.id())
        {
            return Err(StoreError::UniqueViolation {
                entity: "order",
                key: order.order_number().to_string(),
            });
        }

        let record = OrderRecord {
            id: order.id(),
            order_number: order.order_number().clone(),
            customer_id,
            billing_address_id: order.billing_address().id(),
            shipping_address_id: order.shipping_address().id(),
            items: order
                .items()
                .iter()
                .map(|item| (item.variant.id, item.quantity))
                .collect(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        };
        let id = record.id;
        let previous = self.orders.insert(id, record);
        Ok(Undo::RestoreOrder { id, previous })
    }

    fn insert_outbox_message(&mut self, message: OutboxMessage) -> Result<Undo> {
        if self.outbox.iter().any(|m| m.id == message.id) {
            return Err(StoreError::UniqueViolation {
                entity: "outbox message",
                key: message.id.to_string(),
            });
        }
        self.outbox.push(message);
        Ok(Undo::PopOutboxMessage)
    }

    fn update_outbox_message(
        &mut self,
        id: OutboxMessageId,
        update: impl FnOnce(&mut OutboxMessage),
    ) -> Result<Undo> {
        let index = self
            .outbox
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| missing("outbox message", id))?;
        let message = &mut self.outbox[index];
        let previous = message.clone();
        update(message);
        Ok(Undo::RestoreOutboxMessage { index, previous })
    }

    fn hydrate(&self, record: &OrderRecord) -> Result<Order> {
        let customer = self
            .customers
            .get(&record.customer_id)
            .cloned()
            .ok_or_else(|| missing("customer", record.customer_id))?;
        let billing = self.address(record.billing_address_id)?;
        let shipping = self.address(record.shipping_address_id)?;
        let items = record
            .items
            .iter()
            .map(|(variant_id, quantity)| {
                self.variants
                    .get(variant_id)
                    .cloned()
                    .map(|variant| OrderItem::new(variant, *quantity))
                    .ok_or_else(|| missing("variant", variant_id))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Order::from_parts(
            record.id,
            record.order_number.clone(),
            customer,
            billing,
            shipping,
            items,
            record.created_at,
            record.updated_at,
        ))
    }

    fn address(&self, id: AddressId) -> Result<Address> {
        self.addresses
            .get(&id)
            .cloned()
            .ok_or_else(|| missing("address", id))
    }
}

fn missing(entity: &'static str, id: impl std::fmt::Display) -> StoreError {
    StoreError::MissingReference {
        entity,
        id: id.to_string(),
    }
}

/// In-memory order store implementation for testing.
///
/// This implementation keeps all rows in memory, enforces the same
/// uniqueness and reference rules as the PostgreSQL schema, and provides
/// the same interface as the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<RwLock<State>>,
    fail_on_commit: Arc<AtomicBool>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variant (and its product) to the catalog.
    pub async fn insert_variant(&self, variant: Variant) -> Result<()> {
        let mut state = self.state.write().await;
        if state.variants.values().any(|v| v.sku == variant.sku) {
            return Err(StoreError::UniqueViolation {
                entity: "variant",
                key: variant.sku,
            });
        }
        state.variants.insert(variant.id, variant);
        Ok(())
    }

    /// Creates a variant for a new product and adds it to the catalog.
    pub async fn seed_variant(&self, sku: &str, product_name: &str) -> Result<Variant> {
        let variant = Variant::new(sku, Product::new(product_name));
        self.insert_variant(variant.clone()).await?;
        Ok(variant)
    }

    /// Makes every subsequent commit fail until reset.
    pub fn set_fail_on_commit(&self, fail: bool) {
        self.fail_on_commit.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored customers.
    pub async fn customer_count(&self) -> usize {
        self.state.read().await.customers.len()
    }

    /// Returns the number of stored addresses.
    pub async fn address_count(&self) -> usize {
        self.state.read().await.addresses.len()
    }

    /// Returns the number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.state.read().await.orders.len()
    }

    /// Returns all outbox messages in insertion order.
    pub async fn outbox_messages(&self) -> Vec<OutboxMessage> {
        self.state.read().await.outbox.clone()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let state = self.state.read().await;
        Ok(state.customers.values().find(|c| c.email == email).cloned())
    }

    async fn find_addresses_by_hash(&self, hashes: &[AddressHash]) -> Result<Vec<Address>> {
        let state = self.state.read().await;
        Ok(state
            .addresses
            .values()
            .filter(|a| hashes.contains(a.hash()))
            .cloned()
            .collect())
    }

    async fn find_variants_by_sku(&self, skus: &[String]) -> Result<Vec<Variant>> {
        let state = self.state.read().await;
        Ok(state
            .variants
            .values()
            .filter(|v| skus.contains(&v.sku))
            .cloned()
            .collect())
    }

    async fn find_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>> {
        let state = self.state.read().await;
        state
            .orders
            .values()
            .find(|o| o.order_number == *order_number)
            .map(|record| state.hydrate(record))
            .transpose()
    }

    async fn find_outbox_message(&self, id: OutboxMessageId) -> Result<Option<OutboxMessage>> {
        let state = self.state.read().await;
        Ok(state.outbox.iter().find(|m| m.id == id).cloned())
    }

    async fn commit(&self, work: UnitOfWork) -> Result<()> {
        if work.is_empty() {
            return Ok(());
        }
        if self.fail_on_commit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("commit rejected".to_string()));
        }

        let mut state = self.state.write().await;
        let mut undo_log = Vec::with_capacity(work.len());
        for change in work.into_changes() {
            match state.apply(change) {
                Ok(undo) => undo_log.push(undo),
                Err(e) => {
                    for undo in undo_log.into_iter().rev() {
                        state.revert(undo);
                    }
                    return Err(e);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::OutboxStatus;

    fn customer(email: &str) -> Customer {
        Customer::new(email, "Jane Doe", "0123")
    }

    fn address(line_one: &str) -> Address {
        Address::new(line_one, None, None, "SW1A 1AA")
    }

    async fn store_with_order() -> (InMemoryOrderStore, Order) {
        let store = InMemoryOrderStore::new();
        let variant = store.seed_variant("SKU1", "Widget").await.unwrap();
        let customer = customer("jane@test.com");
        let billing = address("1 High St");
        let shipping = address("2 Low Rd");

        let mut order = Order::new(customer.clone(), billing.clone(), shipping.clone());
        order.replace_items(vec![(variant, 2)]).unwrap();

        let mut work = UnitOfWork::new();
        work.insert_customer(customer)
            .insert_address(billing)
            .insert_address(shipping)
            .save_order(order.clone());
        store.commit(work).await.unwrap();

        (store, order)
    }

    #[tokio::test]
    async fn insert_and_find_customer_by_email() {
        let store = InMemoryOrderStore::new();
        let customer = customer("jane@test.com");
        let mut work = UnitOfWork::new();
        work.insert_customer(customer.clone());
        store.commit(work).await.unwrap();

        let found = store.find_customer_by_email("jane@test.com").await.unwrap();
        assert_eq!(found, Some(customer));
        assert!(
            store
                .find_customer_by_email("other@test.com")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let store = InMemoryOrderStore::new();
        let mut work = UnitOfWork::new();
        work.insert_customer(customer("jane@test.com"));
        store.commit(work).await.unwrap();

        let mut work = UnitOfWork::new();
        work.insert_customer(customer("JANE@test.com"));
        let result = store.commit(work).await;

        assert!(matches!(result, Err(StoreError::UniqueViolation { entity: "customer", .. })));
        assert_eq!(store.customer_count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_address_hash_is_a_unique_violation() {
        let store = InMemoryOrderStore::new();
        let mut work = UnitOfWork::new();
        work.insert_address(address("1 High St"));
        store.commit(work).await.unwrap();

        let mut work = UnitOfWork::new();
        work.insert_address(address("1 High St"));
        let result = store.commit(work).await;

        assert!(result.unwrap_err().is_unique_violation());
        assert_eq!(store.address_count().await, 1);
    }

    #[tokio::test]
    async fn find_addresses_by_hash_is_batched() {
        let store = InMemoryOrderStore::new();
        let a = address("1 High St");
        let b = address("2 Low Rd");
        let mut work = UnitOfWork::new();
        work.insert_address(a.clone()).insert_address(b.clone());
        store.commit(work).await.unwrap();

        let unknown = AddressHash::compute("3 Nowhere", None, None, "N1 1NN");
        let found = store
            .find_addresses_by_hash(&[a.hash().clone(), b.hash().clone(), unknown])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn variant_lookup_is_case_sensitive() {
        let store = InMemoryOrderStore::new();
        store.seed_variant("SKU1", "Widget").await.unwrap();

        let exact = store.find_variants_by_sku(&["SKU1".to_string()]).await.unwrap();
        assert_eq!(exact.len(), 1);
        assert_eq!(exact[0].product.name, "Widget");

        let folded = store.find_variants_by_sku(&["sku1".to_string()]).await.unwrap();
        assert!(folded.is_empty());
    }

    #[tokio::test]
    async fn duplicate_sku_is_rejected() {
        let store = InMemoryOrderStore::new();
        store.seed_variant("SKU1", "Widget").await.unwrap();
        let result = store.seed_variant("SKU1", "Gadget").await;
        assert!(matches!(result, Err(StoreError::UniqueViolation { entity: "variant", .. })));
    }

    #[tokio::test]
    async fn save_and_hydrate_order() {
        let (store, order) = store_with_order().await;

        let loaded = store
            .find_order_by_number(order.order_number())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded, order);
        assert_eq!(loaded.items()[0].variant.product.name, "Widget");
    }

    #[tokio::test]
    async fn save_order_replaces_items() {
        let (store, mut order) = store_with_order().await;
        let other = store.seed_variant("SKU2", "Gadget").await.unwrap();

        order.replace_items(vec![(other, 7)]).unwrap();
        let mut work = UnitOfWork::new();
        work.save_order(order.clone());
        store.commit(work).await.unwrap();

        let loaded = store
            .find_order_by_number(order.order_number())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.item_count(), 1);
        assert_eq!(loaded.items()[0].sku(), "SKU2");
        assert_eq!(loaded.items()[0].quantity, 7);
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn missing_order_is_none() {
        let store = InMemoryOrderStore::new();
        let found = store
            .find_order_by_number(&OrderNumber::new("ORD-MISSING"))
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn order_with_unknown_customer_is_rejected() {
        let store = InMemoryOrderStore::new();
        let order = Order::new(customer("a@test.com"), address("1 High St"), address("1 High St"));

        let mut work = UnitOfWork::new();
        work.save_order(order);
        let result = store.commit(work).await;

        assert!(matches!(result, Err(StoreError::MissingReference { entity: "customer", .. })));
    }

    #[tokio::test]
    async fn failed_change_rolls_back_whole_unit() {
        let store = InMemoryOrderStore::new();
        let existing = customer("taken@test.com");
        let mut work = UnitOfWork::new();
        work.insert_customer(existing);
        store.commit(work).await.unwrap();

        let mut work = UnitOfWork::new();
        work.insert_address(address("1 High St"))
            .insert_customer(customer("taken@test.com"));
        assert!(store.commit(work).await.is_err());

        assert_eq!(store.address_count().await, 0);
        assert_eq!(store.customer_count().await, 1);
    }

    #[tokio::test]
    async fn failed_unit_restores_updated_order_and_outbox_status() {
        let (store, order) = store_with_order().await;
        let message = OutboxMessage::new(
            "Order",
            uuid::Uuid::new_v4(),
            "OrderCreated",
            serde_json::json!({}),
        );
        let mut work = UnitOfWork::new();
        work.insert_outbox_message(message.clone());
        store.commit(work).await.unwrap();

        let gadget = store.seed_variant("SKU2", "Gadget").await.unwrap();
        let mut changed = order.clone();
        changed.replace_items(vec![(gadget, 7)]).unwrap();

        let mut work = UnitOfWork::new();
        work.save_order(changed)
            .mark_outbox_delivered(message.id, Utc::now())
            .insert_outbox_message(OutboxMessage::new(
                "Order",
                uuid::Uuid::new_v4(),
                "OrderUpdated",
                serde_json::json!({}),
            ))
            .insert_customer(customer("jane@test.com"));
        assert!(store.commit(work).await.is_err());

        let loaded = store
            .find_order_by_number(order.order_number())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.items(), order.items());

        let messages = store.outbox_messages().await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].status, OutboxStatus::Pending);
        assert_eq!(messages[0].attempts, 0);
    }

    #[tokio::test]
    async fn failed_first_save_removes_new_order() {
        let store = InMemoryOrderStore::new();
        let variant = store.seed_variant("SKU1", "Widget").await.unwrap();
        let customer = customer("jane@test.com");
        let address = address("1 High St");
        let mut order = Order::new(customer.clone(), address.clone(), address.clone());
        order.replace_items(vec![(variant, 1)]).unwrap();

        let mut work = UnitOfWork::new();
        work.insert_customer(customer)
            .insert_address(address)
            .save_order(order.clone())
            .mark_outbox_failed(OutboxMessageId::new(), "boom");
        assert!(store.commit(work).await.is_err());

        assert_eq!(store.order_count().await, 0);
        assert_eq!(store.customer_count().await, 0);
        assert_eq!(store.address_count().await, 0);
    }

    #[tokio::test]
    async fn outbox_message_status_updates() {
        let store = InMemoryOrderStore::new();
        let message = OutboxMessage::new(
            "Order",
            uuid::Uuid::new_v4(),
            "OrderCreated",
            serde_json::json!({}),
        );
        let id = message.id;
        let mut work = UnitOfWork::new();
        work.insert_outbox_message(message);
        store.commit(work).await.unwrap();

        let mut work = UnitOfWork::new();
        work.mark_outbox_failed(id, "boom");
        store.commit(work).await.unwrap();
        let stored = store.find_outbox_message(id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Failed);
        assert_eq!(stored.last_error.as_deref(), Some("boom"));

        let mut work = UnitOfWork::new();
        work.mark_outbox_delivered(id, Utc::now());
        store.commit(work).await.unwrap();
        let stored = store.find_outbox_message(id).await.unwrap().unwrap();
        assert_eq!(stored.status, OutboxStatus::Delivered);
        assert_eq!(stored.attempts, 2);
    }

    #[tokio::test]
    async fn marking_unknown_outbox_message_fails() {
        let store = InMemoryOrderStore::new();
        let mut work = UnitOfWork::new();
        work.mark_outbox_delivered(OutboxMessageId::new(), Utc::now());

        let result = store.commit(work).await;
        assert!(matches!(result, Err(StoreError::MissingReference { .. })));
    }

    #[tokio::test]
    async fn fail_on_commit_rejects_writes() {
        let store = InMemoryOrderStore::new();
        store.set_fail_on_commit(true);

        let mut work = UnitOfWork::new();
        work.insert_customer(customer("a@test.com"));
        let result = store.commit(work).await;

        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.customer_count().await, 0);
    }

    #[tokio::test]
    async fn empty_commit_is_noop() {
        let store = InMemoryOrderStore::new();
        store.set_fail_on_commit(true);
        assert!(store.commit(UnitOfWork::new()).await.is_ok());
    }
}
