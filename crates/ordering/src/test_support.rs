//! Store wrapper for exercising insert races in unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use domain::{
    Address, AddressHash, Customer, Order, OrderNumber, OutboxMessage, OutboxMessageId, Variant,
};
use order_store::{InMemoryOrderStore, OrderStore, UnitOfWork};

/// Wraps an in-memory store and reports the next `n` customer and address
/// lookups as empty, as if another request inserted the row in between.
#[derive(Clone)]
pub(crate) struct StaleReadStore {
    inner: InMemoryOrderStore,
    stale_reads: Arc<AtomicUsize>,
}

impl StaleReadStore {
    pub(crate) fn new(inner: InMemoryOrderStore) -> Self {
        Self {
            inner,
            stale_reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn miss_next_reads(&self, n: usize) {
        self.stale_reads.store(n, Ordering::SeqCst);
    }

    fn take_stale_read(&self) -> bool {
        self.stale_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl OrderStore for StaleReadStore {
    async fn find_customer_by_email(&self, email: &str) -> order_store::Result<Option<Customer>> {
        if self.take_stale_read() {
            return Ok(None);
        }
        self.inner.find_customer_by_email(email).await
    }

    async fn find_addresses_by_hash(
        &self,
        hashes: &[AddressHash],
    ) -> order_store::Result<Vec<Address>> {
        if self.take_stale_read() {
            return Ok(Vec::new());
        }
        self.inner.find_addresses_by_hash(hashes).await
    }

    async fn find_variants_by_sku(&self, skus: &[String]) -> order_store::Result<Vec<Variant>> {
        self.inner.find_variants_by_sku(skus).await
    }

    async fn find_order_by_number(
        &self,
        order_number: &OrderNumber,
    ) -> order_store::Result<Option<Order>> {
        self.inner.find_order_by_number(order_number).await
    }

    async fn find_outbox_message(
        &self,
        id: OutboxMessageId,
    ) -> order_store::Result<Option<OutboxMessage>> {
        self.inner.find_outbox_message(id).await
    }

    async fn commit(&self, work: UnitOfWork) -> order_store::Result<()> {
        self.inner.commit(work).await
    }
}
