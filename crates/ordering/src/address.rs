//! Find-or-create resolution of addresses by content hash.

use std::collections::HashMap;

use domain::{Address, AddressHash};
use order_store::{OrderStore, UnitOfWork};

use crate::{AddressRequest, OrderingError, Result};

/// Billing and shipping addresses after resolution.
///
/// Both fields hold the same stored address when the requests hash equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAddresses {
    pub billing: Address,
    pub shipping: Address,
}

/// Resolves address requests to stored addresses.
///
/// Addresses are deduplicated by content hash and never modified once stored.
/// Each new address is committed in its own unit of work, so it survives a
/// later failure of the request that created it.
#[derive(Debug, Clone)]
pub struct AddressResolver<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> AddressResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolves a billing and shipping address with one batched lookup.
    #[tracing::instrument(skip_all)]
    pub async fn resolve(
        &self,
        billing: &AddressRequest,
        shipping: &AddressRequest,
    ) -> Result<ResolvedAddresses> {
        let hashes = [billing.hash(), shipping.hash()];
        let mut known: HashMap<AddressHash, Address> = self
            .store
            .find_addresses_by_hash(&hashes)
            .await?
            .into_iter()
            .map(|address| (address.hash().clone(), address))
            .collect();

        let billing = self.reuse_or_insert(&mut known, billing).await?;
        let shipping = self.reuse_or_insert(&mut known, shipping).await?;

        Ok(ResolvedAddresses { billing, shipping })
    }

    /// Resolves a single address.
    #[tracing::instrument(skip_all)]
    pub async fn resolve_one(&self, request: &AddressRequest) -> Result<Address> {
        let mut known: HashMap<AddressHash, Address> = self
            .store
            .find_addresses_by_hash(&[request.hash()])
            .await?
            .into_iter()
            .map(|address| (address.hash().clone(), address))
            .collect();

        self.reuse_or_insert(&mut known, request).await
    }

    async fn reuse_or_insert(
        &self,
        known: &mut HashMap<AddressHash, Address>,
        request: &AddressRequest,
    ) -> Result<Address> {
        let hash = request.hash();
        if let Some(address) = known.get(&hash) {
            return Ok(address.clone());
        }

        let address = self.insert(request).await?;
        known.insert(hash, address.clone());
        Ok(address)
    }

    async fn insert(&self, request: &AddressRequest) -> Result<Address> {
        let address = request.to_address();
        let mut work = UnitOfWork::new();
        work.insert_address(address.clone());

        match self.store.commit(work).await {
            Ok(()) => {
                metrics::counter!("addresses_created_total").increment(1);
                tracing::info!(address_id = %address.id(), "address created");
                Ok(address)
            }
            // A concurrent request stored the same address first.
            Err(e) if e.is_unique_violation() => self
                .store
                .find_addresses_by_hash(std::slice::from_ref(address.hash()))
                .await?
                .into_iter()
                .next()
                .ok_or(OrderingError::Store(e)),
            Err(e) => Err(e.into()),
        }
    }
}
