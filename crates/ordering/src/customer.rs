//! Find-or-create resolution of customers.

use domain::Customer;
use order_store::{OrderStore, StoreError, UnitOfWork};

use crate::{CustomerRequest, OrderingError, Result};

/// Resolves a customer request to a stored customer, keyed by normalised email.
///
/// An existing customer is returned as stored: name and phone from the request
/// are not merged into it.
#[derive(Debug, Clone)]
pub struct CustomerResolver<S: OrderStore> {
    store: S,
}

impl<S: OrderStore> CustomerResolver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip_all)]
    pub async fn resolve(&self, request: &CustomerRequest) -> Result<Customer> {
        let email = Customer::normalize_email(&request.email);

        if let Some(customer) = self.store.find_customer_by_email(&email).await? {
            tracing::debug!(customer_id = %customer.id, "reusing existing customer");
            return Ok(customer);
        }

        let customer = Customer::new(&request.email, &request.name, &request.phone);
        let mut work = UnitOfWork::new();
        work.insert_customer(customer.clone());

        match self.store.commit(work).await {
            Ok(()) => {
                metrics::counter!("customers_created_total").increment(1);
                tracing::info!(customer_id = %customer.id, "customer created");
                Ok(customer)
            }
            // A concurrent request inserted the same email first.
            Err(e) if e.is_unique_violation() => self.lookup_after_conflict(&email, e).await,
            Err(e) => Err(e.into()),
        }
    }

    async fn lookup_after_conflict(&self, email: &str, conflict: StoreError) -> Result<Customer> {
        self.store
            .find_customer_by_email(email)
            .await?
            .ok_or(OrderingError::Store(conflict))
    }
}
