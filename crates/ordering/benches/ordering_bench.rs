use criterion::{Criterion, criterion_group, criterion_main};
use domain::{Address, AddressHash, Customer};
use order_store::InMemoryOrderStore;
use ordering::{
    AddressRequest, CreateOrderRequest, CustomerRequest, OrderItemRequest, OrderService,
    RequestValidator,
};
use outbox::InMemoryOutboxSender;

fn bench_address_hash(c: &mut Criterion) {
    c.bench_function("ordering/address_hash", |b| {
        b.iter(|| {
            AddressHash::compute(
                std::hint::black_box("1 High St"),
                Some("Flat 2"),
                None,
                std::hint::black_box("SW1A 1AA"),
            )
        });
    });
}

fn bench_validate(c: &mut Criterion) {
    let validator = RequestValidator::new();
    let customer = Customer::new("jane@test.com", "Jane Doe", "0123");
    let billing = Address::new("1 High St", None, None, "SW1A 1AA");
    let shipping = Address::new("2 Low Rd", Some("Unit 4".to_string()), None, "EC1A 1BB");

    c.bench_function("ordering/validate", |b| {
        b.iter(|| validator.validate(&customer, &billing, &shipping));
    });
}

fn bench_create_order(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryOrderStore::new();
    rt.block_on(async {
        store.seed_variant("SKU1", "Widget").await.unwrap();
        store.seed_variant("SKU2", "Gadget").await.unwrap();
    });
    let service = OrderService::new(store, InMemoryOutboxSender::new());
    let request = CreateOrderRequest {
        customer: CustomerRequest::new("jane@test.com", "Jane Doe", "0123"),
        billing_address: AddressRequest::new("1 High St", "SW1A 1AA"),
        shipping_address: AddressRequest::new("1 High St", "SW1A 1AA"),
        items: vec![OrderItemRequest::new("SKU1", 2), OrderItemRequest::new("SKU2", 1)],
    };

    c.bench_function("ordering/create_order", |b| {
        b.iter(|| {
            rt.block_on(async {
                service.create_order(request.clone()).await.unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_address_hash, bench_validate, bench_create_order);
criterion_main!(benches);
