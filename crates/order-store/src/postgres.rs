use async_trait::async_trait;
use domain::{
    Address, AddressHash, AddressId, Customer, CustomerId, Order, OrderId, OrderItem, OrderNumber,
    OutboxMessage, OutboxMessageId, OutboxStatus, Product, ProductId, Variant, VariantId,
};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgPoolOptions, postgres::PgRow};
use uuid::Uuid;

use crate::{
    DatabaseConfig, Result, StoreError,
    store::{Change, OrderStore, UnitOfWork},
};

const ORDER_SELECT: &str = r#"
    SELECT o.id, o.order_number, o.created_at, o.updated_at,
           c.id AS customer_id, c.email AS customer_email, c.name AS customer_name,
           c.phone AS customer_phone, c.created_at AS customer_created_at,
           b.id AS billing_id, b.line_one AS billing_line_one, b.line_two AS billing_line_two,
           b.line_three AS billing_line_three, b.post_code AS billing_post_code,
           b.hash AS billing_hash,
           s.id AS shipping_id, s.line_one AS shipping_line_one, s.line_two AS shipping_line_two,
           s.line_three AS shipping_line_three, s.post_code AS shipping_post_code,
           s.hash AS shipping_hash
    FROM orders o
    JOIN customers c ON c.id = o.customer_id
    JOIN addresses b ON b.id = o.billing_address_id
    JOIN addresses s ON s.id = o.shipping_address_id
    WHERE o.order_number = $1
"#;

const OUTBOX_COLUMNS: &str = "id, aggregate_type, aggregate_id, event_type, payload, status, attempts, last_error, created_at, delivered_at";

/// PostgreSQL-backed order store implementation.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects a new pool using the given configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;
        tracing::info!(max_connections = config.max_connections, "connected order store");
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    /// Adds a variant (and its product, if new) to the catalog.
    pub async fn insert_variant(&self, variant: &Variant) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO products (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(variant.product.id.as_uuid())
            .bind(&variant.product.name)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO variants (id, sku, product_id) VALUES ($1, $2, $3)")
            .bind(variant.id.as_uuid())
            .bind(&variant.sku)
            .bind(variant.product.id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, &variant.sku))?;

        tx.commit().await?;
        Ok(())
    }

    async fn apply(tx: &mut Transaction<'_, Postgres>, change: Change) -> Result<()> {
        match change {
            Change::InsertCustomer(customer) => {
                sqlx::query(
                    r#"
                    INSERT INTO customers (id, email, name, phone, created_at)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(customer.id.as_uuid())
                .bind(&customer.email)
                .bind(&customer.name)
                .bind(&customer.phone)
                .bind(customer.created_at)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_write_error(e, &customer.email))?;
            }
            Change::InsertAddress(address) => {
                sqlx::query(
                    r#"
                    INSERT INTO addresses (id, line_one, line_two, line_three, post_code, hash)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    "#,
                )
                .bind(address.id().as_uuid())
                .bind(address.line_one())
                .bind(address.line_two())
                .bind(address.line_three())
                .bind(address.post_code())
                .bind(address.hash().as_str())
                .execute(&mut **tx)
                .await
                .map_err(|e| map_write_error(e, address.hash().as_str()))?;
            }
            Change::SaveOrder(order) => Self::save_order(tx, &order).await?,
            Change::InsertOutboxMessage(message) => {
                sqlx::query(
                    r#"
                    INSERT INTO outbox_messages
                        (id, aggregate_type, aggregate_id, event_type, payload, status, attempts, last_error, created_at, delivered_at)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                    "#,
                )
                .bind(message.id.as_uuid())
                .bind(&message.aggregate_type)
                .bind(message.aggregate_id)
                .bind(&message.event_type)
                .bind(&message.payload)
                .bind(message.status.as_str())
                .bind(message.attempts)
                .bind(&message.last_error)
                .bind(message.created_at)
                .bind(message.delivered_at)
                .execute(&mut **tx)
                .await
                .map_err(|e| map_write_error(e, &message.id.to_string()))?;
            }
            Change::MarkOutboxDelivered { id, at } => {
                let result = sqlx::query(
                    r#"
                    UPDATE outbox_messages
                    SET status = $2, attempts = attempts + 1, last_error = NULL, delivered_at = $3
                    WHERE id = $1
                    "#,
                )
                .bind(id.as_uuid())
                .bind(OutboxStatus::Delivered.as_str())
                .bind(at)
                .execute(&mut **tx)
                .await?;
                ensure_updated(result.rows_affected(), id)?;
            }
            Change::MarkOutboxFailed { id, error } => {
                let result = sqlx::query(
                    r#"
                    UPDATE outbox_messages
                    SET status = $2, attempts = attempts + 1, last_error = $3
                    WHERE id = $1
                    "#,
                )
                .bind(id.as_uuid())
                .bind(OutboxStatus::Failed.as_str())
                .bind(&error)
                .execute(&mut **tx)
                .await?;
                ensure_updated(result.rows_affected(), id)?;
            }
        }
        Ok(())
    }

    async fn save_order(tx: &mut Transaction<'_, Postgres>, order: &Order) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (id, order_number, customer_id, billing_address_id, shipping_address_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                customer_id = EXCLUDED.customer_id,
                billing_address_id = EXCLUDED.billing_address_id,
                shipping_address_id = EXCLUDED.shipping_address_id,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(order.id().as_uuid())
        .bind(order.order_number().as_str())
        .bind(order.customer().id.as_uuid())
        .bind(order.billing_address().id().as_uuid())
        .bind(order.shipping_address().id().as_uuid())
        .bind(order.created_at())
        .bind(order.updated_at())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error(e, order.order_number().as_str()))?;

        // Items are replaced wholesale, never merged
        sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order.id().as_uuid())
            .execute(&mut **tx)
            .await?;

        for (position, item) in (0_i32..).zip(order.items()) {
            sqlx::query(
                r#"
                INSERT INTO order_items (order_id, position, variant_id, quantity)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(order.id().as_uuid())
            .bind(position)
            .bind(item.variant.id.as_uuid())
            .bind(i64::from(item.quantity))
            .execute(&mut **tx)
            .await
            .map_err(|e| map_write_error(e, item.sku()))?;
        }

        Ok(())
    }

    fn row_to_customer(row: &PgRow) -> Result<Customer> {
        Ok(Customer {
            id: CustomerId::from_uuid(row.try_get::<Uuid, _>("customer_id")?),
            email: row.try_get("customer_email")?,
            name: row.try_get("customer_name")?,
            phone: row.try_get("customer_phone")?,
            created_at: row.try_get("customer_created_at")?,
        })
    }

    fn row_to_address(row: &PgRow, prefix: &str) -> Result<Address> {
        let column = |name: &str| format!("{prefix}{name}");
        Ok(Address::from_parts(
            AddressId::from_uuid(row.try_get::<Uuid, _>(column("id").as_str())?),
            row.try_get(column("line_one").as_str())?,
            row.try_get(column("line_two").as_str())?,
            row.try_get(column("line_three").as_str())?,
            row.try_get(column("post_code").as_str())?,
            AddressHash::from_hex(row.try_get::<String, _>(column("hash").as_str())?),
        ))
    }

    fn row_to_variant(row: &PgRow) -> Result<Variant> {
        Ok(Variant {
            id: VariantId::from_uuid(row.try_get::<Uuid, _>("variant_id")?),
            sku: row.try_get("sku")?,
            product: Product {
                id: ProductId::from_uuid(row.try_get::<Uuid, _>("product_id")?),
                name: row.try_get("product_name")?,
            },
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        let quantity: i64 = row.try_get("quantity")?;
        let quantity = u32::try_from(quantity).map_err(|_| StoreError::CorruptRow {
            table: "order_items",
            reason: format!("quantity {quantity} out of range"),
        })?;
        Ok(OrderItem::new(Self::row_to_variant(row)?, quantity))
    }

    fn row_to_outbox_message(row: PgRow) -> Result<OutboxMessage> {
        let status: String = row.try_get("status")?;
        let status = OutboxStatus::parse(&status).ok_or_else(|| StoreError::CorruptRow {
            table: "outbox_messages",
            reason: format!("unknown status {status}"),
        })?;

        Ok(OutboxMessage {
            id: OutboxMessageId::from_uuid(row.try_get::<Uuid, _>("id")?),
            aggregate_type: row.try_get("aggregate_type")?,
            aggregate_id: row.try_get("aggregate_id")?,
            event_type: row.try_get("event_type")?,
            payload: row.try_get("payload")?,
            status,
            attempts: row.try_get("attempts")?,
            last_error: row.try_get("last_error")?,
            created_at: row.try_get("created_at")?,
            delivered_at: row.try_get("delivered_at")?,
        })
    }
}

/// Maps constraint violations to store errors; everything else is a database error.
fn map_write_error(e: sqlx::Error, key: &str) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            let entity = match db_err.constraint() {
                Some("unique_customer_email") => "customer",
                Some("unique_address_hash") => "address",
                Some("unique_variant_sku") => "variant",
                Some("unique_order_number") => "order",
                _ => "row",
            };
            return StoreError::UniqueViolation {
                entity,
                key: key.to_string(),
            };
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingReference {
                entity: "reference",
                id: db_err.constraint().unwrap_or(key).to_string(),
            };
        }
    }
    StoreError::Database(e)
}

fn ensure_updated(rows_affected: u64, id: OutboxMessageId) -> Result<()> {
    if rows_affected == 0 {
        return Err(StoreError::MissingReference {
            entity: "outbox message",
            id: id.to_string(),
        });
    }
    Ok(())
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
        let row = sqlx::query(
            r#"
            SELECT id AS customer_id, email AS customer_email, name AS customer_name,
                   phone AS customer_phone, created_at AS customer_created_at
            FROM customers
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_customer).transpose()
    }

    async fn find_addresses_by_hash(&self, hashes: &[AddressHash]) -> Result<Vec<Address>> {
        let hashes: Vec<String> = hashes.iter().map(|h| h.as_str().to_string()).collect();
        let rows = sqlx::query(
            r#"
            SELECT id, line_one, line_two, line_three, post_code, hash
            FROM addresses
            WHERE hash = ANY($1)
            "#,
        )
        .bind(hashes)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(|row| Self::row_to_address(row, "")).collect()
    }

    async fn find_variants_by_sku(&self, skus: &[String]) -> Result<Vec<Variant>> {
        let rows = sqlx::query(
            r#"
            SELECT v.id AS variant_id, v.sku, p.id AS product_id, p.name AS product_name
            FROM variants v
            JOIN products p ON p.id = v.product_id
            WHERE v.sku = ANY($1)
            "#,
        )
        .bind(skus)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_variant).collect()
    }

    async fn find_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>> {
        let Some(row) = sqlx::query(ORDER_SELECT)
            .bind(order_number.as_str())
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);

        let item_rows = sqlx::query(
            r#"
            SELECT i.quantity, v.id AS variant_id, v.sku, p.id AS product_id, p.name AS product_name
            FROM order_items i
            JOIN variants v ON v.id = i.variant_id
            JOIN products p ON p.id = v.product_id
            WHERE i.order_id = $1
            ORDER BY i.position ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        let items = item_rows
            .iter()
            .map(Self::row_to_item)
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Order::from_parts(
            order_id,
            OrderNumber::new(row.try_get::<String, _>("order_number")?),
            Self::row_to_customer(&row)?,
            Self::row_to_address(&row, "billing_")?,
            Self::row_to_address(&row, "shipping_")?,
            items,
            row.try_get("created_at")?,
            row.try_get("updated_at")?,
        )))
    }

    async fn find_outbox_message(&self, id: OutboxMessageId) -> Result<Option<OutboxMessage>> {
        let row = sqlx::query(&format!(
            "SELECT {OUTBOX_COLUMNS} FROM outbox_messages WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_outbox_message).transpose()
    }

    async fn commit(&self, work: UnitOfWork) -> Result<()> {
        if work.is_empty() {
            return Ok(());
        }

        let changes = work.len();
        let mut tx = self.pool.begin().await?;
        for change in work.into_changes() {
            // Dropping the transaction on error rolls it back
            Self::apply(&mut tx, change).await?;
        }
        tx.commit().await?;
        tracing::debug!(changes, "unit of work committed");

        Ok(())
    }
}
