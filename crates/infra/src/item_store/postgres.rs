//! Postgres-backed item store implementation.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | ItemStoreError | Scenario |
//! |------------|----------------------|----------------|----------|
//! | Database (duplicate table) | `42P07` | `SchemaConflict` | `create_schema` against a provisioned store |
//! | Database (unique violation) | `23505` | `SchemaConflict` | Two processes creating the table concurrently |
//! | Database (undefined table) | `42P01` | `Unavailable` | Request arrived before bootstrap provisioned the schema |
//! | Database (other) | Any other | `Unavailable` | Other database errors |
//! | PoolTimedOut | N/A | `Timeout` | No connection became available in time |
//! | Io / Tls / PoolClosed / other | N/A | `Unavailable` | Store unreachable or still starting |
//!
//! ## Conditional Decrement
//!
//! `conditional_decrement_stock` is a single statement:
//!
//! ```sql
//! UPDATE items SET stock = stock - 1 WHERE id = $1 AND stock >= $2 RETURNING ...
//! ```
//!
//! Postgres evaluates the `stock >= $2` predicate against the row it locks for
//! the update, so two concurrent buyers of the last unit serialize on the row
//! and the second one matches zero rows.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tokio_stream::StreamExt;
use tracing::instrument;

use storefront_core::ItemId;
use storefront_inventory::Item;

use super::r#trait::{ItemStore, ItemStoreError, ItemStream};

/// Postgres-backed item store.
///
/// Uses the SQLx connection pool, which is `Send + Sync` and shared across
/// request tasks.
#[derive(Debug, Clone)]
pub struct PostgresItemStore {
    pool: Arc<PgPool>,
}

impl PostgresItemStore {
    /// Create a new PostgresItemStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Build a lazily-connecting pool.
    ///
    /// No connection is opened here, so a database that is still starting up
    /// does not fail process start; bootstrap retries until it answers.
    pub fn connect_lazy(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, ItemStoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    #[instrument(skip(self), err)]
    async fn create_schema(&self) -> Result<(), ItemStoreError> {
        sqlx::query(
            r#"
            CREATE TABLE items (
                id BIGINT PRIMARY KEY,
                brand TEXT NOT NULL,
                model TEXT NOT NULL,
                price BIGINT NOT NULL CHECK (price >= 0),
                stock BIGINT NOT NULL CHECK (stock >= 0)
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ItemStoreError::SchemaConflict
            } else {
                map_sqlx_error("create_schema", e)
            }
        })?;

        Ok(())
    }

    #[instrument(skip(self, item), fields(item_id = %item.id), err)]
    async fn put_item(&self, item: &Item) -> Result<(), ItemStoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (id, brand, model, price, stock)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id)
            DO UPDATE SET
                brand = EXCLUDED.brand,
                model = EXCLUDED.model,
                price = EXCLUDED.price,
                stock = EXCLUDED.stock
            "#,
        )
        .bind(item.id.get())
        .bind(&item.brand)
        .bind(&item.model)
        .bind(item.price)
        .bind(item.stock)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("put_item", e))?;

        Ok(())
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, ItemStoreError> {
        let row = sqlx::query("SELECT id, brand, model, price, stock FROM items WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_item", e))?;

        row.as_ref().map(item_from_row).transpose()
    }

    fn scan_all(&self) -> ItemStream<'_> {
        let rows = sqlx::query("SELECT id, brand, model, price, stock FROM items")
            .fetch(&*self.pool);

        Box::pin(rows.map(|row| {
            row.map_err(|e| map_sqlx_error("scan_all", e))
                .and_then(|r| item_from_row(&r))
        }))
    }

    #[instrument(skip(self), fields(item_id = %id), err)]
    async fn conditional_decrement_stock(
        &self,
        id: ItemId,
        expected_minimum: i64,
    ) -> Result<Item, ItemStoreError> {
        let row = sqlx::query(
            r#"
            UPDATE items
            SET stock = stock - 1
            WHERE id = $1 AND stock >= $2
            RETURNING id, brand, model, price, stock
            "#,
        )
        .bind(id.get())
        .bind(expected_minimum.max(1))
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("conditional_decrement_stock", e))?;

        if let Some(row) = row {
            return item_from_row(&row);
        }

        // Zero rows matched: tell a missing item apart from a failed condition.
        let exists = sqlx::query("SELECT 1 FROM items WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("conditional_decrement_stock", e))?
            .is_some();

        if exists {
            Err(ItemStoreError::ConditionNotMet {
                id,
                expected_minimum,
            })
        } else {
            Err(ItemStoreError::NotFound(id))
        }
    }
}

fn item_from_row(row: &PgRow) -> Result<Item, ItemStoreError> {
    let decode =
        |e: sqlx::Error| ItemStoreError::Corrupt(format!("failed to decode item row: {e}"));

    let id: i64 = row.try_get("id").map_err(decode)?;
    let brand: String = row.try_get("brand").map_err(decode)?;
    let model: String = row.try_get("model").map_err(decode)?;
    let price: i64 = row.try_get("price").map_err(decode)?;
    let stock: i64 = row.try_get("stock").map_err(decode)?;

    let id = ItemId::new(id).map_err(|e| ItemStoreError::Corrupt(e.to_string()))?;
    Item::new(id, brand, model, price, stock).map_err(|e| ItemStoreError::Corrupt(e.to_string()))
}

/// Map SQLx errors to `ItemStoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> ItemStoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());

            match db_err.code().as_deref() {
                // duplicate_table
                Some("42P07") => ItemStoreError::SchemaConflict,
                // undefined_table
                Some("42P01") => {
                    ItemStoreError::Unavailable(format!("items table does not exist ({operation})"))
                }
                _ => ItemStoreError::Unavailable(msg),
            }
        }
        sqlx::Error::PoolTimedOut => {
            ItemStoreError::Timeout(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::PoolClosed => {
            ItemStoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        _ => ItemStoreError::Unavailable(format!("sqlx error in {operation}: {err}")),
    }
}

/// Check if an error is a unique constraint violation.
fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code.as_ref() == "23505";
        }
    }
    false
}
