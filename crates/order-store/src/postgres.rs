use async_trait::async_trait;
use domain::{CustomerId, Order, OrderFields, OrderItem, OrderStatus, ProductId};
use sqlx::{PgPool, Postgres, Row, Transaction, postgres::PgRow};
use uuid::Uuid;

use crate::{
    OrderId, OrderItemId, Result, StoreError,
    store::{DeletedFilter, NewOrder, NewOrderItem, OrderStore, OrderTransaction},
};

const ORDER_COLUMNS: &str = "order_id, customer_id, status, tracking_company, tracking_number, \
     tracking_link, deleted, created_at";

/// Name Postgres gives the `order_items.order_id` foreign key.
const ITEMS_ORDER_FK: &str = "order_items_order_id_fkey";

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

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        tracing::info!("order store migrations applied");
        Ok(())
    }

    fn row_to_order(row: &PgRow) -> Result<Order> {
        let status: String = row.try_get("status")?;
        let status: OrderStatus = status
            .parse()
            .map_err(|e: domain::OrderError| StoreError::InvalidRow(e.to_string()))?;

        Ok(Order {
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            customer_id: row
                .try_get::<Option<String>, _>("customer_id")?
                .map(CustomerId::from),
            status,
            tracking_company: row.try_get("tracking_company")?,
            tracking_number: row.try_get("tracking_number")?,
            tracking_link: row.try_get("tracking_link")?,
            deleted: row.try_get("deleted")?,
            created_at: row.try_get("created_at")?,
            items: Vec::new(),
        })
    }

    fn row_to_item(row: &PgRow) -> Result<OrderItem> {
        Ok(OrderItem {
            item_id: OrderItemId::from_uuid(row.try_get::<Uuid, _>("order_item_id")?),
            order_id: OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            product_id: ProductId::from(row.try_get::<String, _>("product_id")?),
            quantity: row.try_get("quantity")?,
        })
    }

    /// Item columns of an outer-joined row; None when the order has no items.
    fn joined_row_to_item(row: &PgRow, order_id: OrderId) -> Result<Option<OrderItem>> {
        let Some(item_id) = row.try_get::<Option<Uuid>, _>("order_item_id")? else {
            return Ok(None);
        };

        Ok(Some(OrderItem {
            item_id: OrderItemId::from_uuid(item_id),
            order_id,
            product_id: ProductId::from(row.try_get::<String, _>("product_id")?),
            quantity: row.try_get("quantity")?,
        }))
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    type Transaction = PgOrderTransaction;

    async fn begin(&self) -> Result<PgOrderTransaction> {
        let tx = self.pool.begin().await?;
        tracing::debug!("order store transaction opened");
        Ok(PgOrderTransaction { tx })
    }

    async fn select_order_with_items(
        &self,
        order_id: OrderId,
        filter: DeletedFilter,
    ) -> Result<Option<Order>> {
        // LEFT JOIN so that an order without items is still found.
        let rows = sqlx::query(
            r#"
            SELECT o.order_id, o.customer_id, o.status, o.tracking_company, o.tracking_number,
                   o.tracking_link, o.deleted, o.created_at,
                   i.order_item_id, i.product_id, i.quantity
            FROM orders o
            LEFT JOIN order_items i ON i.order_id = o.order_id
            WHERE o.order_id = $1 AND ($2 OR o.deleted = FALSE)
            ORDER BY i.line_no ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(filter == DeletedFilter::IncludeDeleted)
        .fetch_all(&self.pool)
        .await?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let mut order = Self::row_to_order(first)?;
        for row in &rows {
            if let Some(item) = Self::joined_row_to_item(row, order_id)? {
                order.items.push(item);
            }
        }

        Ok(Some(order))
    }

    async fn update_order_fields(&self, order_id: OrderId, fields: &OrderFields) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET customer_id = $2,
                status = $3,
                tracking_company = $4,
                tracking_number = $5,
                tracking_link = $6
            WHERE order_id = $1 AND deleted = FALSE
            "#,
        )
        .bind(order_id.as_uuid())
        .bind(fields.customer_id.as_ref().map(CustomerId::as_str))
        .bind(fields.status.as_str())
        .bind(fields.tracking_company.as_deref())
        .bind(fields.tracking_number.as_deref())
        .bind(fields.tracking_link.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_deleted(&self, order_id: OrderId) -> Result<bool> {
        let result = sqlx::query("UPDATE orders SET deleted = TRUE WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query(
            r#"
            SELECT order_item_id, order_id, product_id, quantity
            FROM order_items
            WHERE order_id = $1
            ORDER BY line_no ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_item).collect()
    }
}

/// Transaction over a [`PostgresOrderStore`].
///
/// Dropping it without calling `commit` rolls it back.
pub struct PgOrderTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl OrderTransaction for PgOrderTransaction {
    async fn insert_order(&mut self, order: NewOrder) -> Result<Order> {
        let sql = format!(
            "INSERT INTO orders (order_id, customer_id, status) VALUES ($1, $2, $3) \
             RETURNING {ORDER_COLUMNS}"
        );

        let row = sqlx::query(&sql)
            .bind(OrderId::new().as_uuid())
            .bind(order.customer_id.as_ref().map(CustomerId::as_str))
            .bind(order.status.as_str())
            .fetch_one(&mut *self.tx)
            .await?;

        PostgresOrderStore::row_to_order(&row)
    }

    async fn insert_items(
        &mut self,
        order_id: OrderId,
        items: Vec<NewOrderItem>,
    ) -> Result<Vec<OrderItem>> {
        let mut inserted = Vec::with_capacity(items.len());

        for (line_no, item) in items.into_iter().enumerate() {
            let line_no = i32::try_from(line_no)
                .map_err(|_| StoreError::InvalidRow(format!("too many items for {order_id}")))?;

            let row = sqlx::query(
                r#"
                INSERT INTO order_items (order_item_id, order_id, line_no, product_id, quantity)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING order_item_id, order_id, product_id, quantity
                "#,
            )
            .bind(OrderItemId::new().as_uuid())
            .bind(order_id.as_uuid())
            .bind(line_no)
            .bind(item.product_id.as_str())
            .bind(item.quantity)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some(ITEMS_ORDER_FK)
                {
                    tracing::debug!(%order_id, "item insert violated the order foreign key");
                    return StoreError::OrderNotFound(order_id);
                }
                StoreError::Database(e)
            })?;

            inserted.push(PostgresOrderStore::row_to_item(&row)?);
        }

        Ok(inserted)
    }

    async fn delete_order(&mut self, order_id: OrderId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(order_id.as_uuid())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some(ITEMS_ORDER_FK)
                {
                    return StoreError::InvalidRow(format!(
                        "order {order_id} is still referenced by items"
                    ));
                }
                StoreError::Database(e)
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
