//! # Order Repository
//!
//! Database operations for the order aggregate (header + line items).
//!
//! ## Aggregate Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Aggregate Lifecycle                         │
//! │                                                                         │
//! │  1. CREATE (one transaction)                                           │
//! │     ├── compute subtotal = quantity × price for every line             │
//! │     ├── INSERT header                                                  │
//! │     ├── INSERT every line (position = batch index)                     │
//! │     └── COMMIT  (any failure drops the tx → ROLLBACK, no orphan)       │
//! │                                                                         │
//! │  2. UPDATE (one transaction)                                           │
//! │     ├── header exists?           no → NotFound                         │
//! │     ├── UPDATE header with COALESCE(new, old)                          │
//! │     ├── products present?                                              │
//! │     │     yes → DELETE all lines, INSERT new batch (may be empty)      │
//! │     │     no  → lines untouched                                        │
//! │     └── COMMIT                                                         │
//! │                                                                         │
//! │  3. DELETE                                                             │
//! │     └── DELETE header; lines follow by ON DELETE CASCADE               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals
//! `orders.total` is whatever the caller supplied. When it differs from the
//! sum of the line subtotals the write still succeeds and a warning is logged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{decode_decimal, encode_decimal};
use crate::error::{DbError, DbResult};
use orderdesk_core::{LineItem, NewLineItem, NewOrder, Order, OrderChanges, OrderWithItems};

// =============================================================================
// Records
// =============================================================================

/// Row shape of the `orders` table.
#[derive(Debug, sqlx::FromRow)]
struct OrderRecord {
    id: String,
    client_id: Option<String>,
    order_number: String,
    status: String,
    status_description: String,
    total: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRecord> for Order {
    type Error = DbError;

    fn try_from(r: OrderRecord) -> DbResult<Self> {
        Ok(Order {
            total: decode_decimal("orders.total", &r.total)?,
            id: r.id,
            client_id: r.client_id,
            order_number: r.order_number,
            status: r.status,
            status_description: r.status_description,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Row shape of the `line_items` table.
#[derive(Debug, sqlx::FromRow)]
struct LineItemRecord {
    id: String,
    order_id: String,
    product_name: String,
    quantity: String,
    price: String,
    subtotal: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LineItemRecord> for LineItem {
    type Error = DbError;

    fn try_from(r: LineItemRecord) -> DbResult<Self> {
        Ok(LineItem {
            quantity: decode_decimal("line_items.quantity", &r.quantity)?,
            price: decode_decimal("line_items.price", &r.price)?,
            subtotal: decode_decimal("line_items.subtotal", &r.subtotal)?,
            id: r.id,
            order_id: r.order_id,
            product_name: r.product_name,
            created_at: r.created_at,
        })
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the order aggregate.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an order and all of its line items atomically.
    ///
    /// ## Errors
    /// * `DbError::InvalidReference { field: "client_id" }` - unknown client
    /// * any storage error; nothing is persisted in that case
    pub async fn create(&self, new: &NewOrder) -> DbResult<OrderWithItems> {
        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            client_id: Some(new.client_id.clone()),
            order_number: new.order_number.clone(),
            status: new.status.clone(),
            status_description: new.status_description.clone(),
            total: new.total,
            created_at: now,
            updated_at: now,
        };

        check_total(&order.order_number, new.total, new.items_total());

        debug!(id = %order.id, order_number = %order.order_number, items = new.products.len(), "Creating order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, client_id, order_number, status, status_description,
                total, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&order.id)
        .bind(&order.client_id)
        .bind(&order.order_number)
        .bind(&order.status)
        .bind(&order.status_description)
        .bind(encode_decimal(order.total))
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).attribute_reference("client_id", "client"))?;

        let products = insert_items(&mut tx, &order.id, &new.products, now).await?;

        tx.commit().await?;

        info!(id = %order.id, items = products.len(), "Order created");
        Ok(OrderWithItems { order, products })
    }

    /// Applies a partial update to an order, optionally replacing its lines.
    ///
    /// Header fields that are `None` keep their stored value. When
    /// `changes.products` is `Some`, every existing line is deleted and the
    /// given batch (possibly empty) is inserted in its place.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no order with `id`
    /// * `DbError::InvalidReference { field: "client_id" }` - unknown client
    pub async fn update(&self, id: &str, changes: &OrderChanges) -> DbResult<OrderWithItems> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let exists: Option<String> = sqlx::query_scalar("SELECT id FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        if exists.is_none() {
            return Err(DbError::not_found("Order", id));
        }

        debug!(
            id = %id,
            header = changes.touches_header(),
            replace_items = changes.products.is_some(),
            "Updating order"
        );

        sqlx::query(
            r#"
            UPDATE orders SET
                client_id          = COALESCE(?1, client_id),
                order_number       = COALESCE(?2, order_number),
                status             = COALESCE(?3, status),
                status_description = COALESCE(?4, status_description),
                total              = COALESCE(?5, total),
                updated_at         = ?6
            WHERE id = ?7
            "#,
        )
        .bind(&changes.client_id)
        .bind(&changes.order_number)
        .bind(&changes.status)
        .bind(&changes.status_description)
        .bind(changes.total.map(encode_decimal))
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from(e).attribute_reference("client_id", "client"))?;

        if let Some(products) = &changes.products {
            let removed = sqlx::query("DELETE FROM line_items WHERE order_id = ?1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            insert_items(&mut tx, id, products, now).await?;

            debug!(id = %id, removed, inserted = products.len(), "Line items replaced");
        }

        let updated = fetch_aggregate(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?;

        tx.commit().await?;

        if changes.total.is_some() || changes.products.is_some() {
            check_total(&updated.order.order_number, updated.order.total, updated.items_total());
        }

        info!(id = %id, "Order updated");
        Ok(updated)
    }

    /// Lists every order with its lines, most recently created first.
    ///
    /// Lines are returned in the order they were submitted.
    pub async fn list(&self) -> DbResult<Vec<OrderWithItems>> {
        let mut conn = self.pool.acquire().await?;

        let orders = sqlx::query_as::<_, OrderRecord>(
            r#"
            SELECT id, client_id, order_number, status, status_description,
                   total, created_at, updated_at
            FROM orders
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let items = sqlx::query_as::<_, LineItemRecord>(
            r#"
            SELECT id, order_id, product_name, quantity, price, subtotal, created_at
            FROM line_items
            ORDER BY order_id, position
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        let mut by_order: HashMap<String, Vec<LineItem>> = HashMap::new();
        for record in items {
            let item = LineItem::try_from(record)?;
            by_order.entry(item.order_id.clone()).or_default().push(item);
        }

        orders
            .into_iter()
            .map(|record| {
                let order = Order::try_from(record)?;
                let products = by_order.remove(&order.id).unwrap_or_default();
                Ok(OrderWithItems { order, products })
            })
            .collect()
    }

    /// Fetches one order with its lines.
    pub async fn get(&self, id: &str) -> DbResult<Option<OrderWithItems>> {
        let mut conn = self.pool.acquire().await?;
        fetch_aggregate(&mut conn, id).await
    }

    /// Deletes an order. Its lines are removed by cascade.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no order with `id`
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        info!(id = %id, "Order deleted");
        Ok(())
    }
}

// =============================================================================
// Helpers (run on a caller-owned connection or transaction)
// =============================================================================

/// Inserts a batch of lines for `order_id`, computing each subtotal.
async fn insert_items(
    conn: &mut SqliteConnection,
    order_id: &str,
    items: &[NewLineItem],
    now: DateTime<Utc>,
) -> DbResult<Vec<LineItem>> {
    let mut inserted = Vec::with_capacity(items.len());

    for (position, item) in items.iter().enumerate() {
        let line = LineItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_name: item.product_name.clone(),
            quantity: item.quantity,
            price: item.price,
            subtotal: item.subtotal(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO line_items (
                id, order_id, position, product_name, quantity, price, subtotal, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&line.id)
        .bind(&line.order_id)
        .bind(position as i64)
        .bind(&line.product_name)
        .bind(encode_decimal(line.quantity))
        .bind(encode_decimal(line.price))
        .bind(encode_decimal(line.subtotal))
        .bind(line.created_at)
        .execute(&mut *conn)
        .await?;

        inserted.push(line);
    }

    Ok(inserted)
}

/// Loads one order and its lines on `conn`.
async fn fetch_aggregate(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<OrderWithItems>> {
    let record = sqlx::query_as::<_, OrderRecord>(
        r#"
        SELECT id, client_id, order_number, status, status_description,
               total, created_at, updated_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(record) = record else {
        return Ok(None);
    };

    let products = sqlx::query_as::<_, LineItemRecord>(
        r#"
        SELECT id, order_id, product_name, quantity, price, subtotal, created_at
        FROM line_items
        WHERE order_id = ?1
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(LineItem::try_from)
    .collect::<DbResult<Vec<_>>>()?;

    Ok(Some(OrderWithItems {
        order: Order::try_from(record)?,
        products,
    }))
}

fn check_total(order_number: &str, total: Decimal, items_total: Decimal) {
    if total != items_total {
        warn!(
            order_number = %order_number,
            total = %total,
            items_total = %items_total,
            "Order total differs from the sum of line subtotals"
        );
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use crate::{Database, DbConfig, DbError};
    use orderdesk_core::{NewClient, NewLineItem, NewOrder, OrderChanges};

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn line(name: &str, quantity: &str, price: &str) -> NewLineItem {
        NewLineItem {
            product_name: name.to_string(),
            quantity: dec(quantity),
            price: dec(price),
        }
    }

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = db
            .clients()
            .create(&NewClient {
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                tax_id: "123".to_string(),
                postal_code: "01001-000".to_string(),
                street: "Rua A".to_string(),
                house_number: "10".to_string(),
                district: "Centro".to_string(),
                city: "Sao Paulo".to_string(),
                state: "SP".to_string(),
                password: None,
            })
            .await
            .unwrap();
        (db, client.id)
    }

    fn new_order(client_id: &str, number: &str, products: Vec<NewLineItem>) -> NewOrder {
        NewOrder {
            client_id: client_id.to_string(),
            order_number: number.to_string(),
            status: "open".to_string(),
            status_description: "new".to_string(),
            total: dec("150"),
            products,
        }
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_stores_every_item_with_exact_subtotal() {
        let (db, client_id) = setup().await;
        let products = vec![
            line("Widget", "3", "50"),
            line("Bolt", "0.5", "19.99"),
            line("Nut", "7", "0.10"),
        ];

        let created = db
            .orders()
            .create(&new_order(&client_id, "A1", products))
            .await
            .unwrap();
        assert_eq!(created.products.len(), 3);

        let stored = db.orders().get(&created.order.id).await.unwrap().unwrap();
        assert_eq!(stored.products.len(), 3);
        assert_eq!(stored.products[0].subtotal, dec("150"));
        assert_eq!(stored.products[1].subtotal, dec("9.995"));
        assert_eq!(stored.products[2].subtotal, dec("0.7"));
        assert_eq!(stored.products[1].product_name, "Bolt");
        assert_eq!(stored.order.total, dec("150"));
        assert_eq!(stored.order.client_id.as_deref(), Some(client_id.as_str()));
    }

    #[tokio::test]
    async fn test_create_rolls_back_when_an_item_fails() {
        let (db, client_id) = setup().await;
        // The schema rejects empty product names, failing the second insert.
        let products = vec![line("Widget", "1", "1"), line("", "1", "1")];

        let result = db.orders().create(&new_order(&client_id, "A1", products)).await;

        assert!(result.is_err());
        assert_eq!(count(&db, "orders").await, 0);
        assert_eq!(count(&db, "line_items").await, 0);
    }

    #[tokio::test]
    async fn test_create_with_unknown_client_is_invalid_reference() {
        let (db, _) = setup().await;

        let err = db
            .orders()
            .create(&new_order(
                "00000000-0000-4000-8000-000000000000",
                "A1",
                vec![line("Widget", "1", "1")],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::InvalidReference { ref field, .. } if field == "client_id"));
        assert_eq!(count(&db, "orders").await, 0);
    }

    #[tokio::test]
    async fn test_total_mismatch_is_accepted() {
        let (db, client_id) = setup().await;
        let mut order = new_order(&client_id, "A1", vec![line("Widget", "1", "10")]);
        order.total = dec("999");

        let created = db.orders().create(&order).await.unwrap();
        assert_eq!(created.order.total, dec("999"));
        assert_eq!(created.items_total(), dec("10"));
    }

    #[tokio::test]
    async fn test_update_with_empty_items_clears_them_and_keeps_header() {
        let (db, client_id) = setup().await;
        let created = db
            .orders()
            .create(&new_order(&client_id, "A1", vec![line("Widget", "3", "50"), line("Bolt", "1", "2")]))
            .await
            .unwrap();

        let changes = OrderChanges {
            status: Some("closed".to_string()),
            products: Some(vec![]),
            ..Default::default()
        };
        let updated = db.orders().update(&created.order.id, &changes).await.unwrap();

        assert!(updated.products.is_empty());
        assert_eq!(updated.order.status, "closed");
        assert_eq!(updated.order.order_number, "A1");
        assert_eq!(updated.order.status_description, "new");
        assert_eq!(updated.order.total, dec("150"));
        assert_eq!(count(&db, "line_items").await, 0);
    }

    #[tokio::test]
    async fn test_header_only_update_leaves_items_untouched() {
        let (db, client_id) = setup().await;
        let created = db
            .orders()
            .create(&new_order(&client_id, "A1", vec![line("Widget", "3", "50")]))
            .await
            .unwrap();

        let changes = OrderChanges {
            total: Some(dec("200")),
            ..Default::default()
        };
        let updated = db.orders().update(&created.order.id, &changes).await.unwrap();

        assert_eq!(updated.order.total, dec("200"));
        assert_eq!(updated.products, created.products);
    }

    #[tokio::test]
    async fn test_update_replaces_items_wholesale() {
        let (db, client_id) = setup().await;
        let created = db
            .orders()
            .create(&new_order(&client_id, "A1", vec![line("Widget", "3", "50")]))
            .await
            .unwrap();

        let changes = OrderChanges {
            products: Some(vec![line("Gear", "2", "4.5"), line("Cog", "1", "1")]),
            ..Default::default()
        };
        let updated = db.orders().update(&created.order.id, &changes).await.unwrap();

        let names: Vec<_> = updated.products.iter().map(|p| p.product_name.as_str()).collect();
        assert_eq!(names, ["Gear", "Cog"]);
        assert_eq!(updated.products[0].subtotal, dec("9"));
        assert_eq!(count(&db, "line_items").await, 2);
    }

    #[tokio::test]
    async fn test_failed_replacement_keeps_previous_items() {
        let (db, client_id) = setup().await;
        let created = db
            .orders()
            .create(&new_order(&client_id, "A1", vec![line("Widget", "3", "50")]))
            .await
            .unwrap();

        let changes = OrderChanges {
            status: Some("closed".to_string()),
            products: Some(vec![line("Gear", "1", "1"), line("", "1", "1")]),
            ..Default::default()
        };
        assert!(db.orders().update(&created.order.id, &changes).await.is_err());

        let stored = db.orders().get(&created.order.id).await.unwrap().unwrap();
        assert_eq!(stored.order.status, "open");
        assert_eq!(stored.products, created.products);
    }

    #[tokio::test]
    async fn test_update_missing_order() {
        let (db, _) = setup().await;

        let err = db
            .orders()
            .update("missing", &OrderChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_is_newest_first_with_items_in_order() {
        let (db, client_id) = setup().await;
        let repo = db.orders();

        repo.create(&new_order(&client_id, "A1", vec![line("One", "1", "1")])).await.unwrap();
        repo.create(&new_order(&client_id, "A2", vec![line("Two", "1", "1"), line("Three", "1", "1")]))
            .await
            .unwrap();

        let orders = repo.list().await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].order.order_number, "A2");
        assert_eq!(orders[0].products[0].product_name, "Two");
        assert_eq!(orders[0].products[1].product_name, "Three");
        assert_eq!(orders[1].order.order_number, "A1");
        assert_eq!(orders[1].products.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_items() {
        let (db, client_id) = setup().await;
        let created = db
            .orders()
            .create(&new_order(&client_id, "A1", vec![line("Widget", "3", "50")]))
            .await
            .unwrap();

        db.orders().delete(&created.order.id).await.unwrap();

        assert!(db.orders().get(&created.order.id).await.unwrap().is_none());
        assert_eq!(count(&db, "line_items").await, 0);
        assert!(matches!(
            db.orders().delete(&created.order.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_client_deletion_orphans_order() {
        let (db, client_id) = setup().await;
        let created = db
            .orders()
            .create(&new_order(&client_id, "A1", vec![line("Widget", "3", "50")]))
            .await
            .unwrap();

        sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(&client_id)
            .execute(db.pool())
            .await
            .unwrap();

        let stored = db.orders().get(&created.order.id).await.unwrap().unwrap();
        assert!(stored.order.client_id.is_none());
        assert_eq!(stored.products.len(), 1);
    }
}
