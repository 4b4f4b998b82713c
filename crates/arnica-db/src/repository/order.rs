//! # Order Repository
//!
//! Database operations for orders, order items, shipping rows, and the
//! checkout transaction.
//!
//! ## Checkout Transaction
//! [`OrderRepository::place_order`] performs every stock and booking
//! effect of a checkout in one SQLite transaction:
//!
//! 1. Insert the order row (items and draws reference it).
//! 2. Draw stock first-expiry-first-out per item, recording each draw.
//!    A shortfall aborts with [`DbError::StockConflict`].
//! 3. Insert item snapshots and the shipping row.
//! 4. For slotted deliveries, increment the slot's booked count, guarded
//!    by capacity. A full slot aborts with [`DbError::SlotCapacity`].
//!
//! Any early return drops the transaction and rolls everything back.
//!
//! ## Cancellation
//! Cancelling returns drawn units to the exact batches they came from
//! and deletes the draw records, so a second cancellation has nothing
//! left to restore.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::inventory;
use arnica_core::{Order, OrderItem, OrderStatus, Shipping};

/// All order columns, in struct field order.
const ORDER_COLUMNS: &str = "id, user_id, status, subtotal_cents, delivery_fee_cents, \
     total_cents, prescription_id, payment_intent_id, created_at, updated_at";

/// All shipping columns, in struct field order.
const SHIPPING_COLUMNS: &str = "id, order_id, mode, branch_id, address_line, city, \
     postal_code, urgent, slot_id, driver_id, delivered_at, created_at";

/// A fully validated order ready to be written: the order row, its item
/// snapshots, and the shipping selection. Built by the checkout service
/// after the business checks have passed.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub shipping: Shipping,
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Writes a checkout atomically: order + items + shipping, stock
    /// draws at the shipping branch, and the slot booking if any.
    ///
    /// `on` is the availability date; batches expiring before it do not
    /// count and are never drawn from.
    ///
    /// ## Returns
    /// * `Err(DbError::StockConflict)` - A product fell short between
    ///   the advisory check and this write. Nothing is persisted.
    /// * `Err(DbError::SlotCapacity)` - The slot filled up concurrently.
    ///   Nothing is persisted.
    pub async fn place_order(&self, new_order: &NewOrder, on: NaiveDate) -> DbResult<()> {
        let order = &new_order.order;
        let shipping = &new_order.shipping;

        debug!(
            order_id = %order.id,
            user = %order.user_id,
            items = new_order.items.len(),
            total_cents = order.total_cents,
            "Placing order"
        );

        let mut tx = self.pool.begin().await?;

        // Order row first: draws and items reference it.
        sqlx::query(
            "INSERT INTO orders ( \
                id, user_id, status, subtotal_cents, delivery_fee_cents, \
                total_cents, prescription_id, payment_intent_id, created_at, updated_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.delivery_fee_cents)
        .bind(order.total_cents)
        .bind(&order.prescription_id)
        .bind(&order.payment_intent_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &new_order.items {
            inventory::draw_fefo(
                &mut tx,
                &order.id,
                &shipping.branch_id,
                &item.product_id,
                item.quantity,
                on,
            )
            .await?;

            sqlx::query(
                "INSERT INTO order_items ( \
                    id, order_id, product_id, name_snapshot, unit_price_cents, \
                    quantity, line_total_cents, requires_prescription \
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(item.requires_prescription)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "INSERT INTO shipping ( \
                id, order_id, mode, branch_id, address_line, city, \
                postal_code, urgent, slot_id, driver_id, delivered_at, created_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&shipping.id)
        .bind(&shipping.order_id)
        .bind(shipping.mode)
        .bind(&shipping.branch_id)
        .bind(&shipping.address_line)
        .bind(&shipping.city)
        .bind(&shipping.postal_code)
        .bind(shipping.urgent)
        .bind(&shipping.slot_id)
        .bind(&shipping.driver_id)
        .bind(shipping.delivered_at)
        .bind(shipping.created_at)
        .execute(&mut *tx)
        .await?;

        if let Some(slot_id) = &shipping.slot_id {
            let result = sqlx::query(
                "UPDATE delivery_slots SET booked = booked + 1 \
                 WHERE id = ?1 AND booked < capacity",
            )
            .bind(slot_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::SlotCapacity {
                    slot_id: slot_id.clone(),
                });
            }
        }

        tx.commit().await?;

        debug!(order_id = %order.id, "Order placed");
        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");

        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Gets the item snapshots of an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            "SELECT id, order_id, product_id, name_snapshot, unit_price_cents, \
                    quantity, line_total_cents, requires_prescription \
             FROM order_items WHERE order_id = ?1",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets the shipping row of an order.
    pub async fn get_shipping(&self, order_id: &str) -> DbResult<Option<Shipping>> {
        let sql = format!("SELECT {SHIPPING_COLUMNS} FROM shipping WHERE order_id = ?1");

        let shipping = sqlx::query_as::<_, Shipping>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shipping)
    }

    /// Gets a shipping row by its own ID.
    pub async fn get_shipping_by_id(&self, shipping_id: &str) -> DbResult<Option<Shipping>> {
        let sql = format!("SELECT {SHIPPING_COLUMNS} FROM shipping WHERE id = ?1");

        let shipping = sqlx::query_as::<_, Shipping>(&sql)
            .bind(shipping_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(shipping)
    }

    /// Lists a user's orders, newest first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1 ORDER BY created_at DESC"
        );

        let orders = sqlx::query_as::<_, Order>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    /// Lists orders shipped from a branch, optionally filtered by status.
    /// Newest first.
    pub async fn list_for_branch(
        &self,
        branch_id: &str,
        status: Option<OrderStatus>,
    ) -> DbResult<Vec<Order>> {
        let orders = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {ORDER_COLUMNS} FROM orders \
                     WHERE id IN (SELECT order_id FROM shipping WHERE branch_id = ?1) \
                       AND status = ?2 \
                     ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, Order>(&sql)
                    .bind(branch_id)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {ORDER_COLUMNS} FROM orders \
                     WHERE id IN (SELECT order_id FROM shipping WHERE branch_id = ?1) \
                     ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, Order>(&sql)
                    .bind(branch_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(orders)
    }

    /// Moves an order from `expected` to `next`, guarded so a concurrent
    /// transition cannot be overwritten.
    ///
    /// The caller validates the transition against the status graph
    /// before calling; here the guard only protects against races.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No order with this id in the
    ///   expected status.
    pub async fn set_status(
        &self,
        id: &str,
        expected: OrderStatus,
        next: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(order_id = %id, from = expected.as_str(), to = next.as_str(), "Order status change");

        let result = sqlx::query(
            "UPDATE orders SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        )
        .bind(id)
        .bind(expected)
        .bind(next)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Cancels an order and returns its drawn stock to the source
    /// batches, in one transaction.
    ///
    /// Returns the number of units restored. Zero is normal for orders
    /// whose draws were already restored.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No order with this id in the
    ///   expected status; nothing is written.
    pub async fn cancel_order(
        &self,
        id: &str,
        expected: OrderStatus,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        debug!(order_id = %id, from = expected.as_str(), "Cancelling order");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE orders SET status = 'cancelled', updated_at = ?3 \
             WHERE id = ?1 AND status = ?2",
        )
        .bind(id)
        .bind(expected)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        let restored = inventory::restore_draws(&mut tx, id).await?;

        tx.commit().await?;

        debug!(order_id = %id, restored, "Order cancelled");
        Ok(restored)
    }

    /// Releases orders held on a newly approved prescription into
    /// `placed`. Returns how many moved.
    pub async fn release_held(&self, prescription_id: &str, now: DateTime<Utc>) -> DbResult<i64> {
        let result = sqlx::query(
            "UPDATE orders SET status = 'placed', updated_at = ?2 \
             WHERE prescription_id = ?1 AND status = 'awaiting_prescription'",
        )
        .bind(prescription_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let released = result.rows_affected() as i64;
        if released > 0 {
            debug!(prescription_id = %prescription_id, released, "Released held orders");
        }
        Ok(released)
    }

    /// Cancels orders held on a rejected or expired prescription and
    /// returns their stock, in one transaction. Returns the cancelled
    /// order ids.
    pub async fn cancel_held(
        &self,
        prescription_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Vec<String>> {
        let mut tx = self.pool.begin().await?;

        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM orders \
             WHERE prescription_id = ?1 AND status = 'awaiting_prescription'",
        )
        .bind(prescription_id)
        .fetch_all(&mut *tx)
        .await?;

        for id in &ids {
            sqlx::query("UPDATE orders SET status = 'cancelled', updated_at = ?2 WHERE id = ?1")
                .bind(id)
                .bind(now)
                .execute(&mut *tx)
                .await?;

            inventory::restore_draws(&mut tx, id).await?;
        }

        tx.commit().await?;

        if !ids.is_empty() {
            debug!(
                prescription_id = %prescription_id,
                cancelled = ids.len(),
                "Cancelled held orders"
            );
        }
        Ok(ids)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::test_support::{batch, branch, pending_prescription, product, slot};
    use arnica_core::ShippingMode;
    use uuid::Uuid;

    fn order(id: &str, user_id: &str, status: OrderStatus, subtotal_cents: i64) -> Order {
        let now = Utc::now();
        Order {
            id: id.to_string(),
            user_id: user_id.to_string(),
            status,
            subtotal_cents,
            delivery_fee_cents: 0,
            total_cents: subtotal_cents,
            prescription_id: None,
            payment_intent_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn item(order_id: &str, product_id: &str, quantity: i64) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_id: product_id.to_string(),
            name_snapshot: format!("{product_id} name"),
            unit_price_cents: 500,
            quantity,
            line_total_cents: 500 * quantity,
            requires_prescription: false,
        }
    }

    fn pickup(order_id: &str, branch_id: &str) -> Shipping {
        Shipping {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            mode: ShippingMode::Pickup,
            branch_id: branch_id.to_string(),
            address_line: None,
            city: None,
            postal_code: None,
            urgent: false,
            slot_id: None,
            driver_id: None,
            delivered_at: None,
            created_at: Utc::now(),
        }
    }

    fn slotted_delivery(order_id: &str, branch_id: &str, slot_id: &str) -> Shipping {
        Shipping {
            mode: ShippingMode::Delivery,
            address_line: Some("12 Elm Street".to_string()),
            city: Some("Lahore".to_string()),
            postal_code: Some("54000".to_string()),
            slot_id: Some(slot_id.to_string()),
            ..pickup(order_id, branch_id)
        }
    }

    async fn seed_stock(db: &Database) {
        db.branches().insert(&branch("b-1", "Main Branch")).await.unwrap();
        db.products()
            .insert(&product("p-1", "SKU-1", "Paracetamol 500mg", 500, false))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_place_order_draws_fefo() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_stock(&db).await;

        // One expired batch and two live ones with different expiries
        db.inventory().insert_batch(&batch("bat-old", "b-1", "p-1", 5, -1)).await.unwrap();
        db.inventory().insert_batch(&batch("bat-soon", "b-1", "p-1", 5, 10)).await.unwrap();
        db.inventory().insert_batch(&batch("bat-late", "b-1", "p-1", 5, 60)).await.unwrap();

        let new_order = NewOrder {
            order: order("o-1", "u-1", OrderStatus::Placed, 3500),
            items: vec![item("o-1", "p-1", 7)],
            shipping: pickup("o-1", "b-1"),
        };
        let today = Utc::now().date_naive();
        db.orders().place_order(&new_order, today).await.unwrap();

        // Soonest live batch drained first, expired batch untouched
        let soon = db.inventory().get_batch("bat-soon").await.unwrap().unwrap();
        assert_eq!(soon.quantity, 0);
        let late = db.inventory().get_batch("bat-late").await.unwrap().unwrap();
        assert_eq!(late.quantity, 3);
        let old = db.inventory().get_batch("bat-old").await.unwrap().unwrap();
        assert_eq!(old.quantity, 5);

        let placed = db.orders().get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(placed.status, OrderStatus::Placed);
        assert_eq!(placed.total_cents, 3500);

        let items = db.orders().get_items("o-1").await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 7);

        let shipping = db.orders().get_shipping("o-1").await.unwrap().unwrap();
        assert_eq!(shipping.mode, ShippingMode::Pickup);
    }

    #[tokio::test]
    async fn test_stock_conflict_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_stock(&db).await;
        db.inventory().insert_batch(&batch("bat-1", "b-1", "p-1", 3, 30)).await.unwrap();

        let new_order = NewOrder {
            order: order("o-1", "u-1", OrderStatus::Placed, 2500),
            items: vec![item("o-1", "p-1", 5)],
            shipping: pickup("o-1", "b-1"),
        };
        let today = Utc::now().date_naive();
        let err = db.orders().place_order(&new_order, today).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::StockConflict { available: 3, requested: 5, .. }
        ));

        // Nothing persisted, nothing drawn
        assert!(db.orders().get_by_id("o-1").await.unwrap().is_none());
        let available = db.inventory().availability("b-1", "p-1", today).await.unwrap();
        assert_eq!(available, 3);
    }

    #[tokio::test]
    async fn test_slot_booking_stops_at_capacity() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_stock(&db).await;
        db.inventory().insert_batch(&batch("bat-1", "b-1", "p-1", 10, 30)).await.unwrap();
        db.delivery()
            .insert_slot(&slot("slot-1", "b-1", 1, "09:00-12:00", 1))
            .await
            .unwrap();

        let today = Utc::now().date_naive();

        let first = NewOrder {
            order: order("o-1", "u-1", OrderStatus::Placed, 1000),
            items: vec![item("o-1", "p-1", 2)],
            shipping: slotted_delivery("o-1", "b-1", "slot-1"),
        };
        db.orders().place_order(&first, today).await.unwrap();

        let booked = db.delivery().get_slot("slot-1").await.unwrap().unwrap();
        assert_eq!(booked.booked, 1);

        let second = NewOrder {
            order: order("o-2", "u-2", OrderStatus::Placed, 1000),
            items: vec![item("o-2", "p-1", 2)],
            shipping: slotted_delivery("o-2", "b-1", "slot-1"),
        };
        let err = db.orders().place_order(&second, today).await.unwrap_err();
        assert!(matches!(err, DbError::SlotCapacity { .. }));

        // The losing checkout left no order and no draws behind
        assert!(db.orders().get_by_id("o-2").await.unwrap().is_none());
        let available = db.inventory().availability("b-1", "p-1", today).await.unwrap();
        assert_eq!(available, 8);
    }

    #[tokio::test]
    async fn test_cancel_restores_stock_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_stock(&db).await;
        db.inventory().insert_batch(&batch("bat-1", "b-1", "p-1", 4, 10)).await.unwrap();
        db.inventory().insert_batch(&batch("bat-2", "b-1", "p-1", 6, 40)).await.unwrap();

        let new_order = NewOrder {
            order: order("o-1", "u-1", OrderStatus::Placed, 3000),
            items: vec![item("o-1", "p-1", 6)],
            shipping: pickup("o-1", "b-1"),
        };
        let today = Utc::now().date_naive();
        db.orders().place_order(&new_order, today).await.unwrap();

        let restored = db
            .orders()
            .cancel_order("o-1", OrderStatus::Placed, Utc::now())
            .await
            .unwrap();
        assert_eq!(restored, 6);

        // Units back in the batches they came from
        let first = db.inventory().get_batch("bat-1").await.unwrap().unwrap();
        assert_eq!(first.quantity, 4);
        let second = db.inventory().get_batch("bat-2").await.unwrap().unwrap();
        assert_eq!(second.quantity, 6);

        let cancelled = db.orders().get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);

        // Already cancelled, the guard refuses a second pass
        let err = db
            .orders()
            .cancel_order("o-1", OrderStatus::Placed, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_held_orders_release_and_cancel() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_stock(&db).await;
        db.inventory().insert_batch(&batch("bat-1", "b-1", "p-1", 20, 30)).await.unwrap();
        db.prescriptions().insert(&pending_prescription("rx-1", "u-1")).await.unwrap();
        db.prescriptions().insert(&pending_prescription("rx-2", "u-2")).await.unwrap();

        let today = Utc::now().date_naive();

        let mut held_a = order("o-a", "u-1", OrderStatus::AwaitingPrescription, 1000);
        held_a.prescription_id = Some("rx-1".to_string());
        db.orders()
            .place_order(
                &NewOrder {
                    order: held_a,
                    items: vec![item("o-a", "p-1", 2)],
                    shipping: pickup("o-a", "b-1"),
                },
                today,
            )
            .await
            .unwrap();

        let mut held_b = order("o-b", "u-2", OrderStatus::AwaitingPrescription, 1500);
        held_b.prescription_id = Some("rx-2".to_string());
        db.orders()
            .place_order(
                &NewOrder {
                    order: held_b,
                    items: vec![item("o-b", "p-1", 3)],
                    shipping: pickup("o-b", "b-1"),
                },
                today,
            )
            .await
            .unwrap();

        // Approval releases rx-1's order into placed
        let released = db.orders().release_held("rx-1", Utc::now()).await.unwrap();
        assert_eq!(released, 1);
        let released_order = db.orders().get_by_id("o-a").await.unwrap().unwrap();
        assert_eq!(released_order.status, OrderStatus::Placed);

        // Rejection cancels rx-2's order and puts its units back
        let cancelled = db.orders().cancel_held("rx-2", Utc::now()).await.unwrap();
        assert_eq!(cancelled, vec!["o-b".to_string()]);
        let available = db.inventory().availability("b-1", "p-1", today).await.unwrap();
        assert_eq!(available, 18);
    }

    #[tokio::test]
    async fn test_branch_listing_filters_by_status() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_stock(&db).await;
        db.inventory().insert_batch(&batch("bat-1", "b-1", "p-1", 20, 30)).await.unwrap();

        let today = Utc::now().date_naive();
        for (id, status) in [
            ("o-1", OrderStatus::Placed),
            ("o-2", OrderStatus::Placed),
            ("o-3", OrderStatus::Processing),
        ] {
            db.orders()
                .place_order(
                    &NewOrder {
                        order: order(id, "u-1", status, 500),
                        items: vec![item(id, "p-1", 1)],
                        shipping: pickup(id, "b-1"),
                    },
                    today,
                )
                .await
                .unwrap();
        }

        let all = db.orders().list_for_branch("b-1", None).await.unwrap();
        assert_eq!(all.len(), 3);

        let placed = db
            .orders()
            .list_for_branch("b-1", Some(OrderStatus::Placed))
            .await
            .unwrap();
        assert_eq!(placed.len(), 2);

        let user_orders = db.orders().list_for_user("u-1").await.unwrap();
        assert_eq!(user_orders.len(), 3);
    }
}
