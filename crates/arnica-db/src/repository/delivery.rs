//! # Delivery Repository
//!
//! Database operations for delivery slots, driver assignment, and
//! delivery completion.
//!
//! Slot booking itself happens inside the checkout transaction (see the
//! order repository); this repository covers slot administration and the
//! driver-facing flow: assign a driver to a shipping row, list a
//! driver's open deliveries, mark one delivered.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use arnica_core::{DeliverySlot, Shipping};

/// All delivery slot columns, in struct field order.
const SLOT_COLUMNS: &str = "id, branch_id, slot_date, window_label, capacity, booked, created_at";

/// Repository for delivery database operations.
#[derive(Debug, Clone)]
pub struct DeliveryRepository {
    pool: SqlitePool,
}

impl DeliveryRepository {
    /// Creates a new DeliveryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DeliveryRepository { pool }
    }

    /// Inserts a delivery slot.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - The branch already offers
    ///   this window on this date.
    pub async fn insert_slot(&self, slot: &DeliverySlot) -> DbResult<()> {
        debug!(
            id = %slot.id,
            branch = %slot.branch_id,
            date = %slot.slot_date,
            window = %slot.window,
            "Inserting delivery slot"
        );

        sqlx::query(
            "INSERT INTO delivery_slots ( \
                id, branch_id, slot_date, window_label, capacity, booked, created_at \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&slot.id)
        .bind(&slot.branch_id)
        .bind(slot.slot_date)
        .bind(&slot.window)
        .bind(slot.capacity)
        .bind(slot.booked)
        .bind(slot.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a slot by ID.
    pub async fn get_slot(&self, id: &str) -> DbResult<Option<DeliverySlot>> {
        let sql = format!("SELECT {SLOT_COLUMNS} FROM delivery_slots WHERE id = ?1");

        let slot = sqlx::query_as::<_, DeliverySlot>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(slot)
    }

    /// Lists a branch's slots on a date that still have free capacity.
    pub async fn open_slots(&self, branch_id: &str, on: NaiveDate) -> DbResult<Vec<DeliverySlot>> {
        let sql = format!(
            "SELECT {SLOT_COLUMNS} FROM delivery_slots \
             WHERE branch_id = ?1 AND slot_date = ?2 AND booked < capacity \
             ORDER BY window_label"
        );

        let slots = sqlx::query_as::<_, DeliverySlot>(&sql)
            .bind(branch_id)
            .bind(on)
            .fetch_all(&self.pool)
            .await?;

        Ok(slots)
    }

    /// Assigns a driver to an undelivered delivery shipping row.
    ///
    /// Reassignment before delivery is allowed; dispatch sometimes
    /// swaps drivers.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No open delivery with this shipping
    ///   id (pickup rows and delivered rows never match).
    pub async fn assign_driver(&self, shipping_id: &str, driver_id: &str) -> DbResult<()> {
        debug!(shipping_id = %shipping_id, driver = %driver_id, "Assigning driver");

        let result = sqlx::query(
            "UPDATE shipping SET driver_id = ?2 \
             WHERE id = ?1 AND mode = 'delivery' AND delivered_at IS NULL",
        )
        .bind(shipping_id)
        .bind(driver_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open delivery", shipping_id));
        }

        Ok(())
    }

    /// Lists a driver's assigned, not-yet-delivered shipping rows,
    /// oldest first.
    pub async fn open_assignments(&self, driver_id: &str) -> DbResult<Vec<Shipping>> {
        let shipments = sqlx::query_as::<_, Shipping>(
            "SELECT id, order_id, mode, branch_id, address_line, city, \
                    postal_code, urgent, slot_id, driver_id, delivered_at, created_at \
             FROM shipping \
             WHERE driver_id = ?1 AND delivered_at IS NULL \
             ORDER BY created_at",
        )
        .bind(driver_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(shipments)
    }

    /// Marks a delivery as delivered and completes its order, in one
    /// transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No open delivery with this shipping
    ///   id, or the order was not out for delivery. Nothing is written.
    pub async fn mark_delivered(&self, shipping_id: &str, now: DateTime<Utc>) -> DbResult<()> {
        debug!(shipping_id = %shipping_id, "Marking delivered");

        let mut tx = self.pool.begin().await?;

        let order_id: Option<String> = sqlx::query_scalar(
            "SELECT order_id FROM shipping \
             WHERE id = ?1 AND mode = 'delivery' AND delivered_at IS NULL",
        )
        .bind(shipping_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(order_id) = order_id else {
            return Err(DbError::not_found("Open delivery", shipping_id));
        };

        sqlx::query("UPDATE shipping SET delivered_at = ?2 WHERE id = ?1")
            .bind(shipping_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query(
            "UPDATE orders SET status = 'completed', updated_at = ?2 \
             WHERE id = ?1 AND status = 'out_for_delivery'",
        )
        .bind(&order_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order out for delivery", &order_id));
        }

        tx.commit().await?;

        debug!(shipping_id = %shipping_id, order_id = %order_id, "Delivered");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::order::NewOrder;
    use crate::repository::test_support::{batch, branch, employee, product, slot};
    use arnica_core::{EmployeeRole, Order, OrderItem, OrderStatus, ShippingMode};
    use uuid::Uuid;

    async fn seed_delivery_order(db: &Database, order_id: &str, shipping_id: &str) {
        let now = Utc::now();
        let new_order = NewOrder {
            order: Order {
                id: order_id.to_string(),
                user_id: "u-1".to_string(),
                status: OrderStatus::OutForDelivery,
                subtotal_cents: 1000,
                delivery_fee_cents: 300,
                total_cents: 1300,
                prescription_id: None,
                payment_intent_id: None,
                created_at: now,
                updated_at: now,
            },
            items: vec![OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.to_string(),
                product_id: "p-1".to_string(),
                name_snapshot: "Paracetamol 500mg".to_string(),
                unit_price_cents: 500,
                quantity: 2,
                line_total_cents: 1000,
                requires_prescription: false,
            }],
            shipping: Shipping {
                id: shipping_id.to_string(),
                order_id: order_id.to_string(),
                mode: ShippingMode::Delivery,
                branch_id: "b-1".to_string(),
                address_line: Some("12 Elm Street".to_string()),
                city: Some("Lahore".to_string()),
                postal_code: Some("54000".to_string()),
                urgent: true,
                slot_id: None,
                driver_id: None,
                delivered_at: None,
                created_at: now,
            },
        };
        db.orders()
            .place_order(&new_order, now.date_naive())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_open_slots_excludes_full() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.branches().insert(&branch("b-1", "Main Branch")).await.unwrap();

        db.delivery().insert_slot(&slot("s-1", "b-1", 1, "09:00-12:00", 2)).await.unwrap();
        let mut full = slot("s-2", "b-1", 1, "12:00-15:00", 2);
        full.booked = 2;
        db.delivery().insert_slot(&full).await.unwrap();

        let tomorrow = Utc::now().date_naive() + chrono::Duration::days(1);
        let open = db.delivery().open_slots("b-1", tomorrow).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, "s-1");
        assert_eq!(open[0].window, "09:00-12:00");
    }

    #[tokio::test]
    async fn test_duplicate_window_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.branches().insert(&branch("b-1", "Main Branch")).await.unwrap();

        db.delivery().insert_slot(&slot("s-1", "b-1", 1, "09:00-12:00", 2)).await.unwrap();
        let err = db
            .delivery()
            .insert_slot(&slot("s-dup", "b-1", 1, "09:00-12:00", 4))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_assignment_flow() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.branches().insert(&branch("b-1", "Main Branch")).await.unwrap();
        db.products()
            .insert(&product("p-1", "SKU-1", "Paracetamol 500mg", 500, false))
            .await
            .unwrap();
        db.inventory().insert_batch(&batch("bat-1", "b-1", "p-1", 10, 30)).await.unwrap();
        db.employees()
            .insert(&employee("drv-1", "Bilal", EmployeeRole::Driver, "b-1"))
            .await
            .unwrap();

        seed_delivery_order(&db, "o-1", "ship-1").await;

        db.delivery().assign_driver("ship-1", "drv-1").await.unwrap();

        let open = db.delivery().open_assignments("drv-1").await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].order_id, "o-1");

        db.delivery().mark_delivered("ship-1", Utc::now()).await.unwrap();

        let done = db.orders().get_by_id("o-1").await.unwrap().unwrap();
        assert_eq!(done.status, OrderStatus::Completed);
        let shipping = db.orders().get_shipping("o-1").await.unwrap().unwrap();
        assert!(shipping.delivered_at.is_some());

        // Delivered rows drop off the driver's list and cannot be re-marked
        assert!(db.delivery().open_assignments("drv-1").await.unwrap().is_empty());
        let err = db.delivery().mark_delivered("ship-1", Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_assign_refuses_pickup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.branches().insert(&branch("b-1", "Main Branch")).await.unwrap();
        db.products()
            .insert(&product("p-1", "SKU-1", "Paracetamol 500mg", 500, false))
            .await
            .unwrap();
        db.inventory().insert_batch(&batch("bat-1", "b-1", "p-1", 10, 30)).await.unwrap();

        let now = Utc::now();
        let new_order = NewOrder {
            order: Order {
                id: "o-1".to_string(),
                user_id: "u-1".to_string(),
                status: OrderStatus::Placed,
                subtotal_cents: 500,
                delivery_fee_cents: 0,
                total_cents: 500,
                prescription_id: None,
                payment_intent_id: None,
                created_at: now,
                updated_at: now,
            },
            items: vec![OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: "o-1".to_string(),
                product_id: "p-1".to_string(),
                name_snapshot: "Paracetamol 500mg".to_string(),
                unit_price_cents: 500,
                quantity: 1,
                line_total_cents: 500,
                requires_prescription: false,
            }],
            shipping: Shipping {
                id: "ship-1".to_string(),
                order_id: "o-1".to_string(),
                mode: ShippingMode::Pickup,
                branch_id: "b-1".to_string(),
                address_line: None,
                city: None,
                postal_code: None,
                urgent: false,
                slot_id: None,
                driver_id: None,
                delivered_at: None,
                created_at: now,
            },
        };
        db.orders().place_order(&new_order, now.date_naive()).await.unwrap();

        let err = db.delivery().assign_driver("ship-1", "drv-1").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
