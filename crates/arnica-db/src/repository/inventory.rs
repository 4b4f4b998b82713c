//! # Inventory Repository
//!
//! Database operations for branch stock. Stock lives in batches with
//! expiry dates; a product's availability at a branch is the unexpired
//! batch sum.
//!
//! ## FEFO Draws
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    First-Expiry-First-Out                               │
//! │                                                                         │
//! │  Order wants 30 × Ibuprofen at branch Central                          │
//! │                                                                         │
//! │  batches (expiry order):                                               │
//! │  ┌──────────┬──────────┬──────────┐                                    │
//! │  │ 2026-01  │ 2026-04  │ 2026-09  │                                    │
//! │  │ qty 10   │ qty 15   │ qty 40   │                                    │
//! │  └──────────┴──────────┴──────────┘                                    │
//! │    take 10    take 15    take 5     ← expired batches never touched    │
//! │                                                                         │
//! │  Each take is recorded in stock_draws so a cancellation can put        │
//! │  the units back into the batches they came from.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Draw and restore run inside the order transaction, so a concurrent
//! shortfall rolls the whole checkout back.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use arnica_core::InventoryBatch;

/// Per-product stock at a branch, for the inventory listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockLevel {
    pub product_id: String,
    pub product_name: String,
    /// Unexpired units on hand.
    pub on_hand: i64,
    pub soonest_expiry: Option<NaiveDate>,
}

/// A batch nearing its expiry date, for the expiring listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExpiringBatch {
    pub batch_id: String,
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub expiry_date: NaiveDate,
}

/// Repository for inventory batch operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Records a received batch (restock).
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown branch or product
    pub async fn insert_batch(&self, batch: &InventoryBatch) -> DbResult<()> {
        debug!(
            branch = %batch.branch_id,
            product = %batch.product_id,
            quantity = %batch.quantity,
            "Inserting inventory batch"
        );

        sqlx::query(
            "INSERT INTO inventory_batches (id, branch_id, product_id, quantity, expiry_date, received_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&batch.id)
        .bind(&batch.branch_id)
        .bind(&batch.product_id)
        .bind(batch.quantity)
        .bind(batch.expiry_date)
        .bind(batch.received_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a batch by ID.
    pub async fn get_batch(&self, id: &str) -> DbResult<Option<InventoryBatch>> {
        let batch = sqlx::query_as::<_, InventoryBatch>(
            "SELECT id, branch_id, product_id, quantity, expiry_date, received_at \
             FROM inventory_batches WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(batch)
    }

    /// Available units of one product at a branch on a given date.
    ///
    /// A batch is usable through its expiry date inclusive.
    pub async fn availability(
        &self,
        branch_id: &str,
        product_id: &str,
        on: NaiveDate,
    ) -> DbResult<i64> {
        let available: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM inventory_batches \
             WHERE branch_id = ?1 AND product_id = ?2 AND expiry_date >= ?3",
        )
        .bind(branch_id)
        .bind(product_id)
        .bind(on)
        .fetch_one(&self.pool)
        .await?;

        Ok(available)
    }

    /// Availability for several products at once, keyed by product id.
    ///
    /// ## Usage
    /// Checkout pre-checks the whole cart in one query. Products with no
    /// batches at the branch are absent from the map (treat as zero).
    pub async fn availability_map(
        &self,
        branch_id: &str,
        product_ids: &[String],
        on: NaiveDate,
    ) -> DbResult<HashMap<String, i64>> {
        if product_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; product_ids.len()].join(", ");
        let sql = format!(
            "SELECT product_id, COALESCE(SUM(quantity), 0) FROM inventory_batches \
             WHERE branch_id = ? AND expiry_date >= ? AND product_id IN ({placeholders}) \
             GROUP BY product_id"
        );

        let mut query = sqlx::query_as::<_, (String, i64)>(&sql)
            .bind(branch_id)
            .bind(on);
        for id in product_ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().collect())
    }

    /// Per-product unexpired totals at a branch, with the soonest expiry.
    pub async fn stock_levels(&self, branch_id: &str, on: NaiveDate) -> DbResult<Vec<StockLevel>> {
        let levels = sqlx::query_as::<_, StockLevel>(
            "SELECT b.product_id, p.name AS product_name, \
                    COALESCE(SUM(b.quantity), 0) AS on_hand, \
                    MIN(b.expiry_date) AS soonest_expiry \
             FROM inventory_batches b \
             JOIN products p ON p.id = b.product_id \
             WHERE b.branch_id = ?1 AND b.expiry_date >= ?2 AND b.quantity > 0 \
             GROUP BY b.product_id, p.name \
             ORDER BY p.name",
        )
        .bind(branch_id)
        .bind(on)
        .fetch_all(&self.pool)
        .await?;

        Ok(levels)
    }

    /// Batches at a branch expiring within `days` of `on` (inclusive),
    /// still holding units.
    pub async fn expiring(
        &self,
        branch_id: &str,
        days: i64,
        on: NaiveDate,
    ) -> DbResult<Vec<ExpiringBatch>> {
        let until = on + Duration::days(days);

        let batches = sqlx::query_as::<_, ExpiringBatch>(
            "SELECT b.id AS batch_id, b.product_id, p.name AS product_name, \
                    b.quantity, b.expiry_date \
             FROM inventory_batches b \
             JOIN products p ON p.id = b.product_id \
             WHERE b.branch_id = ?1 AND b.quantity > 0 \
               AND b.expiry_date >= ?2 AND b.expiry_date <= ?3 \
             ORDER BY b.expiry_date, p.name",
        )
        .bind(branch_id)
        .bind(on)
        .bind(until)
        .fetch_all(&self.pool)
        .await?;

        Ok(batches)
    }

    /// Zeroes all expired batches at a branch and returns the unit count
    /// taken off the shelf.
    pub async fn discard_expired(&self, branch_id: &str, on: NaiveDate) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;

        let discarded: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM inventory_batches \
             WHERE branch_id = ?1 AND expiry_date < ?2 AND quantity > 0",
        )
        .bind(branch_id)
        .bind(on)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE inventory_batches SET quantity = 0 \
             WHERE branch_id = ?1 AND expiry_date < ?2 AND quantity > 0",
        )
        .bind(branch_id)
        .bind(on)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(branch = %branch_id, discarded = %discarded, "Discarded expired stock");
        Ok(discarded)
    }

    /// Total unexpired units at a branch expiring within `days`, for the
    /// scheduled stock warning.
    pub async fn expiring_unit_count(&self, branch_id: &str, days: i64) -> DbResult<i64> {
        let on = Utc::now().date_naive();
        let until = on + Duration::days(days);

        let units: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM inventory_batches \
             WHERE branch_id = ?1 AND quantity > 0 \
               AND expiry_date >= ?2 AND expiry_date <= ?3",
        )
        .bind(branch_id)
        .bind(on)
        .bind(until)
        .fetch_one(&self.pool)
        .await?;

        Ok(units)
    }
}

// =============================================================================
// Transactional helpers (used by the order repository)
// =============================================================================

/// Draws `quantity` units of a product from a branch's batches,
/// first-expiry-first-out, inside the caller's transaction.
///
/// Expired batches are never touched. Every take is recorded in
/// `stock_draws` under `order_id` so cancellation can reverse it.
///
/// ## Returns
/// * `Err(DbError::StockConflict)` - Unexpired batches hold fewer than
///   `quantity` units; the caller must roll back.
pub(crate) async fn draw_fefo(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: &str,
    branch_id: &str,
    product_id: &str,
    quantity: i64,
    on: NaiveDate,
) -> DbResult<()> {
    let batches: Vec<(String, i64)> = sqlx::query_as(
        "SELECT id, quantity FROM inventory_batches \
         WHERE branch_id = ?1 AND product_id = ?2 AND expiry_date >= ?3 AND quantity > 0 \
         ORDER BY expiry_date, received_at",
    )
    .bind(branch_id)
    .bind(product_id)
    .bind(on)
    .fetch_all(&mut **tx)
    .await?;

    let available: i64 = batches.iter().map(|(_, q)| q).sum();
    if available < quantity {
        return Err(DbError::StockConflict {
            product_id: product_id.to_string(),
            available,
            requested: quantity,
        });
    }

    let mut remaining = quantity;
    for (batch_id, batch_quantity) in batches {
        if remaining == 0 {
            break;
        }
        let take = remaining.min(batch_quantity);

        sqlx::query("UPDATE inventory_batches SET quantity = quantity - ?2 WHERE id = ?1")
            .bind(&batch_id)
            .bind(take)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            "INSERT INTO stock_draws (id, order_id, batch_id, quantity) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(order_id)
        .bind(&batch_id)
        .bind(take)
        .execute(&mut **tx)
        .await?;

        remaining -= take;
    }

    Ok(())
}

/// Puts an order's drawn units back into the batches they came from and
/// clears the draw records, inside the caller's transaction.
///
/// Returns the number of units restored. Calling it again is a no-op
/// because the draw rows are gone.
pub(crate) async fn restore_draws(
    tx: &mut Transaction<'_, Sqlite>,
    order_id: &str,
) -> DbResult<i64> {
    let draws: Vec<(String, i64)> = sqlx::query_as(
        "SELECT batch_id, quantity FROM stock_draws WHERE order_id = ?1",
    )
    .bind(order_id)
    .fetch_all(&mut **tx)
    .await?;

    let mut restored = 0;
    for (batch_id, quantity) in &draws {
        sqlx::query("UPDATE inventory_batches SET quantity = quantity + ?2 WHERE id = ?1")
            .bind(batch_id)
            .bind(quantity)
            .execute(&mut **tx)
            .await?;
        restored += quantity;
    }

    sqlx::query("DELETE FROM stock_draws WHERE order_id = ?1")
        .bind(order_id)
        .execute(&mut **tx)
        .await?;

    Ok(restored)
}

// =============================================================================
// Unit Tests
// =============================================================================
