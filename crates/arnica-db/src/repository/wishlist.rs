//! # Wishlist Repository
//!
//! One toggle operation and a listing. The (user, product) pair is the
//! primary key, so the table can never hold a duplicate entry and the
//! toggle is idempotent per pair.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use arnica_core::Product;

/// Repository for wishlist database operations.
#[derive(Debug, Clone)]
pub struct WishlistRepository {
    pool: SqlitePool,
}

impl WishlistRepository {
    /// Creates a new WishlistRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WishlistRepository { pool }
    }

    /// Lists a user's wishlisted products, most recently added first.
    pub async fn list_for_user(&self, user_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT p.id, p.sku, p.name, p.description, p.category_id, p.supplier_id, \
                    p.price_cents, p.requires_prescription, p.active_ingredient, \
                    p.image_path, p.is_active, p.created_at, p.updated_at \
             FROM wishlist_items w \
             JOIN products p ON p.id = w.product_id \
             WHERE w.user_id = ?1 AND p.is_active = 1 \
             ORDER BY w.added_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Toggles a product on a user's wishlist.
    ///
    /// ## Semantics
    /// - absent → added, returns `true`
    /// - present → removed, returns `false`
    ///
    /// `INSERT OR IGNORE` against the (user, product) primary key makes
    /// the add side race-safe; when it inserts nothing the pair already
    /// existed and is deleted instead.
    pub async fn toggle(&self, user_id: &str, product_id: &str) -> DbResult<bool> {
        let now = Utc::now();

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO wishlist_items (user_id, product_id, added_at) \
             VALUES (?1, ?2, ?3)",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 1 {
            debug!(user = %user_id, product = %product_id, "Wishlist add");
            return Ok(true);
        }

        sqlx::query("DELETE FROM wishlist_items WHERE user_id = ?1 AND product_id = ?2")
            .bind(user_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?;

        debug!(user = %user_id, product = %product_id, "Wishlist remove");
        Ok(false)
    }

    /// Counts (user, product) rows for a user. Diagnostics and tests.
    pub async fn count_for_user(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM wishlist_items WHERE user_id = ?1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
