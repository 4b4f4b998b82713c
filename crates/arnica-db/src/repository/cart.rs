//! # Cart Repository
//!
//! Server-side carts keyed by opaque user id. Rows store only
//! (user, product, quantity); names and prices are joined from the
//! catalog on read so the cart always reflects current pricing.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use arnica_core::cart::CartLine;

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Loads a user's cart joined to the catalog.
    ///
    /// Lines for soft-deleted products are skipped; they can no longer
    /// be bought, so they should not surface or price into totals.
    pub async fn lines_for_user(&self, user_id: &str) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(
            "SELECT c.product_id, p.name, p.price_cents AS unit_price_cents, \
                    c.quantity, p.requires_prescription \
             FROM cart_items c \
             JOIN products p ON p.id = c.product_id \
             WHERE c.user_id = ?1 AND p.is_active = 1 \
             ORDER BY c.added_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Adds quantity to a cart line, creating it if absent.
    ///
    /// ## Upsert Semantics
    /// `POST /api/cart/items` with the same product twice accumulates;
    /// use [`Self::set_quantity`] to overwrite.
    pub async fn add_item(&self, user_id: &str, product_id: &str, quantity: i64) -> DbResult<()> {
        debug!(user = %user_id, product = %product_id, quantity = %quantity, "Adding cart item");

        let now = Utc::now();

        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, quantity, added_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (user_id, product_id) \
             DO UPDATE SET quantity = quantity + excluded.quantity",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Sets a cart line's quantity exactly. Zero removes the line.
    pub async fn set_quantity(
        &self,
        user_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        if quantity == 0 {
            return self.remove_item(user_id, product_id).await;
        }

        let result = sqlx::query(
            "UPDATE cart_items SET quantity = ?3 WHERE user_id = ?1 AND product_id = ?2",
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart item", product_id));
        }

        Ok(())
    }

    /// Removes one line from a user's cart.
    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM cart_items WHERE user_id = ?1 AND product_id = ?2",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Cart item", product_id));
        }

        Ok(())
    }

    /// Empties a user's cart. Succeeds on an already-empty cart.
    ///
    /// Checkout calls this after the order commits.
    pub async fn clear(&self, user_id: &str) -> DbResult<()> {
        debug!(user = %user_id, "Clearing cart");

        sqlx::query("DELETE FROM cart_items WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

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
    use crate::repository::test_support::product;

    async fn seed(db: &Database) {
        db.products()
            .insert(&product("p-1", "IBU-200", "Ibuprofen 200mg", 450, false))
            .await
            .unwrap();
        db.products()
            .insert(&product("p-2", "PARA-500", "Paracetamol 500mg", 300, false))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_accumulates_quantity() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;

        db.carts().add_item("u-1", "p-1", 2).await.unwrap();
        db.carts().add_item("u-1", "p-1", 3).await.unwrap();

        let lines = db.carts().lines_for_user("u-1").await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[0].unit_price_cents, 450);
    }

    #[tokio::test]
    async fn test_set_quantity_overwrites_and_zero_removes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;

        db.carts().add_item("u-1", "p-1", 2).await.unwrap();
        db.carts().set_quantity("u-1", "p-1", 7).await.unwrap();

        let lines = db.carts().lines_for_user("u-1").await.unwrap();
        assert_eq!(lines[0].quantity, 7);

        db.carts().set_quantity("u-1", "p-1", 0).await.unwrap();
        assert!(db.carts().lines_for_user("u-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_carts_are_per_user() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;

        db.carts().add_item("u-1", "p-1", 1).await.unwrap();
        db.carts().add_item("u-2", "p-2", 4).await.unwrap();

        assert_eq!(db.carts().lines_for_user("u-1").await.unwrap().len(), 1);
        assert_eq!(db.carts().lines_for_user("u-2").await.unwrap().len(), 1);

        db.carts().clear("u-1").await.unwrap();
        assert!(db.carts().lines_for_user("u-1").await.unwrap().is_empty());
        assert_eq!(db.carts().lines_for_user("u-2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_soft_deleted_products_drop_out_of_cart() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;

        db.carts().add_item("u-1", "p-1", 1).await.unwrap();
        db.products().soft_delete("p-1").await.unwrap();

        assert!(db.carts().lines_for_user("u-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_missing_item_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;

        let err = db.carts().remove_item("u-1", "p-1").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
