//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Search across name, SKU, and active ingredient
//! - CRUD with soft delete
//! - Image path updates after multipart uploads
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How Catalog Search Works                             │
//! │                                                                         │
//! │  User types: "ibu"                                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  LIKE '%ibu%' across: name, sku, active_ingredient                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │ products                                │                           │
//! │  │                                         │                           │
//! │  │ IBU-200  | Ibuprofen 200mg | ibuprofen │ ← MATCH!                  │
//! │  │ IBU-400  | Ibuprofen 400mg | ibuprofen │ ← MATCH!                  │
//! │  │ PARA-500 | Paracetamol     | ...       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Results: [IBU-200, IBU-400], optionally narrowed by category          │
//! │                                                                         │
//! │  An empty query lists the active catalog (paginated, by name).         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use arnica_core::Product;

/// All product columns, in struct field order.
const PRODUCT_COLUMNS: &str = "id, sku, name, description, category_id, supplier_id, \
     price_cents, requires_prescription, active_ingredient, image_path, \
     is_active, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// // Search products
/// let results = repo.search("ibuprofen", None, 20, 0).await?;
///
/// // Get by ID
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches active products.
    ///
    /// ## How It Works
    /// 1. `query` matches name, SKU, or active ingredient (substring,
    ///    case-insensitive per SQLite LIKE)
    /// 2. `category_id` narrows to one category when present
    /// 3. Results are ordered by name and paginated
    ///
    /// An empty query lists the active catalog.
    ///
    /// ## Arguments
    /// * `query` - Search term (can be partial or empty)
    /// * `category_id` - Optional category filter
    /// * `limit` / `offset` - Pagination
    pub async fn search(
        &self,
        query: &str,
        category_id: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, category = ?category_id, limit = %limit, "Searching products");

        // "%%" matches every row, so the empty query falls out naturally
        let pattern = format!("%{}%", query);

        let products = match category_id {
            Some(category) => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE is_active = 1 AND category_id = ?1 \
                     AND (name LIKE ?2 OR sku LIKE ?2 OR active_ingredient LIKE ?2) \
                     ORDER BY name LIMIT ?3 OFFSET ?4"
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(category)
                    .bind(&pattern)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE is_active = 1 \
                     AND (name LIKE ?1 OR sku LIKE ?1 OR active_ingredient LIKE ?1) \
                     ORDER BY name LIMIT ?2 OFFSET ?3"
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(&pattern)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found (active or soft-deleted)
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets several products by ID in one query.
    ///
    /// ## Usage
    /// Checkout and the safety check load whole carts at once. Missing
    /// ids are simply absent from the result; callers decide whether
    /// that matters.
    pub async fn get_many(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id IN ({placeholders})");

        let mut query = sqlx::query_as::<_, Product>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let products = query.fetch_all(&self.pool).await?;
        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(())` - Inserted
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description, category_id, supplier_id,
                price_cents, requires_prescription, active_ingredient,
                image_path, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.price_cents)
        .bind(product.requires_prescription)
        .bind(&product.active_ingredient)
        .bind(&product.image_path)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product.
    ///
    /// ## Returns
    /// * `Ok(())` - Update successful
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                name = ?3,
                description = ?4,
                category_id = ?5,
                supplier_id = ?6,
                price_cents = ?7,
                requires_prescription = ?8,
                active_ingredient = ?9,
                is_active = ?10,
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(&product.supplier_id)
        .bind(product.price_cents)
        .bind(product.requires_prescription)
        .bind(&product.active_ingredient)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Records the stored image path after a multipart upload.
    pub async fn set_image_path(&self, id: &str, image_path: &str) -> DbResult<()> {
        debug!(id = %id, path = %image_path, "Setting product image");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET image_path = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(image_path)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// ## Why Soft Delete?
    /// - Historical order items still reference this product
    /// - Can be restored if deleted by mistake
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
