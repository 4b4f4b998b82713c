//! # Catalog Reference Data
//!
//! Repositories for categories and suppliers. Both are small CRUD
//! aggregates referenced by products; deleting one that is still in use
//! fails on the foreign key and surfaces as a conflict.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use arnica_core::{Category, Supplier};

// =============================================================================
// Categories
// =============================================================================

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists all categories, name order.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, image_path, created_at \
             FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, image_path, created_at \
             FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Inserts a new category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Name already exists
    pub async fn insert(&self, category: &Category) -> DbResult<()> {
        debug!(name = %category.name, "Inserting category");

        sqlx::query(
            "INSERT INTO categories (id, name, description, image_path, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.image_path)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a category's name and description.
    pub async fn update(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, "Updating category");

        let result = sqlx::query(
            "UPDATE categories SET name = ?2, description = ?3 WHERE id = ?1",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        Ok(())
    }

    /// Records the stored image path after a multipart upload.
    pub async fn set_image_path(&self, id: &str, image_path: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE categories SET image_path = ?2 WHERE id = ?1")
            .bind(id)
            .bind(image_path)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }

    /// Deletes a category.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Products still reference it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

// =============================================================================
// Suppliers
// =============================================================================

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists all suppliers, name order.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT id, name, contact_email, phone, created_at \
             FROM suppliers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Gets a supplier by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier = sqlx::query_as::<_, Supplier>(
            "SELECT id, name, contact_email, phone, created_at \
             FROM suppliers WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Inserts a new supplier.
    pub async fn insert(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(name = %supplier.name, "Inserting supplier");

        sqlx::query(
            "INSERT INTO suppliers (id, name, contact_email, phone, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_email)
        .bind(&supplier.phone)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a supplier.
    pub async fn update(&self, supplier: &Supplier) -> DbResult<()> {
        debug!(id = %supplier.id, "Updating supplier");

        let result = sqlx::query(
            "UPDATE suppliers SET name = ?2, contact_email = ?3, phone = ?4 WHERE id = ?1",
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.contact_email)
        .bind(&supplier.phone)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", &supplier.id));
        }

        Ok(())
    }

    /// Deletes a supplier.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - Products still reference it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting supplier");

        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

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

    fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            image_path: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_category_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut cat = category("c-1", "Pain Relief");
        db.categories().insert(&cat).await.unwrap();

        cat.description = Some("Analgesics and anti-inflammatories".to_string());
        db.categories().update(&cat).await.unwrap();

        let loaded = db.categories().get_by_id("c-1").await.unwrap().unwrap();
        assert_eq!(loaded.description.as_deref(), Some("Analgesics and anti-inflammatories"));

        db.categories().delete("c-1").await.unwrap();
        assert!(db.categories().get_by_id("c-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_category_in_use_cannot_be_deleted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.categories().insert(&category("c-1", "Vitamins")).await.unwrap();
        let mut p = product("p-1", "VIT-C", "Vitamin C", 899, false);
        p.category_id = Some("c-1".to_string());
        db.products().insert(&p).await.unwrap();

        let err = db.categories().delete("c-1").await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_supplier_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let supplier = Supplier {
            id: "s-1".to_string(),
            name: "MediSupply Co".to_string(),
            contact_email: Some("orders@medisupply.test".to_string()),
            phone: None,
            created_at: Utc::now(),
        };
        db.suppliers().insert(&supplier).await.unwrap();

        let all = db.suppliers().list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "MediSupply Co");

        db.suppliers().delete("s-1").await.unwrap();
        assert!(db.suppliers().list().await.unwrap().is_empty());
    }
}
