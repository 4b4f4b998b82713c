//! # Branch Repository
//!
//! Database operations for pharmacy branches. Branches own inventory
//! batches and delivery slots, so they are never deleted, only
//! deactivated through `update`.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use arnica_core::Branch;

/// Repository for branch database operations.
#[derive(Debug, Clone)]
pub struct BranchRepository {
    pool: SqlitePool,
}

impl BranchRepository {
    /// Creates a new BranchRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BranchRepository { pool }
    }

    /// Lists all branches, name order. Inactive branches are included
    /// so the back office can reactivate them.
    pub async fn list(&self) -> DbResult<Vec<Branch>> {
        let branches = sqlx::query_as::<_, Branch>(
            "SELECT id, name, address, phone, is_active, created_at \
             FROM branches ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(branches)
    }

    /// Gets a branch by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Branch>> {
        let branch = sqlx::query_as::<_, Branch>(
            "SELECT id, name, address, phone, is_active, created_at \
             FROM branches WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(branch)
    }

    /// Inserts a new branch.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Name already exists
    pub async fn insert(&self, branch: &Branch) -> DbResult<()> {
        debug!(name = %branch.name, "Inserting branch");

        sqlx::query(
            "INSERT INTO branches (id, name, address, phone, is_active, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&branch.id)
        .bind(&branch.name)
        .bind(&branch.address)
        .bind(&branch.phone)
        .bind(branch.is_active)
        .bind(branch.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a branch (including activation state).
    pub async fn update(&self, branch: &Branch) -> DbResult<()> {
        debug!(id = %branch.id, "Updating branch");

        let result = sqlx::query(
            "UPDATE branches SET name = ?2, address = ?3, phone = ?4, is_active = ?5 \
             WHERE id = ?1",
        )
        .bind(&branch.id)
        .bind(&branch.name)
        .bind(&branch.address)
        .bind(&branch.phone)
        .bind(branch.is_active)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Branch", &branch.id));
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
    use crate::repository::test_support::branch;

    #[tokio::test]
    async fn test_branch_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.branches().insert(&branch("br-1", "Central")).await.unwrap();
        db.branches().insert(&branch("br-2", "Airport")).await.unwrap();

        let all = db.branches().list().await.unwrap();
        assert_eq!(all.len(), 2);
        // Name order
        assert_eq!(all[0].name, "Airport");

        let mut central = db.branches().get_by_id("br-1").await.unwrap().unwrap();
        central.is_active = false;
        db.branches().update(&central).await.unwrap();

        let reloaded = db.branches().get_by_id("br-1").await.unwrap().unwrap();
        assert!(!reloaded.is_active);
    }

    #[tokio::test]
    async fn test_update_missing_branch_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db.branches().update(&branch("ghost", "Ghost")).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
