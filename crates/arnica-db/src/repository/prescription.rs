//! # Prescription Repository
//!
//! Database operations for uploaded prescriptions.
//!
//! ## Review Writes
//! The state machine itself lives in arnica-core ([`Prescription::approve`]
//! and [`Prescription::reject`] validate the transition); this repository
//! persists the outcome with a guarded UPDATE:
//!
//! ```text
//! UPDATE prescriptions SET ... WHERE id = ? AND status = 'pending_approval'
//! ```
//!
//! Zero rows affected means the row was reviewed concurrently (or never
//! existed) and nothing was written.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use arnica_core::{Prescription, PrescriptionStatus};

/// All prescription columns, in struct field order.
const PRESCRIPTION_COLUMNS: &str = "id, user_id, document_path, status, uploaded_at, \
     product_id, dosage, quantity, expires_at, reviewed_by, reviewed_at, rejection_reason";

/// Repository for prescription database operations.
#[derive(Debug, Clone)]
pub struct PrescriptionRepository {
    pool: SqlitePool,
}

impl PrescriptionRepository {
    /// Creates a new PrescriptionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PrescriptionRepository { pool }
    }

    /// Inserts a freshly uploaded prescription (normally pending).
    pub async fn insert(&self, prescription: &Prescription) -> DbResult<()> {
        debug!(id = %prescription.id, user = %prescription.user_id, "Inserting prescription");

        sqlx::query(
            "INSERT INTO prescriptions ( \
                id, user_id, document_path, status, uploaded_at, \
                product_id, dosage, quantity, expires_at, \
                reviewed_by, reviewed_at, rejection_reason \
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&prescription.id)
        .bind(&prescription.user_id)
        .bind(&prescription.document_path)
        .bind(prescription.status)
        .bind(prescription.uploaded_at)
        .bind(&prescription.product_id)
        .bind(&prescription.dosage)
        .bind(prescription.quantity)
        .bind(prescription.expires_at)
        .bind(&prescription.reviewed_by)
        .bind(prescription.reviewed_at)
        .bind(&prescription.rejection_reason)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a prescription by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Prescription>> {
        let sql = format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = ?1");

        let prescription = sqlx::query_as::<_, Prescription>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(prescription)
    }

    /// Lists prescriptions, optionally filtered by status and/or user.
    /// Oldest upload first, matching the pharmacist review queue.
    pub async fn list(
        &self,
        status: Option<PrescriptionStatus>,
        user_id: Option<&str>,
    ) -> DbResult<Vec<Prescription>> {
        let prescriptions = match (status, user_id) {
            (Some(status), Some(user)) => {
                let sql = format!(
                    "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions \
                     WHERE status = ?1 AND user_id = ?2 ORDER BY uploaded_at"
                );
                sqlx::query_as::<_, Prescription>(&sql)
                    .bind(status)
                    .bind(user)
                    .fetch_all(&self.pool)
                    .await?
            }
            (Some(status), None) => {
                let sql = format!(
                    "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions \
                     WHERE status = ?1 ORDER BY uploaded_at"
                );
                sqlx::query_as::<_, Prescription>(&sql)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, Some(user)) => {
                let sql = format!(
                    "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions \
                     WHERE user_id = ?1 ORDER BY uploaded_at"
                );
                sqlx::query_as::<_, Prescription>(&sql)
                    .bind(user)
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, None) => {
                let sql = format!(
                    "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions ORDER BY uploaded_at"
                );
                sqlx::query_as::<_, Prescription>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(prescriptions)
    }

    /// Persists a review outcome (approval or rejection) produced by the
    /// core state machine.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No pending row with this id; either
    ///   it never existed or another review won the race. Nothing was
    ///   written.
    pub async fn apply_review(&self, reviewed: &Prescription) -> DbResult<()> {
        debug!(
            id = %reviewed.id,
            status = %reviewed.status.as_str(),
            "Persisting prescription review"
        );

        let result = sqlx::query(
            "UPDATE prescriptions SET \
                status = ?2, product_id = ?3, dosage = ?4, quantity = ?5, \
                expires_at = ?6, reviewed_by = ?7, reviewed_at = ?8, rejection_reason = ?9 \
             WHERE id = ?1 AND status = 'pending_approval'",
        )
        .bind(&reviewed.id)
        .bind(reviewed.status)
        .bind(&reviewed.product_id)
        .bind(&reviewed.dosage)
        .bind(reviewed.quantity)
        .bind(reviewed.expires_at)
        .bind(&reviewed.reviewed_by)
        .bind(reviewed.reviewed_at)
        .bind(&reviewed.rejection_reason)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pending prescription", &reviewed.id));
        }

        Ok(())
    }

    /// Expires pending prescriptions uploaded before `cutoff`.
    ///
    /// Returns the ids flipped, so the caller can cancel any held orders.
    pub async fn expire_overdue_pending(&self, cutoff: DateTime<Utc>) -> DbResult<Vec<String>> {
        let mut tx = self.pool.begin().await?;

        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM prescriptions \
             WHERE status = 'pending_approval' AND uploaded_at < ?1",
        )
        .bind(cutoff)
        .fetch_all(&mut *tx)
        .await?;

        if !ids.is_empty() {
            sqlx::query(
                "UPDATE prescriptions SET status = 'expired' \
                 WHERE status = 'pending_approval' AND uploaded_at < ?1",
            )
            .bind(cutoff)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(ids)
    }

    /// Expires approved prescriptions whose validity window has passed.
    ///
    /// Returns the ids flipped. Checkout already refuses these rows by
    /// timestamp; this keeps the stored status in line with reality.
    pub async fn expire_lapsed_approved(&self, now: DateTime<Utc>) -> DbResult<Vec<String>> {
        let mut tx = self.pool.begin().await?;

        let ids: Vec<String> = sqlx::query_scalar(
            "SELECT id FROM prescriptions \
             WHERE status = 'approved' AND expires_at IS NOT NULL AND expires_at < ?1",
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await?;

        if !ids.is_empty() {
            sqlx::query(
                "UPDATE prescriptions SET status = 'expired' \
                 WHERE status = 'approved' AND expires_at IS NOT NULL AND expires_at < ?1",
            )
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
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
    use crate::repository::test_support::{pending_prescription, product};
    use arnica_core::prescription::Approval;
    use chrono::Duration;

    /// The product the `approval` fixture points at; prescriptions carry a
    /// foreign key to products, so approved rows need it present.
    async fn seed_product(db: &Database) {
        db.products()
            .insert(&product("p-1", "AMOX-500", "Amoxicillin 500mg", 1200, true))
            .await
            .unwrap();
    }

    fn approval(now: DateTime<Utc>) -> Approval {
        Approval {
            product_id: "p-1".to_string(),
            dosage: "1 tablet daily".to_string(),
            quantity: 30,
            expires_at: now + Duration::days(90),
            reviewed_by: "emp-pharm".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upload_and_fetch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.prescriptions()
            .insert(&pending_prescription("rx-1", "u-1"))
            .await
            .unwrap();

        let loaded = db.prescriptions().get_by_id("rx-1").await.unwrap().unwrap();
        assert_eq!(loaded.status, PrescriptionStatus::PendingApproval);
        assert_eq!(loaded.user_id, "u-1");
        assert!(loaded.reviewed_by.is_none());
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_product(&db).await;
        let now = Utc::now();

        db.prescriptions().insert(&pending_prescription("rx-1", "u-1")).await.unwrap();
        db.prescriptions().insert(&pending_prescription("rx-2", "u-2")).await.unwrap();

        let approved = pending_prescription("rx-3", "u-1")
            .approve(approval(now), now)
            .unwrap();
        db.prescriptions().insert(&approved).await.unwrap();

        let pending = db
            .prescriptions()
            .list(Some(PrescriptionStatus::PendingApproval), None)
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let u1 = db.prescriptions().list(None, Some("u-1")).await.unwrap();
        assert_eq!(u1.len(), 2);

        let u1_approved = db
            .prescriptions()
            .list(Some(PrescriptionStatus::Approved), Some("u-1"))
            .await
            .unwrap();
        assert_eq!(u1_approved.len(), 1);
        assert_eq!(u1_approved[0].id, "rx-3");
    }

    #[tokio::test]
    async fn test_review_persists_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_product(&db).await;
        let now = Utc::now();

        db.prescriptions().insert(&pending_prescription("rx-1", "u-1")).await.unwrap();

        let loaded = db.prescriptions().get_by_id("rx-1").await.unwrap().unwrap();
        let approved = loaded.approve(approval(now), now).unwrap();
        db.prescriptions().apply_review(&approved).await.unwrap();

        let reloaded = db.prescriptions().get_by_id("rx-1").await.unwrap().unwrap();
        assert_eq!(reloaded.status, PrescriptionStatus::Approved);
        assert_eq!(reloaded.product_id.as_deref(), Some("p-1"));
        assert_eq!(reloaded.quantity, Some(30));

        // The guarded UPDATE refuses a second write
        let err = db.prescriptions().apply_review(&approved).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_expire_overdue_pending() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();

        let mut old = pending_prescription("rx-old", "u-1");
        old.uploaded_at = now - Duration::days(45);
        db.prescriptions().insert(&old).await.unwrap();
        db.prescriptions().insert(&pending_prescription("rx-new", "u-1")).await.unwrap();

        let cutoff = now - Duration::days(30);
        let flipped = db.prescriptions().expire_overdue_pending(cutoff).await.unwrap();
        assert_eq!(flipped, vec!["rx-old".to_string()]);

        let old = db.prescriptions().get_by_id("rx-old").await.unwrap().unwrap();
        assert_eq!(old.status, PrescriptionStatus::Expired);
        let fresh = db.prescriptions().get_by_id("rx-new").await.unwrap().unwrap();
        assert_eq!(fresh.status, PrescriptionStatus::PendingApproval);
    }

    #[tokio::test]
    async fn test_expire_lapsed_approved() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_product(&db).await;
        let now = Utc::now();

        // Approved three months ago with a 90-day window that has passed
        let then = now - Duration::days(100);
        let mut details = approval(then);
        details.expires_at = then + Duration::days(90);
        let lapsed = pending_prescription("rx-lapsed", "u-1")
            .approve(details, then)
            .unwrap();
        db.prescriptions().insert(&lapsed).await.unwrap();

        let current = pending_prescription("rx-current", "u-1")
            .approve(approval(now), now)
            .unwrap();
        db.prescriptions().insert(&current).await.unwrap();

        let flipped = db.prescriptions().expire_lapsed_approved(now).await.unwrap();
        assert_eq!(flipped, vec!["rx-lapsed".to_string()]);

        let kept = db.prescriptions().get_by_id("rx-current").await.unwrap().unwrap();
        assert_eq!(kept.status, PrescriptionStatus::Approved);
    }
}
