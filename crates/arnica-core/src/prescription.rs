//! # Prescription Approval
//!
//! The prescription entity and its approval state machine.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │                    ┌──► approved ──────┐ (expires_at passes,            │
//! │   pending_approval │    (pharmacist)   │  swept by the expiry job)      │
//! │         │          ├──► rejected       ▼                                │
//! │         │          │    (pharmacist)  expired                           │
//! │         │          │                   ▲                                │
//! │         └──────────┴───────────────────┘ (review TTL passes)            │
//! │                                                                         │
//! │   approved / rejected / expired are terminal to pharmacist action.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Approval records what was prescribed (product, dosage, quantity) and a
//! validity window. Checkout never trusts the status column alone: an
//! approved prescription past `expires_at` is unusable even before the
//! sweep flips its row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};

// =============================================================================
// Prescription Status
// =============================================================================

/// The review status of an uploaded prescription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PrescriptionStatus {
    /// Uploaded, waiting for a pharmacist.
    PendingApproval,
    /// Pharmacist approved; valid until `expires_at`.
    Approved,
    /// Pharmacist rejected with a reason.
    Rejected,
    /// Closed by time: review TTL or validity window passed.
    Expired,
}

impl PrescriptionStatus {
    /// Stable string form, matches the database representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PrescriptionStatus::PendingApproval => "pending_approval",
            PrescriptionStatus::Approved => "approved",
            PrescriptionStatus::Rejected => "rejected",
            PrescriptionStatus::Expired => "expired",
        }
    }

    /// Pharmacist review only applies to pending prescriptions.
    #[inline]
    pub fn can_review(&self) -> bool {
        matches!(self, PrescriptionStatus::PendingApproval)
    }

    /// The full transition graph, time-based moves included.
    ///
    /// Pharmacists drive pending→approved and pending→rejected; the expiry
    /// sweep drives pending→expired and approved→expired. Nothing else moves.
    pub fn can_transition_to(&self, next: PrescriptionStatus) -> bool {
        use PrescriptionStatus::*;
        matches!(
            (self, next),
            (PendingApproval, Approved)
                | (PendingApproval, Rejected)
                | (PendingApproval, Expired)
                | (Approved, Expired)
        )
    }

    /// Terminal states accept no pharmacist action.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !self.can_review()
    }
}

// =============================================================================
// Prescription
// =============================================================================

/// An uploaded prescription document and its review outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Prescription {
    pub id: String,
    /// Customer who uploaded the document.
    pub user_id: String,
    /// Relative path of the stored document.
    pub document_path: String,
    pub status: PrescriptionStatus,
    pub uploaded_at: DateTime<Utc>,
    /// Set on approval: the prescribed product.
    pub product_id: Option<String>,
    /// Set on approval: dosage instructions as written.
    pub dosage: Option<String>,
    /// Set on approval: prescribed quantity.
    pub quantity: Option<i64>,
    /// Set on approval: end of the validity window.
    pub expires_at: Option<DateTime<Utc>>,
    /// Reviewing pharmacist (employee id).
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Set on rejection.
    pub rejection_reason: Option<String>,
}

/// What a pharmacist records when approving.
#[derive(Debug, Clone)]
pub struct Approval {
    pub product_id: String,
    pub dosage: String,
    pub quantity: i64,
    pub expires_at: DateTime<Utc>,
    pub reviewed_by: String,
}

/// How a usable prescription enters an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrescriptionUse {
    /// Approved and inside its validity window; order proceeds normally.
    Ready,
    /// Still pending review; order is created held (`awaiting_prescription`).
    HeldForReview,
}

impl Prescription {
    /// Applies a pharmacist approval, returning the updated prescription.
    ///
    /// Fails unless the prescription is pending and the validity window
    /// ends in the future.
    pub fn approve(mut self, approval: Approval, now: DateTime<Utc>) -> CoreResult<Self> {
        if !self.status.can_review() {
            return Err(CoreError::PrescriptionNotPending {
                prescription_id: self.id.clone(),
                current_status: self.status.as_str().to_string(),
            });
        }
        if approval.expires_at <= now {
            return Err(ValidationError::InvalidFormat {
                field: "expiresAt".to_string(),
                reason: "must be in the future".to_string(),
            }
            .into());
        }
        if approval.quantity <= 0 {
            return Err(ValidationError::MustBePositive {
                field: "quantity".to_string(),
            }
            .into());
        }
        if approval.dosage.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "dosage".to_string(),
            }
            .into());
        }

        self.status = PrescriptionStatus::Approved;
        self.product_id = Some(approval.product_id);
        self.dosage = Some(approval.dosage);
        self.quantity = Some(approval.quantity);
        self.expires_at = Some(approval.expires_at);
        self.reviewed_by = Some(approval.reviewed_by);
        self.reviewed_at = Some(now);
        Ok(self)
    }

    /// Applies a pharmacist rejection, returning the updated prescription.
    pub fn reject(
        mut self,
        reason: String,
        reviewed_by: String,
        now: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if !self.status.can_review() {
            return Err(CoreError::PrescriptionNotPending {
                prescription_id: self.id.clone(),
                current_status: self.status.as_str().to_string(),
            });
        }
        if reason.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "reason".to_string(),
            }
            .into());
        }

        self.status = PrescriptionStatus::Rejected;
        self.rejection_reason = Some(reason);
        self.reviewed_by = Some(reviewed_by);
        self.reviewed_at = Some(now);
        Ok(self)
    }

    /// Classifies this prescription for a checkout by `user_id` at `now`.
    ///
    /// - approved and inside its window → [`PrescriptionUse::Ready`]
    /// - pending review → [`PrescriptionUse::HeldForReview`]
    /// - anything else → the matching [`CoreError`]
    pub fn usability_for_order(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<PrescriptionUse> {
        if self.user_id != user_id {
            return Err(CoreError::PrescriptionWrongUser);
        }
        match self.status {
            PrescriptionStatus::PendingApproval => Ok(PrescriptionUse::HeldForReview),
            PrescriptionStatus::Approved => match self.expires_at {
                Some(expires_at) if expires_at > now => Ok(PrescriptionUse::Ready),
                Some(expires_at) => Err(CoreError::PrescriptionExpired {
                    expired_at: expires_at.to_rfc3339(),
                }),
                // Approved rows always carry a window; a missing one is
                // treated as expired rather than open-ended.
                None => Err(CoreError::PrescriptionNotUsable {
                    status: self.status.as_str().to_string(),
                }),
            },
            PrescriptionStatus::Rejected | PrescriptionStatus::Expired => {
                Err(CoreError::PrescriptionNotUsable {
                    status: self.status.as_str().to_string(),
                })
            }
        }
    }

    /// Whether a pending prescription has sat unreviewed past the TTL.
    /// The expiry sweep uses the same cutoff in SQL; this backs its tests.
    pub fn review_overdue(&self, ttl_days: i64, now: DateTime<Utc>) -> bool {
        self.status == PrescriptionStatus::PendingApproval
            && self.uploaded_at + chrono::Duration::days(ttl_days) < now
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
