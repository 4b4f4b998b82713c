//! # Scheduled Jobs
//!
//! The nightly expiry sweep. One cron job flips overdue prescriptions to
//! expired, cancels the orders held on them (restoring their stock), and
//! logs a per-branch note about stock approaching expiry.
//!
//! The sweep is idempotent: rows it already flipped no longer match its
//! predicates, so an extra run is a no-op. Failures are logged and the
//! schedule keeps running; nothing here can take the API down.

use chrono::{Duration, Utc};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{error, info, warn};

use arnica_db::DbResult;

use crate::SharedState;

/// Horizon for the per-branch expiring-stock note in the sweep log.
const EXPIRY_WARNING_DAYS: i64 = 30;

/// Starts the scheduler with the sweep on `config.expiry_sweep_schedule`.
///
/// The returned handle must be kept alive for the schedule to fire.
pub async fn start(state: SharedState) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;
    let schedule = state.config.expiry_sweep_schedule.clone();

    let job = Job::new_async(schedule.as_str(), move |_id, _scheduler| {
        let state = state.clone();
        Box::pin(async move {
            match run_sweep(&state).await {
                Ok(summary) => info!(
                    prescriptions = summary.expired_prescriptions,
                    orders = summary.cancelled_orders,
                    "Expiry sweep finished"
                ),
                Err(err) => error!(error = %err, "Expiry sweep failed"),
            }
        })
    })?;
    scheduler.add(job).await?;
    scheduler.start().await?;

    info!(schedule = %schedule, "Expiry sweep scheduled");
    Ok(scheduler)
}

/// What one sweep did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub expired_prescriptions: usize,
    pub cancelled_orders: usize,
}

/// One pass of the sweep. Public so an operator endpoint or a test can
/// trigger it outside the schedule.
pub async fn run_sweep(state: &SharedState) -> DbResult<SweepSummary> {
    let now = Utc::now();
    let cutoff = now - Duration::days(state.config.prescription_pending_ttl_days);

    let mut expired = state
        .db
        .prescriptions()
        .expire_overdue_pending(cutoff)
        .await?;
    expired.extend(state.db.prescriptions().expire_lapsed_approved(now).await?);

    let mut cancelled_orders = 0;
    for prescription_id in &expired {
        let cancelled = state.db.orders().cancel_held(prescription_id, now).await?;
        if !cancelled.is_empty() {
            info!(
                prescription_id = %prescription_id,
                orders = cancelled.len(),
                "Cancelled orders held on expired prescription"
            );
        }
        cancelled_orders += cancelled.len();
    }

    for branch in state.db.branches().list().await? {
        let units = state
            .db
            .inventory()
            .expiring_unit_count(&branch.id, EXPIRY_WARNING_DAYS)
            .await?;
        if units > 0 {
            warn!(
                branch = %branch.name,
                units,
                days = EXPIRY_WARNING_DAYS,
                "Stock approaching expiry"
            );
        }
    }

    Ok(SweepSummary {
        expired_prescriptions: expired.len(),
        cancelled_orders,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
