//! # Report Repository
//!
//! Read-only aggregation queries for the back-office reports, plus the
//! report-generation log.
//!
//! All aggregates are computed by SQLite at query time; nothing here is
//! cached or materialized. Each generation is recorded as a
//! [`ReportRecord`] so the back office can list what was run, by whom,
//! and with which parameters.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Dimension a sales report is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesGroupBy {
    Branch,
    Category,
    Supplier,
}

impl SalesGroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesGroupBy::Branch => "branch",
            SalesGroupBy::Category => "category",
            SalesGroupBy::Supplier => "supplier",
        }
    }
}

/// One group in a sales report. `group_key` is the branch, category, or
/// supplier name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SalesReportRow {
    pub group_key: String,
    pub orders: i64,
    pub units: i64,
    pub revenue_cents: i64,
}

/// A sales report over a date range.
///
/// Grand totals are computed independently of the grouping: an order
/// whose items span two categories appears in both category rows but
/// counts once in `total_orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub group_by: SalesGroupBy,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub rows: Vec<SalesReportRow>,
    pub total_orders: i64,
    pub total_units: i64,
    pub total_revenue_cents: i64,
}

/// Per-product stock posture at one branch.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReportRow {
    pub product_id: String,
    pub product_name: String,
    /// Usable units (unexpired batches).
    pub on_hand: i64,
    pub soonest_expiry: Option<NaiveDate>,
    /// Usable units expiring within the requested horizon.
    pub expiring_units: i64,
    /// Units sitting in expired batches that nobody discarded yet.
    pub expired_units: i64,
}

/// Prescription-handling aggregates over a date range.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    /// Documents uploaded in the range.
    pub received: i64,
    /// Approvals decided in the range.
    pub approved: i64,
    /// Rejections decided in the range.
    pub rejected: i64,
    /// Documents uploaded in the range that have since expired.
    pub expired: i64,
    /// Mean hours from upload to review, over reviews decided in the
    /// range. None when nothing was reviewed.
    pub mean_review_hours: Option<f64>,
    /// Prescription-requiring order lines sold in the range.
    pub controlled_lines: i64,
    /// Of those, lines whose order carries a prescription reference.
    pub covered_lines: i64,
}

/// Kind of a generated report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ReportKind {
    Sales,
    Inventory,
    Compliance,
}

impl ReportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Sales => "sales",
            ReportKind::Inventory => "inventory",
            ReportKind::Compliance => "compliance",
        }
    }
}

/// A log row recording one report generation.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    pub id: String,
    pub kind: ReportKind,
    /// JSON-encoded request parameters, as received.
    pub parameters: String,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
}

/// Repository for report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

/// Half-open UTC timestamp range covering `from`..=`to` as whole days.
fn day_bounds(from: NaiveDate, to: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = from.and_time(NaiveTime::MIN).and_utc();
    let end = (to + Duration::days(1)).and_time(NaiveTime::MIN).and_utc();
    (start, end)
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales over `from..=to`, grouped by branch, category, or supplier.
    /// Cancelled orders are excluded.
    pub async fn sales(
        &self,
        group_by: SalesGroupBy,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<SalesReport> {
        debug!(group_by = group_by.as_str(), %from, %to, "Sales report");

        let (start, end) = day_bounds(from, to);

        let sql = match group_by {
            SalesGroupBy::Branch => {
                "SELECT b.name AS group_key, \
                        COUNT(DISTINCT o.id) AS orders, \
                        SUM(oi.quantity) AS units, \
                        SUM(oi.line_total_cents) AS revenue_cents \
                 FROM orders o \
                 JOIN shipping s ON s.order_id = o.id \
                 JOIN branches b ON b.id = s.branch_id \
                 JOIN order_items oi ON oi.order_id = o.id \
                 WHERE o.status <> 'cancelled' AND o.created_at >= ?1 AND o.created_at < ?2 \
                 GROUP BY s.branch_id \
                 ORDER BY revenue_cents DESC"
            }
            SalesGroupBy::Category => {
                "SELECT COALESCE(c.name, 'Uncategorized') AS group_key, \
                        COUNT(DISTINCT o.id) AS orders, \
                        SUM(oi.quantity) AS units, \
                        SUM(oi.line_total_cents) AS revenue_cents \
                 FROM orders o \
                 JOIN order_items oi ON oi.order_id = o.id \
                 JOIN products p ON p.id = oi.product_id \
                 LEFT JOIN categories c ON c.id = p.category_id \
                 WHERE o.status <> 'cancelled' AND o.created_at >= ?1 AND o.created_at < ?2 \
                 GROUP BY p.category_id \
                 ORDER BY revenue_cents DESC"
            }
            SalesGroupBy::Supplier => {
                "SELECT COALESCE(su.name, 'Unattributed') AS group_key, \
                        COUNT(DISTINCT o.id) AS orders, \
                        SUM(oi.quantity) AS units, \
                        SUM(oi.line_total_cents) AS revenue_cents \
                 FROM orders o \
                 JOIN order_items oi ON oi.order_id = o.id \
                 JOIN products p ON p.id = oi.product_id \
                 LEFT JOIN suppliers su ON su.id = p.supplier_id \
                 WHERE o.status <> 'cancelled' AND o.created_at >= ?1 AND o.created_at < ?2 \
                 GROUP BY p.supplier_id \
                 ORDER BY revenue_cents DESC"
            }
        };

        let rows = sqlx::query_as::<_, SalesReportRow>(sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        let (total_orders, total_units, total_revenue_cents) =
            sqlx::query_as::<_, (i64, i64, i64)>(
                "SELECT COUNT(DISTINCT o.id), \
                        COALESCE(SUM(oi.quantity), 0), \
                        COALESCE(SUM(oi.line_total_cents), 0) \
                 FROM orders o \
                 JOIN order_items oi ON oi.order_id = o.id \
                 WHERE o.status <> 'cancelled' AND o.created_at >= ?1 AND o.created_at < ?2",
            )
            .bind(start)
            .bind(end)
            .fetch_one(&self.pool)
            .await?;

        Ok(SalesReport {
            group_by,
            from,
            to,
            rows,
            total_orders,
            total_units,
            total_revenue_cents,
        })
    }

    /// Stock posture per product at a branch: usable units, soonest
    /// expiry, units expiring within `days`, expired units on the shelf.
    pub async fn inventory(
        &self,
        branch_id: &str,
        days: i64,
        on: NaiveDate,
    ) -> DbResult<Vec<InventoryReportRow>> {
        debug!(branch = %branch_id, days, "Inventory report");

        let horizon = on + Duration::days(days);

        let rows = sqlx::query_as::<_, InventoryReportRow>(
            "SELECT p.id AS product_id, p.name AS product_name, \
                    COALESCE(SUM(CASE WHEN ib.expiry_date >= ?2 THEN ib.quantity END), 0) AS on_hand, \
                    MIN(CASE WHEN ib.expiry_date >= ?2 AND ib.quantity > 0 THEN ib.expiry_date END) AS soonest_expiry, \
                    COALESCE(SUM(CASE WHEN ib.expiry_date >= ?2 AND ib.expiry_date <= ?3 THEN ib.quantity END), 0) AS expiring_units, \
                    COALESCE(SUM(CASE WHEN ib.expiry_date < ?2 THEN ib.quantity END), 0) AS expired_units \
             FROM inventory_batches ib \
             JOIN products p ON p.id = ib.product_id \
             WHERE ib.branch_id = ?1 \
             GROUP BY p.id \
             ORDER BY p.name",
        )
        .bind(branch_id)
        .bind(on)
        .bind(horizon)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Prescription-handling aggregates over `from..=to`.
    pub async fn compliance(&self, from: NaiveDate, to: NaiveDate) -> DbResult<ComplianceReport> {
        debug!(%from, %to, "Compliance report");

        let (start, end) = day_bounds(from, to);

        let received: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM prescriptions WHERE uploaded_at >= ?1 AND uploaded_at < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        // Approvals leave rejection_reason NULL; rejections set it.
        let approved: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM prescriptions \
             WHERE reviewed_at >= ?1 AND reviewed_at < ?2 AND rejection_reason IS NULL",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let rejected: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM prescriptions \
             WHERE reviewed_at >= ?1 AND reviewed_at < ?2 AND rejection_reason IS NOT NULL",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let expired: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM prescriptions \
             WHERE status = 'expired' AND uploaded_at >= ?1 AND uploaded_at < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let mean_review_hours: Option<f64> = sqlx::query_scalar(
            "SELECT AVG((julianday(reviewed_at) - julianday(uploaded_at)) * 24.0) \
             FROM prescriptions \
             WHERE reviewed_at >= ?1 AND reviewed_at < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let (controlled_lines, covered_lines) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), \
                    COALESCE(SUM(CASE WHEN o.prescription_id IS NOT NULL THEN 1 END), 0) \
             FROM order_items oi \
             JOIN orders o ON o.id = oi.order_id \
             WHERE oi.requires_prescription = 1 \
               AND o.status <> 'cancelled' \
               AND o.created_at >= ?1 AND o.created_at < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(ComplianceReport {
            from,
            to,
            received,
            approved,
            rejected,
            expired,
            mean_review_hours,
            controlled_lines,
            covered_lines,
        })
    }

    /// Logs a report generation.
    pub async fn insert_record(&self, record: &ReportRecord) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO report_records (id, kind, parameters, generated_by, generated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&record.id)
        .bind(record.kind)
        .bind(&record.parameters)
        .bind(&record.generated_by)
        .bind(record.generated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists recent report generations, newest first.
    pub async fn list_records(&self, limit: i64) -> DbResult<Vec<ReportRecord>> {
        let records = sqlx::query_as::<_, ReportRecord>(
            "SELECT id, kind, parameters, generated_by, generated_at \
             FROM report_records ORDER BY generated_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
