//! Back-office report endpoints. Every generation is computed at query
//! time and logged to the report-generation log with the parameters it
//! was run with.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use arnica_db::{
    ComplianceReport, InventoryReportRow, ReportKind, ReportRecord, SalesGroupBy, SalesReport,
};

use crate::error::ApiError;
use crate::routes::{parse_date, parse_enum, require_param};
use crate::SharedState;

const DEFAULT_EXPIRY_HORIZON_DAYS: i64 = 30;
const DEFAULT_RECORDS_LIMIT: i64 = 50;
const MAX_RECORDS_LIMIT: i64 = 500;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/reports", get(list_records))
        .route("/reports/sales", get(sales))
        .route("/reports/inventory", get(inventory))
        .route("/reports/compliance", get(compliance))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalesQuery {
    from: Option<String>,
    to: Option<String>,
    group_by: Option<String>,
    generated_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InventoryQuery {
    branch_id: Option<String>,
    expiring_within_days: Option<i64>,
    generated_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComplianceQuery {
    from: Option<String>,
    to: Option<String>,
    generated_by: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecordsQuery {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InventoryReportResponse {
    branch_id: String,
    expiring_within_days: i64,
    generated_at: DateTime<Utc>,
    rows: Vec<InventoryReportRow>,
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_range(
    from: Option<String>,
    to: Option<String>,
) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let from = parse_date("from", &require_param(from, "from")?)?;
    let to = parse_date("to", &require_param(to, "to")?)?;
    if from > to {
        return Err(ApiError::bad_request("from must not be after to"));
    }
    Ok((from, to))
}

async fn log_generation(
    state: &SharedState,
    kind: ReportKind,
    parameters: serde_json::Value,
    generated_by: Option<String>,
) -> Result<(), ApiError> {
    let record = ReportRecord {
        id: Uuid::new_v4().to_string(),
        kind,
        parameters: parameters.to_string(),
        generated_by: generated_by.unwrap_or_else(|| "unknown".to_string()),
        generated_at: Utc::now(),
    };
    state.db.reports().insert_record(&record).await?;
    Ok(())
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/reports/sales?from=&to=&groupBy=&generatedBy=`
async fn sales(
    State(state): State<SharedState>,
    Query(params): Query<SalesQuery>,
) -> Result<Json<SalesReport>, ApiError> {
    let (from, to) = parse_range(params.from, params.to)?;
    let group_by = match params.group_by {
        Some(g) => parse_enum::<SalesGroupBy>("groupBy", &g)?,
        None => SalesGroupBy::Branch,
    };

    let report = state.db.reports().sales(group_by, from, to).await?;
    log_generation(
        &state,
        ReportKind::Sales,
        json!({"groupBy": group_by.as_str(), "from": from, "to": to}),
        params.generated_by,
    )
    .await?;
    Ok(Json(report))
}

/// `GET /api/reports/inventory?branchId=&expiringWithinDays=&generatedBy=`
async fn inventory(
    State(state): State<SharedState>,
    Query(params): Query<InventoryQuery>,
) -> Result<Json<InventoryReportResponse>, ApiError> {
    let branch_id = require_param(params.branch_id, "branchId")?;
    let days = params
        .expiring_within_days
        .unwrap_or(DEFAULT_EXPIRY_HORIZON_DAYS);
    if days < 0 {
        return Err(ApiError::bad_request("expiringWithinDays must not be negative"));
    }

    let generated_at = Utc::now();
    let rows = state
        .db
        .reports()
        .inventory(&branch_id, days, generated_at.date_naive())
        .await?;
    log_generation(
        &state,
        ReportKind::Inventory,
        json!({"branchId": branch_id, "expiringWithinDays": days}),
        params.generated_by,
    )
    .await?;

    Ok(Json(InventoryReportResponse {
        branch_id,
        expiring_within_days: days,
        generated_at,
        rows,
    }))
}

/// `GET /api/reports/compliance?from=&to=&generatedBy=`
async fn compliance(
    State(state): State<SharedState>,
    Query(params): Query<ComplianceQuery>,
) -> Result<Json<ComplianceReport>, ApiError> {
    let (from, to) = parse_range(params.from, params.to)?;

    let report = state.db.reports().compliance(from, to).await?;
    log_generation(
        &state,
        ReportKind::Compliance,
        json!({"from": from, "to": to}),
        params.generated_by,
    )
    .await?;
    Ok(Json(report))
}

/// `GET /api/reports?limit=` - recent generations, newest first.
async fn list_records(
    State(state): State<SharedState>,
    Query(params): Query<RecordsQuery>,
) -> Result<Json<Vec<ReportRecord>>, ApiError> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_RECORDS_LIMIT)
        .clamp(1, MAX_RECORDS_LIMIT);
    let records = state.db.reports().list_records(limit).await?;
    Ok(Json(records))
}

// =============================================================================
// Unit Tests
// =============================================================================
