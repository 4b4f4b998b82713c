//! Staff management: the roles listing and employee CRUD. Role changes go
//! through a dedicated endpoint so the general update can never move
//! someone into a workflow by accident.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use arnica_core::validation::{validate_email, validate_name};
use arnica_core::{Employee, EmployeeRole};

use crate::error::ApiError;
use crate::routes::parse_enum;
use crate::SharedState;

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/:id", get(get_employee).put(update_employee))
        .route("/employees/:id/role", put(change_role))
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmployeeListQuery {
    branch_id: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEmployeeBody {
    name: String,
    email: String,
    role: EmployeeRole,
    branch_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateEmployeeBody {
    name: String,
    email: String,
    branch_id: String,
    is_active: bool,
}

#[derive(Debug, Deserialize)]
struct ChangeRoleBody {
    role: EmployeeRole,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/roles` - the fixed role set, in display order.
async fn list_roles() -> Json<[EmployeeRole; 4]> {
    Json(EmployeeRole::all())
}

/// `GET /api/employees?branchId=&role=`
async fn list_employees(
    State(state): State<SharedState>,
    Query(params): Query<EmployeeListQuery>,
) -> Result<Json<Vec<Employee>>, ApiError> {
    let role = params
        .role
        .map(|r| parse_enum::<EmployeeRole>("role", &r))
        .transpose()?;
    let employees = state
        .db
        .employees()
        .list(params.branch_id.as_deref(), role)
        .await?;
    Ok(Json(employees))
}

/// `GET /api/employees/:id`
async fn get_employee(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
    let employee = state
        .db
        .employees()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Employee", &id))?;
    Ok(Json(employee))
}

/// `POST /api/employees`
async fn create_employee(
    State(state): State<SharedState>,
    Json(body): Json<CreateEmployeeBody>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    validate_name(&body.name)?;
    validate_email(&body.email)?;

    let now = Utc::now();
    let employee = Employee {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        email: body.email.trim().to_string(),
        role: body.role,
        branch_id: body.branch_id,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.employees().insert(&employee).await?;

    info!(id = %employee.id, role = %employee.role.as_str(), "Employee created");
    Ok((StatusCode::CREATED, Json(employee)))
}

/// `PUT /api/employees/:id` - details only; the role is untouched.
async fn update_employee(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateEmployeeBody>,
) -> Result<Json<Employee>, ApiError> {
    validate_name(&body.name)?;
    validate_email(&body.email)?;

    let mut employee = state
        .db
        .employees()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Employee", &id))?;

    employee.name = body.name.trim().to_string();
    employee.email = body.email.trim().to_string();
    employee.branch_id = body.branch_id;
    employee.is_active = body.is_active;
    state.db.employees().update(&employee).await?;

    let updated = state
        .db
        .employees()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Employee", &id))?;
    Ok(Json(updated))
}

/// `PUT /api/employees/:id/role`
async fn change_role(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(body): Json<ChangeRoleBody>,
) -> Result<Json<Employee>, ApiError> {
    state.db.employees().set_role(&id, body.role).await?;

    let employee = state
        .db
        .employees()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::missing("Employee", &id))?;

    info!(id = %employee.id, role = %employee.role.as_str(), "Employee role changed");
    Ok(Json(employee))
}

// =============================================================================
// Unit Tests
// =============================================================================
