//! # Employee Repository
//!
//! Database operations for staff records. Roles are the fixed
//! [`EmployeeRole`] enum; there is no identity or login system, the
//! back office manages these rows directly.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use arnica_core::{Employee, EmployeeRole};

/// All employee columns, in struct field order.
const EMPLOYEE_COLUMNS: &str =
    "id, name, email, role, branch_id, is_active, created_at, updated_at";

/// Repository for employee database operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Creates a new EmployeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Lists employees, optionally filtered by branch and/or role.
    pub async fn list(
        &self,
        branch_id: Option<&str>,
        role: Option<EmployeeRole>,
    ) -> DbResult<Vec<Employee>> {
        let employees = match (branch_id, role) {
            (Some(branch), Some(role)) => {
                let sql = format!(
                    "SELECT {EMPLOYEE_COLUMNS} FROM employees \
                     WHERE branch_id = ?1 AND role = ?2 ORDER BY name"
                );
                sqlx::query_as::<_, Employee>(&sql)
                    .bind(branch)
                    .bind(role)
                    .fetch_all(&self.pool)
                    .await?
            }
            (Some(branch), None) => {
                let sql = format!(
                    "SELECT {EMPLOYEE_COLUMNS} FROM employees \
                     WHERE branch_id = ?1 ORDER BY name"
                );
                sqlx::query_as::<_, Employee>(&sql)
                    .bind(branch)
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, Some(role)) => {
                let sql = format!(
                    "SELECT {EMPLOYEE_COLUMNS} FROM employees \
                     WHERE role = ?1 ORDER BY name"
                );
                sqlx::query_as::<_, Employee>(&sql)
                    .bind(role)
                    .fetch_all(&self.pool)
                    .await?
            }
            (None, None) => {
                let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees ORDER BY name");
                sqlx::query_as::<_, Employee>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(employees)
    }

    /// Gets an employee by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?1");

        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    /// Inserts a new employee.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Email already exists
    /// * `Err(DbError::ForeignKeyViolation)` - Branch doesn't exist
    pub async fn insert(&self, employee: &Employee) -> DbResult<()> {
        debug!(email = %employee.email, role = %employee.role.as_str(), "Inserting employee");

        sqlx::query(
            "INSERT INTO employees (id, name, email, role, branch_id, is_active, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(employee.role)
        .bind(&employee.branch_id)
        .bind(employee.is_active)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an employee's details (not the role; see [`Self::set_role`]).
    pub async fn update(&self, employee: &Employee) -> DbResult<()> {
        debug!(id = %employee.id, "Updating employee");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE employees SET name = ?2, email = ?3, branch_id = ?4, is_active = ?5, \
             updated_at = ?6 WHERE id = ?1",
        )
        .bind(&employee.id)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(&employee.branch_id)
        .bind(employee.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", &employee.id));
        }

        Ok(())
    }

    /// Changes an employee's role.
    pub async fn set_role(&self, id: &str, role: EmployeeRole) -> DbResult<()> {
        debug!(id = %id, role = %role.as_str(), "Changing employee role");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE employees SET role = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(role)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Employee", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
