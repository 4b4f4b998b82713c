//! # arnica-db: Database Layer for Arnica
//!
//! SQLite storage for the Arnica pharmacy platform, accessed through sqlx.
//! The layer has three parts:
//!
//! - [`pool`] - one [`Database`] handle owning the connection pool
//!   (WAL mode, foreign keys on) and handing out repositories
//! - [`repository`] - one repository per aggregate; all SQL lives here,
//!   handlers never run queries directly
//! - [`migrations`] - the schema, embedded at compile time and applied
//!   on startup
//!
//! Business rules do not: arnica-core decides, this crate executes. The
//! one deliberate exception is the checkout transaction in the order
//! repository, which re-verifies stock and slot capacity inside the
//! write so a concurrent order cannot oversell a batch.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use arnica_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/db.sqlite")).await?;
//! let products = db.products().search("ibuprofen", None, 20, 0).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::branch::BranchRepository;
pub use repository::cart::CartRepository;
pub use repository::catalog::{CategoryRepository, SupplierRepository};
pub use repository::delivery::DeliveryRepository;
pub use repository::employee::EmployeeRepository;
pub use repository::inventory::{ExpiringBatch, InventoryRepository, StockLevel};
pub use repository::order::{NewOrder, OrderRepository};
pub use repository::prescription::PrescriptionRepository;
pub use repository::product::ProductRepository;
pub use repository::report::{
    ComplianceReport, InventoryReportRow, ReportKind, ReportRecord, ReportRepository,
    SalesGroupBy, SalesReport, SalesReportRow,
};
pub use repository::wishlist::WishlistRepository;
