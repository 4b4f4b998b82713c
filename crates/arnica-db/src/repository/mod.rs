//! # Repository Module
//!
//! One repository per aggregate; each file owns every SQL statement that
//! touches its tables. Handlers call `db.products().search(...)` and
//! match on [`DbError`](crate::error::DbError) categories, never on SQL.
//! All of them run against an in-memory SQLite in tests, so repository
//! tests exercise the real queries.
//!
//! - [`product::ProductRepository`] - Catalog CRUD and search
//! - [`catalog::CategoryRepository`] / [`catalog::SupplierRepository`] - Catalog reference data
//! - [`branch::BranchRepository`] - Pharmacy branches
//! - [`employee::EmployeeRepository`] - Staff and roles
//! - [`inventory::InventoryRepository`] - Batches, availability, FEFO draws
//! - [`cart::CartRepository`] - Server-side carts
//! - [`wishlist::WishlistRepository`] - Wishlist toggle
//! - [`prescription::PrescriptionRepository`] - Uploads and review updates
//! - [`order::OrderRepository`] - The checkout transaction and status moves
//! - [`delivery::DeliveryRepository`] - Slots and driver assignments
//! - [`report::ReportRepository`] - Aggregation queries and the generation log

pub mod branch;
pub mod cart;
pub mod catalog;
pub mod delivery;
pub mod employee;
pub mod inventory;
pub mod order;
pub mod prescription;
pub mod product;
pub mod report;
pub mod wishlist;

#[cfg(test)]
pub(crate) mod test_support;
