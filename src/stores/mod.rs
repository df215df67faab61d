//! Contains traits and implementations for objects that store the domain
//! [models](crate::models).
//!
//! The traits model the handful of primitive operations the app needs from
//! its backend: filtered select, insert, update-by-id and delete-by-id over
//! the logical tables, plus a small key-value store for the materialization
//! month marker. Any backend that can offer these operations can replace the
//! bundled SQLite implementation.

mod goal;
mod marker;
mod recurring;
mod transaction;
mod user;

pub mod sql_store;
pub mod sqlite;

pub use goal::GoalStore;
pub use marker::MarkerStore;
pub use recurring::RecurringTemplateStore;
pub use transaction::{TransactionQuery, TransactionStore};
pub use user::UserStore;
