//! This module defines the domain data types.

pub use category::Category;
pub use goal::{GoalBuilder, GoalStatus, SavingsGoal};
pub use password::PasswordHash;
pub use recurring::{RecurringTemplate, TemplateBuilder, TemplateUpdate};
pub use transaction::{Transaction, TransactionBuilder, TransactionData, TransactionKind};
pub use user::{User, UserID};

mod category;
mod goal;
mod password;
mod recurring;
mod transaction;
mod user;

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseID = i64;
