//! SQLite backed implementations of the store traits.

mod goal;
mod marker;
mod recurring;
mod transaction;
mod user;

pub use goal::SQLiteGoalStore;
pub use marker::SQLiteMarkerStore;
pub use recurring::SQLiteTemplateStore;
pub use transaction::SQLiteTransactionStore;
pub use user::SQLiteUserStore;
