//! The route handlers for the JSON API.
//!
//! Handlers are generic over the store traits in [AppState](crate::AppState)
//! so they can be exercised against in-memory databases in tests.

mod goals;
mod import;
mod log_in;
mod log_out;
mod register;
mod summary;
mod templates;
mod transactions;

pub use goals::{create_contribution, create_goal, delete_goal, get_goals};
pub use import::import_recurring;
pub use log_in::log_in;
pub use log_out::log_out;
pub use register::register;
pub use summary::get_summary;
pub use templates::{
    create_template, delete_template, get_templates, set_template_active, update_template,
};
pub use transactions::{
    create_transaction, delete_transaction, get_transaction, get_transactions,
};
