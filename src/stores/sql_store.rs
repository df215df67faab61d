//! Contains a convenience type alias and function for an
//! [AppState] that uses the SQLite backend.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{AppState, db::initialize};

use super::sqlite::{
    SQLiteGoalStore, SQLiteMarkerStore, SQLiteTemplateStore, SQLiteTransactionStore,
    SQLiteUserStore,
};

/// An alias for an [AppState] that uses SQLite for the backend.
pub type SqlAppState = AppState<
    SQLiteTemplateStore,
    SQLiteTransactionStore,
    SQLiteGoalStore,
    SQLiteUserStore,
    SQLiteMarkerStore,
>;

/// Creates an [AppState] instance that uses SQLite for the backend.
///
/// This function will modify the database by adding the tables for the
/// domain models.
///
/// # Errors
/// Returns an error if the database could not be initialized.
pub fn create_app_state(
    db_connection: Connection,
    cookie_secret: &str,
) -> Result<SqlAppState, rusqlite::Error> {
    initialize(&db_connection)?;

    let connection = Arc::new(Mutex::new(db_connection));

    Ok(AppState::new(
        cookie_secret,
        SQLiteTemplateStore::new(connection.clone()),
        SQLiteTransactionStore::new(connection.clone()),
        SQLiteGoalStore::new(connection.clone()),
        SQLiteUserStore::new(connection.clone()),
        SQLiteMarkerStore::new(connection),
    ))
}
