//! Implements a SQLite backed month marker store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension};

use crate::{Error, db::CreateTable, models::UserID, stores::MarkerStore};

/// Stores the per-user "last materialized month" marker in a SQLite
/// database, one row per user. The marker is only a cache, see
/// [MarkerStore].
#[derive(Debug, Clone)]
pub struct SQLiteMarkerStore {
    connection: Arc<Mutex<Connection>>,
}

impl SQLiteMarkerStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl MarkerStore for SQLiteMarkerStore {
    /// The last month automatic materialization ran for `user_id`, if any.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn get(&self, user_id: UserID) -> Result<Option<String>, Error> {
        let marker = self
            .connection
            .lock()
            .unwrap()
            .query_row(
                "SELECT month_key FROM materialization_markers WHERE user_id = :user_id",
                &[(":user_id", &user_id.as_i64())],
                |row| row.get(0),
            )
            .optional()?;

        Ok(marker)
    }

    /// Record `month_key` as the last processed month for `user_id`,
    /// overwriting any previous marker.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn set(&mut self, user_id: UserID, month_key: &str) -> Result<(), Error> {
        self.connection.lock().unwrap().execute(
            "INSERT INTO materialization_markers (user_id, month_key) VALUES (?1, ?2)
             ON CONFLICT(user_id) DO UPDATE SET month_key = excluded.month_key",
            (user_id.as_i64(), month_key),
        )?;

        Ok(())
    }

    /// Forget the marker for `user_id`.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn remove(&mut self, user_id: UserID) -> Result<(), Error> {
        self.connection.lock().unwrap().execute(
            "DELETE FROM materialization_markers WHERE user_id = ?1",
            (user_id.as_i64(),),
        )?;

        Ok(())
    }
}

impl CreateTable for SQLiteMarkerStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS materialization_markers (
                    user_id INTEGER PRIMARY KEY,
                    month_key TEXT NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
                    )",
            (),
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod marker_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        db::initialize,
        models::{PasswordHash, UserID},
        stores::{MarkerStore, UserStore, sqlite::SQLiteUserStore},
    };

    use super::SQLiteMarkerStore;

    fn get_test_store() -> (SQLiteMarkerStore, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        let user = SQLiteUserStore::new(connection.clone())
            .create(
                "hello@example.com",
                PasswordHash::from_hash_string("hunter2".to_owned()),
            )
            .unwrap();

        (SQLiteMarkerStore::new(connection), user.id())
    }

    #[test]
    fn get_returns_none_before_first_set() {
        let (store, user_id) = get_test_store();

        assert_eq!(store.get(user_id), Ok(None));
    }

    #[test]
    fn set_overwrites_previous_marker() {
        let (mut store, user_id) = get_test_store();

        store.set(user_id, "2025-3").unwrap();
        store.set(user_id, "2025-4").unwrap();

        assert_eq!(store.get(user_id), Ok(Some("2025-4".to_owned())));
    }

    #[test]
    fn remove_forgets_marker() {
        let (mut store, user_id) = get_test_store();
        store.set(user_id, "2025-3").unwrap();

        store.remove(user_id).unwrap();

        assert_eq!(store.get(user_id), Ok(None));
    }
}
