//! Implements a SQLite backed savings goal store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row};

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{DatabaseID, GoalBuilder, GoalStatus, SavingsGoal, UserID},
    stores::GoalStore,
};

/// Stores savings goals in a SQLite database.
///
/// The goal rows never hold the amount saved so far; that is always derived
/// from the linked expenses.
#[derive(Debug, Clone)]
pub struct SQLiteGoalStore {
    connection: Arc<Mutex<Connection>>,
}

const COLUMNS: &str = "id, user_id, name, target_amount, monthly_amount, category, status";

impl SQLiteGoalStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl GoalStore for SQLiteGoalStore {
    /// Create a new goal in the database. New goals start active.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn create(&mut self, builder: GoalBuilder) -> Result<SavingsGoal, Error> {
        let goal = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "INSERT INTO savings_goals
                    (user_id, name, target_amount, monthly_amount, category, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, 'active')
                 RETURNING {COLUMNS}"
            ))?
            .query_row(
                (
                    builder.user_id.as_i64(),
                    &builder.name,
                    builder.target_amount,
                    builder.monthly_amount,
                    builder.category,
                ),
                Self::map_row,
            )?;

        Ok(goal)
    }

    /// Retrieve a goal in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a goal owned by
    ///   `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: DatabaseID, user_id: UserID) -> Result<SavingsGoal, Error> {
        let goal = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM savings_goals WHERE id = :id AND user_id = :user_id"
            ))?
            .query_row(&[(":id", &id), (":user_id", &user_id.as_i64())], Self::map_row)?;

        Ok(goal)
    }

    /// Retrieve all goals belonging to `user_id`.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn get_by_user(&self, user_id: UserID) -> Result<Vec<SavingsGoal>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM savings_goals
                 WHERE user_id = :user_id ORDER BY id ASC"
            ))?
            .query_map(&[(":user_id", &user_id.as_i64())], Self::map_row)?
            .map(|maybe_goal| maybe_goal.map_err(Error::SqlError))
            .collect()
    }

    /// Set the status of the goal `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a goal owned by
    ///   `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn set_status(
        &mut self,
        id: DatabaseID,
        user_id: UserID,
        status: GoalStatus,
    ) -> Result<(), Error> {
        let rows_affected = self.connection.lock().unwrap().execute(
            "UPDATE savings_goals SET status = ?1 WHERE id = ?2 AND user_id = ?3",
            (status, id, user_id.as_i64()),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Hard-delete the goal `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a goal owned by
    ///   `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, id: DatabaseID, user_id: UserID) -> Result<(), Error> {
        let rows_affected = self.connection.lock().unwrap().execute(
            "DELETE FROM savings_goals WHERE id = ?1 AND user_id = ?2",
            (id, user_id.as_i64()),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteGoalStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS savings_goals (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    target_amount REAL NOT NULL,
                    monthly_amount REAL NOT NULL,
                    category TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'active',
                    FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteGoalStore {
    type ReturnType = SavingsGoal;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        Ok(SavingsGoal::new(
            row.get(offset)?,
            UserID::new(row.get(offset + 1)?),
            row.get(offset + 2)?,
            row.get(offset + 3)?,
            row.get(offset + 4)?,
            row.get(offset + 5)?,
            row.get(offset + 6)?,
        ))
    }
}
