//! Implements a SQLite backed transaction store.
//!
//! Income and expenses live in separate tables (`income_transactions` and
//! `expense_transactions`), matching the two logical row collections the
//! rest of the app works with.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, Row, params_from_iter, types::Value};

use crate::{
    Error,
    db::CreateTable,
    models::{
        DatabaseID, Transaction, TransactionBuilder, TransactionData, TransactionKind, UserID,
    },
    stores::{TransactionQuery, TransactionStore},
};

/// Stores income and expense transactions in a SQLite database.
///
/// Note that because transactions reference the
/// [User](crate::models::User) model, the user table must be set up in the
/// database.
#[derive(Debug, Clone)]
pub struct SQLiteTransactionStore {
    connection: Arc<Mutex<Connection>>,
}

const INCOME_COLUMNS: &str = "id, user_id, name, amount, date, recurring_id, is_recurring";
const EXPENSE_COLUMNS: &str =
    "id, user_id, name, amount, date, recurring_id, is_recurring, category, goal_id";

fn table_name(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Income => "income_transactions",
        TransactionKind::Expense => "expense_transactions",
    }
}

impl SQLiteTransactionStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn map_income_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
        Ok(Transaction::new(
            row.get(0)?,
            UserID::new(row.get(1)?),
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            TransactionData::Income,
        ))
    }

    fn map_expense_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
        Ok(Transaction::new(
            row.get(0)?,
            UserID::new(row.get(1)?),
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            TransactionData::Expense {
                category: row.get(7)?,
                goal_id: row.get(8)?,
            },
        ))
    }

    fn insert(connection: &Connection, builder: &TransactionBuilder) -> Result<Transaction, Error> {
        let transaction = match builder.data {
            TransactionData::Income => connection
                .prepare(&format!(
                    "INSERT INTO income_transactions
                        (user_id, name, amount, date, recurring_id, is_recurring)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     RETURNING {INCOME_COLUMNS}"
                ))?
                .query_row(
                    (
                        builder.user_id.as_i64(),
                        &builder.name,
                        builder.amount,
                        builder.date,
                        builder.recurring_id,
                        builder.is_recurring,
                    ),
                    Self::map_income_row,
                )?,
            TransactionData::Expense { category, goal_id } => connection
                .prepare(&format!(
                    "INSERT INTO expense_transactions
                        (user_id, name, amount, date, recurring_id, is_recurring, category, goal_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     RETURNING {EXPENSE_COLUMNS}"
                ))?
                .query_row(
                    (
                        builder.user_id.as_i64(),
                        &builder.name,
                        builder.amount,
                        builder.date,
                        builder.recurring_id,
                        builder.is_recurring,
                        category,
                        goal_id,
                    ),
                    Self::map_expense_row,
                )?,
        };

        Ok(transaction)
    }

    fn query_table(
        connection: &Connection,
        kind: TransactionKind,
        query: &TransactionQuery,
    ) -> Result<Vec<Transaction>, Error> {
        let columns = match kind {
            TransactionKind::Income => INCOME_COLUMNS,
            TransactionKind::Expense => EXPENSE_COLUMNS,
        };

        let mut where_clause_parts = vec!["user_id = ?1".to_string()];
        let mut query_parameters = vec![Value::Integer(query.user_id.as_i64())];

        if let Some(ref date_range) = query.date_range {
            where_clause_parts.push(format!(
                "date BETWEEN ?{} AND ?{}",
                query_parameters.len() + 1,
                query_parameters.len() + 2,
            ));
            query_parameters.push(Value::Text(date_range.start().to_string()));
            query_parameters.push(Value::Text(date_range.end().to_string()));
        }

        if query.recurring_only {
            where_clause_parts.push("is_recurring = 1".to_string());
        }

        if let Some(goal_id) = query.goal_id {
            where_clause_parts.push(format!("goal_id = ?{}", query_parameters.len() + 1));
            query_parameters.push(Value::Integer(goal_id));
        }

        let query_string = format!(
            "SELECT {columns} FROM {} WHERE {} ORDER BY date ASC, id ASC",
            table_name(kind),
            where_clause_parts.join(" AND "),
        );

        let map_row = match kind {
            TransactionKind::Income => Self::map_income_row,
            TransactionKind::Expense => Self::map_expense_row,
        };

        connection
            .prepare(&query_string)?
            .query_map(params_from_iter(query_parameters.iter()), map_row)?
            .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
            .collect()
    }
}

impl TransactionStore for SQLiteTransactionStore {
    /// Create a new transaction in the database.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();

        Self::insert(&connection, &builder)
    }

    /// Create many transactions in the database.
    ///
    /// The inserts are deliberately not wrapped in a database transaction:
    /// rows inserted before a failure stay in the database and the error is
    /// reported upward. Callers relying on this for materialization will
    /// pick up the remaining rows on their next run.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] on the first failed
    /// insert.
    fn create_batch(
        &mut self,
        builders: Vec<TransactionBuilder>,
    ) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().unwrap();

        let mut created = Vec::with_capacity(builders.len());

        for builder in &builders {
            created.push(Self::insert(&connection, builder)?);
        }

        Ok(created)
    }

    /// Retrieve a transaction in the database by its kind and `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a transaction owned by
    ///   `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(
        &self,
        kind: TransactionKind,
        id: DatabaseID,
        user_id: UserID,
    ) -> Result<Transaction, Error> {
        let connection = self.connection.lock().unwrap();

        let (columns, map_row): (_, fn(&Row) -> Result<Transaction, rusqlite::Error>) = match kind
        {
            TransactionKind::Income => (INCOME_COLUMNS, Self::map_income_row),
            TransactionKind::Expense => (EXPENSE_COLUMNS, Self::map_expense_row),
        };

        let transaction = connection
            .prepare(&format!(
                "SELECT {columns} FROM {} WHERE id = :id AND user_id = :user_id",
                table_name(kind)
            ))?
            .query_row(
                &[(":id", &id), (":user_id", &user_id.as_i64())],
                map_row,
            )?;

        Ok(transaction)
    }

    /// Query for transactions in the database.
    ///
    /// Results are sorted by date, oldest first.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn get_query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error> {
        let connection = self.connection.lock().unwrap();

        let mut transactions = Vec::new();

        // A goal filter can only ever match expenses.
        let skip_income =
            query.goal_id.is_some() || query.kind == Some(TransactionKind::Expense);

        if !skip_income {
            transactions.extend(Self::query_table(
                &connection,
                TransactionKind::Income,
                &query,
            )?);
        }

        if query.kind != Some(TransactionKind::Income) {
            transactions.extend(Self::query_table(
                &connection,
                TransactionKind::Expense,
                &query,
            )?);
        }

        transactions.sort_by_key(|transaction| (transaction.date(), transaction.id()));

        Ok(transactions)
    }

    /// Sum the amounts of all expenses linked to the goal `goal_id`.
    ///
    /// Returns 0.0 for a goal with no linked expenses.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn sum_by_goal(&self, goal_id: DatabaseID, user_id: UserID) -> Result<f64, Error> {
        let total = self
            .connection
            .lock()
            .unwrap()
            .query_row(
                "SELECT COALESCE(SUM(amount), 0.0) FROM expense_transactions
                 WHERE goal_id = :goal_id AND user_id = :user_id",
                &[(":goal_id", &goal_id), (":user_id", &user_id.as_i64())],
                |row| row.get(0),
            )?;

        Ok(total)
    }

    /// Delete the transaction `id` of the given `kind`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a transaction owned by
    ///   `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(
        &mut self,
        kind: TransactionKind,
        id: DatabaseID,
        user_id: UserID,
    ) -> Result<(), Error> {
        let rows_affected = self.connection.lock().unwrap().execute(
            &format!(
                "DELETE FROM {} WHERE id = ?1 AND user_id = ?2",
                table_name(kind)
            ),
            (id, user_id.as_i64()),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Delete all expenses linked to the goal `goal_id`.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn delete_by_goal(&mut self, goal_id: DatabaseID, user_id: UserID) -> Result<(), Error> {
        self.connection.lock().unwrap().execute(
            "DELETE FROM expense_transactions WHERE goal_id = ?1 AND user_id = ?2",
            (goal_id, user_id.as_i64()),
        )?;

        Ok(())
    }

    /// Clear the goal link on all expenses linked to the goal `goal_id`.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn clear_goal_links(&mut self, goal_id: DatabaseID, user_id: UserID) -> Result<(), Error> {
        self.connection.lock().unwrap().execute(
            "UPDATE expense_transactions SET goal_id = NULL
             WHERE goal_id = ?1 AND user_id = ?2",
            (goal_id, user_id.as_i64()),
        )?;

        Ok(())
    }

    /// Clear the template back-reference on all transactions materialized
    /// from the template `template_id`. The `is_recurring` flag is kept as a
    /// historical marker.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn clear_recurring_links(
        &mut self,
        template_id: DatabaseID,
        user_id: UserID,
    ) -> Result<(), Error> {
        let connection = self.connection.lock().unwrap();

        for table in ["income_transactions", "expense_transactions"] {
            connection.execute(
                &format!(
                    "UPDATE {table} SET recurring_id = NULL
                     WHERE recurring_id = ?1 AND user_id = ?2"
                ),
                (template_id, user_id.as_i64()),
            )?;
        }

        Ok(())
    }
}

impl CreateTable for SQLiteTransactionStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS income_transactions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    amount REAL NOT NULL,
                    date TEXT NOT NULL,
                    recurring_id INTEGER,
                    is_recurring INTEGER NOT NULL DEFAULT 0,
                    FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
                    )",
            (),
        )?;

        connection.execute(
            "CREATE TABLE IF NOT EXISTS expense_transactions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    amount REAL NOT NULL,
                    date TEXT NOT NULL,
                    recurring_id INTEGER,
                    is_recurring INTEGER NOT NULL DEFAULT 0,
                    category TEXT NOT NULL,
                    goal_id INTEGER,
                    FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
                    )",
            (),
        )?;

        Ok(())
    }
}
