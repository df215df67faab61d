//! Implements a SQLite backed recurring template store.

use std::sync::{Arc, Mutex};

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    db::{CreateTable, MapRow},
    models::{
        DatabaseID, RecurringTemplate, TemplateBuilder, TemplateUpdate, TransactionKind, UserID,
    },
    stores::RecurringTemplateStore,
};

/// Stores recurring transaction templates in a SQLite database.
#[derive(Debug, Clone)]
pub struct SQLiteTemplateStore {
    connection: Arc<Mutex<Connection>>,
}

const COLUMNS: &str = "id, user_id, name, amount, kind, category, active, goal_id, created_at";

impl SQLiteTemplateStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }
}

impl RecurringTemplateStore for SQLiteTemplateStore {
    /// Create a new template in the database.
    ///
    /// The creation date is stamped with today's date (UTC).
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn create(&mut self, builder: TemplateBuilder) -> Result<RecurringTemplate, Error> {
        let created_at = OffsetDateTime::now_utc().date();

        let template = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "INSERT INTO recurring_templates
                    (user_id, name, amount, kind, category, active, goal_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7)
                 RETURNING {COLUMNS}"
            ))?
            .query_row(
                (
                    builder.user_id.as_i64(),
                    &builder.name,
                    builder.amount,
                    builder.kind.as_str(),
                    builder.category,
                    builder.goal_id,
                    created_at,
                ),
                Self::map_row,
            )?;

        Ok(template)
    }

    /// Retrieve a template in the database by its `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a template owned by
    ///   `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn get(&self, id: DatabaseID, user_id: UserID) -> Result<RecurringTemplate, Error> {
        let template = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM recurring_templates
                 WHERE id = :id AND user_id = :user_id"
            ))?
            .query_row(&[(":id", &id), (":user_id", &user_id.as_i64())], Self::map_row)?;

        Ok(template)
    }

    /// Retrieve all templates belonging to `user_id`.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn get_by_user(&self, user_id: UserID) -> Result<Vec<RecurringTemplate>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM recurring_templates
                 WHERE user_id = :user_id ORDER BY id ASC"
            ))?
            .query_map(&[(":user_id", &user_id.as_i64())], Self::map_row)?
            .map(|maybe_template| maybe_template.map_err(Error::SqlError))
            .collect()
    }

    /// Retrieve the active templates belonging to `user_id`.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn get_active_by_user(&self, user_id: UserID) -> Result<Vec<RecurringTemplate>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM recurring_templates
                 WHERE user_id = :user_id AND active = 1 ORDER BY id ASC"
            ))?
            .query_map(&[(":user_id", &user_id.as_i64())], Self::map_row)?
            .map(|maybe_template| maybe_template.map_err(Error::SqlError))
            .collect()
    }

    /// Retrieve the active auto-contribution template for the goal
    /// `goal_id`, if one exists.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn get_active_by_goal(
        &self,
        goal_id: DatabaseID,
        user_id: UserID,
    ) -> Result<Option<RecurringTemplate>, Error> {
        let template = self
            .connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM recurring_templates
                 WHERE goal_id = :goal_id AND user_id = :user_id AND active = 1
                 LIMIT 1"
            ))?
            .query_row(
                &[(":goal_id", &goal_id), (":user_id", &user_id.as_i64())],
                Self::map_row,
            )
            .optional()?;

        Ok(template)
    }

    /// Retrieve all templates linked to the goal `goal_id`.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn get_by_goal(
        &self,
        goal_id: DatabaseID,
        user_id: UserID,
    ) -> Result<Vec<RecurringTemplate>, Error> {
        self.connection
            .lock()
            .unwrap()
            .prepare(&format!(
                "SELECT {COLUMNS} FROM recurring_templates
                 WHERE goal_id = :goal_id AND user_id = :user_id ORDER BY id ASC"
            ))?
            .query_map(
                &[(":goal_id", &goal_id), (":user_id", &user_id.as_i64())],
                Self::map_row,
            )?
            .map(|maybe_template| maybe_template.map_err(Error::SqlError))
            .collect()
    }

    /// Merge `update` into the template `id` and return the updated
    /// template.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a template owned by
    ///   `user_id`,
    /// - [Error::EmptyName], [Error::InvalidAmount] or
    ///   [Error::UnexpectedCategory] if the update fails validation,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn update(
        &mut self,
        id: DatabaseID,
        user_id: UserID,
        update: TemplateUpdate,
    ) -> Result<RecurringTemplate, Error> {
        let current = self.get(id, user_id)?;
        update.validate(current.kind())?;

        let name = match update.name {
            Some(name) => name.trim().to_owned(),
            None => current.name().to_owned(),
        };
        let amount = update.amount.unwrap_or(current.amount());
        let category = match current.kind() {
            TransactionKind::Income => None,
            TransactionKind::Expense => update.category.or(current.category()),
        };

        self.connection.lock().unwrap().execute(
            "UPDATE recurring_templates SET name = ?1, amount = ?2, category = ?3
             WHERE id = ?4 AND user_id = ?5",
            (&name, amount, category, id, user_id.as_i64()),
        )?;

        self.get(id, user_id)
    }

    /// Flip the active flag of the template `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a template owned by
    ///   `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn set_active(&mut self, id: DatabaseID, user_id: UserID, active: bool) -> Result<(), Error> {
        let rows_affected = self.connection.lock().unwrap().execute(
            "UPDATE recurring_templates SET active = ?1 WHERE id = ?2 AND user_id = ?3",
            (active, id, user_id.as_i64()),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }

    /// Clear the goal link on all templates linked to the goal `goal_id`.
    ///
    /// # Errors
    /// This function will return an [Error::SqlError] if there is a SQL
    /// error.
    fn clear_goal_link(&mut self, goal_id: DatabaseID, user_id: UserID) -> Result<(), Error> {
        self.connection.lock().unwrap().execute(
            "UPDATE recurring_templates SET goal_id = NULL
             WHERE goal_id = ?1 AND user_id = ?2",
            (goal_id, user_id.as_i64()),
        )?;

        Ok(())
    }

    /// Hard-delete the template `id`.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::NotFound] if `id` does not refer to a template owned by
    ///   `user_id`,
    /// - or [Error::SqlError] if there is some other SQL error.
    fn delete(&mut self, id: DatabaseID, user_id: UserID) -> Result<(), Error> {
        let rows_affected = self.connection.lock().unwrap().execute(
            "DELETE FROM recurring_templates WHERE id = ?1 AND user_id = ?2",
            (id, user_id.as_i64()),
        )?;

        if rows_affected == 0 {
            return Err(Error::NotFound);
        }

        Ok(())
    }
}

impl CreateTable for SQLiteTemplateStore {
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error> {
        connection.execute(
            "CREATE TABLE IF NOT EXISTS recurring_templates (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    name TEXT NOT NULL,
                    amount REAL NOT NULL,
                    kind TEXT NOT NULL,
                    category TEXT,
                    active INTEGER NOT NULL DEFAULT 1,
                    goal_id INTEGER,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
                    )",
            (),
        )?;

        Ok(())
    }
}

impl MapRow for SQLiteTemplateStore {
    type ReturnType = RecurringTemplate;

    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error> {
        let kind: String = row.get(offset + 4)?;
        let kind = match kind.as_str() {
            "income" => TransactionKind::Income,
            _ => TransactionKind::Expense,
        };

        Ok(RecurringTemplate::new(
            row.get(offset)?,
            UserID::new(row.get(offset + 1)?),
            row.get(offset + 2)?,
            row.get(offset + 3)?,
            kind,
            row.get(offset + 5)?,
            row.get(offset + 6)?,
            row.get(offset + 7)?,
            row.get(offset + 8)?,
        ))
    }
}

#[cfg(test)]
mod template_store_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        models::{Category, PasswordHash, TemplateBuilder, TemplateUpdate, TransactionKind, UserID},
        stores::{RecurringTemplateStore, UserStore, sqlite::SQLiteUserStore},
    };

    use super::SQLiteTemplateStore;

    fn get_test_store() -> (SQLiteTemplateStore, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        let user = SQLiteUserStore::new(connection.clone())
            .create(
                "hello@example.com",
                PasswordHash::from_hash_string("hunter2".to_owned()),
            )
            .unwrap();

        (SQLiteTemplateStore::new(connection), user.id())
    }

    fn rent_template(user_id: UserID) -> TemplateBuilder {
        TemplateBuilder::new(
            user_id,
            "Rent",
            800.0,
            TransactionKind::Expense,
            Some(Category::Needs),
        )
        .unwrap()
    }

    #[test]
    fn create_template_starts_active() {
        let (mut store, user_id) = get_test_store();

        let template = store.create(rent_template(user_id)).unwrap();

        assert!(template.id() > 0);
        assert!(template.is_active());
        assert_eq!(template.category(), Some(Category::Needs));
    }

    #[test]
    fn get_template_scopes_by_user() {
        let (mut store, user_id) = get_test_store();
        let template = store.create(rent_template(user_id)).unwrap();

        let other_user = UserID::new(user_id.as_i64() + 1);

        assert_eq!(store.get(template.id(), other_user), Err(Error::NotFound));
    }

    #[test]
    fn get_active_by_user_skips_inactive_templates() {
        let (mut store, user_id) = get_test_store();
        let active = store.create(rent_template(user_id)).unwrap();
        let inactive = store.create(rent_template(user_id)).unwrap();
        store.set_active(inactive.id(), user_id, false).unwrap();

        let got = store.get_active_by_user(user_id).unwrap();

        assert_eq!(got, vec![active]);
    }

    #[test]
    fn update_merges_partial_fields() {
        let (mut store, user_id) = get_test_store();
        let template = store.create(rent_template(user_id)).unwrap();

        let updated = store
            .update(
                template.id(),
                user_id,
                TemplateUpdate {
                    amount: Some(850.0),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.amount(), 850.0);
        assert_eq!(updated.name(), "Rent");
        assert_eq!(updated.category(), Some(Category::Needs));
    }

    #[test]
    fn update_rejects_category_on_income_template() {
        let (mut store, user_id) = get_test_store();
        let template = store
            .create(
                TemplateBuilder::new(user_id, "Wages", 1000.0, TransactionKind::Income, None)
                    .unwrap(),
            )
            .unwrap();

        let result = store.update(
            template.id(),
            user_id,
            TemplateUpdate {
                category: Some(Category::Needs),
                ..Default::default()
            },
        );

        assert_eq!(result, Err(Error::UnexpectedCategory));
    }

    #[test]
    fn get_active_by_goal_finds_only_active_linked_template() {
        let (mut store, user_id) = get_test_store();
        let unlinked = store.create(rent_template(user_id)).unwrap();
        let linked = store.create(rent_template(user_id).linked_goal(5)).unwrap();

        assert_eq!(store.get_active_by_goal(5, user_id), Ok(Some(linked.clone())));
        assert_eq!(store.get_active_by_goal(99, user_id), Ok(None));

        store.set_active(linked.id(), user_id, false).unwrap();
        assert_eq!(store.get_active_by_goal(5, user_id), Ok(None));

        // The unlinked template never matches a goal query.
        assert_eq!(store.get(unlinked.id(), user_id).unwrap().goal_id(), None);
    }

    #[test]
    fn clear_goal_link_keeps_template() {
        let (mut store, user_id) = get_test_store();
        let template = store.create(rent_template(user_id).linked_goal(5)).unwrap();

        store.clear_goal_link(5, user_id).unwrap();

        let got = store.get(template.id(), user_id).unwrap();
        assert_eq!(got.goal_id(), None);
    }

    #[test]
    fn delete_missing_template_returns_not_found() {
        let (mut store, user_id) = get_test_store();

        assert_eq!(store.delete(999, user_id), Err(Error::NotFound));
    }
}
