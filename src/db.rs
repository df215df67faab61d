//! This module defines traits for mapping the domain models to and from the
//! application's SQLite database, and a function for initializing the
//! database schema.

use rusqlite::{Connection, Row};

use crate::stores::sqlite::{
    SQLiteGoalStore, SQLiteMarkerStore, SQLiteTemplateStore, SQLiteTransactionStore,
    SQLiteUserStore,
};

/// A trait for adding an object schema to a database.
pub trait CreateTable {
    /// Create the table(s) for the model.
    ///
    /// # Errors
    /// Returns an error if there is an SQL error.
    fn create_table(connection: &Connection) -> Result<(), rusqlite::Error>;
}

/// A trait for mapping from a `rusqlite::Row` from a SQLite database to a
/// concrete rust type.
pub trait MapRow {
    /// The type that the implementation maps to.
    type ReturnType;

    /// Convert a row into a concrete type.
    ///
    /// # Errors
    /// Returns an error if a row column could not be read or converted.
    fn map_row(row: &Row) -> Result<Self::ReturnType, rusqlite::Error> {
        Self::map_row_with_offset(row, 0)
    }

    /// Convert a row into a concrete type, reading columns starting from
    /// `offset`. Useful for mapping rows from joined tables.
    ///
    /// # Errors
    /// Returns an error if a row column could not be read or converted.
    fn map_row_with_offset(row: &Row, offset: usize) -> Result<Self::ReturnType, rusqlite::Error>;
}

/// Create the tables for all the domain models.
///
/// # Errors
/// Returns an error if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute("PRAGMA foreign_keys = ON", ())?;

    SQLiteUserStore::create_table(connection)?;
    SQLiteGoalStore::create_table(connection)?;
    SQLiteTemplateStore::create_table(connection)?;
    SQLiteTransactionStore::create_table(connection)?;
    SQLiteMarkerStore::create_table(connection)?;

    Ok(())
}
