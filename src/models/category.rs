//! The fixed set of spending categories used for expenses.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::Error;

/// A category that describes what an expense was for.
///
/// Categories apply to expenses only; income has no category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Money put into investments.
    Investment,
    /// Debt repayments.
    Debt,
    /// Essential spending such as rent, groceries and utilities.
    Needs,
    /// Non-essential spending.
    Leisure,
}

impl Category {
    /// The lowercase string stored in the database and used in the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Investment => "investment",
            Category::Debt => "debt",
            Category::Needs => "needs",
            Category::Leisure => "leisure",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "investment" => Ok(Category::Investment),
            "debt" => Ok(Category::Debt),
            "needs" => Ok(Category::Needs),
            "leisure" => Ok(Category::Leisure),
            other => Err(Error::InvalidCategory(other.to_owned())),
        }
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}
