//! This file defines the `SavingsGoal` type, a named savings target with an
//! optional monthly auto-contribution.

use std::{fmt::Display, str::FromStr};

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    models::{Category, DatabaseID, UserID},
};

/// Whether a goal is still being saved towards or has been reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    /// The goal has not been reached yet.
    Active,
    /// The saved amount has reached the target.
    Completed,
}

impl GoalStatus {
    /// The lowercase string stored in the database and used in the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
        }
    }
}

impl Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(GoalStatus::Active),
            "completed" => Ok(GoalStatus::Completed),
            other => Err(Error::InvalidStatus(other.to_owned())),
        }
    }
}

impl ToSql for GoalStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for GoalStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

/// A savings target, e.g. "Emergency fund, $5000".
///
/// The amount saved so far is never stored on the goal. It is always derived
/// by summing the expenses linked to the goal, so the two cannot drift
/// apart. See [goal_progress](crate::goal_service::goal_progress).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavingsGoal {
    id: DatabaseID,
    user_id: UserID,
    name: String,
    target_amount: f64,
    monthly_amount: f64,
    category: Category,
    status: GoalStatus,
}

impl SavingsGoal {
    /// Create a goal from its parts, e.g. a database row.
    ///
    /// Most callers should go through a [GoalBuilder] and a store instead.
    pub fn new(
        id: DatabaseID,
        user_id: UserID,
        name: String,
        target_amount: f64,
        monthly_amount: f64,
        category: Category,
        status: GoalStatus,
    ) -> Self {
        Self {
            id,
            user_id,
            name,
            target_amount,
            monthly_amount,
            category,
            status,
        }
    }

    /// The ID of the goal.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The ID of the user that owns this goal.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// The name of the goal.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The amount to save.
    pub fn target_amount(&self) -> f64 {
        self.target_amount
    }

    /// The intended monthly contribution.
    pub fn monthly_amount(&self) -> f64 {
        self.monthly_amount
    }

    /// The category contributions to this goal are filed under.
    pub fn category(&self) -> Category {
        self.category
    }

    /// Whether the goal is active or completed.
    pub fn status(&self) -> GoalStatus {
        self.status
    }
}

/// Collects the data needed to create a [SavingsGoal] and validates it.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalBuilder {
    /// The ID of the user the goal belongs to.
    pub user_id: UserID,
    /// The name of the goal.
    pub name: String,
    /// The amount to save. Always positive.
    pub target_amount: f64,
    /// The intended monthly contribution. Always positive.
    pub monthly_amount: f64,
    /// The category contributions are filed under.
    pub category: Category,
}

impl GoalBuilder {
    /// Start building a new goal.
    ///
    /// # Errors
    /// Returns an [Error::EmptyName] if `name` is blank, or an
    /// [Error::InvalidAmount] if either amount is not positive.
    pub fn new(
        user_id: UserID,
        name: &str,
        target_amount: f64,
        monthly_amount: f64,
        category: Category,
    ) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        if target_amount <= 0.0 {
            return Err(Error::InvalidAmount(target_amount));
        }

        if monthly_amount <= 0.0 {
            return Err(Error::InvalidAmount(monthly_amount));
        }

        Ok(Self {
            user_id,
            name: name.to_owned(),
            target_amount,
            monthly_amount,
            category,
        })
    }
}
