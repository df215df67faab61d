//! This file defines the `Transaction` type, an income or expense event, and
//! the builder used to create one.

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    models::{Category, DatabaseID, UserID},
};

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in, e.g. wages.
    Income,
    /// Money going out.
    Expense,
}

impl TransactionKind {
    /// The lowercase string used in the API.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

/// The kind-specific part of a transaction.
///
/// Expenses carry a mandatory category and an optional link to a savings
/// goal; income carries neither. Modelling this as a sum type makes the
/// invalid combinations unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransactionData {
    /// An income event.
    Income,
    /// An expense event.
    Expense {
        /// What the money was spent on.
        category: Category,
        /// The savings goal this expense contributes to, if any.
        goal_id: Option<DatabaseID>,
    },
}

impl TransactionData {
    /// The discriminant of this data.
    pub fn kind(&self) -> TransactionKind {
        match self {
            TransactionData::Income => TransactionKind::Income,
            TransactionData::Expense { .. } => TransactionKind::Expense,
        }
    }
}

/// An income or expense, i.e. an event where money was either earned or
/// spent.
///
/// To create a new `Transaction`, use a [TransactionBuilder] and pass it to
/// a [TransactionStore](crate::stores::TransactionStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: DatabaseID,
    user_id: UserID,
    name: String,
    amount: f64,
    date: Date,
    /// The recurring template this row was materialized from, if any. A
    /// back-reference, not ownership.
    recurring_id: Option<DatabaseID>,
    is_recurring: bool,
    #[serde(flatten)]
    data: TransactionData,
}

impl Transaction {
    /// Create a transaction from its parts, e.g. a database row.
    ///
    /// Most callers should go through a [TransactionBuilder] and a store
    /// instead.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: DatabaseID,
        user_id: UserID,
        name: String,
        amount: f64,
        date: Date,
        recurring_id: Option<DatabaseID>,
        is_recurring: bool,
        data: TransactionData,
    ) -> Self {
        Self {
            id,
            user_id,
            name,
            amount,
            date,
            recurring_id,
            is_recurring,
            data,
        }
    }

    /// The ID of the transaction.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The ID of the user that owns this transaction.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// A short description of what the transaction was for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The amount of money earned or spent.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// When the transaction happened.
    ///
    /// Rows materialized from a recurring template are dated the first of
    /// the month they were materialized for.
    pub fn date(&self) -> Date {
        self.date
    }

    /// The recurring template this row was materialized from, if any.
    pub fn recurring_id(&self) -> Option<DatabaseID> {
        self.recurring_id
    }

    /// Whether this row was materialized from a recurring template.
    pub fn is_recurring(&self) -> bool {
        self.is_recurring
    }

    /// The kind-specific data of this transaction.
    pub fn data(&self) -> &TransactionData {
        &self.data
    }

    /// Whether this is income or an expense.
    pub fn kind(&self) -> TransactionKind {
        self.data.kind()
    }

    /// The expense category, if this is an expense.
    pub fn category(&self) -> Option<Category> {
        match self.data {
            TransactionData::Income => None,
            TransactionData::Expense { category, .. } => Some(category),
        }
    }

    /// The linked savings goal, if this is an expense contributing to one.
    pub fn goal_id(&self) -> Option<DatabaseID> {
        match self.data {
            TransactionData::Income => None,
            TransactionData::Expense { goal_id, .. } => goal_id,
        }
    }
}

/// Collects the data needed to create a [Transaction] and validates it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionBuilder {
    /// The ID of the user the transaction belongs to.
    pub user_id: UserID,
    /// A short description of what the transaction was for.
    pub name: String,
    /// The amount of money earned or spent. Always positive.
    pub amount: f64,
    /// When the transaction happened. Defaults to today (UTC).
    pub date: Date,
    /// The recurring template the transaction was materialized from.
    pub recurring_id: Option<DatabaseID>,
    /// Whether the transaction was materialized from a recurring template.
    pub is_recurring: bool,
    /// The kind-specific data.
    pub data: TransactionData,
}

impl TransactionBuilder {
    fn new(user_id: UserID, name: &str, amount: f64, data: TransactionData) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        if amount <= 0.0 {
            return Err(Error::InvalidAmount(amount));
        }

        Ok(Self {
            user_id,
            name: name.to_owned(),
            amount,
            date: OffsetDateTime::now_utc().date(),
            recurring_id: None,
            is_recurring: false,
            data,
        })
    }

    /// Start building an income transaction.
    ///
    /// # Errors
    /// Returns an [Error::EmptyName] if `name` is blank, or an
    /// [Error::InvalidAmount] if `amount` is not positive.
    pub fn income(user_id: UserID, name: &str, amount: f64) -> Result<Self, Error> {
        Self::new(user_id, name, amount, TransactionData::Income)
    }

    /// Start building an expense transaction.
    ///
    /// # Errors
    /// Returns an [Error::EmptyName] if `name` is blank, or an
    /// [Error::InvalidAmount] if `amount` is not positive.
    pub fn expense(
        user_id: UserID,
        name: &str,
        amount: f64,
        category: Category,
    ) -> Result<Self, Error> {
        Self::new(
            user_id,
            name,
            amount,
            TransactionData::Expense {
                category,
                goal_id: None,
            },
        )
    }

    /// Set the date of the transaction.
    pub fn date(mut self, date: Date) -> Self {
        self.date = date;
        self
    }

    /// Link the transaction to a savings goal.
    ///
    /// Has no effect on income, which cannot contribute to a goal.
    pub fn linked_goal(mut self, linked_goal_id: DatabaseID) -> Self {
        if let TransactionData::Expense { ref mut goal_id, .. } = self.data {
            *goal_id = Some(linked_goal_id);
        }

        self
    }

    /// Mark the transaction as materialized from the recurring template
    /// `template_id`.
    pub fn recurring(mut self, template_id: DatabaseID) -> Self {
        self.recurring_id = Some(template_id);
        self.is_recurring = true;
        self
    }

    /// The kind of the transaction being built.
    pub fn kind(&self) -> TransactionKind {
        self.data.kind()
    }
}
