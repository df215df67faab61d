//! Defines the transaction store trait.

use std::ops::RangeInclusive;

use time::Date;

use crate::{
    Error,
    models::{DatabaseID, Transaction, TransactionBuilder, TransactionKind, UserID},
};

/// Handles the creation and retrieval of income and expense transactions.
///
/// Income and expenses live in separate logical tables, so a transaction is
/// addressed by its kind and ID together.
pub trait TransactionStore {
    /// Create a new transaction in the store.
    fn create(&mut self, builder: TransactionBuilder) -> Result<Transaction, Error>;

    /// Create many transactions.
    ///
    /// There is no rollback on partial failure: transactions inserted before
    /// a failed insert stay in the store and the error is reported upward.
    fn create_batch(&mut self, builders: Vec<TransactionBuilder>)
    -> Result<Vec<Transaction>, Error>;

    /// Retrieve the transaction `id` of the given `kind` belonging to
    /// `user_id`.
    ///
    /// Rows belonging to other users are reported as [Error::NotFound].
    fn get(
        &self,
        kind: TransactionKind,
        id: DatabaseID,
        user_id: UserID,
    ) -> Result<Transaction, Error>;

    /// Retrieve transactions from the store in the way defined by `query`.
    fn get_query(&self, query: TransactionQuery) -> Result<Vec<Transaction>, Error>;

    /// Sum the amounts of all expenses linked to the goal `goal_id`.
    ///
    /// This is the authoritative source for a goal's progress; the total is
    /// never stored anywhere.
    fn sum_by_goal(&self, goal_id: DatabaseID, user_id: UserID) -> Result<f64, Error>;

    /// Delete the transaction `id` of the given `kind` belonging to
    /// `user_id`.
    fn delete(&mut self, kind: TransactionKind, id: DatabaseID, user_id: UserID)
    -> Result<(), Error>;

    /// Delete all expenses linked to the goal `goal_id`.
    fn delete_by_goal(&mut self, goal_id: DatabaseID, user_id: UserID) -> Result<(), Error>;

    /// Clear the goal link on all expenses linked to the goal `goal_id`,
    /// keeping the rows themselves.
    fn clear_goal_links(&mut self, goal_id: DatabaseID, user_id: UserID) -> Result<(), Error>;

    /// Clear the recurring template back-reference on all transactions that
    /// point at the template `template_id`.
    ///
    /// Used before a template is deleted so that no dangling references are
    /// left behind.
    fn clear_recurring_links(
        &mut self,
        template_id: DatabaseID,
        user_id: UserID,
    ) -> Result<(), Error>;
}

/// Defines how transactions should be fetched from
/// [TransactionStore::get_query].
///
/// All queries are scoped to a single user; the remaining filters are
/// optional.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionQuery {
    /// The user whose transactions to fetch.
    pub user_id: UserID,
    /// Fetch only income or only expenses. `None` fetches both kinds.
    pub kind: Option<TransactionKind>,
    /// Include transactions within `date_range` (inclusive).
    pub date_range: Option<RangeInclusive<Date>>,
    /// Include only transactions materialized from a recurring template.
    pub recurring_only: bool,
    /// Include only expenses linked to this goal.
    pub goal_id: Option<DatabaseID>,
}

impl TransactionQuery {
    /// A query for all transactions belonging to `user_id`.
    pub fn new(user_id: UserID) -> Self {
        Self {
            user_id,
            kind: None,
            date_range: None,
            recurring_only: false,
            goal_id: None,
        }
    }

    /// Restrict the query to a single kind.
    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Restrict the query to transactions within `date_range` (inclusive).
    pub fn date_range(mut self, date_range: RangeInclusive<Date>) -> Self {
        self.date_range = Some(date_range);
        self
    }

    /// Restrict the query to transactions materialized from a recurring
    /// template.
    pub fn recurring_only(mut self) -> Self {
        self.recurring_only = true;
        self
    }

    /// Restrict the query to expenses linked to the goal `goal_id`.
    pub fn goal(mut self, goal_id: DatabaseID) -> Self {
        self.goal_id = Some(goal_id);
        self
    }
}
