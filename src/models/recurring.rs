//! This file defines the `RecurringTemplate` type, a user-defined pattern
//! describing a monthly income or expense that is materialized into a
//! concrete transaction once per calendar month.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    models::{Category, DatabaseID, TransactionBuilder, TransactionKind, UserID},
};

/// A monthly recurring income or expense pattern.
///
/// Templates do not move money themselves; the materialization service
/// creates one concrete [Transaction](crate::models::Transaction) per
/// template per calendar month while the template is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTemplate {
    id: DatabaseID,
    user_id: UserID,
    name: String,
    amount: f64,
    kind: TransactionKind,
    category: Option<Category>,
    active: bool,
    /// Set when the template was created as an auto-contribution for a
    /// savings goal.
    goal_id: Option<DatabaseID>,
    created_at: Date,
}

impl RecurringTemplate {
    /// Create a template from its parts, e.g. a database row.
    ///
    /// Most callers should go through a [TemplateBuilder] and a store
    /// instead.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: DatabaseID,
        user_id: UserID,
        name: String,
        amount: f64,
        kind: TransactionKind,
        category: Option<Category>,
        active: bool,
        goal_id: Option<DatabaseID>,
        created_at: Date,
    ) -> Self {
        Self {
            id,
            user_id,
            name,
            amount,
            kind,
            category,
            active,
            goal_id,
            created_at,
        }
    }

    /// The ID of the template.
    pub fn id(&self) -> DatabaseID {
        self.id
    }

    /// The ID of the user that owns this template.
    pub fn user_id(&self) -> UserID {
        self.user_id
    }

    /// A short description, copied onto materialized transactions.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The amount materialized each month. Always positive.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// Whether the template produces income or expenses.
    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// The expense category. `Some` if and only if the template is an
    /// expense template.
    pub fn category(&self) -> Option<Category> {
        self.category
    }

    /// Whether the template is materialized each month. Inactive templates
    /// are skipped but keep their history.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The savings goal this template auto-contributes to, if any.
    pub fn goal_id(&self) -> Option<DatabaseID> {
        self.goal_id
    }

    /// When the template was created.
    pub fn created_at(&self) -> Date {
        self.created_at
    }

    /// Build the concrete transaction this template materializes into for
    /// the month starting at `date`.
    ///
    /// The name, amount, kind and category are copied from the template, the
    /// row is marked as recurring and back-references the template. Expense
    /// templates linked to a goal carry the link onto the transaction.
    pub fn to_transaction(&self, date: Date) -> Result<TransactionBuilder, Error> {
        let builder = match (self.kind, self.category) {
            (TransactionKind::Income, _) => {
                TransactionBuilder::income(self.user_id, &self.name, self.amount)?
            }
            (TransactionKind::Expense, Some(category)) => {
                TransactionBuilder::expense(self.user_id, &self.name, self.amount, category)?
            }
            (TransactionKind::Expense, None) => return Err(Error::MissingCategory),
        };

        let builder = match self.goal_id {
            Some(goal_id) => builder.linked_goal(goal_id),
            None => builder,
        };

        Ok(builder.date(date).recurring(self.id))
    }
}

/// Collects the data needed to create a [RecurringTemplate] and validates
/// it.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateBuilder {
    /// The ID of the user the template belongs to.
    pub user_id: UserID,
    /// A short description, copied onto materialized transactions.
    pub name: String,
    /// The amount materialized each month. Always positive.
    pub amount: f64,
    /// Whether the template produces income or expenses.
    pub kind: TransactionKind,
    /// The expense category. `Some` if and only if `kind` is expense.
    pub category: Option<Category>,
    /// The savings goal this template auto-contributes to, if any.
    pub goal_id: Option<DatabaseID>,
}

impl TemplateBuilder {
    /// Start building a new template.
    ///
    /// # Errors
    /// Returns an:
    /// - [Error::EmptyName] if `name` is blank,
    /// - [Error::InvalidAmount] if `amount` is not positive,
    /// - [Error::MissingCategory] if `kind` is expense and no category was
    ///   given,
    /// - [Error::UnexpectedCategory] if `kind` is income and a category was
    ///   given.
    pub fn new(
        user_id: UserID,
        name: &str,
        amount: f64,
        kind: TransactionKind,
        category: Option<Category>,
    ) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::EmptyName);
        }

        if amount <= 0.0 {
            return Err(Error::InvalidAmount(amount));
        }

        match (kind, category) {
            (TransactionKind::Expense, None) => return Err(Error::MissingCategory),
            (TransactionKind::Income, Some(_)) => return Err(Error::UnexpectedCategory),
            _ => {}
        }

        Ok(Self {
            user_id,
            name: name.to_owned(),
            amount,
            kind,
            category,
            goal_id: None,
        })
    }

    /// Link the template to a savings goal as its auto-contribution.
    pub fn linked_goal(mut self, goal_id: DatabaseID) -> Self {
        self.goal_id = Some(goal_id);
        self
    }
}

/// A partial update for a [RecurringTemplate].
///
/// Fields set to `None` keep their current value. The kind of a template
/// cannot change after creation.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
pub struct TemplateUpdate {
    /// A new name for the template.
    pub name: Option<String>,
    /// A new monthly amount.
    pub amount: Option<f64>,
    /// A new expense category. Rejected for income templates.
    pub category: Option<Category>,
}

impl TemplateUpdate {
    /// Validate this update against the template it will be merged into.
    ///
    /// # Errors
    /// Returns an [Error::EmptyName], [Error::InvalidAmount] or
    /// [Error::UnexpectedCategory] under the same rules as
    /// [TemplateBuilder::new].
    pub fn validate(&self, kind: TransactionKind) -> Result<(), Error> {
        if let Some(ref name) = self.name
            && name.trim().is_empty()
        {
            return Err(Error::EmptyName);
        }

        if let Some(amount) = self.amount
            && amount <= 0.0
        {
            return Err(Error::InvalidAmount(amount));
        }

        if self.category.is_some() && kind == TransactionKind::Income {
            return Err(Error::UnexpectedCategory);
        }

        Ok(())
    }
}


#[cfg(test)]
mod to_transaction_tests {
    use time::macros::date;

    use crate::models::{Category, RecurringTemplate, TransactionKind, UserID};

    #[test]
    fn copies_template_fields_and_back_reference() {
        let template = RecurringTemplate::new(
            7,
            UserID::new(1),
            "Gym".to_owned(),
            35.0,
            TransactionKind::Expense,
            Some(Category::Leisure),
            true,
            None,
            date!(2025 - 01 - 15),
        );

        let builder = template.to_transaction(date!(2025 - 03 - 01)).unwrap();

        assert_eq!(builder.name, "Gym");
        assert_eq!(builder.amount, 35.0);
        assert_eq!(builder.date, date!(2025 - 03 - 01));
        assert_eq!(builder.recurring_id, Some(7));
        assert!(builder.is_recurring);
    }
}
