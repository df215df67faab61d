//! Savings goal contributions, derived progress and deletion semantics.
//!
//! A goal's saved amount is never stored. It is recomputed from the linked
//! expenses every time it is needed, so the displayed progress cannot drift
//! from the transaction history.

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    materialize::month_range,
    models::{
        DatabaseID, GoalStatus, RecurringTemplate, SavingsGoal, TemplateBuilder, Transaction,
        TransactionBuilder, TransactionKind, UserID,
    },
    stores::{GoalStore, RecurringTemplateStore, TransactionStore},
};

/// What [add_contribution] did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionOutcome {
    /// The expense recorded for this contribution.
    pub transaction: Transaction,
    /// The auto-contribution template, if this contribution created one.
    pub template: Option<RecurringTemplate>,
    /// True if a recurring contribution was requested but the goal already
    /// has an active auto-contribution template. The contribution is then
    /// recorded as a one-time expense instead.
    pub recurring_ignored: bool,
    /// The goal's saved amount after this contribution.
    pub current_amount: f64,
    /// True if this contribution completed the goal.
    pub goal_completed: bool,
}

/// The amount saved towards `goal` so far: the sum of all expenses linked
/// to it.
pub fn goal_progress<T>(transactions: &T, goal: &SavingsGoal) -> Result<f64, Error>
where
    T: TransactionStore,
{
    transactions.sum_by_goal(goal.id(), goal.user_id())
}

/// Record a contribution of `amount` towards the goal `goal_id`.
///
/// A one-time contribution becomes a single expense dated `today`, linked
/// to the goal and filed under the goal's category.
///
/// A recurring contribution additionally creates a monthly auto-contribution
/// template linked to the goal, and the first expense is dated the first of
/// the current month and back-references the template, so the monthly
/// materialization run will not double-book this month. Only one active
/// template per goal is allowed: if one already exists the recurring request
/// is ignored and the contribution lands as a one-time expense.
///
/// After the expense is recorded the goal's progress is recomputed; reaching
/// the target marks the goal completed and deactivates (never deletes) any
/// linked template.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if `goal_id` does not refer to a goal owned by
///   `user_id`,
/// - [Error::InvalidAmount] if `amount` is not positive,
/// - or any store error. The template-then-expense sequence is not atomic:
///   if the expense insert fails, the freshly created template survives and
///   will be picked up by the next materialization run.
pub fn add_contribution<R, T, G>(
    templates: &mut R,
    transactions: &mut T,
    goals: &mut G,
    user_id: UserID,
    goal_id: DatabaseID,
    amount: f64,
    recurring: bool,
    today: Date,
) -> Result<ContributionOutcome, Error>
where
    R: RecurringTemplateStore,
    T: TransactionStore,
    G: GoalStore,
{
    let goal = goals.get(goal_id, user_id)?;

    let contribution_name = format!("{} contribution", goal.name());
    let builder = TransactionBuilder::expense(user_id, &contribution_name, amount, goal.category())?
        .linked_goal(goal_id);

    let mut created_template = None;
    let mut recurring_ignored = false;

    let builder = if recurring {
        match templates.get_active_by_goal(goal_id, user_id)? {
            Some(_) => {
                tracing::debug!(
                    goal_id,
                    "goal already has an active auto-contribution template, \
                     recording a one-time contribution instead"
                );
                recurring_ignored = true;
                builder.date(today)
            }
            None => {
                let template = templates.create(
                    TemplateBuilder::new(
                        user_id,
                        &contribution_name,
                        amount,
                        TransactionKind::Expense,
                        Some(goal.category()),
                    )?
                    .linked_goal(goal_id),
                )?;

                let builder = builder
                    .date(*month_range(today).start())
                    .recurring(template.id());
                created_template = Some(template);
                builder
            }
        }
    } else {
        builder.date(today)
    };

    let transaction = transactions.create(builder)?;

    let current_amount = transactions.sum_by_goal(goal_id, user_id)?;
    let goal_completed = goal.status() == GoalStatus::Active && current_amount >= goal.target_amount();

    if goal_completed {
        goals.set_status(goal_id, user_id, GoalStatus::Completed)?;

        if let Some(template) = templates.get_active_by_goal(goal_id, user_id)? {
            templates.set_active(template.id(), user_id, false)?;
            if let Some(ref mut created) = created_template
                && created.id() == template.id()
            {
                *created = templates.get(template.id(), user_id)?;
            }
        }

        tracing::info!(goal_id, current_amount, "savings goal completed");
    }

    Ok(ContributionOutcome {
        transaction,
        template: created_template,
        recurring_ignored,
        current_amount,
        goal_completed,
    })
}

/// How to treat the rows linked to a goal when the goal itself is deleted.
///
/// The two choices are independent, matching the prompts the client shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
pub struct GoalDeletion {
    /// Delete the goal's auto-contribution templates instead of merely
    /// clearing their goal link.
    #[serde(default)]
    pub delete_recurring: bool,
    /// Delete the goal's historical expenses instead of merely clearing
    /// their goal link.
    #[serde(default)]
    pub delete_expenses: bool,
}

/// Delete the goal `goal_id` along with, or disconnected from, its linked
/// templates and expenses according to `options`.
///
/// Before a template is deleted, the back-references on transactions
/// materialized from it are cleared so no dangling references are left. A
/// surviving (unlinked) template keeps its back-references since they are
/// still valid.
///
/// # Errors
/// Returns a [Error::NotFound] if `goal_id` does not refer to a goal owned
/// by `user_id`, or any store error. The multi-step flow is not atomic; a
/// failure part-way leaves earlier steps applied.
pub fn delete_goal<R, T, G>(
    templates: &mut R,
    transactions: &mut T,
    goals: &mut G,
    user_id: UserID,
    goal_id: DatabaseID,
    options: GoalDeletion,
) -> Result<(), Error>
where
    R: RecurringTemplateStore,
    T: TransactionStore,
    G: GoalStore,
{
    // Fail early if the goal is absent or owned by someone else.
    goals.get(goal_id, user_id)?;

    if options.delete_recurring {
        for template in templates.get_by_goal(goal_id, user_id)? {
            transactions.clear_recurring_links(template.id(), user_id)?;
            templates.delete(template.id(), user_id)?;
        }
    } else {
        templates.clear_goal_link(goal_id, user_id)?;
    }

    if options.delete_expenses {
        transactions.delete_by_goal(goal_id, user_id)?;
    } else {
        transactions.clear_goal_links(goal_id, user_id)?;
    }

    goals.delete(goal_id, user_id)
}

#[cfg(test)]
mod goal_service_tests {
    use std::sync::{Arc, Mutex};

    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        materialize::materialize_month,
        models::{
            Category, GoalBuilder, GoalStatus, PasswordHash, TransactionBuilder, TransactionKind,
            UserID,
        },
        stores::{
            GoalStore, RecurringTemplateStore, TransactionQuery, TransactionStore, UserStore,
            sqlite::{SQLiteGoalStore, SQLiteTemplateStore, SQLiteTransactionStore, SQLiteUserStore},
        },
    };

    use super::{GoalDeletion, add_contribution, delete_goal, goal_progress};

    struct Fixture {
        templates: SQLiteTemplateStore,
        transactions: SQLiteTransactionStore,
        goals: SQLiteGoalStore,
        user_id: UserID,
    }

    fn get_fixture() -> Fixture {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let connection = Arc::new(Mutex::new(connection));

        let user = SQLiteUserStore::new(connection.clone())
            .create(
                "hello@example.com",
                PasswordHash::from_hash_string("hunter2".to_owned()),
            )
            .unwrap();

        Fixture {
            templates: SQLiteTemplateStore::new(connection.clone()),
            transactions: SQLiteTransactionStore::new(connection.clone()),
            goals: SQLiteGoalStore::new(connection),
            user_id: user.id(),
        }
    }

    fn create_goal(fixture: &mut Fixture, target: f64, monthly: f64) -> i64 {
        fixture
            .goals
            .create(
                GoalBuilder::new(
                    fixture.user_id,
                    "Emergency fund",
                    target,
                    monthly,
                    Category::Investment,
                )
                .unwrap(),
            )
            .unwrap()
            .id()
    }

    #[test]
    fn progress_is_derived_from_linked_expenses() {
        let mut fixture = get_fixture();
        let goal_id = create_goal(&mut fixture, 1000.0, 100.0);

        add_contribution(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            100.0,
            false,
            date!(2025 - 03 - 10),
        )
        .unwrap();
        // An unrelated expense must not count towards the goal.
        fixture
            .transactions
            .create(
                TransactionBuilder::expense(fixture.user_id, "Groceries", 55.0, Category::Needs)
                    .unwrap(),
            )
            .unwrap();

        let goal = fixture.goals.get(goal_id, fixture.user_id).unwrap();
        assert_eq!(goal_progress(&fixture.transactions, &goal), Ok(100.0));
    }

    #[test]
    fn recurring_contribution_creates_template_and_first_expense() {
        let mut fixture = get_fixture();
        let goal_id = create_goal(&mut fixture, 1000.0, 100.0);

        let outcome = add_contribution(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            100.0,
            true,
            date!(2025 - 03 - 10),
        )
        .unwrap();

        let template = outcome.template.expect("a template should be created");
        assert_eq!(template.goal_id(), Some(goal_id));
        assert!(template.is_active());
        assert_eq!(template.category(), Some(Category::Investment));

        assert_eq!(outcome.transaction.goal_id(), Some(goal_id));
        assert_eq!(outcome.transaction.recurring_id(), Some(template.id()));
        assert_eq!(outcome.transaction.date(), date!(2025 - 03 - 01));
        assert!(!outcome.recurring_ignored);
    }

    #[test]
    fn second_recurring_request_is_ignored_but_contribution_recorded() {
        let mut fixture = get_fixture();
        let goal_id = create_goal(&mut fixture, 1000.0, 100.0);

        add_contribution(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            100.0,
            true,
            date!(2025 - 03 - 10),
        )
        .unwrap();
        let second = add_contribution(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            50.0,
            true,
            date!(2025 - 03 - 12),
        )
        .unwrap();

        assert!(second.recurring_ignored);
        assert_eq!(second.template, None);
        assert_eq!(second.current_amount, 150.0);
        assert_eq!(
            fixture
                .templates
                .get_by_goal(goal_id, fixture.user_id)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn recurring_contribution_is_not_double_booked_by_monthly_import() {
        let mut fixture = get_fixture();
        let goal_id = create_goal(&mut fixture, 1000.0, 100.0);

        add_contribution(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            100.0,
            true,
            date!(2025 - 03 - 10),
        )
        .unwrap();

        let outcome = materialize_month(
            &fixture.templates,
            &mut fixture.transactions,
            fixture.user_id,
            date!(2025 - 03 - 15),
        )
        .unwrap();

        assert_eq!(outcome.created, 0);
        assert_eq!(outcome.skipped, 1);
    }

    #[test]
    fn completing_contribution_marks_goal_and_deactivates_template() {
        let mut fixture = get_fixture();
        let goal_id = create_goal(&mut fixture, 300.0, 100.0);

        add_contribution(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            100.0,
            true,
            date!(2025 - 03 - 10),
        )
        .unwrap();
        let final_contribution = add_contribution(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            200.0,
            false,
            date!(2025 - 04 - 10),
        )
        .unwrap();

        assert!(final_contribution.goal_completed);
        assert_eq!(final_contribution.current_amount, 300.0);

        let goal = fixture.goals.get(goal_id, fixture.user_id).unwrap();
        assert_eq!(goal.status(), GoalStatus::Completed);

        // The template survives, deactivated, to preserve history.
        let templates = fixture
            .templates
            .get_by_goal(goal_id, fixture.user_id)
            .unwrap();
        assert_eq!(templates.len(), 1);
        assert!(!templates[0].is_active());
    }

    #[test]
    fn completing_recurring_first_contribution_deactivates_new_template() {
        let mut fixture = get_fixture();
        let goal_id = create_goal(&mut fixture, 100.0, 100.0);

        let outcome = add_contribution(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            100.0,
            true,
            date!(2025 - 03 - 10),
        )
        .unwrap();

        assert!(outcome.goal_completed);
        let template = outcome.template.expect("a template should be created");
        assert!(!template.is_active());
    }

    #[test]
    fn delete_goal_keeping_template_but_deleting_expenses() {
        let mut fixture = get_fixture();
        let goal_id = create_goal(&mut fixture, 1000.0, 100.0);
        let outcome = add_contribution(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            100.0,
            true,
            date!(2025 - 03 - 10),
        )
        .unwrap();
        let template_id = outcome.template.unwrap().id();

        delete_goal(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            GoalDeletion {
                delete_recurring: false,
                delete_expenses: true,
            },
        )
        .unwrap();

        assert_eq!(
            fixture.goals.get(goal_id, fixture.user_id),
            Err(Error::NotFound)
        );

        let template = fixture.templates.get(template_id, fixture.user_id).unwrap();
        assert_eq!(template.goal_id(), None);

        let expenses = fixture
            .transactions
            .get_query(TransactionQuery::new(fixture.user_id).kind(TransactionKind::Expense))
            .unwrap();
        assert!(expenses.is_empty());
    }

    #[test]
    fn delete_goal_deleting_template_but_keeping_expenses() {
        let mut fixture = get_fixture();
        let goal_id = create_goal(&mut fixture, 1000.0, 100.0);
        let outcome = add_contribution(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            100.0,
            true,
            date!(2025 - 03 - 10),
        )
        .unwrap();
        let template_id = outcome.template.unwrap().id();

        delete_goal(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            goal_id,
            GoalDeletion {
                delete_recurring: true,
                delete_expenses: false,
            },
        )
        .unwrap();

        assert_eq!(
            fixture.templates.get(template_id, fixture.user_id),
            Err(Error::NotFound)
        );

        // The expense survives with both links cleared.
        let expenses = fixture
            .transactions
            .get_query(TransactionQuery::new(fixture.user_id).kind(TransactionKind::Expense))
            .unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].goal_id(), None);
        assert_eq!(expenses[0].recurring_id(), None);
    }

    #[test]
    fn delete_missing_goal_returns_not_found() {
        let mut fixture = get_fixture();

        let result = delete_goal(
            &mut fixture.templates,
            &mut fixture.transactions,
            &mut fixture.goals,
            fixture.user_id,
            999,
            GoalDeletion {
                delete_recurring: false,
                delete_expenses: false,
            },
        );

        assert_eq!(result, Err(Error::NotFound));
    }
}
