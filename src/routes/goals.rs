//! The route handlers for savings goals.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    goal_service::{self, ContributionOutcome, GoalDeletion},
    models::{Category, DatabaseID, GoalBuilder, SavingsGoal, UserID},
    stores::{GoalStore, MarkerStore, RecurringTemplateStore, TransactionStore, UserStore},
};

/// The data for creating a savings goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalForm {
    /// What the user is saving for.
    pub name: String,
    /// The amount to save in total. Must be positive.
    pub target_amount: f64,
    /// The suggested monthly contribution. Must be positive.
    pub monthly_amount: f64,
    /// The category contributions are filed under.
    pub category: Category,
}

/// A savings goal as returned by the API, with its derived progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalResponse {
    /// The goal itself.
    #[serde(flatten)]
    pub goal: SavingsGoal,
    /// The amount saved so far, derived from the linked expenses.
    pub current_amount: f64,
}

/// A route handler for creating a new savings goal.
///
/// # Errors
/// Returns an [Error::EmptyName] or [Error::InvalidAmount] if the name or
/// amounts are invalid.
pub async fn create_goal<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<GoalForm>,
) -> Result<(StatusCode, Json<GoalResponse>), Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let goal = state.goal_store.create(GoalBuilder::new(
        user_id,
        &form.name,
        form.target_amount,
        form.monthly_amount,
        form.category,
    )?)?;

    Ok((
        StatusCode::CREATED,
        Json(GoalResponse {
            goal,
            current_amount: 0.0,
        }),
    ))
}

/// A route handler for listing the current user's savings goals with their
/// progress.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub async fn get_goals<R, T, G, U, M>(
    State(state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<GoalResponse>>, Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let goals = state.goal_store.get_by_user(user_id)?;

    let mut responses = Vec::with_capacity(goals.len());

    for goal in goals {
        let current_amount = goal_service::goal_progress(&state.transaction_store, &goal)?;
        responses.push(GoalResponse {
            goal,
            current_amount,
        });
    }

    Ok(Json(responses))
}

/// The data for a contribution towards a savings goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionForm {
    /// The amount to contribute. Must be positive.
    pub amount: f64,
    /// Also set up a monthly auto-contribution of the same amount.
    #[serde(default)]
    pub recurring: bool,
}

/// A route handler for recording a contribution towards a savings goal.
///
/// See [goal_service::add_contribution] for the semantics of one-time and
/// recurring contributions and goal completion.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if the goal does not exist or belongs to another
///   user,
/// - [Error::InvalidAmount] if the amount is not positive.
pub async fn create_contribution<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<DatabaseID>,
    Json(form): Json<ContributionForm>,
) -> Result<(StatusCode, Json<ContributionOutcome>), Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let outcome = goal_service::add_contribution(
        &mut state.template_store,
        &mut state.transaction_store,
        &mut state.goal_store,
        user_id,
        goal_id,
        form.amount,
        form.recurring,
        OffsetDateTime::now_utc().date(),
    )?;

    Ok((StatusCode::CREATED, Json(outcome)))
}

/// A route handler for deleting a savings goal.
///
/// The query parameters `delete_recurring` and `delete_expenses` choose,
/// independently, whether the goal's auto-contribution templates and its
/// historical expenses are deleted along with it or merely unlinked. Both
/// default to false.
///
/// # Errors
/// Returns an [Error::NotFound] if the goal does not exist or belongs to
/// another user.
pub async fn delete_goal<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Path(goal_id): Path<DatabaseID>,
    Query(options): Query<GoalDeletion>,
) -> Result<StatusCode, Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    goal_service::delete_goal(
        &mut state.template_store,
        &mut state.transaction_store,
        &mut state.goal_store,
        user_id,
        goal_id,
        options,
    )?;

    Ok(StatusCode::NO_CONTENT)
}
