//! The route handler for materializing recurring transactions on demand.

use axum::{Extension, Json, extract::State};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    materialize::{MaterializeOutcome, materialize_month, month_key},
    models::UserID,
    stores::{GoalStore, MarkerStore, RecurringTemplateStore, TransactionStore, UserStore},
};

/// A route handler that materializes the current month's recurring
/// transactions for the current user.
///
/// Unlike the automatic run at log-in, this always bypasses the month
/// marker and goes to the per-template existence check, so it can be used
/// to pick up templates created after the automatic run. It is idempotent:
/// templates that already produced a transaction this month are skipped.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub async fn import_recurring<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<MaterializeOutcome>, Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let today = OffsetDateTime::now_utc().date();

    let outcome = materialize_month(
        &state.template_store,
        &mut state.transaction_store,
        user_id,
        today,
    )?;

    if let Err(error) = state.marker_store.set(user_id, &month_key(today)) {
        tracing::warn!(
            user_id = %user_id,
            %error,
            "failed to update the month marker after a manual import"
        );
    }

    Ok(Json(outcome))
}
