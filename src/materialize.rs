//! The recurring transaction materialization service.
//!
//! Once per calendar month, every active recurring template should produce
//! exactly one concrete transaction. The dedup invariant (at most one
//! transaction per template per month) is enforced by checking the existing
//! rows for the month before inserting, never by a stored counter or the
//! month marker: the marker only short-circuits redundant runs.
//!
//! The check-then-insert is not guarded by a database constraint, so two
//! truly concurrent invocations can race and double-materialize. In
//! practice the shared connection mutex serializes in-process callers.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use time::{Date, util::days_in_year_month};

use crate::{
    Error,
    models::UserID,
    stores::{MarkerStore, RecurringTemplateStore, TransactionQuery, TransactionStore},
};

/// What a materialization run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeOutcome {
    /// The number of transactions created by this run.
    pub created: usize,
    /// The number of active templates skipped because they already had a
    /// transaction this month.
    pub skipped: usize,
}

/// The marker key for the month containing `date`, e.g. `"2025-3"` for
/// March 2025.
pub fn month_key(date: Date) -> String {
    format!("{}-{}", date.year(), u8::from(date.month()))
}

/// The inclusive range of days in the month containing `date`.
pub fn month_range(date: Date) -> RangeInclusive<Date> {
    let first = date.replace_day(1).expect("day 1 is valid in every month");
    let last = date
        .replace_day(days_in_year_month(date.year(), date.month()))
        .expect("the month length is a valid day");

    first..=last
}

/// Ensure every active template belonging to `user_id` has exactly one
/// transaction in the month containing `today`.
///
/// Materialized rows copy the template's name, amount, kind and category,
/// are dated the first of the month, and back-reference the template.
/// Templates that already have a recurring transaction this month are
/// skipped, so the operation is idempotent within a month.
///
/// # Errors
/// Returns the first store error encountered. There is no rollback: rows
/// created before the failure stay, and the failed template remains
/// unprocessed so the next invocation will retry it.
pub fn materialize_month<R, T>(
    templates: &R,
    transactions: &mut T,
    user_id: UserID,
    today: Date,
) -> Result<MaterializeOutcome, Error>
where
    R: RecurringTemplateStore,
    T: TransactionStore,
{
    let active_templates = templates.get_active_by_user(user_id)?;

    if active_templates.is_empty() {
        return Ok(MaterializeOutcome {
            created: 0,
            skipped: 0,
        });
    }

    let this_month = month_range(today);
    let first_of_month = *this_month.start();

    let existing = transactions.get_query(
        TransactionQuery::new(user_id)
            .date_range(this_month)
            .recurring_only(),
    )?;
    let already_materialized: HashSet<_> = existing
        .iter()
        .filter_map(|transaction| transaction.recurring_id())
        .collect();

    let pending: Vec<_> = active_templates
        .iter()
        .filter(|template| !already_materialized.contains(&template.id()))
        .collect();
    let skipped = active_templates.len() - pending.len();

    let builders = pending
        .into_iter()
        .map(|template| template.to_transaction(first_of_month))
        .collect::<Result<Vec<_>, _>>()?;

    let created = transactions.create_batch(builders)?.len();

    tracing::debug!(
        user_id = %user_id,
        created,
        skipped,
        "materialized recurring transactions"
    );

    Ok(MaterializeOutcome { created, skipped })
}

/// Run the automatic monthly materialization for `user_id` if it has not
/// already run this month.
///
/// The month marker is consulted first: when it matches the current month
/// the store round-trips are skipped entirely and `None` is returned. The
/// marker is only a cache; a stale or missing marker just means
/// [materialize_month] runs and finds nothing to do.
///
/// # Errors
/// Returns an error if the marker could not be read or materialization
/// failed. A failure to update the marker afterwards is logged and ignored,
/// since the next run will simply hit the (idempotent) existence check.
pub fn run_monthly_import<R, T, M>(
    templates: &R,
    transactions: &mut T,
    markers: &mut M,
    user_id: UserID,
    today: Date,
) -> Result<Option<MaterializeOutcome>, Error>
where
    R: RecurringTemplateStore,
    T: TransactionStore,
    M: MarkerStore,
{
    let current_month = month_key(today);

    if markers.get(user_id)? == Some(current_month.clone()) {
        return Ok(None);
    }

    let outcome = materialize_month(templates, transactions, user_id, today)?;

    if let Err(error) = markers.set(user_id, &current_month) {
        tracing::warn!(
            user_id = %user_id,
            "could not update the materialization marker: {error}"
        );
    }

    Ok(Some(outcome))
}
