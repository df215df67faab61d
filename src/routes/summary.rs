//! The route handler for the monthly income and spending summary.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use time::{Date, Month};

use crate::{
    AppState, Error,
    materialize::month_range,
    models::{Category, TransactionData, UserID},
    stores::{
        GoalStore, MarkerStore, RecurringTemplateStore, TransactionQuery, TransactionStore,
        UserStore,
    },
};

/// The month to summarize.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SummaryParams {
    /// The calendar year, e.g. 2025.
    pub year: i32,
    /// The calendar month, 1 through 12.
    pub month: u8,
}

/// The total spent in one expense category over a month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// The expense category.
    pub category: Category,
    /// The sum of the category's expenses in the month.
    pub total: f64,
}

/// A summary of one calendar month's incomes and expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    /// The summarized year.
    pub year: i32,
    /// The summarized month, 1 through 12.
    pub month: u8,
    /// The sum of all income in the month.
    pub income_total: f64,
    /// The sum of all expenses in the month.
    pub expense_total: f64,
    /// Income minus expenses.
    pub net: f64,
    /// The expense totals per category, in category order. Categories with
    /// no expenses are included with a zero total.
    pub by_category: Vec<CategoryTotal>,
}

/// A route handler that summarizes the current user's incomes and expenses
/// for one calendar month.
///
/// # Errors
/// Returns an [Error::InvalidDate] if `year` and `month` do not form a valid
/// date.
pub async fn get_summary<R, T, G, U, M>(
    State(state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<MonthlySummary>, Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let month = Month::try_from(params.month)
        .map_err(|error| Error::InvalidDate(error.to_string()))?;
    let first_of_month = Date::from_calendar_date(params.year, month, 1)
        .map_err(|error| Error::InvalidDate(error.to_string()))?;

    let transactions = state.transaction_store.get_query(
        TransactionQuery::new(user_id).date_range(month_range(first_of_month)),
    )?;

    let mut income_total = 0.0;
    let mut expense_total = 0.0;
    let mut by_category = [
        CategoryTotal {
            category: Category::Investment,
            total: 0.0,
        },
        CategoryTotal {
            category: Category::Debt,
            total: 0.0,
        },
        CategoryTotal {
            category: Category::Needs,
            total: 0.0,
        },
        CategoryTotal {
            category: Category::Leisure,
            total: 0.0,
        },
    ];

    for transaction in &transactions {
        match transaction.data() {
            TransactionData::Income => income_total += transaction.amount(),
            TransactionData::Expense { category, .. } => {
                expense_total += transaction.amount();

                if let Some(entry) = by_category
                    .iter_mut()
                    .find(|entry| entry.category == *category)
                {
                    entry.total += transaction.amount();
                }
            }
        }
    }

    Ok(Json(MonthlySummary {
        year: params.year,
        month: params.month,
        income_total,
        expense_total,
        net: income_total - expense_total,
        by_category: by_category.to_vec(),
    }))
}
