//! The route handlers for income and expense transactions.
//!
//! Incomes and expenses are stored separately, so a single transaction is
//! addressed by its kind and its ID rather than by ID alone.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    AppState, Error,
    models::{
        DatabaseID, Transaction, TransactionBuilder, TransactionData, TransactionKind, UserID,
    },
    stores::{
        GoalStore, MarkerStore, RecurringTemplateStore, TransactionQuery, TransactionStore,
        UserStore,
    },
};

/// The data for creating a transaction.
///
/// The `kind` field selects between income and expense; expenses carry a
/// category and an optional savings goal link.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionForm {
    /// A short description, e.g. "Rent".
    pub name: String,
    /// The amount of money earned or spent. Must be positive.
    pub amount: f64,
    /// The date of the transaction. Defaults to today.
    pub date: Option<Date>,
    /// The kind-specific fields.
    #[serde(flatten)]
    pub data: TransactionData,
}

/// A route handler for creating a new transaction.
///
/// # Errors
/// Returns a:
/// - [Error::EmptyName] if the name is empty or whitespace,
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::NotFound] if an expense links a goal that does not exist or
///   belongs to another user.
pub async fn create_transaction<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<TransactionForm>,
) -> Result<(StatusCode, Json<Transaction>), Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let mut builder = match form.data {
        TransactionData::Income => TransactionBuilder::income(user_id, &form.name, form.amount)?,
        TransactionData::Expense { category, goal_id } => {
            let mut builder =
                TransactionBuilder::expense(user_id, &form.name, form.amount, category)?;

            if let Some(goal_id) = goal_id {
                // Linking a goal that is not yours looks the same as linking
                // one that does not exist.
                state.goal_store.get(goal_id, user_id)?;
                builder = builder.linked_goal(goal_id);
            }

            builder
        }
    };

    if let Some(date) = form.date {
        builder = builder.date(date);
    }

    let transaction = state.transaction_store.create(builder)?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

/// The filters for listing transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionListParams {
    /// Only return transactions of this kind.
    pub kind: Option<TransactionKind>,
    /// Only return transactions on or after this date.
    pub from: Option<Date>,
    /// Only return transactions on or before this date.
    pub to: Option<Date>,
    /// Only return transactions materialized from a recurring template.
    #[serde(default)]
    pub recurring_only: bool,
    /// Only return expenses linked to this savings goal.
    pub goal_id: Option<DatabaseID>,
}

/// A route handler for listing the current user's transactions, newest
/// filters first applied. Results are ordered by date, then ID.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub async fn get_transactions<R, T, G, U, M>(
    State(state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Query(params): Query<TransactionListParams>,
) -> Result<Json<Vec<Transaction>>, Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let mut query = TransactionQuery::new(user_id);

    if let Some(kind) = params.kind {
        query = query.kind(kind);
    }

    match (params.from, params.to) {
        (None, None) => {}
        // A half-specified range is open at the missing end.
        (from, to) => {
            query = query.date_range(from.unwrap_or(Date::MIN)..=to.unwrap_or(Date::MAX));
        }
    }

    if params.recurring_only {
        query = query.recurring_only();
    }

    if let Some(goal_id) = params.goal_id {
        query = query.goal(goal_id);
    }

    let transactions = state.transaction_store.get_query(query)?;

    Ok(Json(transactions))
}

/// A route handler for getting a single transaction by kind and ID.
///
/// # Errors
/// Returns an [Error::NotFound] if the transaction does not exist or belongs
/// to another user.
pub async fn get_transaction<R, T, G, U, M>(
    State(state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Path((kind, transaction_id)): Path<(TransactionKind, DatabaseID)>,
) -> Result<Json<Transaction>, Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let transaction = state
        .transaction_store
        .get(kind, transaction_id, user_id)?;

    Ok(Json(transaction))
}

/// A route handler for deleting a single transaction by kind and ID.
///
/// # Errors
/// Returns an [Error::NotFound] if the transaction does not exist or belongs
/// to another user.
pub async fn delete_transaction<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Path((kind, transaction_id)): Path<(TransactionKind, DatabaseID)>,
) -> Result<StatusCode, Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    state
        .transaction_store
        .delete(kind, transaction_id, user_id)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod transaction_route_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::macros::date;

    use crate::{
        build_router,
        endpoints::{self, format_endpoint},
        models::{Category, Transaction, TransactionKind},
        stores::sql_store::create_app_state,
    };

    async fn get_logged_in_server() -> TestServer {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = create_app_state(db_connection, "42").expect("Could not create app state.");

        let mut server =
            TestServer::new(build_router(state)).expect("Could not create test server.");
        server.save_cookies();

        server
            .post(endpoints::REGISTER)
            .json(&json!({"email": "test@test.com", "password": "averysafeandsecurepassword"}))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
        server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "test@test.com", "password": "averysafeandsecurepassword"}))
            .await
            .assert_status_ok();

        server
    }

    #[tokio::test]
    async fn create_income_transaction() {
        let server = get_logged_in_server().await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "kind": "income",
                "name": "Wages",
                "amount": 1250.0,
                "date": "2025-03-14",
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let transaction = response.json::<Transaction>();
        assert_eq!(transaction.kind(), TransactionKind::Income);
        assert_eq!(transaction.name(), "Wages");
        assert_eq!(transaction.amount(), 1250.0);
        assert_eq!(transaction.date(), date!(2025 - 03 - 14));
    }

    #[tokio::test]
    async fn create_expense_transaction_with_category() {
        let server = get_logged_in_server().await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "kind": "expense",
                "name": "Groceries",
                "amount": 85.5,
                "category": "needs",
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let transaction = response.json::<Transaction>();
        assert_eq!(transaction.kind(), TransactionKind::Expense);
        assert_eq!(transaction.category(), Some(Category::Needs));
        assert_eq!(transaction.goal_id(), None);
    }

    #[tokio::test]
    async fn create_expense_without_category_is_rejected() {
        let server = get_logged_in_server().await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "kind": "expense",
                "name": "Groceries",
                "amount": 85.5,
            }))
            .await;

        response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn create_transaction_with_negative_amount_is_rejected() {
        let server = get_logged_in_server().await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "kind": "income",
                "name": "Wages",
                "amount": -1.0,
            }))
            .await;

        response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn create_expense_linking_missing_goal_is_rejected() {
        let server = get_logged_in_server().await;

        let response = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({
                "kind": "expense",
                "name": "Savings",
                "amount": 100.0,
                "category": "investment",
                "goal_id": 999,
            }))
            .await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn list_transactions_filters_by_kind() {
        let server = get_logged_in_server().await;
        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"kind": "income", "name": "Wages", "amount": 1000.0}))
            .await;
        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"kind": "expense", "name": "Rent", "amount": 400.0, "category": "needs"}))
            .await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("kind", "expense")
            .await;

        response.assert_status_ok();
        let transactions = response.json::<Vec<Transaction>>();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].name(), "Rent");
    }

    #[tokio::test]
    async fn list_transactions_with_half_specified_date_range() {
        let server = get_logged_in_server().await;
        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"kind": "income", "name": "Old wages", "amount": 1000.0, "date": "2020-01-15"}))
            .await;
        server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"kind": "income", "name": "Wages", "amount": 1000.0, "date": "2025-06-01"}))
            .await;

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("from", "2025-01-01")
            .await;
        response.assert_status_ok();
        let transactions = response.json::<Vec<Transaction>>();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].name(), "Wages");

        let response = server
            .get(endpoints::TRANSACTIONS)
            .add_query_param("to", "2024-12-31")
            .await;
        response.assert_status_ok();
        let transactions = response.json::<Vec<Transaction>>();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].name(), "Old wages");
    }

    #[tokio::test]
    async fn get_and_delete_transaction_round_trip() {
        let server = get_logged_in_server().await;
        let created = server
            .post(endpoints::TRANSACTIONS)
            .json(&json!({"kind": "income", "name": "Wages", "amount": 1000.0}))
            .await
            .json::<Transaction>();

        let path = format_endpoint(
            &endpoints::TRANSACTION.replace("{kind}", created.kind().as_str()),
            created.id(),
        );

        let response = server.get(&path).await;
        response.assert_status_ok();
        assert_eq!(response.json::<Transaction>().id(), created.id());

        server.delete(&path).await.assert_status(axum::http::StatusCode::NO_CONTENT);
        server.get(&path).await.assert_status_not_found();
    }

    #[tokio::test]
    async fn transactions_require_authentication() {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = create_app_state(db_connection, "42").expect("Could not create app state.");
        let server = TestServer::new(build_router(state)).expect("Could not create test server.");

        server.get(endpoints::TRANSACTIONS).await.assert_status_unauthorized();
    }
}
