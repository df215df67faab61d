//! The route handlers for recurring transaction templates.

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    models::{
        Category, DatabaseID, RecurringTemplate, TemplateBuilder, TemplateUpdate, TransactionKind,
        UserID,
    },
    stores::{GoalStore, MarkerStore, RecurringTemplateStore, TransactionStore, UserStore},
};

/// The data for creating a recurring transaction template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateForm {
    /// A short description, copied onto materialized transactions.
    pub name: String,
    /// The amount materialized each month. Must be positive.
    pub amount: f64,
    /// Whether the template produces income or expenses.
    pub kind: TransactionKind,
    /// The expense category. Required for expense templates, rejected for
    /// income templates.
    pub category: Option<Category>,
    /// The savings goal this template auto-contributes to, if any.
    pub goal_id: Option<DatabaseID>,
}

/// A route handler for creating a new recurring transaction template.
///
/// The template starts active and will be picked up by the next monthly
/// materialization run. It does not create a transaction by itself.
///
/// # Errors
/// Returns a:
/// - [Error::EmptyName] if the name is empty or whitespace,
/// - [Error::InvalidAmount] if the amount is not positive,
/// - [Error::MissingCategory] or [Error::UnexpectedCategory] if the
///   category does not match the kind,
/// - [Error::NotFound] if `goal_id` does not refer to a goal owned by the
///   current user.
pub async fn create_template<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Json(form): Json<TemplateForm>,
) -> Result<(StatusCode, Json<RecurringTemplate>), Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let mut builder =
        TemplateBuilder::new(user_id, &form.name, form.amount, form.kind, form.category)?;

    if let Some(goal_id) = form.goal_id {
        state.goal_store.get(goal_id, user_id)?;
        builder = builder.linked_goal(goal_id);
    }

    let template = state.template_store.create(builder)?;

    Ok((StatusCode::CREATED, Json(template)))
}

/// A route handler for listing the current user's templates, both active
/// and paused.
///
/// # Errors
/// Returns an [Error::SqlError] if there is an unexpected SQL error.
pub async fn get_templates<R, T, G, U, M>(
    State(state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<RecurringTemplate>>, Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let templates = state.template_store.get_by_user(user_id)?;

    Ok(Json(templates))
}

/// A route handler for updating a template's name, amount or category.
///
/// Changes only affect future materializations; transactions already
/// created from the template keep their original values.
///
/// # Errors
/// Returns a:
/// - [Error::NotFound] if the template does not exist or belongs to another
///   user,
/// - [Error::EmptyName], [Error::InvalidAmount] or
///   [Error::UnexpectedCategory] if the update is invalid for the
///   template's kind.
pub async fn update_template<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Path(template_id): Path<DatabaseID>,
    Json(update): Json<TemplateUpdate>,
) -> Result<Json<RecurringTemplate>, Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let template = state.template_store.update(template_id, user_id, update)?;

    Ok(Json(template))
}

/// The data for pausing or resuming a template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateActiveForm {
    /// Whether the template should be materialized each month.
    pub active: bool,
}

/// A route handler for pausing or resuming a template.
///
/// A paused template is skipped by materialization but keeps its history;
/// resuming it picks it up again from the next run. Resuming within a month
/// where the template was already materialized does not create a duplicate.
///
/// # Errors
/// Returns an [Error::NotFound] if the template does not exist or belongs
/// to another user.
pub async fn set_template_active<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Path(template_id): Path<DatabaseID>,
    Json(form): Json<TemplateActiveForm>,
) -> Result<Json<RecurringTemplate>, Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    state
        .template_store
        .set_active(template_id, user_id, form.active)?;
    let template = state.template_store.get(template_id, user_id)?;

    Ok(Json(template))
}

/// A route handler for deleting a template.
///
/// Transactions already materialized from the template are kept; their
/// back-reference to the template is cleared so no dangling reference
/// remains, but they stay marked as recurring in origin.
///
/// # Errors
/// Returns an [Error::NotFound] if the template does not exist or belongs
/// to another user.
pub async fn delete_template<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    Extension(user_id): Extension<UserID>,
    Path(template_id): Path<DatabaseID>,
) -> Result<StatusCode, Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    // Check ownership before touching the transactions so a failed delete
    // leaves the back-references intact.
    state.template_store.get(template_id, user_id)?;
    state
        .transaction_store
        .clear_recurring_links(template_id, user_id)?;
    state.template_store.delete(template_id, user_id)?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod template_route_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        build_router,
        endpoints::{self, format_endpoint},
        models::{Category, RecurringTemplate, Transaction},
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

    async fn create_rent_template(server: &TestServer) -> RecurringTemplate {
        let response = server
            .post(endpoints::TEMPLATES)
            .json(&json!({
                "name": "Rent",
                "amount": 450.0,
                "kind": "expense",
                "category": "needs",
            }))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<RecurringTemplate>()
    }

    #[tokio::test]
    async fn create_template_starts_active_without_transactions() {
        let server = get_logged_in_server().await;

        let template = create_rent_template(&server).await;

        assert!(template.is_active());
        assert_eq!(template.category(), Some(Category::Needs));

        // Creating a template must not create a transaction by itself.
        let transactions = server
            .get(endpoints::TRANSACTIONS)
            .await
            .json::<Vec<Transaction>>();
        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn create_income_template_with_category_is_rejected() {
        let server = get_logged_in_server().await;

        let response = server
            .post(endpoints::TEMPLATES)
            .json(&json!({
                "name": "Wages",
                "amount": 1000.0,
                "kind": "income",
                "category": "needs",
            }))
            .await;

        response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn update_template_changes_only_given_fields() {
        let server = get_logged_in_server().await;
        let template = create_rent_template(&server).await;

        let response = server
            .put(&format_endpoint(endpoints::TEMPLATE, template.id()))
            .json(&json!({"amount": 475.0}))
            .await;

        response.assert_status_ok();
        let updated = response.json::<RecurringTemplate>();
        assert_eq!(updated.amount(), 475.0);
        assert_eq!(updated.name(), "Rent");
        assert_eq!(updated.category(), Some(Category::Needs));
    }

    #[tokio::test]
    async fn pause_and_resume_template() {
        let server = get_logged_in_server().await;
        let template = create_rent_template(&server).await;
        let path = format_endpoint(endpoints::TEMPLATE_ACTIVE, template.id());

        let paused = server
            .put(&path)
            .json(&json!({"active": false}))
            .await
            .json::<RecurringTemplate>();
        assert!(!paused.is_active());

        let resumed = server
            .put(&path)
            .json(&json!({"active": true}))
            .await
            .json::<RecurringTemplate>();
        assert!(resumed.is_active());
    }

    #[tokio::test]
    async fn delete_template_keeps_materialized_transactions() {
        let server = get_logged_in_server().await;
        let template = create_rent_template(&server).await;

        // Materialize this month's transaction from the template.
        server
            .post(endpoints::IMPORT_RECURRING)
            .await
            .assert_status_ok();

        server
            .delete(&format_endpoint(endpoints::TEMPLATE, template.id()))
            .await
            .assert_status(axum::http::StatusCode::NO_CONTENT);

        let transactions = server
            .get(endpoints::TRANSACTIONS)
            .await
            .json::<Vec<Transaction>>();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].recurring_id(), None);
        assert!(transactions[0].is_recurring());
    }

    #[tokio::test]
    async fn delete_missing_template_returns_not_found() {
        let server = get_logged_in_server().await;

        server
            .delete(&format_endpoint(endpoints::TEMPLATE, 999))
            .await
            .assert_status_not_found();
    }
}
