//! The route handler for logging in a user.
//!
//! Logging in also runs the monthly materialization of recurring
//! transactions for the user, so a user who opens the app in a new month
//! immediately sees that month's recurring incomes and expenses.

use axum::{Json, extract::State};
use axum_extra::extract::PrivateCookieJar;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::set_auth_cookie,
    materialize::{MaterializeOutcome, run_monthly_import},
    models::UserID,
    stores::{GoalStore, MarkerStore, RecurringTemplateStore, TransactionStore, UserStore},
};

/// The data for a log-in request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The registered email address.
    pub email: String,
    /// The plaintext password.
    pub password: String,
}

/// The response to a successful log-in request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogInResponse {
    /// The logged in user's ID.
    pub id: UserID,
    /// The logged in user's email address.
    pub email: String,
    /// What the monthly materialization run did, or `None` if it had
    /// already run this month.
    pub import: Option<MaterializeOutcome>,
}

/// A route handler for logging in a user.
///
/// On success, the auth cookie is added to the response and the current
/// month's recurring transactions are materialized if they have not been
/// already.
///
/// # Errors
/// Returns an [Error::InvalidCredentials] if the email is not registered or
/// the password is wrong. The two cases are deliberately indistinguishable
/// to the client.
pub async fn log_in<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    jar: PrivateCookieJar,
    Json(data): Json<LogInData>,
) -> Result<(PrivateCookieJar, Json<LogInResponse>), Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let user = state
        .user_store
        .get_by_email(data.email.trim())
        .map_err(|error| match error {
            Error::NotFound => Error::InvalidCredentials,
            error => error,
        })?;

    user.password_hash().verify(&data.password)?;

    let jar = set_auth_cookie(jar, user.id(), state.cookie_duration)?;

    let today = OffsetDateTime::now_utc().date();
    let import = run_monthly_import(
        &state.template_store,
        &mut state.transaction_store,
        &mut state.marker_store,
        user.id(),
        today,
    )?;

    Ok((
        jar,
        Json(LogInResponse {
            id: user.id(),
            email: user.email().to_owned(),
            import,
        }),
    ))
}

#[cfg(test)]
mod log_in_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        auth::cookie::COOKIE_USER_ID, build_router, endpoints,
        stores::sql_store::create_app_state,
    };

    use super::LogInResponse;

    fn get_test_server() -> TestServer {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = create_app_state(db_connection, "42").expect("Could not create app state.");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    async fn register_test_user(server: &TestServer) {
        server
            .post(endpoints::REGISTER)
            .json(&json!({"email": "test@test.com", "password": "averysafeandsecurepassword"}))
            .await
            .assert_status(axum::http::StatusCode::CREATED);
    }

    #[tokio::test]
    async fn log_in_with_valid_credentials_sets_auth_cookie() {
        let server = get_test_server();
        register_test_user(&server).await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "test@test.com", "password": "averysafeandsecurepassword"}))
            .await;

        response.assert_status_ok();
        assert!(!response.cookie(COOKIE_USER_ID).value().is_empty());

        let body = response.json::<LogInResponse>();
        assert_eq!(body.email, "test@test.com");
    }

    #[tokio::test]
    async fn log_in_runs_monthly_import_once() {
        let server = get_test_server();
        register_test_user(&server).await;
        let credentials =
            json!({"email": "test@test.com", "password": "averysafeandsecurepassword"});

        let first = server.post(endpoints::LOG_IN).json(&credentials).await;
        first.assert_status_ok();
        assert!(first.json::<LogInResponse>().import.is_some());

        let second = server.post(endpoints::LOG_IN).json(&credentials).await;
        second.assert_status_ok();
        assert_eq!(second.json::<LogInResponse>().import, None);
    }

    #[tokio::test]
    async fn log_in_with_wrong_password_is_rejected() {
        let server = get_test_server();
        register_test_user(&server).await;

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "test@test.com", "password": "wrong"}))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn log_in_with_unknown_email_is_rejected() {
        let server = get_test_server();

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "nobody@test.com", "password": "whatever"}))
            .await;

        response.assert_status_unauthorized();
    }
}
