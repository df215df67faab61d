//! The route handler for registering a new user.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::{
    AppState, Error,
    models::{PasswordHash, UserID},
    stores::{GoalStore, MarkerStore, RecurringTemplateStore, TransactionStore, UserStore},
};

/// The data for a registration request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterData {
    /// The email address to register, used as the log-in name.
    pub email: String,
    /// The plaintext password.
    pub password: String,
}

/// A user as returned by the API, without the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    /// The user's ID.
    pub id: UserID,
    /// The user's email address.
    pub email: String,
}

/// A route handler for creating a new user account.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidCredentials] if the email or password is empty,
/// - [Error::DuplicateEmail] if the email is already registered,
/// - [Error::HashingError] if the password could not be hashed.
pub async fn register<R, T, G, U, M>(
    State(mut state): State<AppState<R, T, G, U, M>>,
    Json(data): Json<RegisterData>,
) -> Result<(StatusCode, Json<UserResponse>), Error>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    let email = data.email.trim();

    if email.is_empty() || data.password.is_empty() {
        return Err(Error::InvalidCredentials);
    }

    let password_hash = PasswordHash::new(&data.password)?;
    let user = state.user_store.create(email, password_hash)?;

    tracing::info!(user_id = user.id().as_i64(), "registered new user");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id(),
            email: user.email().to_owned(),
        }),
    ))
}

#[cfg(test)]
mod register_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{build_router, endpoints, stores::sql_store::create_app_state};

    fn get_test_server() -> TestServer {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = create_app_state(db_connection, "42").expect("Could not create app state.");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn register_creates_user() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({"email": "test@test.com", "password": "averysafeandsecurepassword"}))
            .await;

        response.assert_status(axum::http::StatusCode::CREATED);
        let user = response.json::<super::UserResponse>();
        assert_eq!(user.email, "test@test.com");
    }

    #[tokio::test]
    async fn register_with_duplicate_email_returns_conflict() {
        let server = get_test_server();
        let body = json!({"email": "test@test.com", "password": "averysafeandsecurepassword"});

        server.post(endpoints::REGISTER).json(&body).await;
        let response = server.post(endpoints::REGISTER).json(&body).await;

        response.assert_status(axum::http::StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn register_with_empty_password_is_rejected() {
        let server = get_test_server();

        let response = server
            .post(endpoints::REGISTER)
            .json(&json!({"email": "test@test.com", "password": ""}))
            .await;

        response.assert_status(axum::http::StatusCode::UNAUTHORIZED);
    }
}
