//! The route handler for logging out the current user.

use axum::http::StatusCode;
use axum_extra::extract::PrivateCookieJar;

use crate::auth::invalidate_auth_cookie;

/// A route handler that logs out the current user by invalidating their
/// auth cookies.
///
/// This route sits outside the auth guard so that a client with an expired
/// session can still clear its cookies.
pub async fn log_out(jar: PrivateCookieJar) -> (StatusCode, PrivateCookieJar) {
    (StatusCode::OK, invalidate_auth_cookie(jar))
}

#[cfg(test)]
mod log_out_tests {
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    use crate::{
        auth::cookie::COOKIE_USER_ID, build_router, endpoints,
        stores::sql_store::create_app_state,
    };

    // The cookie values on the wire are encrypted, so deletion is asserted
    // through the expiry attributes instead of the value.
    fn assert_cookie_deleted(response: &axum_test::TestResponse) {
        let cookie = response.cookie(COOKIE_USER_ID);

        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
    }

    fn get_test_server() -> TestServer {
        let db_connection =
            Connection::open_in_memory().expect("Could not open database in memory.");
        let state = create_app_state(db_connection, "42").expect("Could not create app state.");

        TestServer::new(build_router(state)).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn log_out_invalidates_auth_cookie() {
        let server = get_test_server();
        server
            .post(endpoints::REGISTER)
            .json(&json!({"email": "test@test.com", "password": "averysafeandsecurepassword"}))
            .await;
        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "test@test.com", "password": "averysafeandsecurepassword"}))
            .await;
        let jar = response.cookies();

        let response = server.post(endpoints::LOG_OUT).add_cookies(jar).await;

        response.assert_status_ok();
        assert_cookie_deleted(&response);
    }

    #[tokio::test]
    async fn log_out_without_session_still_succeeds() {
        let server = get_test_server();

        let response = server.post(endpoints::LOG_OUT).await;

        response.assert_status_ok();
        assert_cookie_deleted(&response);
    }
}
