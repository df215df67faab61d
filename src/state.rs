//! Implements a struct that holds the state of the REST server.

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    auth::cookie::DEFAULT_COOKIE_DURATION,
    stores::{GoalStore, MarkerStore, RecurringTemplateStore, TransactionStore, UserStore},
};

/// The state of the REST server.
///
/// Generic over the store traits so that the storage backend can be swapped
/// out, e.g. for in-memory fakes in tests.
#[derive(Debug, Clone)]
pub struct AppState<R, T, G, U, M>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The store for recurring transaction templates.
    pub template_store: R,
    /// The store for income and expense transactions.
    pub transaction_store: T,
    /// The store for savings goals.
    pub goal_store: G,
    /// The store for users.
    pub user_store: U,
    /// The store for the per-user materialization month marker.
    pub marker_store: M,
}

impl<R, T, G, U, M> AppState<R, T, G, U, M>
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    /// Create a new [AppState].
    pub fn new(
        cookie_secret: &str,
        template_store: R,
        transaction_store: T,
        goal_store: G,
        user_store: U,
        marker_store: M,
    ) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            template_store,
            transaction_store,
            goal_store,
            user_store,
            marker_store,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl<R, T, G, U, M> FromRef<AppState<R, T, G, U, M>> for Key
where
    R: RecurringTemplateStore + Send + Sync,
    T: TransactionStore + Send + Sync,
    G: GoalStore + Send + Sync,
    U: UserStore + Send + Sync,
    M: MarkerStore + Send + Sync,
{
    fn from_ref(state: &AppState<R, T, G, U, M>) -> Self {
        state.cookie_key.clone()
    }
}

/// Create a signing key for cookies from a `secret` string.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}
