//! Cookie based authentication for the JSON API.
//!
//! Log-in sets a pair of private (encrypted) cookies holding the user ID and
//! the session expiry. The [auth_guard] middleware validates them on every
//! protected request, makes the user ID available to handlers as an
//! extension and slides the expiry forward.

pub(crate) mod cookie;
mod middleware;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use middleware::{AuthState, auth_guard};
