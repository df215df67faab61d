//! Assembles the route handlers into the application's router.

use axum::{
    Router,
    extract::FromRef,
    middleware,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    auth::{AuthState, auth_guard},
    endpoints, routes,
    stores::{GoalStore, MarkerStore, RecurringTemplateStore, TransactionStore, UserStore},
};

/// Return the router with all the app's routes.
///
/// Everything except registration, log-in and log-out sits behind the auth
/// guard and requires a valid session cookie.
pub fn build_router<R, T, G, U, M>(state: AppState<R, T, G, U, M>) -> Router
where
    R: RecurringTemplateStore + Clone + Send + Sync + 'static,
    T: TransactionStore + Clone + Send + Sync + 'static,
    G: GoalStore + Clone + Send + Sync + 'static,
    U: UserStore + Clone + Send + Sync + 'static,
    M: MarkerStore + Clone + Send + Sync + 'static,
{
    let auth_state = AuthState::from_ref(&state);

    let protected_routes = Router::new()
        .route(
            endpoints::TRANSACTIONS,
            post(routes::create_transaction).get(routes::get_transactions),
        )
        .route(
            endpoints::TRANSACTION,
            get(routes::get_transaction).delete(routes::delete_transaction),
        )
        .route(
            endpoints::TEMPLATES,
            post(routes::create_template).get(routes::get_templates),
        )
        .route(
            endpoints::TEMPLATE,
            put(routes::update_template).delete(routes::delete_template),
        )
        .route(endpoints::TEMPLATE_ACTIVE, put(routes::set_template_active))
        .route(
            endpoints::GOALS,
            post(routes::create_goal).get(routes::get_goals),
        )
        .route(endpoints::GOAL, delete(routes::delete_goal))
        .route(
            endpoints::GOAL_CONTRIBUTIONS,
            post(routes::create_contribution),
        )
        .route(endpoints::IMPORT_RECURRING, post(routes::import_recurring))
        .route(endpoints::SUMMARY, get(routes::get_summary))
        .route_layer(middleware::from_fn_with_state(auth_state, auth_guard));

    Router::new()
        .merge(protected_routes)
        .route(endpoints::REGISTER, post(routes::register))
        .route(endpoints::LOG_IN, post(routes::log_in))
        .route(endpoints::LOG_OUT, post(routes::log_out))
        .with_state(state)
}
