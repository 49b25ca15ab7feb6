pub mod categories;
pub mod channels;
pub mod health;
pub mod reviews;
pub mod stats;

use axum::{middleware::from_fn_with_state, Router};

use crate::middleware::auth::bearer_auth;
use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    let open = Router::new()
        .merge(categories::router(state.clone()))
        .merge(channels::open_router(state.clone()))
        .merge(reviews::router(state.clone()))
        .merge(stats::router(state.clone()));

    let protected = channels::protected_router(state.clone())
        .layer(from_fn_with_state(state, bearer_auth));

    open.merge(protected)
}

pub fn health_router(state: AppState) -> Router {
    health::router(state)
}
