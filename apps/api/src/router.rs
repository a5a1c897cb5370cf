use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use scheduling_cell::handlers::SchedulingState;
use scheduling_cell::router::scheduling_routes;

pub fn create_router(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Rehab Scheduler API is running!" }))
        .nest("/scheduling", scheduling_routes(state))
}
