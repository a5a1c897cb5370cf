// libs/scheduling-cell/src/router.rs
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::{self, SchedulingState};

pub fn scheduling_routes(state: Arc<SchedulingState>) -> Router {
    Router::new()
        .route("/slots", post(handlers::find_slots))
        .route("/patients", get(handlers::list_patients))
        .route("/patients/{patient_id}/slots", post(handlers::find_patient_slots))
        .route("/optimize", post(handlers::optimize_schedule))
        .with_state(state)
}
