// libs/scheduling-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use generation_cell::{GenerationError, TextGenerator};
use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{
    bookings_from_records, PatientSlotSearchRequest, ResourceKind, ScheduleOptimizerRequest,
    SchedulingError, SlotSearchRequest,
};
use crate::services::{ScheduleOptimizerService, SchedulingDataSource, SlotFinder};

/// Shared state for the scheduling routes.
pub struct SchedulingState {
    pub config: AppConfig,
    pub data_source: Arc<dyn SchedulingDataSource>,
    pub generator: Arc<dyn TextGenerator>,
}

impl SchedulingState {
    pub fn new(
        config: AppConfig,
        data_source: Arc<dyn SchedulingDataSource>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self { config, data_source, generator }
    }

    pub fn slot_finder(&self) -> SlotFinder {
        SlotFinder::from_app_config(&self.config)
    }
}

fn to_app_error(error: SchedulingError) -> AppError {
    match error {
        SchedulingError::InvalidTime(_)
        | SchedulingError::InvalidWindow { .. }
        | SchedulingError::InvalidDuration(_)
        | SchedulingError::InvalidSearchRange { .. }
        | SchedulingError::InvalidBooking { .. } => AppError::ValidationError(error.to_string()),
        SchedulingError::ResourceNotFound { .. } => AppError::NotFound(error.to_string()),
        SchedulingError::DataSource(msg) => AppError::Internal(msg),
        SchedulingError::Generation(GenerationError::NotConfigured) => {
            AppError::ServiceUnavailable("Schedule optimization is not configured".to_string())
        },
        SchedulingError::Generation(e) => AppError::ExternalService(e.to_string()),
        SchedulingError::InvalidSuggestion(_) => AppError::ExternalService(error.to_string()),
    }
}

// ==============================================================================
// SLOT SEARCH HANDLERS
// ==============================================================================

pub async fn find_slots(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<SlotSearchRequest>,
) -> Result<Json<Value>, AppError> {
    let bookings = bookings_from_records(&request.existing_bookings).map_err(to_app_error)?;

    let slots = state.slot_finder()
        .find_available_slots(
            &request.patient_availability,
            &request.therapist_availability,
            &request.device_availability,
            &bookings,
            request.session_duration_minutes,
            &request.search_range,
        )
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "count": slots.len(),
        "slots": slots
    })))
}

pub async fn find_patient_slots(
    State(state): State<Arc<SchedulingState>>,
    Path(patient_id): Path<String>,
    Json(request): Json<PatientSlotSearchRequest>,
) -> Result<Json<Value>, AppError> {
    for (field, value) in [
        ("patient_id", patient_id.as_str()),
        ("therapist_id", request.therapist_id.as_str()),
        ("device_id", request.device_id.as_str()),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::BadRequest(format!("{} must not be empty", field)));
        }
    }

    let source = &state.data_source;

    let patient = source.load_availability(ResourceKind::Patient, &patient_id).await
        .map_err(to_app_error)?;
    let therapist = source.load_availability(ResourceKind::Therapist, &request.therapist_id).await
        .map_err(to_app_error)?;
    let device = source.load_availability(ResourceKind::Device, &request.device_id).await
        .map_err(to_app_error)?;
    let bookings = source.load_bookings(&request.search_range).await
        .map_err(to_app_error)?;

    let slots = state.slot_finder()
        .find_available_slots(
            &patient,
            &therapist,
            &device,
            &bookings,
            request.session_duration_minutes,
            &request.search_range,
        )
        .map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "patient_id": patient_id,
        "therapist_id": request.therapist_id,
        "device_id": request.device_id,
        "count": slots.len(),
        "slots": slots
    })))
}

pub async fn list_patients(
    State(state): State<Arc<SchedulingState>>,
) -> Result<Json<Value>, AppError> {
    let patients = state.data_source.load_patients().await.map_err(to_app_error)?;

    Ok(Json(json!({
        "patients": patients,
        "total": patients.len()
    })))
}

// ==============================================================================
// OPTIMIZATION HANDLERS
// ==============================================================================

pub async fn optimize_schedule(
    State(state): State<Arc<SchedulingState>>,
    Json(request): Json<ScheduleOptimizerRequest>,
) -> Result<Json<Value>, AppError> {
    let optimizer = ScheduleOptimizerService::new(state.slot_finder(), state.generator.clone());

    let suggestion = optimizer.optimize(request).await.map_err(to_app_error)?;

    Ok(Json(json!({
        "success": true,
        "suggestion": suggestion
    })))
}
