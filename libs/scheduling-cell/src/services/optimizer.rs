// libs/scheduling-cell/src/services/optimizer.rs
use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info, warn};

use generation_cell::{GenerationError, GenerationRequest, TextGenerator};

use crate::models::{
    bookings_from_records, format_clock_time, CandidateSlot, ScheduleOptimizerRequest,
    ScheduleSuggestion, SchedulingError,
};
use crate::services::slot_finder::SlotFinder;

pub const NO_AVAILABILITY_JUSTIFICATION: &str =
    "No time slots are available where the patient, therapist and device are all free in the requested range.";

const OPTIMIZER_TASK: &str = "schedule_optimization";

const OPTIMIZER_INSTRUCTIONS: &str = "You are scheduling therapy sessions for a rehabilitation clinic. \
Choose sessions only from `candidate_slots` so that the `scheduling_goal` is met and every entry in \
`constraints` is respected. Respond with a JSON object {\"suggested_slots\": [{\"patient_name\", \
\"therapist_id\", \"date\" (YYYY-MM-DD), \"start_time\" (hh:mm AM/PM), \"end_time\" (hh:mm AM/PM)}], \
\"justification\"} explaining why the schedule is optimal.";

/// Picks sessions out of the computed candidate slots with the help of the
/// text-generation backend. The slot search itself never leaves the process.
pub struct ScheduleOptimizerService {
    finder: SlotFinder,
    generator: Arc<dyn TextGenerator>,
}

impl ScheduleOptimizerService {
    pub fn new(finder: SlotFinder, generator: Arc<dyn TextGenerator>) -> Self {
        Self { finder, generator }
    }

    pub async fn optimize(
        &self,
        request: ScheduleOptimizerRequest,
    ) -> Result<ScheduleSuggestion, SchedulingError> {
        debug!("Optimizing schedule for {}", request.patient_name);

        let bookings = bookings_from_records(&request.existing_bookings)?;
        let candidates = self.finder.find_available_slots(
            &request.patient_availability,
            &request.therapist_availability,
            &request.device_availability,
            &bookings,
            request.session_duration_minutes,
            &request.search_range,
        )?;

        if candidates.is_empty() {
            info!("No candidate slots for {}, skipping generation", request.patient_name);
            return Ok(ScheduleSuggestion {
                suggested_slots: vec![],
                justification: NO_AVAILABILITY_JUSTIFICATION.to_string(),
            });
        }

        let context = json!({
            "patient_name": request.patient_name,
            "therapist_id": request.therapist_availability.resource_id,
            "device_id": request.device_availability.resource_id,
            "session_duration_minutes": request.session_duration_minutes,
            "scheduling_goal": request.scheduling_goal,
            "constraints": request.constraints,
            "candidate_slots": candidates,
        });

        let output = self.generator
            .generate(GenerationRequest::new(OPTIMIZER_TASK, OPTIMIZER_INSTRUCTIONS, context))
            .await?;

        let suggestion: ScheduleSuggestion = serde_json::from_value(output)
            .map_err(|e| GenerationError::InvalidOutput(e.to_string()))?;

        validate_suggestion(&suggestion, &candidates)?;

        info!(
            "Schedule optimized for {}: {} of {} candidate slots suggested",
            request.patient_name,
            suggestion.suggested_slots.len(),
            candidates.len()
        );
        Ok(suggestion)
    }
}

fn validate_suggestion(
    suggestion: &ScheduleSuggestion,
    candidates: &[CandidateSlot],
) -> Result<(), SchedulingError> {
    let allowed: HashSet<&CandidateSlot> = candidates.iter().collect();

    for session in &suggestion.suggested_slots {
        if !allowed.contains(&session.slot()) {
            warn!("Generator suggested a slot outside the candidates: {:?}", session);
            return Err(SchedulingError::InvalidSuggestion(format!(
                "{} {} - {}",
                session.date,
                format_clock_time(session.start_time),
                format_clock_time(session.end_time)
            )));
        }
    }

    Ok(())
}
