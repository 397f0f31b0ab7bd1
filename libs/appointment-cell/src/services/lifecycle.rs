// libs/appointment-cell/src/services/lifecycle.rs
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use shared_models::ValidationError;
use shared_utils::validation;

use crate::models::{AppointmentError, AppointmentStatus};

/// What applying a requested status to an appointment amounts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Unchanged,
    Transition(AppointmentStatus),
}

#[derive(Default)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed. Re-applying the current
    /// status is accepted and reported as `Unchanged`.
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<StatusChange, AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if current_status == new_status {
            return Ok(StatusChange::Unchanged);
        }

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        info!("Status transition validated: {} -> {}", current_status, new_status);
        Ok(StatusChange::Transition(new_status))
    }

    /// Get all valid next statuses for a given current status
    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Scheduled => vec![AppointmentStatus::Completed],
            // Terminal
            AppointmentStatus::Completed => vec![],
        }
    }

    pub fn parse_status(&self, code: Option<i32>) -> Result<AppointmentStatus, AppointmentError> {
        let code = validation::required("newStatus", "Status", code)?;
        AppointmentStatus::try_from(code).map_err(|e| {
            AppointmentError::Validation(ValidationError::new("newStatus", e.message))
        })
    }

    /// The start must lie strictly after `current_time`.
    pub fn validate_appointment_timing(
        &self,
        scheduled_start_time: DateTime<Utc>,
        current_time: DateTime<Utc>,
    ) -> Result<(), AppointmentError> {
        if scheduled_start_time <= current_time {
            return Err(ValidationError::new(
                "appointmentTime",
                "Appointment time must be in the future",
            )
            .into());
        }
        Ok(())
    }

    pub fn validate_reason(&self, reason: &str) -> Result<(), AppointmentError> {
        validation::length_between("reasonForVisit", reason, 3, 255)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::Duration;

    #[test]
    fn scheduled_can_complete() {
        let lifecycle = AppointmentLifecycleService::new();
        assert_eq!(
            lifecycle
                .validate_status_transition(AppointmentStatus::Scheduled, AppointmentStatus::Completed)
                .unwrap(),
            StatusChange::Transition(AppointmentStatus::Completed)
        );
    }

    #[test]
    fn completed_is_terminal() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.get_valid_transitions(AppointmentStatus::Completed).is_empty());
        assert_matches!(
            lifecycle.validate_status_transition(AppointmentStatus::Completed, AppointmentStatus::Scheduled),
            Err(AppointmentError::InvalidStatusTransition { .. })
        );
    }

    #[test]
    fn reapplying_a_status_is_a_no_op() {
        let lifecycle = AppointmentLifecycleService::new();
        assert_eq!(
            lifecycle
                .validate_status_transition(AppointmentStatus::Completed, AppointmentStatus::Completed)
                .unwrap(),
            StatusChange::Unchanged
        );
    }

    #[test]
    fn unknown_status_codes_are_rejected() {
        let lifecycle = AppointmentLifecycleService::new();
        assert_matches!(
            lifecycle.parse_status(Some(2)),
            Err(AppointmentError::Validation(e)) if e.field == "newStatus"
        );
        assert_matches!(lifecycle.parse_status(None), Err(AppointmentError::Validation(_)));
        assert_eq!(lifecycle.parse_status(Some(1)).unwrap(), AppointmentStatus::Completed);
    }

    #[test]
    fn start_must_be_strictly_in_the_future() {
        let lifecycle = AppointmentLifecycleService::new();
        let now = Utc::now();
        assert!(lifecycle.validate_appointment_timing(now + Duration::minutes(1), now).is_ok());
        assert_matches!(
            lifecycle.validate_appointment_timing(now, now),
            Err(AppointmentError::Validation(e)) if e.field == "appointmentTime"
        );
    }

    #[test]
    fn reason_length_is_bounded() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.validate_reason("Annual checkup").is_ok());
        assert!(lifecycle.validate_reason("ab").is_err());
        assert!(lifecycle.validate_reason(&"x".repeat(256)).is_err());
    }
}
