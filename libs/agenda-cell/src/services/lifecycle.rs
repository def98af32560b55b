// libs/agenda-cell/src/services/lifecycle.rs
use std::fmt;

use tracing::{debug, warn};

use crate::models::{AgendaError, AppointmentStatus};

/// Operations applied to an existing appointment. Booking is creation and has
/// no current status to check against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentAction {
    Edit,
    Cancel,
    Complete,
    Reassign,
    Delete,
}

impl fmt::Display for AppointmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentAction::Edit => write!(f, "edit"),
            AppointmentAction::Cancel => write!(f, "cancel"),
            AppointmentAction::Complete => write!(f, "complete"),
            AppointmentAction::Reassign => write!(f, "reassign"),
            AppointmentAction::Delete => write!(f, "delete"),
        }
    }
}

pub struct LifecycleService;

impl LifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that an action is legal for the appointment's current status.
    pub fn validate_action(
        &self,
        current_status: &AppointmentStatus,
        action: AppointmentAction,
    ) -> Result<(), AgendaError> {
        debug!("Validating action {} against status {:?}", action, current_status);

        if !self.allowed_actions(current_status).contains(&action) {
            warn!("Invalid action attempted: {} on {:?} appointment", action, current_status);
            return Err(AgendaError::InvalidTransition(*current_status));
        }

        Ok(())
    }

    /// All legal actions for a given status.
    ///
    /// A cancelled appointment cannot be edited; its slot is taken over via
    /// reassign, which flips it back to confirmed with fresh booking data.
    /// A completed appointment accepts further complete calls so notes and
    /// photos can be updated, but cannot be cancelled or deleted.
    pub fn allowed_actions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentAction> {
        match current_status {
            AppointmentStatus::Confirmed => vec![
                AppointmentAction::Edit,
                AppointmentAction::Cancel,
                AppointmentAction::Complete,
                AppointmentAction::Delete,
            ],
            AppointmentStatus::Cancelled => vec![
                AppointmentAction::Reassign,
                AppointmentAction::Delete,
            ],
            AppointmentStatus::Completed => vec![AppointmentAction::Complete],
        }
    }
}

impl Default for LifecycleService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn confirmed_allows_the_working_set() {
        let lifecycle = LifecycleService::new();
        for action in [
            AppointmentAction::Edit,
            AppointmentAction::Cancel,
            AppointmentAction::Complete,
            AppointmentAction::Delete,
        ] {
            assert!(lifecycle
                .validate_action(&AppointmentStatus::Confirmed, action)
                .is_ok());
        }
        assert_matches!(
            lifecycle.validate_action(&AppointmentStatus::Confirmed, AppointmentAction::Reassign),
            Err(AgendaError::InvalidTransition(AppointmentStatus::Confirmed))
        );
    }

    #[test]
    fn cancelled_only_reassigns_or_deletes() {
        let lifecycle = LifecycleService::new();
        assert!(lifecycle
            .validate_action(&AppointmentStatus::Cancelled, AppointmentAction::Reassign)
            .is_ok());
        assert!(lifecycle
            .validate_action(&AppointmentStatus::Cancelled, AppointmentAction::Delete)
            .is_ok());
        for action in [
            AppointmentAction::Edit,
            AppointmentAction::Cancel,
            AppointmentAction::Complete,
        ] {
            assert_matches!(
                lifecycle.validate_action(&AppointmentStatus::Cancelled, action),
                Err(AgendaError::InvalidTransition(AppointmentStatus::Cancelled))
            );
        }
    }

    #[test]
    fn completed_accepts_only_further_completion_updates() {
        let lifecycle = LifecycleService::new();
        assert!(lifecycle
            .validate_action(&AppointmentStatus::Completed, AppointmentAction::Complete)
            .is_ok());
        for action in [
            AppointmentAction::Edit,
            AppointmentAction::Cancel,
            AppointmentAction::Reassign,
            AppointmentAction::Delete,
        ] {
            assert_matches!(
                lifecycle.validate_action(&AppointmentStatus::Completed, action),
                Err(AgendaError::InvalidTransition(AppointmentStatus::Completed))
            );
        }
    }
}
