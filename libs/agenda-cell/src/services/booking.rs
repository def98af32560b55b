// libs/agenda-cell/src/services/booking.rs
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::directory::DirectoryAccess;
use crate::models::{
    AgendaError, Appointment, AppointmentFields, AppointmentStatus, BookAppointmentRequest,
    CancelAppointmentRequest, CompleteAppointmentRequest, EditAppointmentRequest,
    ReassignAppointmentRequest, SlotTime,
};
use crate::repository::{AppointmentRepository, AppointmentSnapshot};
use crate::services::lifecycle::{AppointmentAction, LifecycleService};

/// The scheduling core. Every operation reads an explicit snapshot of the
/// appointment set at its start, checks the lifecycle and slot guards, and
/// performs exactly one repository write. Failures are typed and surface to
/// the caller; nothing is retried here.
pub struct BookingEngine {
    repository: Arc<dyn AppointmentRepository>,
    directories: Arc<dyn DirectoryAccess>,
    lifecycle: LifecycleService,
}

impl BookingEngine {
    pub fn new(repository: Arc<dyn AppointmentRepository>, directories: Arc<dyn DirectoryAccess>) -> Self {
        Self {
            repository,
            directories,
            lifecycle: LifecycleService::new(),
        }
    }

    /// Current appointment set; cheap clone of the cached snapshot.
    pub fn appointments(&self) -> AppointmentSnapshot {
        self.repository.snapshot()
    }

    /// Live feed of snapshots for presentation layers.
    pub fn subscribe(&self) -> watch::Receiver<AppointmentSnapshot> {
        self.repository.subscribe()
    }

    pub fn get(&self, id: &str) -> Result<Appointment, AgendaError> {
        self.repository
            .snapshot()
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(AgendaError::NotFound)
    }

    /// Book a new appointment into a free slot. The snapshot check rejects
    /// known conflicts up front; the repository's conditional create decides
    /// the winner when two operators race for the same slot.
    pub async fn book(&self, request: BookAppointmentRequest) -> Result<Appointment, AgendaError> {
        info!(
            "Booking {} for {} on {} {} at {}",
            request.treatment, request.patient, request.date, request.time, request.office
        );

        let (office, patient, treatment) =
            required_refs(&request.office, &request.patient, &request.treatment)?;
        self.verify_references(&patient, &office, &treatment).await?;

        let snapshot = self.repository.snapshot();
        if slot_taken(&snapshot, request.date, request.time, &office, None) {
            warn!(
                "Slot {} {} at {} already holds an active appointment",
                request.date, request.time, office
            );
            return Err(AgendaError::SlotConflict);
        }

        let fields = AppointmentFields {
            date: request.date,
            time: request.time,
            office_ref: office,
            patient_ref: patient,
            treatment_ref: treatment,
            status: AppointmentStatus::Confirmed,
            cancel_reason: None,
            notes: String::new(),
            photos: Vec::new(),
        };

        let appointment = self.repository.create(fields).await?;
        info!("Appointment {} booked", appointment.id);
        Ok(appointment)
    }

    /// Overwrite the mutable fields of a confirmed appointment. Moving it to
    /// another office re-checks the target slot.
    pub async fn edit(&self, id: &str, request: EditAppointmentRequest) -> Result<Appointment, AgendaError> {
        debug!("Editing appointment {}", id);

        let current = self.get(id)?;
        self.lifecycle.validate_action(&current.status, AppointmentAction::Edit)?;

        let (office, patient, treatment) =
            required_refs(&request.office, &request.patient, &request.treatment)?;
        self.verify_references(&patient, &office, &treatment).await?;

        if office != current.office_ref {
            let snapshot = self.repository.snapshot();
            if slot_taken(&snapshot, current.date, current.time, &office, Some(id)) {
                return Err(AgendaError::SlotConflict);
            }
        }

        let fields = AppointmentFields {
            date: current.date,
            time: current.time,
            office_ref: office,
            patient_ref: patient,
            treatment_ref: treatment,
            status: current.status,
            cancel_reason: current.cancel_reason.clone(),
            notes: current.notes.clone(),
            photos: current.photos.clone(),
        };

        let updated = self.repository.update(id, fields).await?;
        info!("Appointment {} updated", id);
        Ok(updated)
    }

    /// Cancel a confirmed appointment. The slot stays visible for history but
    /// no longer blocks bookings; notes and photos are preserved as-is.
    pub async fn cancel(&self, id: &str, request: CancelAppointmentRequest) -> Result<Appointment, AgendaError> {
        debug!("Cancelling appointment {}", id);

        let current = self.get(id)?;
        self.lifecycle.validate_action(&current.status, AppointmentAction::Cancel)?;

        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(AgendaError::ValidationError(
                "A cancellation reason is required".to_string(),
            ));
        }

        let fields = AppointmentFields {
            date: current.date,
            time: current.time,
            office_ref: current.office_ref.clone(),
            patient_ref: current.patient_ref.clone(),
            treatment_ref: current.treatment_ref.clone(),
            status: AppointmentStatus::Cancelled,
            cancel_reason: Some(reason.to_string()),
            notes: current.notes.clone(),
            photos: current.photos.clone(),
        };

        let cancelled = self.repository.update(id, fields).await?;
        info!("Appointment {} cancelled: {}", id, reason);
        Ok(cancelled)
    }

    /// Finish the treatment. Callable again on a completed appointment to
    /// update the notes or add photos; photos only ever accumulate.
    pub async fn complete(&self, id: &str, request: CompleteAppointmentRequest) -> Result<Appointment, AgendaError> {
        debug!("Completing appointment {}", id);

        let current = self.get(id)?;
        self.lifecycle.validate_action(&current.status, AppointmentAction::Complete)?;

        validate_photos(&request.photos)?;

        let mut photos = current.photos.clone();
        photos.extend(request.photos);

        let notes = request.notes.unwrap_or_else(|| current.notes.clone());

        let fields = AppointmentFields {
            date: current.date,
            time: current.time,
            office_ref: current.office_ref.clone(),
            patient_ref: current.patient_ref.clone(),
            treatment_ref: current.treatment_ref.clone(),
            status: AppointmentStatus::Completed,
            cancel_reason: None,
            notes,
            photos,
        };

        let completed = self.repository.update(id, fields).await?;
        info!("Appointment {} completed", id);
        Ok(completed)
    }

    /// Hand a cancelled appointment's slot to a new booking. The entry keeps
    /// its id, date and time; booking data is overwritten and the cancelled
    /// history (reason, notes, photos) is cleared.
    pub async fn reassign(&self, id: &str, request: ReassignAppointmentRequest) -> Result<Appointment, AgendaError> {
        debug!("Reassigning appointment {}", id);

        let current = self.get(id)?;
        self.lifecycle.validate_action(&current.status, AppointmentAction::Reassign)?;

        let (office, patient, treatment) =
            required_refs(&request.office, &request.patient, &request.treatment)?;
        self.verify_references(&patient, &office, &treatment).await?;

        if office != current.office_ref {
            let snapshot = self.repository.snapshot();
            if slot_taken(&snapshot, current.date, current.time, &office, Some(id)) {
                return Err(AgendaError::SlotConflict);
            }
        }

        let fields = AppointmentFields {
            date: current.date,
            time: current.time,
            office_ref: office,
            patient_ref: patient,
            treatment_ref: treatment,
            status: AppointmentStatus::Confirmed,
            cancel_reason: None,
            notes: String::new(),
            photos: Vec::new(),
        };

        let reassigned = self.repository.update(id, fields).await?;
        info!("Appointment {} reassigned to {}", id, reassigned.patient_ref);
        Ok(reassigned)
    }

    /// Remove an appointment outright. Confirmation happens at the HTTP
    /// boundary; past the status guard this is unconditional.
    pub async fn delete(&self, id: &str) -> Result<(), AgendaError> {
        debug!("Deleting appointment {}", id);

        let current = self.get(id)?;
        self.lifecycle.validate_action(&current.status, AppointmentAction::Delete)?;

        self.repository.remove(id).await?;
        info!("Appointment {} deleted", id);
        Ok(())
    }

    async fn verify_references(
        &self,
        patient: &str,
        office: &str,
        treatment: &str,
    ) -> Result<(), AgendaError> {
        let (patient_ok, office_ok, treatment_ok) = futures::try_join!(
            self.directories.patient_exists(patient),
            self.directories.office_exists(office),
            self.directories.treatment_exists(treatment),
        )?;

        if !patient_ok {
            return Err(AgendaError::PatientNotFound);
        }
        if !office_ok {
            return Err(AgendaError::OfficeNotFound);
        }
        if !treatment_ok {
            return Err(AgendaError::TreatmentNotFound);
        }
        Ok(())
    }
}

/// True if a non-cancelled appointment other than `exclude` occupies the slot.
fn slot_taken(
    appointments: &[Appointment],
    date: chrono::NaiveDate,
    time: SlotTime,
    office: &str,
    exclude: Option<&str>,
) -> bool {
    appointments.iter().any(|a| {
        a.blocks_slot()
            && a.occupies(date, time, office)
            && exclude.map_or(true, |id| a.id != id)
    })
}

fn required_refs(
    office: &str,
    patient: &str,
    treatment: &str,
) -> Result<(String, String, String), AgendaError> {
    let office = office.trim();
    let patient = patient.trim();
    let treatment = treatment.trim();

    if office.is_empty() || patient.is_empty() || treatment.is_empty() {
        return Err(AgendaError::ValidationError(
            "Patient, office and treatment are all required".to_string(),
        ));
    }

    Ok((office.to_string(), patient.to_string(), treatment.to_string()))
}

/// Photos arrive as base64 data URLs from the capture widget; reject anything
/// that would not round-trip through the store.
fn validate_photos(photos: &[String]) -> Result<(), AgendaError> {
    for photo in photos {
        let payload = photo
            .strip_prefix("data:image/")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(_, payload)| payload)
            .ok_or_else(|| {
                AgendaError::ValidationError("Photo is not an image data URL".to_string())
            })?;

        STANDARD
            .decode(payload)
            .map_err(|_| AgendaError::ValidationError("Photo payload is not valid base64".to_string()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_refs_trims_and_rejects_blanks() {
        assert!(required_refs(" Centro ", "Ana", "Facial").is_ok());
        assert!(required_refs("", "Ana", "Facial").is_err());
        assert!(required_refs("Centro", "   ", "Facial").is_err());
        assert!(required_refs("Centro", "Ana", "").is_err());
    }

    #[test]
    fn photo_validation_accepts_image_data_urls() {
        let photo = format!("data:image/png;base64,{}", STANDARD.encode(b"fake-png"));
        assert!(validate_photos(&[photo]).is_ok());
    }

    #[test]
    fn photo_validation_rejects_other_payloads() {
        assert!(validate_photos(&["https://example.com/a.png".to_string()]).is_err());
        assert!(validate_photos(&["data:image/png;base64,!!!".to_string()]).is_err());
        assert!(validate_photos(&["data:text/plain;base64,aGk=".to_string()]).is_err());
    }
}
