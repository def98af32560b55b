// libs/agenda-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ==============================================================================
// SLOT GRID CONSTANTS
// ==============================================================================

/// First bookable hour of the day (inclusive).
pub const OPENING_HOUR: u32 = 9;
/// Hour the agenda closes (exclusive); the last slot starts at 19:30.
pub const CLOSING_HOUR: u32 = 20;
pub const SLOT_MINUTES: u32 = 30;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// A half-hour slot token on the daily grid. Only times on the grid parse:
/// minutes 00 or 30, between `OPENING_HOUR` and `CLOSING_HOUR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotTime(NaiveTime);

impl SlotTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        if !(OPENING_HOUR..CLOSING_HOUR).contains(&hour) {
            return None;
        }
        if minute != 0 && minute != SLOT_MINUTES {
            return None;
        }
        NaiveTime::from_hms_opt(hour, minute, 0).map(SlotTime)
    }

    pub fn as_time(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

impl FromStr for SlotTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let time = NaiveTime::parse_from_str(s, "%H:%M")
            .map_err(|_| format!("invalid time token: {}", s))?;
        SlotTime::new(time.hour(), time.minute())
            .ok_or_else(|| format!("time {} is not on the half-hour agenda grid", s))
    }
}

impl Serialize for SlotTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// An agenda entry: one patient, one treatment, one office, one grid slot.
/// The document shape stored in the document store matches this serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Assigned by the document store on creation; stable for the lifetime.
    pub id: String,
    pub date: NaiveDate,
    pub time: SlotTime,
    pub office_ref: String,
    pub patient_ref: String,
    pub treatment_ref: String,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl Appointment {
    /// A cancelled appointment keeps its slot for historical display but does
    /// not block new bookings.
    pub fn blocks_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    pub fn occupies(&self, date: NaiveDate, time: SlotTime, office: &str) -> bool {
        self.date == date && self.time == time && self.office_ref == office
    }
}

/// The mutable field set written by the booking engine. Same document shape as
/// `Appointment` minus the store-assigned id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentFields {
    pub date: NaiveDate,
    pub time: SlotTime,
    pub office_ref: String,
    pub patient_ref: String,
    pub treatment_ref: String,
    pub status: AppointmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl AppointmentFields {
    pub fn into_appointment(self, id: String) -> Appointment {
        Appointment {
            id,
            date: self.date,
            time: self.time,
            office_ref: self.office_ref,
            patient_ref: self.patient_ref,
            treatment_ref: self.treatment_ref,
            status: self.status,
            cancel_reason: self.cancel_reason,
            notes: self.notes,
            photos: self.photos,
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookAppointmentRequest {
    pub date: NaiveDate,
    pub time: SlotTime,
    pub office: String,
    pub patient: String,
    pub treatment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditAppointmentRequest {
    pub office: String,
    pub patient: String,
    pub treatment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteAppointmentRequest {
    /// `None` keeps the notes already on the appointment.
    pub notes: Option<String>,
    /// Appended to any existing photo sequence, never replacing it.
    #[serde(default)]
    pub photos: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignAppointmentRequest {
    pub office: String,
    pub patient: String,
    pub treatment: String,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AgendaError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Operation not allowed while appointment is {0}")]
    InvalidTransition(AppointmentStatus),

    #[error("Slot already holds an active appointment")]
    SlotConflict,

    #[error("Appointment not found")]
    NotFound,

    #[error("Patient not found in directory")]
    PatientNotFound,

    #[error("Treatment not found in catalog")]
    TreatmentNotFound,

    #[error("Office not found in directory")]
    OfficeNotFound,

    #[error("Persistence error: {0}")]
    PersistenceError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_time_parses_grid_tokens() {
        let first: SlotTime = "09:00".parse().unwrap();
        let last: SlotTime = "19:30".parse().unwrap();
        assert_eq!(first.to_string(), "09:00");
        assert_eq!(last.to_string(), "19:30");
    }

    #[test]
    fn slot_time_rejects_off_grid_tokens() {
        assert!("08:30".parse::<SlotTime>().is_err());
        assert!("20:00".parse::<SlotTime>().is_err());
        assert!("10:15".parse::<SlotTime>().is_err());
        assert!("not-a-time".parse::<SlotTime>().is_err());
    }

    #[test]
    fn appointment_document_shape_is_preserved() {
        let appointment = Appointment {
            id: "t-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
            time: "10:00".parse().unwrap(),
            office_ref: "Centro".to_string(),
            patient_ref: "Ana Ruiz".to_string(),
            treatment_ref: "Facial".to_string(),
            status: AppointmentStatus::Cancelled,
            cancel_reason: Some("no-show".to_string()),
            notes: String::new(),
            photos: vec![],
        };

        let value = serde_json::to_value(&appointment).unwrap();
        assert_eq!(value["date"], "2025-03-11");
        assert_eq!(value["time"], "10:00");
        assert_eq!(value["officeRef"], "Centro");
        assert_eq!(value["patientRef"], "Ana Ruiz");
        assert_eq!(value["treatmentRef"], "Facial");
        assert_eq!(value["status"], "cancelled");
        assert_eq!(value["cancelReason"], "no-show");
    }

    #[test]
    fn cancelled_appointments_do_not_block_their_slot() {
        let mut appointment = Appointment {
            id: "t-1".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 11).unwrap(),
            time: "10:00".parse().unwrap(),
            office_ref: "Centro".to_string(),
            patient_ref: "Ana Ruiz".to_string(),
            treatment_ref: "Facial".to_string(),
            status: AppointmentStatus::Confirmed,
            cancel_reason: None,
            notes: String::new(),
            photos: vec![],
        };

        assert!(appointment.blocks_slot());
        appointment.status = AppointmentStatus::Cancelled;
        assert!(!appointment.blocks_slot());
        appointment.status = AppointmentStatus::Completed;
        assert!(appointment.blocks_slot());
    }
}
