// libs/agenda-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use shared_models::error::AppError;

use crate::models::{
    AgendaError, BookAppointmentRequest, CancelAppointmentRequest, CompleteAppointmentRequest,
    EditAppointmentRequest, ReassignAppointmentRequest,
};
use crate::services::booking::BookingEngine;
use crate::services::projector::{self, WeekView};

/// Shared state for the agenda routes: one engine constructed at startup, its
/// repository cache kept warm by the change feed.
pub struct AgendaState {
    pub engine: BookingEngine,
}

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct WeekParams {
    pub anchor: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    #[serde(default)]
    pub confirm: bool,
}

fn map_agenda_error(err: AgendaError) -> AppError {
    match err {
        AgendaError::ValidationError(msg) => AppError::ValidationError(msg),
        AgendaError::InvalidTransition(status) => AppError::InvalidOperation(format!(
            "operation not allowed while appointment is {}",
            status
        )),
        AgendaError::SlotConflict => {
            AppError::Conflict("Slot already holds an active appointment for this office".to_string())
        }
        AgendaError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AgendaError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        AgendaError::TreatmentNotFound => AppError::NotFound("Treatment not found".to_string()),
        AgendaError::OfficeNotFound => AppError::NotFound("Office not found".to_string()),
        AgendaError::PersistenceError(msg) => AppError::Store(msg),
    }
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<Arc<AgendaState>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .engine
        .book(request)
        .await
        .map_err(map_agenda_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AgendaState>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .engine
        .get(&appointment_id)
        .map_err(map_agenda_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn edit_appointment(
    State(state): State<Arc<AgendaState>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<EditAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .engine
        .edit(&appointment_id, request)
        .await
        .map_err(map_agenda_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AgendaState>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .engine
        .cancel(&appointment_id, request)
        .await
        .map_err(map_agenda_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<Arc<AgendaState>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<CompleteAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .engine
        .complete(&appointment_id, request)
        .await
        .map_err(map_agenda_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Treatment completed"
    })))
}

#[axum::debug_handler]
pub async fn reassign_appointment(
    State(state): State<Arc<AgendaState>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<ReassignAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .engine
        .reassign(&appointment_id, request)
        .await
        .map_err(map_agenda_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Slot reassigned to new booking"
    })))
}

/// Deletion is irreversible; the boundary requires an explicit `confirm=true`
/// acknowledgement before the engine is invoked.
#[axum::debug_handler]
pub async fn delete_appointment(
    State(state): State<Arc<AgendaState>>,
    Path(appointment_id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<Value>, AppError> {
    if !params.confirm {
        return Err(AppError::BadRequest(
            "Deletion must be confirmed with confirm=true".to_string(),
        ));
    }

    state
        .engine
        .delete(&appointment_id)
        .await
        .map_err(map_agenda_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment deleted"
    })))
}

// ==============================================================================
// VIEW HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn week_view(
    State(state): State<Arc<AgendaState>>,
    Query(params): Query<WeekParams>,
) -> Result<Json<Value>, AppError> {
    let anchor = params
        .anchor
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let snapshot = state.engine.appointments();
    let view = WeekView::project(&snapshot, anchor);
    let appointments: Vec<_> = view.appointments().collect();

    Ok(Json(json!({
        "days": view.grid().days,
        "times": view.grid().times,
        "appointments": appointments,
    })))
}

#[axum::debug_handler]
pub async fn day_view(
    State(state): State<Arc<AgendaState>>,
    Path(date): Path<NaiveDate>,
) -> Result<Json<Value>, AppError> {
    let snapshot = state.engine.appointments();
    let appointments = projector::day_appointments(&snapshot, date);

    Ok(Json(json!({
        "date": date,
        "appointments": appointments,
    })))
}
