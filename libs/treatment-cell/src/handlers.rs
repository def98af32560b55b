// libs/treatment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateTreatmentRequest, TreatmentError, UpdateTreatmentRequest};
use crate::services::treatment::TreatmentService;

fn map_treatment_error(err: TreatmentError) -> AppError {
    match err {
        TreatmentError::NotFound => AppError::NotFound("Treatment not found".to_string()),
        TreatmentError::NameAlreadyExists { name } => {
            AppError::Conflict(format!("Treatment named {} already exists", name))
        }
        TreatmentError::ValidationError(msg) => AppError::ValidationError(msg),
        TreatmentError::StoreError(msg) => AppError::Store(msg),
    }
}

#[axum::debug_handler]
pub async fn list_treatments(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let service = TreatmentService::new(&state);
    let treatments = service
        .list_treatments()
        .await
        .map_err(map_treatment_error)?;

    Ok(Json(json!({ "treatments": treatments })))
}

#[axum::debug_handler]
pub async fn get_treatment(
    State(state): State<Arc<AppConfig>>,
    Path(treatment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = TreatmentService::new(&state);
    let treatment = service
        .get_treatment(&treatment_id)
        .await
        .map_err(map_treatment_error)?;

    Ok(Json(json!(treatment)))
}

#[axum::debug_handler]
pub async fn create_treatment(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateTreatmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = TreatmentService::new(&state);
    let treatment = service
        .create_treatment(request)
        .await
        .map_err(map_treatment_error)?;

    Ok(Json(json!({
        "success": true,
        "treatment": treatment
    })))
}

#[axum::debug_handler]
pub async fn update_treatment(
    State(state): State<Arc<AppConfig>>,
    Path(treatment_id): Path<String>,
    Json(request): Json<UpdateTreatmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = TreatmentService::new(&state);
    let treatment = service
        .update_treatment(&treatment_id, request)
        .await
        .map_err(map_treatment_error)?;

    Ok(Json(json!({
        "success": true,
        "treatment": treatment
    })))
}

#[axum::debug_handler]
pub async fn delete_treatment(
    State(state): State<Arc<AppConfig>>,
    Path(treatment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = TreatmentService::new(&state);
    service
        .delete_treatment(&treatment_id)
        .await
        .map_err(map_treatment_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Treatment deleted"
    })))
}
