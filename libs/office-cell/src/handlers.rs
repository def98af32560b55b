// libs/office-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateOfficeRequest, OfficeError, UpdateOfficeRequest};
use crate::services::office::OfficeService;

fn map_office_error(err: OfficeError) -> AppError {
    match err {
        OfficeError::NotFound => AppError::NotFound("Office not found".to_string()),
        OfficeError::NameAlreadyExists { name } => {
            AppError::Conflict(format!("Office named {} already exists", name))
        }
        OfficeError::ValidationError(msg) => AppError::ValidationError(msg),
        OfficeError::StoreError(msg) => AppError::Store(msg),
    }
}

#[axum::debug_handler]
pub async fn list_offices(State(state): State<Arc<AppConfig>>) -> Result<Json<Value>, AppError> {
    let service = OfficeService::new(&state);
    let offices = service.list_offices().await.map_err(map_office_error)?;

    Ok(Json(json!({ "offices": offices })))
}

#[axum::debug_handler]
pub async fn get_office(
    State(state): State<Arc<AppConfig>>,
    Path(office_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = OfficeService::new(&state);
    let office = service
        .get_office(&office_id)
        .await
        .map_err(map_office_error)?;

    Ok(Json(json!(office)))
}

#[axum::debug_handler]
pub async fn create_office(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateOfficeRequest>,
) -> Result<Json<Value>, AppError> {
    let service = OfficeService::new(&state);
    let office = service
        .create_office(request)
        .await
        .map_err(map_office_error)?;

    Ok(Json(json!({
        "success": true,
        "office": office
    })))
}

#[axum::debug_handler]
pub async fn update_office(
    State(state): State<Arc<AppConfig>>,
    Path(office_id): Path<String>,
    Json(request): Json<UpdateOfficeRequest>,
) -> Result<Json<Value>, AppError> {
    let service = OfficeService::new(&state);
    let office = service
        .update_office(&office_id, request)
        .await
        .map_err(map_office_error)?;

    Ok(Json(json!({
        "success": true,
        "office": office
    })))
}

#[axum::debug_handler]
pub async fn delete_office(
    State(state): State<Arc<AppConfig>>,
    Path(office_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = OfficeService::new(&state);
    service
        .delete_office(&office_id)
        .await
        .map_err(map_office_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Office deleted"
    })))
}
