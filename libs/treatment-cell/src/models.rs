use serde::{Deserialize, Serialize};

/// A catalog entry. Price and duration are reference data for the front desk;
/// the agenda itself books whole half-hour slots regardless of duration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTreatmentRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTreatmentRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TreatmentError {
    #[error("Treatment not found")]
    NotFound,

    #[error("Treatment named {name} already exists")]
    NameAlreadyExists { name: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    StoreError(String),
}
