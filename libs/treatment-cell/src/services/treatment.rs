// libs/treatment-cell/src/services/treatment.rs
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use shared_config::AppConfig;
use shared_database::{DocStoreClient, StoreError};

use crate::models::{CreateTreatmentRequest, Treatment, TreatmentError, UpdateTreatmentRequest};

const TREATMENTS_COLLECTION: &str = "treatments";

pub struct TreatmentService {
    store: Arc<DocStoreClient>,
}

impl TreatmentService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(DocStoreClient::new(config)),
        }
    }

    pub async fn list_treatments(&self) -> Result<Vec<Treatment>, TreatmentError> {
        let mut treatments: Vec<Treatment> = self
            .store
            .list(TREATMENTS_COLLECTION)
            .await
            .map_err(map_store_error)?;
        treatments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(treatments)
    }

    pub async fn get_treatment(&self, treatment_id: &str) -> Result<Treatment, TreatmentError> {
        self.store
            .fetch(TREATMENTS_COLLECTION, treatment_id)
            .await
            .map_err(map_store_error)
    }

    pub async fn create_treatment(
        &self,
        request: CreateTreatmentRequest,
    ) -> Result<Treatment, TreatmentError> {
        let name = validate_fields(&request.name, request.price, request.duration_minutes)?;

        if self.name_taken(&name).await? {
            return Err(TreatmentError::NameAlreadyExists { name });
        }

        let document = json!({
            "name": name,
            "description": request.description,
            "price": request.price,
            "duration_minutes": request.duration_minutes,
        });

        let treatment: Treatment = self
            .store
            .insert(TREATMENTS_COLLECTION, document)
            .await
            .map_err(map_store_error)?;

        info!("Treatment {} created", treatment.id);
        Ok(treatment)
    }

    pub async fn update_treatment(
        &self,
        treatment_id: &str,
        request: UpdateTreatmentRequest,
    ) -> Result<Treatment, TreatmentError> {
        let existing = self.get_treatment(treatment_id).await?;

        let name = request.name.unwrap_or_else(|| existing.name.clone());
        let price = request.price.unwrap_or(existing.price);
        let duration_minutes = request.duration_minutes.unwrap_or(existing.duration_minutes);
        let name = validate_fields(&name, price, duration_minutes)?;

        if name != existing.name && self.name_taken(&name).await? {
            return Err(TreatmentError::NameAlreadyExists { name });
        }

        let patch = json!({
            "name": name,
            "description": request.description.unwrap_or(existing.description),
            "price": price,
            "duration_minutes": duration_minutes,
        });

        self.store
            .update(TREATMENTS_COLLECTION, treatment_id, patch)
            .await
            .map_err(map_store_error)
    }

    pub async fn delete_treatment(&self, treatment_id: &str) -> Result<(), TreatmentError> {
        self.store
            .remove(TREATMENTS_COLLECTION, treatment_id)
            .await
            .map_err(map_store_error)?;
        info!("Treatment {} deleted", treatment_id);
        Ok(())
    }

    async fn name_taken(&self, name: &str) -> Result<bool, TreatmentError> {
        let filter = format!("name=eq.{}", urlencoding::encode(name));
        let matches: Vec<Treatment> = self
            .store
            .query(TREATMENTS_COLLECTION, &filter)
            .await
            .map_err(map_store_error)?;
        Ok(!matches.is_empty())
    }
}

fn validate_fields(name: &str, price: f64, duration_minutes: i32) -> Result<String, TreatmentError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TreatmentError::ValidationError(
            "Treatment name is required".to_string(),
        ));
    }
    if price < 0.0 {
        return Err(TreatmentError::ValidationError(
            "Price cannot be negative".to_string(),
        ));
    }
    if duration_minutes < 0 {
        return Err(TreatmentError::ValidationError(
            "Duration cannot be negative".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn map_store_error(err: StoreError) -> TreatmentError {
    match err {
        StoreError::NotFound => TreatmentError::NotFound,
        other => TreatmentError::StoreError(other.to_string()),
    }
}
