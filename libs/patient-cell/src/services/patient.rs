// libs/patient-cell/src/services/patient.rs
use std::sync::Arc;

use serde_json::json;
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_database::{DocStoreClient, StoreError};

use crate::models::{CreatePatientRequest, Patient, PatientError, UpdatePatientRequest};

const PATIENTS_COLLECTION: &str = "patients";

pub struct PatientService {
    store: Arc<DocStoreClient>,
}

impl PatientService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(DocStoreClient::new(config)),
        }
    }

    pub async fn list_patients(&self) -> Result<Vec<Patient>, PatientError> {
        let mut patients: Vec<Patient> = self
            .store
            .list(PATIENTS_COLLECTION)
            .await
            .map_err(map_store_error)?;
        patients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(patients)
    }

    pub async fn get_patient(&self, patient_id: &str) -> Result<Patient, PatientError> {
        self.store
            .fetch(PATIENTS_COLLECTION, patient_id)
            .await
            .map_err(map_store_error)
    }

    /// Lookup by name: case-insensitive substring match over the directory.
    pub async fn search_by_name(&self, name: &str) -> Result<Vec<Patient>, PatientError> {
        let needle = name.trim().to_lowercase();
        let patients = self.list_patients().await?;
        Ok(patients
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect())
    }

    pub async fn create_patient(&self, request: CreatePatientRequest) -> Result<Patient, PatientError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(PatientError::ValidationError(
                "Patient name is required".to_string(),
            ));
        }

        if self.name_taken(&name).await? {
            return Err(PatientError::NameAlreadyExists { name });
        }

        let document = json!({
            "name": name,
            "phone": request.phone,
            "email": request.email,
            "photo": request.photo,
        });

        let patient: Patient = self
            .store
            .insert(PATIENTS_COLLECTION, document)
            .await
            .map_err(map_store_error)?;

        info!("Patient {} created", patient.id);
        Ok(patient)
    }

    pub async fn update_patient(
        &self,
        patient_id: &str,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient {}", patient_id);

        let existing = self.get_patient(patient_id).await?;

        let name = match &request.name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(PatientError::ValidationError(
                        "Patient name is required".to_string(),
                    ));
                }
                if name != existing.name && self.name_taken(&name).await? {
                    return Err(PatientError::NameAlreadyExists { name });
                }
                name
            }
            None => existing.name.clone(),
        };

        let patch = json!({
            "name": name,
            "phone": request.phone.unwrap_or(existing.phone),
            "email": request.email.unwrap_or(existing.email),
            "photo": request.photo.or(existing.photo),
        });

        self.store
            .update(PATIENTS_COLLECTION, patient_id, patch)
            .await
            .map_err(map_store_error)
    }

    pub async fn delete_patient(&self, patient_id: &str) -> Result<(), PatientError> {
        self.store
            .remove(PATIENTS_COLLECTION, patient_id)
            .await
            .map_err(map_store_error)?;
        info!("Patient {} deleted", patient_id);
        Ok(())
    }

    async fn name_taken(&self, name: &str) -> Result<bool, PatientError> {
        let filter = format!("name=eq.{}", urlencoding::encode(name));
        let matches: Vec<Patient> = self
            .store
            .query(PATIENTS_COLLECTION, &filter)
            .await
            .map_err(map_store_error)?;
        Ok(!matches.is_empty())
    }
}

fn map_store_error(err: StoreError) -> PatientError {
    match err {
        StoreError::NotFound => PatientError::NotFound,
        other => PatientError::StoreError(other.to_string()),
    }
}
