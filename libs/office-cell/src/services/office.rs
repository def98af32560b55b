// libs/office-cell/src/services/office.rs
use std::sync::Arc;

use serde_json::json;
use tracing::info;

use shared_config::AppConfig;
use shared_database::{DocStoreClient, StoreError};

use crate::models::{CreateOfficeRequest, Office, OfficeError, UpdateOfficeRequest};

const OFFICES_COLLECTION: &str = "offices";

pub struct OfficeService {
    store: Arc<DocStoreClient>,
}

impl OfficeService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(DocStoreClient::new(config)),
        }
    }

    pub async fn list_offices(&self) -> Result<Vec<Office>, OfficeError> {
        let mut offices: Vec<Office> = self
            .store
            .list(OFFICES_COLLECTION)
            .await
            .map_err(map_store_error)?;
        offices.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(offices)
    }

    pub async fn get_office(&self, office_id: &str) -> Result<Office, OfficeError> {
        self.store
            .fetch(OFFICES_COLLECTION, office_id)
            .await
            .map_err(map_store_error)
    }

    pub async fn create_office(&self, request: CreateOfficeRequest) -> Result<Office, OfficeError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(OfficeError::ValidationError(
                "Office name is required".to_string(),
            ));
        }

        if self.name_taken(&name).await? {
            return Err(OfficeError::NameAlreadyExists { name });
        }

        let document = json!({
            "name": name,
            "address": request.address,
            "city": request.city,
            "phone": request.phone,
        });

        let office: Office = self
            .store
            .insert(OFFICES_COLLECTION, document)
            .await
            .map_err(map_store_error)?;

        info!("Office {} created", office.id);
        Ok(office)
    }

    pub async fn update_office(
        &self,
        office_id: &str,
        request: UpdateOfficeRequest,
    ) -> Result<Office, OfficeError> {
        let existing = self.get_office(office_id).await?;

        let name = match &request.name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(OfficeError::ValidationError(
                        "Office name is required".to_string(),
                    ));
                }
                if name != existing.name && self.name_taken(&name).await? {
                    return Err(OfficeError::NameAlreadyExists { name });
                }
                name
            }
            None => existing.name.clone(),
        };

        let patch = json!({
            "name": name,
            "address": request.address.unwrap_or(existing.address),
            "city": request.city.unwrap_or(existing.city),
            "phone": request.phone.unwrap_or(existing.phone),
        });

        self.store
            .update(OFFICES_COLLECTION, office_id, patch)
            .await
            .map_err(map_store_error)
    }

    pub async fn delete_office(&self, office_id: &str) -> Result<(), OfficeError> {
        self.store
            .remove(OFFICES_COLLECTION, office_id)
            .await
            .map_err(map_store_error)?;
        info!("Office {} deleted", office_id);
        Ok(())
    }

    async fn name_taken(&self, name: &str) -> Result<bool, OfficeError> {
        let filter = format!("name=eq.{}", urlencoding::encode(name));
        let matches: Vec<Office> = self
            .store
            .query(OFFICES_COLLECTION, &filter)
            .await
            .map_err(map_store_error)?;
        Ok(!matches.is_empty())
    }
}

fn map_store_error(err: StoreError) -> OfficeError {
    match err {
        StoreError::NotFound => OfficeError::NotFound,
        other => OfficeError::StoreError(other.to_string()),
    }
}
