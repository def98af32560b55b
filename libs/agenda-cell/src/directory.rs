// libs/agenda-cell/src/directory.rs
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use shared_database::DocStoreClient;

use crate::models::AgendaError;

/// Read access into the patient / treatment / office directories. Existence is
/// checked at call time only; references are not re-verified later.
#[async_trait]
pub trait DirectoryAccess: Send + Sync {
    async fn patient_exists(&self, name: &str) -> Result<bool, AgendaError>;
    async fn treatment_exists(&self, name: &str) -> Result<bool, AgendaError>;
    async fn office_exists(&self, name: &str) -> Result<bool, AgendaError>;
}

/// Directory lookups against the document store collections maintained by the
/// directory cells.
pub struct DocStoreDirectories {
    store: Arc<DocStoreClient>,
}

impl DocStoreDirectories {
    pub fn new(store: Arc<DocStoreClient>) -> Self {
        Self { store }
    }

    async fn name_exists(&self, collection: &str, name: &str) -> Result<bool, AgendaError> {
        debug!("Checking {} directory for {}", collection, name);

        let filter = format!("name=eq.{}", urlencoding::encode(name));
        let matches: Vec<Value> = self
            .store
            .query(collection, &filter)
            .await
            .map_err(|e| AgendaError::PersistenceError(e.to_string()))?;

        Ok(!matches.is_empty())
    }
}

#[async_trait]
impl DirectoryAccess for DocStoreDirectories {
    async fn patient_exists(&self, name: &str) -> Result<bool, AgendaError> {
        self.name_exists("patients", name).await
    }

    async fn treatment_exists(&self, name: &str) -> Result<bool, AgendaError> {
        self.name_exists("treatments", name).await
    }

    async fn office_exists(&self, name: &str) -> Result<bool, AgendaError> {
        self.name_exists("offices", name).await
    }
}

/// Fixed directory contents, for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectories {
    pub patients: Vec<String>,
    pub treatments: Vec<String>,
    pub offices: Vec<String>,
}

impl StaticDirectories {
    pub fn new(patients: &[&str], treatments: &[&str], offices: &[&str]) -> Self {
        Self {
            patients: patients.iter().map(|s| s.to_string()).collect(),
            treatments: treatments.iter().map(|s| s.to_string()).collect(),
            offices: offices.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl DirectoryAccess for StaticDirectories {
    async fn patient_exists(&self, name: &str) -> Result<bool, AgendaError> {
        Ok(self.patients.iter().any(|p| p == name))
    }

    async fn treatment_exists(&self, name: &str) -> Result<bool, AgendaError> {
        Ok(self.treatments.iter().any(|t| t == name))
    }

    async fn office_exists(&self, name: &str) -> Result<bool, AgendaError> {
        Ok(self.offices.iter().any(|o| o == name))
    }
}
