// libs/agenda-cell/src/repository.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{DocStoreClient, StoreError};

use crate::models::{AgendaError, Appointment, AppointmentFields};

const APPOINTMENTS_COLLECTION: &str = "appointments";

/// Copy-on-write view of the full appointment set. Readers clone the `Arc`;
/// mutations publish a replacement through the watch channel.
pub type AppointmentSnapshot = Arc<Vec<Appointment>>;

/// Persistence conduit for appointments. No business logic lives here; the
/// booking engine is the sole writer.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    /// Latest locally cached snapshot. Never blocks.
    fn snapshot(&self) -> AppointmentSnapshot;

    /// Live snapshot feed; a new value is published after every mutation and
    /// every change notification from the store.
    fn subscribe(&self) -> watch::Receiver<AppointmentSnapshot>;

    /// Reload the collection from the store and publish a fresh snapshot.
    async fn refresh(&self) -> Result<(), AgendaError>;

    /// Conditional create: succeeds only if no non-cancelled appointment
    /// already occupies `(date, time, officeRef)`. The loser of a concurrent
    /// double-book receives `SlotConflict`.
    async fn create(&self, fields: AppointmentFields) -> Result<Appointment, AgendaError>;

    async fn update(&self, id: &str, fields: AppointmentFields) -> Result<Appointment, AgendaError>;

    async fn remove(&self, id: &str) -> Result<(), AgendaError>;
}

fn map_store_error(err: StoreError) -> AgendaError {
    match err {
        StoreError::Conflict => AgendaError::SlotConflict,
        StoreError::NotFound => AgendaError::NotFound,
        other => AgendaError::PersistenceError(other.to_string()),
    }
}

// ==============================================================================
// DOCUMENT STORE REPOSITORY
// ==============================================================================

/// Repository over the REST document store. The store enforces the unique
/// active-slot constraint, so its conflict response is the atomic arbiter for
/// concurrent bookings.
pub struct DocStoreAppointmentRepository {
    store: Arc<DocStoreClient>,
    snapshots: watch::Sender<AppointmentSnapshot>,
}

impl DocStoreAppointmentRepository {
    /// Start with an empty cache; the change feed or an explicit `refresh`
    /// fills it. Useful when the store may be unreachable at boot.
    pub fn new(store: Arc<DocStoreClient>) -> Self {
        let (snapshots, _) = watch::channel(Arc::new(Vec::new()));
        Self { store, snapshots }
    }

    /// Construct and perform the initial load.
    pub async fn connect(store: Arc<DocStoreClient>) -> Result<Self, AgendaError> {
        let repository = Self::new(store);
        repository.refresh().await?;
        Ok(repository)
    }

    fn encode(fields: &AppointmentFields) -> Result<serde_json::Value, AgendaError> {
        serde_json::to_value(fields).map_err(|e| AgendaError::PersistenceError(e.to_string()))
    }
}

#[async_trait]
impl AppointmentRepository for DocStoreAppointmentRepository {
    fn snapshot(&self) -> AppointmentSnapshot {
        self.snapshots.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<AppointmentSnapshot> {
        self.snapshots.subscribe()
    }

    async fn refresh(&self) -> Result<(), AgendaError> {
        let appointments: Vec<Appointment> = self
            .store
            .list(APPOINTMENTS_COLLECTION)
            .await
            .map_err(map_store_error)?;

        debug!("Loaded {} appointments from store", appointments.len());
        self.snapshots.send_replace(Arc::new(appointments));
        Ok(())
    }

    async fn create(&self, fields: AppointmentFields) -> Result<Appointment, AgendaError> {
        let body = Self::encode(&fields)?;
        let created: Appointment = self
            .store
            .insert(APPOINTMENTS_COLLECTION, body)
            .await
            .map_err(map_store_error)?;

        // Keep the cache current for the next reader; the write itself has
        // already succeeded, so a failed reload only delays visibility.
        if let Err(e) = self.refresh().await {
            warn!("Snapshot refresh after create failed: {}", e);
        }

        Ok(created)
    }

    async fn update(&self, id: &str, fields: AppointmentFields) -> Result<Appointment, AgendaError> {
        let body = Self::encode(&fields)?;
        let updated: Appointment = self
            .store
            .update(APPOINTMENTS_COLLECTION, id, body)
            .await
            .map_err(map_store_error)?;

        if let Err(e) = self.refresh().await {
            warn!("Snapshot refresh after update failed: {}", e);
        }

        Ok(updated)
    }

    async fn remove(&self, id: &str) -> Result<(), AgendaError> {
        self.store
            .remove(APPOINTMENTS_COLLECTION, id)
            .await
            .map_err(map_store_error)?;

        if let Err(e) = self.refresh().await {
            warn!("Snapshot refresh after delete failed: {}", e);
        }

        Ok(())
    }
}

/// Poll the store for changes made by other operators and publish fresh
/// snapshots to subscribers.
pub fn spawn_change_feed(
    repository: Arc<DocStoreAppointmentRepository>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    info!("Starting agenda change feed (every {:?})", interval);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = repository.refresh().await {
                warn!("Agenda change feed refresh failed: {}", e);
            }
        }
    })
}

// ==============================================================================
// IN-MEMORY REPOSITORY
// ==============================================================================

/// Repository backed by process memory. The conditional create runs its check
/// and insert under one lock, giving the same at-most-one-winner guarantee the
/// store provides. Used by the engine tests and for running without a store.
pub struct InMemoryAppointmentRepository {
    documents: Mutex<HashMap<String, Appointment>>,
    snapshots: watch::Sender<AppointmentSnapshot>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        let (snapshots, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            documents: Mutex::new(HashMap::new()),
            snapshots,
        }
    }

    fn publish(&self, documents: &HashMap<String, Appointment>) {
        let mut appointments: Vec<Appointment> = documents.values().cloned().collect();
        appointments.sort_by(|a, b| {
            (a.date, a.time, a.office_ref.as_str(), a.id.as_str())
                .cmp(&(b.date, b.time, b.office_ref.as_str(), b.id.as_str()))
        });
        self.snapshots.send_replace(Arc::new(appointments));
    }
}

impl Default for InMemoryAppointmentRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    fn snapshot(&self) -> AppointmentSnapshot {
        self.snapshots.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<AppointmentSnapshot> {
        self.snapshots.subscribe()
    }

    async fn refresh(&self) -> Result<(), AgendaError> {
        let documents = self.documents.lock().expect("repository lock poisoned");
        self.publish(&documents);
        Ok(())
    }

    async fn create(&self, fields: AppointmentFields) -> Result<Appointment, AgendaError> {
        let mut documents = self.documents.lock().expect("repository lock poisoned");

        let occupied = documents.values().any(|a| {
            a.blocks_slot() && a.occupies(fields.date, fields.time, &fields.office_ref)
        });
        if occupied {
            return Err(AgendaError::SlotConflict);
        }

        let id = Uuid::new_v4().to_string();
        let appointment = fields.into_appointment(id.clone());
        documents.insert(id, appointment.clone());
        self.publish(&documents);

        Ok(appointment)
    }

    async fn update(&self, id: &str, fields: AppointmentFields) -> Result<Appointment, AgendaError> {
        let mut documents = self.documents.lock().expect("repository lock poisoned");

        if !documents.contains_key(id) {
            return Err(AgendaError::NotFound);
        }

        let appointment = fields.into_appointment(id.to_string());
        documents.insert(id.to_string(), appointment.clone());
        self.publish(&documents);

        Ok(appointment)
    }

    async fn remove(&self, id: &str) -> Result<(), AgendaError> {
        let mut documents = self.documents.lock().expect("repository lock poisoned");

        documents.remove(id).ok_or(AgendaError::NotFound)?;
        self.publish(&documents);

        Ok(())
    }
}
