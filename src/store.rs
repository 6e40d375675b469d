use crate::dlog;
use crate::error::StoreError;
use crate::types::{Workout, WorkoutId, reserve_ids_through};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Key the workout collection is stored under.
pub const STORAGE_KEY: &str = "workouts";

/// Durable key/value device holding serialized blobs.
pub trait BlobStorage {
    /// Replace whatever is stored under `key`.
    fn write_blob(&mut self, key: &str, blob: &str) -> Result<()>;
    fn read_blob(&self, key: &str) -> Result<Option<String>>;
}

/// In-process storage. Clones share the same map, so a test can keep a handle
/// and look at what was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl BlobStorage for MemoryStorage {
    fn write_blob(&mut self, key: &str, blob: &str) -> Result<()> {
        self.blobs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn read_blob(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get(key))
    }
}

/// Owns the ordered workout collection and its durable copy.
pub struct WorkoutStore {
    workouts: Vec<Workout>,
    storage: Box<dyn BlobStorage>,
    key: String,
}

impl WorkoutStore {
    pub fn new(storage: impl BlobStorage + 'static) -> Self {
        Self::with_key(storage, STORAGE_KEY)
    }

    pub fn with_key(storage: impl BlobStorage + 'static, key: impl Into<String>) -> Self {
        Self {
            workouts: Vec::new(),
            storage: Box::new(storage),
            key: key.into(),
        }
    }

    pub fn append(&mut self, workout: Workout) -> Result<(), StoreError> {
        if self.find_by_id(workout.id()).is_some() {
            return Err(StoreError::DuplicateId(workout.id()));
        }
        dlog!("append id={} position={}", workout.id(), self.workouts.len());
        self.workouts.push(workout);
        Ok(())
    }

    /// Current collection in creation order.
    pub fn all(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }

    pub fn find_by_id(&self, id: WorkoutId) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id() == id)
    }

    /// Bump the interaction counter of `id`; `None` when no such workout.
    pub fn record_interaction(&mut self, id: WorkoutId) -> Option<&Workout> {
        let workout = self.workouts.iter_mut().find(|w| w.id() == id)?;
        workout.record_interaction();
        Some(workout)
    }

    pub fn serialize(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string(&self.workouts)?)
    }

    /// Overwrite the stored blob with the whole collection.
    pub fn persist(&mut self) -> Result<(), StoreError> {
        let blob = self.serialize()?;
        self.storage.write_blob(&self.key, &blob)?;
        tracing::info!(count = self.workouts.len(), bytes = blob.len(), "workouts persisted");
        Ok(())
    }

    /// Replace the in-memory collection with the stored one. A missing,
    /// unreadable or malformed blob leaves the collection empty. Returns the
    /// number of workouts restored.
    pub fn restore(&mut self) -> usize {
        self.workouts.clear();

        let blob = match self.storage.read_blob(&self.key) {
            Ok(Some(blob)) => blob,
            Ok(None) => {
                dlog!("restore key={} no stored workouts", self.key);
                return 0;
            }
            Err(e) => {
                tracing::warn!(err = %e, key = %self.key, "reading stored workouts failed; starting empty");
                return 0;
            }
        };

        let restored: Vec<Workout> = match serde_json::from_str(&blob) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(err = %e, key = %self.key, "stored workouts are not readable; starting empty");
                return 0;
            }
        };

        for workout in restored {
            let id = workout.id();
            if let Err(e) = self.append(workout) {
                tracing::warn!(err = %e, "skipping stored workout");
                continue;
            }
            reserve_ids_through(id);
        }

        tracing::info!(count = self.workouts.len(), "workouts restored");
        self.workouts.len()
    }
}
