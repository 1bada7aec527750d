use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{Application, ApplicationId, UserId};

/// Storage abstraction so the store can be backed by memory in tests and a database in
/// production without touching callers.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: Application) -> Result<Application, RepositoryError>;
    fn update(&self, record: Application) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn by_user(&self, user_id: &UserId) -> Result<Vec<Application>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Process-lifetime repository backed by a mutex-guarded map.
#[derive(Default, Clone)]
pub struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, Application>>>,
}

impl InMemoryApplicationRepository {
    fn records(&self) -> Result<MutexGuard<'_, HashMap<ApplicationId, Application>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository mutex poisoned".to_string()))
    }

    pub fn len(&self) -> usize {
        self.records().map(|guard| guard.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: Application) -> Result<Application, RepositoryError> {
        let mut guard = self.records()?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: Application) -> Result<(), RepositoryError> {
        let mut guard = self.records()?;
        match guard.get_mut(&record.id) {
            Some(slot) => {
                *slot = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let guard = self.records()?;
        Ok(guard.get(id).cloned())
    }

    fn by_user(&self, user_id: &UserId) -> Result<Vec<Application>, RepositoryError> {
        let guard = self.records()?;
        Ok(guard
            .values()
            .filter(|record| &record.user_id == user_id)
            .cloned()
            .collect())
    }
}
