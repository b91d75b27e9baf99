use std::sync::Arc;

use client::{ClientError, HttpClientConfig, InMemoryClient, Remote};
use learner_core::model::ContentNode;

use crate::classes_service::ClassesService;
use crate::error::SessionError;
use crate::progress_store::ProgressStore;
use crate::resumable_service::ResumableService;

/// Assembles the session-scoped stores and services over one remote backend.
///
/// Constructed once per learner session; all state lives in the services it
/// owns and is rebuilt from fetches, never persisted.
#[derive(Clone)]
pub struct LearnSession {
    progress: Arc<ProgressStore>,
    classes: Arc<ClassesService>,
    resumable: Arc<ResumableService>,
}

impl LearnSession {
    #[must_use]
    pub fn new(remote: &Remote) -> Self {
        let progress = Arc::new(ProgressStore::new(Arc::clone(&remote.progress)));
        let classes = Arc::new(ClassesService::new(
            Arc::clone(&remote.classrooms),
            Arc::clone(&remote.content),
            Arc::clone(&progress),
        ));
        let resumable = Arc::new(ResumableService::new(
            Arc::clone(&remote.content),
            Arc::clone(&progress),
        ));
        Self {
            progress,
            classes,
            resumable,
        }
    }

    /// Session backed by a fresh in-memory client.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(&Remote::in_memory())
    }

    /// Session backed by an already-seeded in-memory client.
    #[must_use]
    pub fn from_in_memory(remote: InMemoryClient) -> Self {
        Self::new(&Remote::from_in_memory(remote))
    }

    /// Session backed by the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the base URL is unusable.
    pub fn http(config: &HttpClientConfig) -> Result<Self, ClientError> {
        Ok(Self::new(&Remote::http(config)?))
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressStore> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn classes(&self) -> Arc<ClassesService> {
        Arc::clone(&self.classes)
    }

    #[must_use]
    pub fn resumable(&self) -> Arc<ResumableService> {
        Arc::clone(&self.resumable)
    }

    /// Resumable nodes not assigned in any of the learner's classrooms,
    /// cross-referencing the two aggregates.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if either aggregate's state is unavailable.
    pub fn resumable_outside_classes(&self) -> Result<Vec<ContentNode>, SessionError> {
        let classrooms = self.classes.classrooms()?;
        Ok(self.resumable.resumable_outside_classes(&classrooms)?)
    }
}
