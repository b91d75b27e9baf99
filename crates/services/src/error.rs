//! Shared error types for the services crate.

use thiserror::Error;

use client::ClientError;

/// Errors emitted by `ProgressStore`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressStoreError {
    #[error("progress store lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Errors emitted by `ClassesService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClassesServiceError {
    #[error("classroom state lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Progress(#[from] ProgressStoreError),
}

/// Errors emitted by `ResumableService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ResumableServiceError {
    #[error("resumable state lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Progress(#[from] ProgressStoreError),
}

/// Errors emitted by the session-level convenience methods.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Classes(#[from] ClassesServiceError),
    #[error(transparent)]
    Resumable(#[from] ResumableServiceError),
}
