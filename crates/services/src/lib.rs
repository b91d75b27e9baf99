#![forbid(unsafe_code)]

pub mod classes_service;
pub mod error;
pub mod progress_store;
pub mod resumable_service;
pub mod session;

pub use classes_service::ClassesService;
pub use error::{
    ClassesServiceError, ProgressStoreError, ResumableServiceError, SessionError,
};
pub use progress_store::{ProgressEntry, ProgressStore};
pub use resumable_service::ResumableService;
pub use session::LearnSession;
