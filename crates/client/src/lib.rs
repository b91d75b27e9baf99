#![forbid(unsafe_code)]

pub mod http;
pub mod remote;

pub use http::{HttpClient, HttpClientConfig};
pub use remote::{
    ClassroomClient, ClientError, ContentClient, InMemoryClient, ProgressClient, ProgressFilter,
    ProgressUpdate, RESUME_PAGE_SIZE, Remote, ResumePage,
};
