use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use learner_core::model::{
    ClassId, Classroom, ContentNode, ContentNodeId, Lesson, LessonId, ProgressFraction,
    ProgressMetadata,
};

/// Errors surfaced by remote resource clients.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    #[error("not found")]
    NotFound,

    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error("malformed payload: {0}")]
    Decode(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// One page of resume-eligible content, most recently interacted with first.
///
/// `more` is an opaque continuation token; `None` means the last page.
#[derive(Debug, Clone, PartialEq)]
pub struct ResumePage {
    pub results: Vec<ContentNode>,
    pub more: Option<String>,
}

/// A single progress record as reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub content_id: ContentNodeId,
    pub fraction: ProgressFraction,
    pub metadata: ProgressMetadata,
}

/// Scope for a progress collection fetch: either everything assigned in one
/// lesson, or an explicit set of content nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressFilter {
    pub lesson_id: Option<LessonId>,
    pub content_ids: Vec<ContentNodeId>,
}

impl ProgressFilter {
    #[must_use]
    pub fn for_lesson(lesson_id: LessonId) -> Self {
        Self {
            lesson_id: Some(lesson_id),
            content_ids: Vec::new(),
        }
    }

    #[must_use]
    pub fn for_content(content_ids: Vec<ContentNodeId>) -> Self {
        Self {
            lesson_id: None,
            content_ids,
        }
    }
}

//
// ─── CLIENT CONTRACTS ──────────────────────────────────────────────────────────
//

/// Classroom, lesson, and quiz collections for the current learner.
#[async_trait]
pub trait ClassroomClient: Send + Sync {
    /// List every classroom the learner belongs to. Lightweight: assignments
    /// may be omitted (empty) until a detail fetch. `force` bypasses any
    /// response caching the client performs.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the collection cannot be fetched.
    async fn list_classrooms(&self, force: bool) -> Result<Vec<Classroom>, ClientError>;

    /// Fetch one classroom's full detail, including assignments. `force`
    /// bypasses any response caching the client performs.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if missing, or other client errors.
    async fn get_classroom(&self, id: &ClassId, force: bool) -> Result<Classroom, ClientError>;

    /// Fetch one lesson's detail, with denormalized content nodes and progress
    /// inlined on its resources.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if missing, or other client errors.
    async fn get_lesson(&self, id: &LessonId) -> Result<Lesson, ClientError>;
}

/// Browsable content nodes outside any classroom.
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Fetch a page of resume-eligible content. `page` is a continuation
    /// token from a previous call; `None` requests the first page.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the page cannot be fetched.
    async fn fetch_resume(&self, page: Option<&str>) -> Result<ResumePage, ClientError>;

    /// Prime the client's node cache with already-fetched nodes. A hint: no
    /// observable failure.
    async fn cache_nodes(&self, nodes: &[ContentNode]);

    /// Look up a node previously cached via `cache_nodes` or a fetch.
    async fn cached_node(&self, id: &ContentNodeId) -> Option<ContentNode>;
}

/// Per-content progress records for the current learner.
#[async_trait]
pub trait ProgressClient: Send + Sync {
    /// List progress records in the given scope. An empty result is a normal
    /// outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the collection cannot be fetched.
    async fn list_progress(&self, filter: &ProgressFilter)
    -> Result<Vec<ProgressUpdate>, ClientError>;
}

//
// ─── IN-MEMORY CLIENT ──────────────────────────────────────────────────────────
//

/// Default page size for resume fetches.
pub const RESUME_PAGE_SIZE: usize = 12;

#[derive(Default)]
struct InMemoryState {
    classrooms: Vec<Classroom>,
    detail_cache: HashMap<ClassId, Classroom>,
    lessons: HashMap<LessonId, Lesson>,
    resume: Vec<ContentNode>,
    progress: Vec<ProgressUpdate>,
    node_cache: HashMap<ContentNodeId, ContentNode>,
}

/// Seedable in-memory client for tests and prototyping.
///
/// Resume results are served most-recent-interaction first; the continuation
/// token is an offset into the sorted sequence.
#[derive(Clone)]
pub struct InMemoryClient {
    state: Arc<Mutex<InMemoryState>>,
    page_size: usize,
}

impl Default for InMemoryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryClient {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(InMemoryState::default())),
            page_size: RESUME_PAGE_SIZE,
        }
    }

    /// Override the resume page size, for pagination tests.
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Add or replace a classroom in the backing collection.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` if the state lock is poisoned.
    pub fn seed_classroom(&self, classroom: Classroom) -> Result<(), ClientError> {
        let mut state = self.lock()?;
        state.classrooms.retain(|c| c.id() != classroom.id());
        state.classrooms.push(classroom);
        Ok(())
    }

    /// Add or replace a lesson detail record.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` if the state lock is poisoned.
    pub fn seed_lesson(&self, lesson: Lesson) -> Result<(), ClientError> {
        let mut state = self.lock()?;
        state.lessons.insert(lesson.id().clone(), lesson);
        Ok(())
    }

    /// Add a resume-eligible content node.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` if the state lock is poisoned.
    pub fn seed_resume_node(&self, node: ContentNode) -> Result<(), ClientError> {
        let mut state = self.lock()?;
        state.resume.push(node);
        Ok(())
    }

    /// Add a progress record.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Connection` if the state lock is poisoned.
    pub fn seed_progress(&self, update: ProgressUpdate) -> Result<(), ClientError> {
        let mut state = self.lock()?;
        state.progress.push(update);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, ClientError> {
        self.state
            .lock()
            .map_err(|e| ClientError::Connection(e.to_string()))
    }
}

#[async_trait]
impl ClassroomClient for InMemoryClient {
    async fn list_classrooms(&self, _force: bool) -> Result<Vec<Classroom>, ClientError> {
        // the in-memory backend never caches list responses
        let state = self.lock()?;
        Ok(state.classrooms.clone())
    }

    async fn get_classroom(&self, id: &ClassId, force: bool) -> Result<Classroom, ClientError> {
        let mut state = self.lock()?;
        if !force {
            if let Some(cached) = state.detail_cache.get(id) {
                return Ok(cached.clone());
            }
        }

        let fresh = state
            .classrooms
            .iter()
            .find(|c| c.id() == id)
            .cloned()
            .ok_or(ClientError::NotFound)?;
        state.detail_cache.insert(id.clone(), fresh.clone());
        Ok(fresh)
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Lesson, ClientError> {
        let state = self.lock()?;
        state.lessons.get(id).cloned().ok_or(ClientError::NotFound)
    }
}

#[async_trait]
impl ContentClient for InMemoryClient {
    async fn fetch_resume(&self, page: Option<&str>) -> Result<ResumePage, ClientError> {
        let offset = match page {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ClientError::Decode(format!("bad continuation token: {token}")))?,
        };

        let state = self.lock()?;
        let mut ordered: Vec<ContentNode> = state.resume.clone();
        ordered.sort_by(|a, b| b.last_interaction().cmp(&a.last_interaction()));

        let results: Vec<ContentNode> = ordered
            .iter()
            .skip(offset)
            .take(self.page_size)
            .cloned()
            .collect();
        let next = offset + results.len();
        let more = (next < ordered.len()).then(|| next.to_string());

        Ok(ResumePage { results, more })
    }

    async fn cache_nodes(&self, nodes: &[ContentNode]) {
        if let Ok(mut state) = self.state.lock() {
            for node in nodes {
                state.node_cache.insert(node.id().clone(), node.clone());
            }
        }
    }

    async fn cached_node(&self, id: &ContentNodeId) -> Option<ContentNode> {
        self.state.lock().ok()?.node_cache.get(id).cloned()
    }
}

#[async_trait]
impl ProgressClient for InMemoryClient {
    async fn list_progress(
        &self,
        filter: &ProgressFilter,
    ) -> Result<Vec<ProgressUpdate>, ClientError> {
        let state = self.lock()?;

        let mut wanted: Vec<ContentNodeId> = filter.content_ids.clone();
        if let Some(lesson_id) = &filter.lesson_id {
            if let Some(lesson) = state.lessons.get(lesson_id) {
                wanted.extend(
                    lesson
                        .resources()
                        .iter()
                        .map(|r| r.content_node_id.clone()),
                );
            }
        }

        if wanted.is_empty() {
            return Ok(state.progress.clone());
        }
        Ok(state
            .progress
            .iter()
            .filter(|update| wanted.contains(&update.content_id))
            .cloned()
            .collect())
    }
}

//
// ─── REMOTE BUNDLE ─────────────────────────────────────────────────────────────
//

/// Aggregates the client contracts behind trait objects so backends can be
/// swapped without touching consumers.
#[derive(Clone)]
pub struct Remote {
    pub classrooms: Arc<dyn ClassroomClient>,
    pub content: Arc<dyn ContentClient>,
    pub progress: Arc<dyn ProgressClient>,
}

impl Remote {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_in_memory(InMemoryClient::new())
    }

    #[must_use]
    pub fn from_in_memory(client: InMemoryClient) -> Self {
        let classrooms: Arc<dyn ClassroomClient> = Arc::new(client.clone());
        let content: Arc<dyn ContentClient> = Arc::new(client.clone());
        let progress: Arc<dyn ProgressClient> = Arc::new(client);
        Self {
            classrooms,
            content,
            progress,
        }
    }
}
