//! HTTP backend for the remote resource client contracts.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::debug;
use url::Url;

use learner_core::model::{
    Assignments, ClassId, Classroom, ContentKind, ContentNode, ContentNodeId, Lesson, LessonId,
    LessonProgress, ProgressFraction, ProgressMetadata, Quiz, QuizId, QuizProgress, ResourceRef,
};

use crate::remote::{
    ClassroomClient, ClientError, ContentClient, ProgressClient, ProgressFilter, ProgressUpdate,
    Remote, ResumePage,
};

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct HttpClientConfig {
    pub base_url: String,
}

impl HttpClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Reads the base URL from `LEARN_API_BASE_URL`. Returns `None` when the
    /// variable is unset or blank.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("LEARN_API_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self { base_url })
    }
}

//
// ─── WIRE RECORDS ──────────────────────────────────────────────────────────────
//

// These mirror the server payloads so deserialization stays out of the domain
// layer; each record converts into its domain type fallibly.

#[derive(Debug, Deserialize)]
struct ClassroomRecord {
    id: String,
    name: String,
    #[serde(default)]
    assignments: AssignmentsRecord,
}

#[derive(Debug, Default, Deserialize)]
struct AssignmentsRecord {
    #[serde(default)]
    lessons: Vec<LessonRecord>,
    #[serde(default)]
    exams: Vec<QuizRecord>,
}

#[derive(Debug, Deserialize)]
struct LessonRecord {
    id: String,
    title: String,
    is_active: bool,
    collection: String,
    #[serde(default)]
    resources: Vec<ResourceRecord>,
    progress: LessonProgressRecord,
}

#[derive(Debug, Deserialize)]
struct LessonProgressRecord {
    resource_progress: u32,
    total_resources: u32,
}

#[derive(Debug, Deserialize)]
struct ResourceRecord {
    contentnode_id: String,
    #[serde(default)]
    contentnode: Option<ContentNodeRecord>,
    #[serde(default)]
    progress: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ContentNodeRecord {
    id: String,
    title: String,
    kind: ContentKind,
    #[serde(default)]
    last_interaction: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct QuizRecord {
    id: String,
    title: String,
    active: bool,
    collection: String,
    #[serde(default)]
    progress: QuizProgressRecord,
}

#[derive(Debug, Default, Deserialize)]
struct QuizProgressRecord {
    #[serde(default)]
    started: bool,
    #[serde(default)]
    closed: bool,
}

#[derive(Debug, Deserialize)]
struct ResumePageRecord {
    results: Vec<ContentNodeRecord>,
    #[serde(default)]
    more: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProgressRecord {
    content_id: String,
    progress: f64,
    #[serde(default)]
    total_questions: Option<u32>,
    #[serde(default)]
    answered_questions: Option<u32>,
}

fn decode_err(err: impl fmt::Display) -> ClientError {
    ClientError::Decode(err.to_string())
}

impl ContentNodeRecord {
    fn into_node(self) -> ContentNode {
        ContentNode::new(
            ContentNodeId::new(self.id),
            self.title,
            self.kind,
            self.last_interaction,
        )
    }
}

impl ResourceRecord {
    fn into_resource(self) -> Result<ResourceRef, ClientError> {
        let mut resource = ResourceRef::new(ContentNodeId::new(self.contentnode_id));
        if let Some(node) = self.contentnode {
            resource = resource.with_content_node(node.into_node());
        }
        if let Some(fraction) = self.progress {
            resource = resource.with_progress(ProgressFraction::new(fraction).map_err(decode_err)?);
        }
        Ok(resource)
    }
}

impl LessonRecord {
    fn into_lesson(self) -> Result<Lesson, ClientError> {
        let progress =
            LessonProgress::new(self.progress.resource_progress, self.progress.total_resources)
                .map_err(decode_err)?;
        let resources = self
            .resources
            .into_iter()
            .map(ResourceRecord::into_resource)
            .collect::<Result<Vec<_>, _>>()?;
        Lesson::new(
            LessonId::new(self.id),
            self.title,
            self.is_active,
            ClassId::new(self.collection),
            resources,
            progress,
        )
        .map_err(decode_err)
    }
}

impl QuizRecord {
    fn into_quiz(self) -> Result<Quiz, ClientError> {
        Quiz::new(
            QuizId::new(self.id),
            self.title,
            self.active,
            ClassId::new(self.collection),
            QuizProgress {
                started: self.progress.started,
                closed: self.progress.closed,
            },
        )
        .map_err(decode_err)
    }
}

impl ClassroomRecord {
    fn into_classroom(self) -> Result<Classroom, ClientError> {
        let lessons = self
            .assignments
            .lessons
            .into_iter()
            .map(LessonRecord::into_lesson)
            .collect::<Result<Vec<_>, _>>()?;
        let exams = self
            .assignments
            .exams
            .into_iter()
            .map(QuizRecord::into_quiz)
            .collect::<Result<Vec<_>, _>>()?;
        Classroom::new(
            ClassId::new(self.id),
            self.name,
            Assignments { lessons, exams },
        )
        .map_err(decode_err)
    }
}

impl ProgressRecord {
    fn into_update(self) -> Result<ProgressUpdate, ClientError> {
        Ok(ProgressUpdate {
            content_id: ContentNodeId::new(self.content_id),
            fraction: ProgressFraction::new(self.progress).map_err(decode_err)?,
            metadata: ProgressMetadata {
                total_questions: self.total_questions,
                answered_questions: self.answered_questions,
            },
        })
    }
}

//
// ─── HTTP CLIENT ───────────────────────────────────────────────────────────────
//

/// `reqwest`-backed client for the learner API.
///
/// Keeps a per-classroom response cache that `force: true` bypasses, and a
/// node cache primed by resume fetches and `cache_nodes` hints.
pub struct HttpClient {
    http: reqwest::Client,
    base: Url,
    list_cache: Mutex<Option<Vec<Classroom>>>,
    classroom_cache: Mutex<HashMap<ClassId, Classroom>>,
    node_cache: Mutex<HashMap<ContentNodeId, ContentNode>>,
}

impl HttpClient {
    /// Builds a client against the configured base URL.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Url` or `ClientError::InvalidBaseUrl` if the base
    /// URL cannot be used.
    pub fn new(config: &HttpClientConfig) -> Result<Self, ClientError> {
        let base = Url::parse(&config.base_url)?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl(config.base_url.clone()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            list_cache: Mutex::new(None),
            classroom_cache: Mutex::new(HashMap::new()),
            node_cache: Mutex::new(HashMap::new()),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // construction guarantees the base can carry path segments
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        debug!(url = %url, "fetching");
        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound);
        }
        if !response.status().is_success() {
            return Err(ClientError::HttpStatus(response.status()));
        }
        Ok(response.json::<T>().await?)
    }

    fn remember_nodes(&self, nodes: &[ContentNode]) {
        if let Ok(mut cache) = self.node_cache.lock() {
            for node in nodes {
                cache.insert(node.id().clone(), node.clone());
            }
        }
    }
}

#[async_trait]
impl ClassroomClient for HttpClient {
    async fn list_classrooms(&self, force: bool) -> Result<Vec<Classroom>, ClientError> {
        if !force {
            let cache = self
                .list_cache
                .lock()
                .map_err(|e| ClientError::Connection(e.to_string()))?;
            if let Some(cached) = cache.as_ref() {
                return Ok(cached.clone());
            }
        }

        let records: Vec<ClassroomRecord> = self
            .get_json(self.endpoint(&["api", "learner", "classrooms"]))
            .await?;
        let classrooms = records
            .into_iter()
            .map(ClassroomRecord::into_classroom)
            .collect::<Result<Vec<_>, _>>()?;

        let mut cache = self
            .list_cache
            .lock()
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        *cache = Some(classrooms.clone());
        Ok(classrooms)
    }

    async fn get_classroom(&self, id: &ClassId, force: bool) -> Result<Classroom, ClientError> {
        if !force {
            let cache = self
                .classroom_cache
                .lock()
                .map_err(|e| ClientError::Connection(e.to_string()))?;
            if let Some(cached) = cache.get(id) {
                return Ok(cached.clone());
            }
        }

        let record: ClassroomRecord = self
            .get_json(self.endpoint(&["api", "learner", "classrooms", id.as_str()]))
            .await?;
        let classroom = record.into_classroom()?;

        let mut cache = self
            .classroom_cache
            .lock()
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        cache.insert(id.clone(), classroom.clone());
        Ok(classroom)
    }

    async fn get_lesson(&self, id: &LessonId) -> Result<Lesson, ClientError> {
        let record: LessonRecord = self
            .get_json(self.endpoint(&["api", "learner", "lessons", id.as_str()]))
            .await?;
        record.into_lesson()
    }
}

#[async_trait]
impl ContentClient for HttpClient {
    async fn fetch_resume(&self, page: Option<&str>) -> Result<ResumePage, ClientError> {
        let mut url = self.endpoint(&["api", "learner", "contentnodes", "resume"]);
        if let Some(token) = page {
            url.query_pairs_mut().append_pair("page", token);
        }

        let record: ResumePageRecord = self.get_json(url).await?;
        let results: Vec<ContentNode> = record
            .results
            .into_iter()
            .map(ContentNodeRecord::into_node)
            .collect();
        self.remember_nodes(&results);

        Ok(ResumePage {
            results,
            more: record.more,
        })
    }

    async fn cache_nodes(&self, nodes: &[ContentNode]) {
        debug!(count = nodes.len(), "priming node cache");
        self.remember_nodes(nodes);
    }

    async fn cached_node(&self, id: &ContentNodeId) -> Option<ContentNode> {
        self.node_cache.lock().ok()?.get(id).cloned()
    }
}

#[async_trait]
impl ProgressClient for HttpClient {
    async fn list_progress(
        &self,
        filter: &ProgressFilter,
    ) -> Result<Vec<ProgressUpdate>, ClientError> {
        let mut url = self.endpoint(&["api", "learner", "progress"]);
        {
            let mut query = url.query_pairs_mut();
            if let Some(lesson_id) = &filter.lesson_id {
                query.append_pair("lesson", lesson_id.as_str());
            }
            if !filter.content_ids.is_empty() {
                let ids: Vec<&str> = filter.content_ids.iter().map(ContentNodeId::as_str).collect();
                query.append_pair("content_ids", &ids.join(","));
            }
        }

        let records: Vec<ProgressRecord> = self.get_json(url).await?;
        records.into_iter().map(ProgressRecord::into_update).collect()
    }
}

impl Remote {
    /// Bundle backed by the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if the base URL is unusable.
    pub fn http(config: &HttpClientConfig) -> Result<Self, ClientError> {
        let client = Arc::new(HttpClient::new(config)?);
        Ok(Self {
            classrooms: client.clone(),
            content: client.clone(),
            progress: client,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classroom_record_decodes_nested_assignments() {
        let payload = r#"{
            "id": "c1",
            "name": "Grade 5 Math",
            "assignments": {
                "lessons": [{
                    "id": "l1",
                    "title": "Fractions",
                    "is_active": true,
                    "collection": "c1",
                    "resources": [{
                        "contentnode_id": "n1",
                        "contentnode": {"id": "n1", "title": "Halves", "kind": "video"},
                        "progress": 0.5
                    }],
                    "progress": {"resource_progress": 1, "total_resources": 2}
                }],
                "exams": [{
                    "id": "q1",
                    "title": "Unit Quiz",
                    "active": true,
                    "collection": "c1",
                    "progress": {"started": true, "closed": false}
                }]
            }
        }"#;

        let record: ClassroomRecord = serde_json::from_str(payload).unwrap();
        let classroom = record.into_classroom().unwrap();

        assert_eq!(classroom.name(), "Grade 5 Math");
        assert_eq!(classroom.lessons().len(), 1);
        assert_eq!(classroom.quizzes().len(), 1);

        let lesson = &classroom.lessons()[0];
        assert!(!lesson.progress().is_complete());
        let resource = &lesson.resources()[0];
        assert_eq!(resource.progress.unwrap().value(), 0.5);
        assert_eq!(
            resource.content_node.as_ref().map(|n| n.kind()),
            Some(ContentKind::Video)
        );
    }

    #[test]
    fn list_payload_may_omit_assignments() {
        let record: ClassroomRecord =
            serde_json::from_str(r#"{"id": "c1", "name": "Science"}"#).unwrap();
        let classroom = record.into_classroom().unwrap();
        assert!(classroom.lessons().is_empty());
        assert!(classroom.quizzes().is_empty());
    }

    #[test]
    fn out_of_range_progress_is_a_decode_error() {
        let record: ProgressRecord =
            serde_json::from_str(r#"{"content_id": "n1", "progress": 1.4}"#).unwrap();
        let err = record.into_update().unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn quiz_record_defaults_progress_flags() {
        let record: QuizRecord = serde_json::from_str(
            r#"{"id": "q1", "title": "Quiz", "active": false, "collection": "c1"}"#,
        )
        .unwrap();
        let quiz = record.into_quiz().unwrap();
        assert!(!quiz.progress().started);
        assert!(!quiz.progress().closed);
    }
}
