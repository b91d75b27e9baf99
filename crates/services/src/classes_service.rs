use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

use client::{ClassroomClient, ContentClient};
use learner_core::model::{
    ClassId, Classroom, ContentNode, ContentNodeId, Lesson, LessonId, ProgressMetadata, Quiz,
    ResourceEntry,
};

use crate::error::ClassesServiceError;
use crate::progress_store::ProgressStore;

#[derive(Default)]
struct ClassesState {
    classrooms: Vec<Classroom>,
    // sequence of the fetch whose response last replaced the collection /
    // each classroom; later-issued fetches win over slower earlier ones
    collection_seq: u64,
    class_seq: HashMap<ClassId, u64>,
}

/// Owns the learner's classroom collection and derives assignment views.
///
/// The collection is replaced wholesale by `fetch_classes` and per-identifier
/// by `fetch_class`; every derived view recomputes from the current state on
/// each call.
pub struct ClassesService {
    client: Arc<dyn ClassroomClient>,
    content: Arc<dyn ContentClient>,
    progress: Arc<ProgressStore>,
    state: RwLock<ClassesState>,
    fetch_seq: AtomicU64,
}

impl ClassesService {
    #[must_use]
    pub fn new(
        client: Arc<dyn ClassroomClient>,
        content: Arc<dyn ContentClient>,
        progress: Arc<ProgressStore>,
    ) -> Self {
        Self {
            client,
            content,
            progress,
            state: RwLock::new(ClassesState::default()),
            fetch_seq: AtomicU64::new(0),
        }
    }

    fn ticket(&self) -> u64 {
        self.fetch_seq.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, ClassesState>, ClassesServiceError> {
        self.state.read().map_err(|_| ClassesServiceError::Poisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, ClassesState>, ClassesServiceError> {
        self.state
            .write()
            .map_err(|_| ClassesServiceError::Poisoned)
    }

    // ─── Fetches ───────────────────────────────────────────────────────────────

    /// Replace the classroom collection wholesale. `force` bypasses the remote
    /// client's response cache.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Client` if the fetch fails; the previous
    /// state is kept untouched on failure.
    pub async fn fetch_classes(&self, force: bool) -> Result<(), ClassesServiceError> {
        let ticket = self.ticket();
        let classrooms = self.client.list_classrooms(force).await?;

        let mut state = self.write()?;
        if ticket <= state.collection_seq {
            debug!(ticket, "discarding stale classroom list response");
            return Ok(());
        }
        debug!(count = classrooms.len(), "replacing classroom collection");
        state.collection_seq = ticket;
        state.classrooms = classrooms;
        Ok(())
    }

    /// Fetch one classroom's full detail and merge it in by identifier: the
    /// existing entry is removed and the fresh one appended, so stale
    /// assignment data never lingers beside fresh metadata.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Client` if the fetch fails.
    pub async fn fetch_class(&self, id: &ClassId, force: bool) -> Result<(), ClassesServiceError> {
        let ticket = self.ticket();
        let classroom = self.client.get_classroom(id, force).await?;

        let mut state = self.write()?;
        if ticket <= state.class_seq.get(id).copied().unwrap_or(0) {
            debug!(class = %id, ticket, "discarding stale classroom response");
            return Ok(());
        }
        state.class_seq.insert(id.clone(), ticket);
        state.classrooms.retain(|c| c.id() != id);
        state.classrooms.push(classroom);
        Ok(())
    }

    /// Fetch one lesson's detail, priming the node cache with its inlined
    /// content nodes and the progress store with their progress.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Client` if the fetch fails.
    pub async fn fetch_lesson(&self, id: &LessonId) -> Result<Lesson, ClassesServiceError> {
        let lesson = self.client.get_lesson(id).await?;

        let inlined: Vec<ContentNode> = lesson
            .resources()
            .iter()
            .filter_map(|r| r.content_node.clone())
            .collect();
        self.content.cache_nodes(&inlined).await;

        for resource in lesson.resources() {
            if let Some(fraction) = resource.progress {
                self.progress.set_progress(
                    &resource.content_node_id,
                    fraction,
                    ProgressMetadata::default(),
                )?;
            }
        }
        Ok(lesson)
    }

    // ─── Derived Views ─────────────────────────────────────────────────────────

    /// Snapshot of the classroom collection.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Poisoned` if the state lock is poisoned.
    pub fn classrooms(&self) -> Result<Vec<Classroom>, ClassesServiceError> {
        Ok(self.read()?.classrooms.clone())
    }

    /// Every lesson across the learner's classrooms. The list endpoint already
    /// filters to active lessons, so this is a flatten, not a re-filter.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Poisoned` if the state lock is poisoned.
    pub fn active_classes_lessons(&self) -> Result<Vec<Lesson>, ClassesServiceError> {
        let state = self.read()?;
        Ok(state
            .classrooms
            .iter()
            .flat_map(|c| c.lessons().iter().cloned())
            .collect())
    }

    /// Every active quiz across the learner's classrooms.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Poisoned` if the state lock is poisoned.
    pub fn active_classes_quizzes(&self) -> Result<Vec<Quiz>, ClassesServiceError> {
        let state = self.read()?;
        Ok(state
            .classrooms
            .iter()
            .flat_map(|c| c.quizzes().iter())
            .filter(|q| q.is_active())
            .cloned()
            .collect())
    }

    /// Active quizzes the learner has started but not submitted.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Poisoned` if the state lock is poisoned.
    pub fn resumable_classes_quizzes(&self) -> Result<Vec<Quiz>, ClassesServiceError> {
        let state = self.read()?;
        Ok(state
            .classrooms
            .iter()
            .flat_map(|c| c.quizzes().iter())
            .filter(|q| q.is_resumable())
            .cloned()
            .collect())
    }

    /// Started-but-unfinished lesson resources across every classroom,
    /// annotated with where they live. Only resources with both a progress
    /// value and a resolved content node qualify.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Poisoned` if the state lock is poisoned.
    pub fn resumable_classes_resources(&self) -> Result<Vec<ResourceEntry>, ClassesServiceError> {
        let state = self.read()?;
        let mut entries = Vec::new();
        for classroom in &state.classrooms {
            for lesson in classroom.lessons() {
                for resource in lesson.resources() {
                    let Some(progress) = resource.progress else {
                        continue;
                    };
                    let Some(node) = resource.content_node.clone() else {
                        continue;
                    };
                    if progress.is_complete() {
                        continue;
                    }
                    entries.push(ResourceEntry {
                        content_node_id: resource.content_node_id.clone(),
                        progress,
                        lesson_id: lesson.id().clone(),
                        class_id: classroom.id().clone(),
                        content_node: node,
                    });
                }
            }
        }
        Ok(entries)
    }

    /// True when every active lesson is complete and every active quiz is
    /// closed. Vacuously true with no active assignments.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Poisoned` if the state lock is poisoned.
    pub fn learner_finished_all_classes(&self) -> Result<bool, ClassesServiceError> {
        let state = self.read()?;
        let lessons_done = state
            .classrooms
            .iter()
            .flat_map(|c| c.lessons().iter())
            .filter(|l| l.is_active())
            .all(|l| l.progress().is_complete());
        let quizzes_done = state
            .classrooms
            .iter()
            .flat_map(|c| c.quizzes().iter())
            .filter(|q| q.is_active())
            .all(Quiz::is_finished);
        Ok(lessons_done && quizzes_done)
    }

    /// Look up one classroom. Absence is a normal outcome.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Poisoned` if the state lock is poisoned.
    pub fn get_class(&self, id: &ClassId) -> Result<Option<Classroom>, ClassesServiceError> {
        let state = self.read()?;
        Ok(state.classrooms.iter().find(|c| c.id() == id).cloned())
    }

    /// Active lessons of one classroom; empty when the classroom is absent.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Poisoned` if the state lock is poisoned.
    pub fn class_active_lessons(&self, id: &ClassId) -> Result<Vec<Lesson>, ClassesServiceError> {
        let state = self.read()?;
        Ok(state
            .classrooms
            .iter()
            .find(|c| c.id() == id)
            .map(|c| {
                c.lessons()
                    .iter()
                    .filter(|l| l.is_active())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Active quizzes of one classroom; empty when the classroom is absent.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Poisoned` if the state lock is poisoned.
    pub fn class_active_quizzes(&self, id: &ClassId) -> Result<Vec<Quiz>, ClassesServiceError> {
        let state = self.read()?;
        Ok(state
            .classrooms
            .iter()
            .find(|c| c.id() == id)
            .map(|c| {
                c.quizzes()
                    .iter()
                    .filter(|q| q.is_active())
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Every content node id referenced by any lesson across the collection.
    /// Used to partition resumable content into classroom-linked and
    /// independent.
    ///
    /// # Errors
    ///
    /// Returns `ClassesServiceError::Poisoned` if the state lock is poisoned.
    pub fn assigned_content_ids(&self) -> Result<HashSet<ContentNodeId>, ClassesServiceError> {
        let state = self.read()?;
        Ok(state
            .classrooms
            .iter()
            .flat_map(|c| c.lessons().iter())
            .flat_map(|l| l.resources().iter())
            .map(|r| r.content_node_id.clone())
            .collect())
    }
}
