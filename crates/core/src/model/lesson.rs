use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ClassId, LessonId};
use crate::model::resource::ResourceRef;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("resource progress ({resource_progress}) exceeds total resources ({total_resources})")]
    ProgressExceedsTotal {
        resource_progress: u32,
        total_resources: u32,
    },
}

//
// ─── PROGRESS SUMMARY ──────────────────────────────────────────────────────────
//

/// Count of completed resources against the lesson's total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonProgress {
    resource_progress: u32,
    total_resources: u32,
}

impl LessonProgress {
    /// Creates a lesson progress summary.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::ProgressExceedsTotal` if more resources are
    /// reported complete than the lesson contains.
    pub fn new(resource_progress: u32, total_resources: u32) -> Result<Self, LessonError> {
        if resource_progress > total_resources {
            return Err(LessonError::ProgressExceedsTotal {
                resource_progress,
                total_resources,
            });
        }
        Ok(Self {
            resource_progress,
            total_resources,
        })
    }

    #[must_use]
    pub fn resource_progress(self) -> u32 {
        self.resource_progress
    }

    #[must_use]
    pub fn total_resources(self) -> u32 {
        self.total_resources
    }

    /// A lesson is complete iff every resource is complete. Vacuously true for
    /// a lesson with no resources.
    #[must_use]
    pub fn is_complete(self) -> bool {
        self.resource_progress == self.total_resources
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// An ordered assignment of content resources within a classroom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    id: LessonId,
    title: String,
    is_active: bool,
    classroom_id: ClassId,
    resources: Vec<ResourceRef>,
    progress: LessonProgress,
}

impl Lesson {
    /// Creates a new Lesson.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: LessonId,
        title: impl Into<String>,
        is_active: bool,
        classroom_id: ClassId,
        resources: Vec<ResourceRef>,
        progress: LessonProgress,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            is_active,
            classroom_id,
            resources,
            progress,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &LessonId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    #[must_use]
    pub fn classroom_id(&self) -> &ClassId {
        &self.classroom_id
    }

    #[must_use]
    pub fn resources(&self) -> &[ResourceRef] {
        &self.resources
    }

    #[must_use]
    pub fn progress(&self) -> LessonProgress {
        self.progress
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
