use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{ClassId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,
}

//
// ─── PROGRESS ──────────────────────────────────────────────────────────────────
//

/// Raw started/closed flags as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizProgress {
    pub started: bool,
    pub closed: bool,
}

/// A quiz attempt's lifecycle, derived once from the raw flags so call sites
/// can match exhaustively instead of re-checking booleans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizState {
    NotStarted,
    InProgress,
    Closed,
}

impl QuizProgress {
    /// Collapses the flags into an explicit lifecycle state. A closed quiz is
    /// `Closed` regardless of the started flag.
    #[must_use]
    pub fn state(self) -> QuizState {
        if self.closed {
            QuizState::Closed
        } else if self.started {
            QuizState::InProgress
        } else {
            QuizState::NotStarted
        }
    }
}

//
// ─── QUIZ ──────────────────────────────────────────────────────────────────────
//

/// An assessment assignment within a classroom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    id: QuizId,
    title: String,
    active: bool,
    classroom_id: ClassId,
    progress: QuizProgress,
}

impl Quiz {
    /// Creates a new Quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: QuizId,
        title: impl Into<String>,
        active: bool,
        classroom_id: ClassId,
        progress: QuizProgress,
    ) -> Result<Self, QuizError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(QuizError::EmptyTitle);
        }

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            active,
            classroom_id,
            progress,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &QuizId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub fn classroom_id(&self) -> &ClassId {
        &self.classroom_id
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        self.progress
    }

    /// An active quiz the learner has started but not yet submitted.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        self.active && self.progress.state() == QuizState::InProgress
    }

    /// A quiz whose attempt has been submitted.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.progress.state() == QuizState::Closed
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
