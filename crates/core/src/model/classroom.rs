use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ClassId;
use crate::model::lesson::Lesson;
use crate::model::quiz::Quiz;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassroomError {
    #[error("classroom name cannot be empty")]
    EmptyName,
}

/// Lesson and quiz assignments attached to a classroom.
///
/// Lightweight list fetches may omit assignments entirely, in which case both
/// sequences are empty until a detail fetch fills them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignments {
    pub lessons: Vec<Lesson>,
    pub exams: Vec<Quiz>,
}

/// A group enrollment unit associating the learner with lessons and quizzes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classroom {
    id: ClassId,
    name: String,
    assignments: Assignments,
}

impl Classroom {
    /// Creates a new Classroom.
    ///
    /// # Errors
    ///
    /// Returns `ClassroomError::EmptyName` if the name is empty or
    /// whitespace-only.
    pub fn new(
        id: ClassId,
        name: impl Into<String>,
        assignments: Assignments,
    ) -> Result<Self, ClassroomError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ClassroomError::EmptyName);
        }

        Ok(Self {
            id,
            name: name.trim().to_owned(),
            assignments,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> &ClassId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn assignments(&self) -> &Assignments {
        &self.assignments
    }

    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.assignments.lessons
    }

    #[must_use]
    pub fn quizzes(&self) -> &[Quiz] {
        &self.assignments.exams
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classroom_rejects_empty_name() {
        let err = Classroom::new(ClassId::new("c1"), "   ", Assignments::default()).unwrap_err();
        assert_eq!(err, ClassroomError::EmptyName);
    }

    #[test]
    fn classroom_trims_name() {
        let classroom =
            Classroom::new(ClassId::new("c1"), "  Grade 5 Math  ", Assignments::default())
                .unwrap();
        assert_eq!(classroom.name(), "Grade 5 Math");
        assert!(classroom.lessons().is_empty());
        assert!(classroom.quizzes().is_empty());
    }
}
