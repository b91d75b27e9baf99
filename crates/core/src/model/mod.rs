mod classroom;
mod ids;
mod lesson;
mod progress;
mod quiz;
mod resource;
mod route;

pub use classroom::{Assignments, Classroom, ClassroomError};
pub use ids::{ClassId, ContentNodeId, LessonId, QuizId};
pub use lesson::{Lesson, LessonError, LessonProgress};
pub use progress::{ProgressError, ProgressFraction, ProgressMetadata};
pub use quiz::{Quiz, QuizError, QuizProgress, QuizState};
pub use resource::{ContentKind, ContentNode, ResourceEntry, ResourceRef};
pub use route::{PageName, ParamValue, ParsePageNameError, RouteDescriptor};
