mod answers;
mod ids;
mod question;
mod quiz;
mod result;

pub use answers::AnswerMap;
pub use ids::{AttemptId, ParticipationId, QuestionId, QuizId};
pub use question::{MIN_OPTIONS, Question, QuestionError};
pub use quiz::{AvailabilityWindow, Quiz, QuizAvailability, QuizError};
pub use result::{ReviewedAnswer, ScorePatch, SessionResult};
