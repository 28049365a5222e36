mod play_vm;
mod quiz_intro_vm;
mod results_vm;
mod time_fmt;

pub use play_vm::{NavigatorEntryVm, PlayVm};
pub use quiz_intro_vm::{QuizIntroVm, time_per_question_label};
pub use results_vm::{PerformanceTier, ResultsVm, ReviewEntryVm, ReviewStatus, present};
pub use time_fmt::{format_countdown, format_datetime, format_duration};
