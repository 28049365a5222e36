pub mod vm;

pub use vm::{PlayVm, QuizIntroVm, ResultsVm, present};
