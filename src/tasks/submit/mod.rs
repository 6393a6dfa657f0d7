//! The multi-block submission loop.

mod error;
pub use error::SubmissionError;

mod task;
pub use task::{Inclusion, SubmissionAttempt, SubmitSettings, SubmitTask};
