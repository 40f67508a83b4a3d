//! Rewrites a master notebook into the two derivative artifacts consumed
//! downstream: a student-facing notebook with solutions stripped, and an
//! intermediate "autograder notebook" whose cells each correspond to one
//! hidden-test file to be written into the autograder corpus.

mod autograder;
mod markers;
mod metadata;
mod student;

pub use autograder::{AutograderFile, to_autograder};
pub use student::to_student;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("notebook error: {0}")]
    Notebook(#[from] notebook::NotebookError),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("assignment_id is not a string")]
    AssignmentIdNotString,

    #[error("exercise_id is not a string")]
    ExerciseIdNotString,

    #[error("BEGIN PROMPT has no matching END PROMPT")]
    UnterminatedPrompt,

    #[error("END PROMPT appears before BEGIN PROMPT")]
    PromptOutOfOrder,

    #[error(
        "cell has mismatched number of BEGIN SOLUTION and END SOLUTION markers, {begin} != {end}"
    )]
    MismatchedSolutionMarkers { begin: usize, end: usize },

    #[error("BEGIN UNITTEST has no matching END UNITTEST")]
    UnterminatedUnittest,

    #[error("could not detect a test class declaration for unittest cell")]
    UndetectableTestClass,
}
