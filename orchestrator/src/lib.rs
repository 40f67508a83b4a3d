//! The central state machine for grading a single submission: stage each
//! exercise's code into the autograder corpus, run hidden tests under the
//! sandbox, render templates, and aggregate everything into one report.
//!
//! Grading runs one submission at a time per process; the working-directory
//! switching the jail's CWD expectation relies on makes this unsafe to run
//! concurrently within a single process. Parallelism comes from running
//! multiple worker processes, not from multiple tasks in one.

mod grade;
mod report;
mod scratch;

pub use grade::{GradeRequest, grade_submission};
pub use report::{Report, write_report_atomically};
pub use scratch::ScratchMode;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("notebook error: {0}")]
    Notebook(#[from] notebook::NotebookError),

    #[error("malformed submission JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sandbox error: {0}")]
    Sandbox(#[from] sandbox::SandboxError),

    #[error("util error: {0}")]
    Util(#[from] util::UtilError),

    #[error("submission is missing required metadata.{0}")]
    MissingMetadata(&'static str),

    #[error("metadata.{field} is not a string")]
    MetadataNotString { field: &'static str },

    #[error("corpus directory does not exist: {0}")]
    CorpusDirMissing(String),

    #[error("duplicate outcome key across exercises: {0}")]
    DuplicateOutcomeKey(String),

    #[error("template {template} exited unsuccessfully")]
    TemplateFailed { template: String },
}
