//! Engine error types
//!
//! Step-local problems (`StepError`) never abort the run: the orchestration
//! loop records them as failed steps with exit code 127 and moves on. Only
//! `RunError` is fatal to a run.

use std::path::PathBuf;

/// A step could not be prepared or started. Recorded as a failed step.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("empty shell specification")]
    EmptyShell,

    #[error("working directory {0:?} not found")]
    WorkdirNotFound(PathBuf),

    #[error("working directory {0:?} is not a directory")]
    WorkdirNotDirectory(PathBuf),

    #[error("stat working directory {path:?}: {source}")]
    WorkdirStat {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("determine working directory: {0}")]
    NoWorkingDirectory(std::io::Error),

    #[error("spawn {program:?}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("wait for {program:?}: {source}")]
    Wait {
        program: String,
        source: std::io::Error,
    },
}

/// A problem fatal to the whole run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The renderer could not write to the terminal. The streaming contract
    /// cannot be honored past this point, so the run aborts.
    #[error("render output: {0}")]
    Render(#[from] std::io::Error),
}
