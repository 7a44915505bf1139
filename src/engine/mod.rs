//! Step execution engine
//!
//! This module contains:
//! - `runner` - the sequential run orchestrator
//! - `command` - shell dispatch: step script -> argv
//! - `env` - CI-style environment layering
//! - `workdir` - working directory resolution
//! - `gate` - privileged command skipping
//! - `exec` - process spawning, capture, and exit normalization
//! - `result` - step results and run summary

pub mod command;
pub mod env;
pub mod error;
pub mod exec;
pub mod gate;
pub mod result;
pub mod runner;
pub mod workdir;

pub use command::build_command;
pub use env::{merge_env, process_env};
pub use error::{RunError, StepError};
pub use exec::{run_command, tail_lines, ExecOutcome, Mirror};
pub use gate::{default_privileged_patterns, PrivilegedGate, ALLOW_PRIVILEGED_ENV};
pub use result::{StepResult, StepStatus, Summary};
pub use runner::{Options, RunReport, Runner, DEFAULT_TAIL_LINES};
pub use workdir::resolve_working_directory;
