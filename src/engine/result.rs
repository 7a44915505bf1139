//! Execution result types

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Disposition of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Passed,
    Failed,
    Skipped,
}

impl StepStatus {
    /// Glyph used by the pretty and streaming renderers.
    pub fn glyph(&self) -> &'static str {
        match self {
            StepStatus::Passed => "✓",
            StepStatus::Failed => "✗",
            StepStatus::Skipped => "-",
        }
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepStatus::Passed => "passed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        };
        f.write_str(s)
    }
}

/// Outcome of one step. Immutable once appended to the run's result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub workflow_path: String,
    pub workflow_name: String,
    pub job_name: String,
    pub step_name: String,
    pub step_run: String,
    pub status: StepStatus,
    #[serde(skip, default)]
    pub duration: Duration,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stdout: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub stderr: String,
    pub exit_code: i32,
    pub dry_run: bool,
}

impl StepResult {
    /// Label used when rendering: the step name, or the script when unnamed.
    pub fn label(&self) -> &str {
        if self.step_name.is_empty() {
            &self.step_run
        } else {
            &self.step_name
        }
    }
}

/// Aggregated run results. `passed + failed + skipped == total_steps` and
/// `exit_code == 1` exactly when `failed > 0`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Summary {
    pub total_workflows: usize,
    pub total_jobs: usize,
    pub total_steps: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    #[serde(skip, default)]
    pub duration: Duration,
    pub duration_ms: u64,
    pub exit_code: i32,
}
