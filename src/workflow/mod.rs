//! Workflow data model, parsing, filtering, and discovery
//!
//! This module contains:
//! - the provider-neutral `Workflow`/`Job`/`Step` model consumed by the engine
//! - `parser` - GitHub Actions YAML -> model
//! - `filter` - job/step pattern filtering
//! - `discovery` - workflow file discovery under `.github/workflows`

pub mod discovery;
pub mod filter;
pub mod parser;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use discovery::{discover_workflows, DiscoveryError};
pub use filter::{filter_workflows, FilterError, Pattern};
pub use parser::{ParseError, Parser};

/// A parsed CI workflow containing jobs, each containing steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    /// Display path of the workflow file, relative to the project root.
    pub path: String,

    /// Workflow name; defaults to the file name when unset in YAML.
    pub name: String,

    /// Environment variables applied to every job in this workflow.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Shared run defaults for all jobs.
    #[serde(default)]
    pub defaults: Defaults,

    /// Jobs with ids sorted by the parser.
    pub jobs: Vec<Job>,
}

/// Shared `defaults.run` configuration for jobs and steps.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Defaults {
    /// Default shell specification, e.g. `bash` or `pwsh -NoLogo`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run_shell: String,

    /// Default working directory relative to the project root.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_directory: String,
}

/// A job with its resolved steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Human-readable name; defaults to the raw id.
    pub name: String,

    /// The job id as written in the workflow file.
    #[serde(rename = "id")]
    pub raw_id: String,

    /// Job-level environment variables.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Job-level run defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Steps in source order.
    pub steps: Vec<Step>,
}

/// A single workflow step. Steps with an empty `run` or a non-empty `uses`
/// are opaque to this tool and never reach the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Step {
    /// Step name; the parser fills in `step N` when unset.
    pub name: String,

    /// Shell script text for run steps.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub run: String,

    /// Action reference for uses steps.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uses: String,

    /// Shell override for this step.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub shell: String,

    /// Working-directory override for this step.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub working_directory: String,

    /// Step-level environment variables.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

impl Step {
    /// Whether this step is a shell step the engine can execute.
    pub fn is_runnable(&self) -> bool {
        !self.run.is_empty() && self.uses.is_empty()
    }

    /// Label used when rendering: the name, or the script for unnamed steps.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.run
        } else {
            &self.name
        }
    }
}

/// A non-fatal issue found while parsing or preparing workflows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub workflow: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub job: String,
    pub message: String,
}

impl Warning {
    pub fn new(
        workflow: impl Into<String>,
        job: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            workflow: workflow.into(),
            job: job.into(),
            message: message.into(),
        }
    }

    /// One-line form used on stderr and in the JSON report.
    pub fn display(&self) -> String {
        if self.job.is_empty() {
            format!("{}: {}", self.workflow, self.message)
        } else {
            format!("{}:{}: {}", self.workflow, self.job, self.message)
        }
    }
}
