//! GitHub Actions workflow parser
//!
//! Reads workflow YAML files into the provider-neutral model. Unsupported
//! features (services, matrix strategies, `if` conditions) produce warnings
//! instead of errors so a partially supported workflow still replays.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::{Defaults, Job, Step, Warning, Workflow};

pub const PROVIDER_NAME: &str = "github";

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("read workflow {file}: {source}")]
    Io {
        file: String,
        source: std::io::Error,
    },

    #[error("parse workflow {file}: {source}")]
    Yaml {
        file: String,
        source: serde_yaml::Error,
    },
}

/// Loads GitHub Actions workflow files relative to a project root.
pub struct Parser {
    root: std::path::PathBuf,
}

impl Parser {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Parse the supplied workflow paths, in order.
    pub fn parse(&self, paths: &[String]) -> Result<(Vec<Workflow>, Vec<Warning>), ParseError> {
        let mut workflows = Vec::with_capacity(paths.len());
        let mut warnings = Vec::new();
        for rel in paths {
            let full = if Path::new(rel).is_absolute() {
                Path::new(rel).to_path_buf()
            } else {
                self.root.join(rel)
            };
            let content = std::fs::read_to_string(&full).map_err(|source| ParseError::Io {
                file: rel.clone(),
                source,
            })?;
            let (wf, mut warns) = parse_workflow_str(&content, rel)?;
            workflows.push(wf);
            warnings.append(&mut warns);
        }
        Ok((workflows, warnings))
    }
}

/// Parse one workflow document. `display_path` is used for the model path,
/// the default name, and warning attribution.
pub fn parse_workflow_str(
    content: &str,
    display_path: &str,
) -> Result<(Workflow, Vec<Warning>), ParseError> {
    let doc: WorkflowDocument =
        serde_yaml::from_str(content).map_err(|source| ParseError::Yaml {
            file: display_path.to_string(),
            source,
        })?;

    let mut name = doc.name.unwrap_or_default();
    if name.is_empty() {
        name = Path::new(display_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(display_path)
            .to_string();
    }

    let mut warnings = Vec::new();
    let mut jobs = Vec::with_capacity(doc.jobs.len());

    // BTreeMap iteration gives the sorted job-id order the report relies on.
    for (job_id, job_doc) in &doc.jobs {
        let mut job = Job {
            name: job_doc.name.clone().unwrap_or_default(),
            raw_id: job_id.clone(),
            env: convert_env(&job_doc.env),
            defaults: job_doc.defaults.to_model(),
            steps: Vec::with_capacity(job_doc.steps.len()),
        };
        if job.name.is_empty() {
            job.name = job_id.clone();
        }

        if job_doc.services.is_some() {
            warnings.push(Warning::new(display_path, job_id, "services are not supported"));
        }
        if job_doc.strategy.matrix.is_some() {
            warnings.push(Warning::new(
                display_path,
                job_id,
                "strategy.matrix is not supported",
            ));
        }
        if !job_doc.condition.is_empty() {
            warnings.push(Warning::new(
                display_path,
                job_id,
                "job-level if condition is ignored",
            ));
        }

        for (idx, step_doc) in job_doc.steps.iter().enumerate() {
            let mut step = Step {
                name: step_doc.name.clone().unwrap_or_default(),
                run: step_doc.run.clone().unwrap_or_default(),
                uses: step_doc.uses.clone().unwrap_or_default(),
                shell: step_doc.shell.clone().unwrap_or_default(),
                working_directory: step_doc.working_directory.clone().unwrap_or_default(),
                env: convert_env(&step_doc.env),
            };
            if step.name.is_empty() {
                step.name = format!("step {}", idx + 1);
            }
            if !step_doc.condition.is_empty() {
                warnings.push(Warning::new(
                    display_path,
                    job_id,
                    format!("step {:?} has unsupported if condition", step.name),
                ));
            }
            job.steps.push(step);
        }

        jobs.push(job);
    }

    let workflow = Workflow {
        path: display_path.to_string(),
        name,
        env: convert_env(&doc.env),
        defaults: doc.defaults.to_model(),
        jobs,
    };

    Ok((workflow, warnings))
}

// Raw YAML document structs. Env values may be numbers or booleans in real
// workflow files, so they are decoded as YAML values and coerced to strings.

#[derive(Debug, Default, Deserialize)]
struct WorkflowDocument {
    name: Option<String>,
    #[serde(default)]
    env: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    defaults: DefaultsDocument,
    #[serde(default)]
    jobs: BTreeMap<String, JobDocument>,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultsDocument {
    #[serde(default)]
    run: RunDefaultsDocument,
}

impl DefaultsDocument {
    fn to_model(&self) -> Defaults {
        Defaults {
            run_shell: self.run.shell.clone().unwrap_or_default(),
            working_directory: self.run.working_directory.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RunDefaultsDocument {
    shell: Option<String>,
    #[serde(rename = "working-directory")]
    working_directory: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JobDocument {
    name: Option<String>,
    #[serde(default)]
    env: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    defaults: DefaultsDocument,
    #[serde(default)]
    steps: Vec<StepDocument>,
    #[serde(default)]
    services: Option<serde_yaml::Value>,
    #[serde(default)]
    strategy: StrategyDocument,
    #[serde(default, rename = "if")]
    condition: String,
}

#[derive(Debug, Default, Deserialize)]
struct StrategyDocument {
    #[serde(default)]
    matrix: Option<serde_yaml::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct StepDocument {
    name: Option<String>,
    run: Option<String>,
    uses: Option<String>,
    shell: Option<String>,
    #[serde(rename = "working-directory")]
    working_directory: Option<String>,
    #[serde(default)]
    env: BTreeMap<String, serde_yaml::Value>,
    #[serde(default, rename = "if")]
    condition: String,
}

fn convert_env(input: &BTreeMap<String, serde_yaml::Value>) -> BTreeMap<String, String> {
    input
        .iter()
        .map(|(k, v)| (k.clone(), scalar_to_string(v)))
        .collect()
}

fn scalar_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}
