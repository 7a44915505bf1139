//! Run orchestration
//!
//! A run walks the filtered workflows in order and executes every runnable
//! step sequentially, reporting progress through a `RunRenderer`. Step
//! failures never stop the run; they are recorded and the loop moves on to
//! the next step. Only renderer I/O errors abort a run.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::engine::command::build_command;
use crate::engine::env::{merge_env, process_env};
use crate::engine::error::{RunError, StepError};
use crate::engine::exec::{run_command, tail_lines, Mirror};
use crate::engine::gate::{default_privileged_patterns, PrivilegedGate, ALLOW_PRIVILEGED_ENV};
use crate::engine::result::{StepResult, StepStatus, Summary};
use crate::engine::workdir::resolve_working_directory;
use crate::output::RunRenderer;
use crate::workflow::{Job, Step, Workflow};

/// Number of output lines kept from each stream of a failed step.
pub const DEFAULT_TAIL_LINES: usize = 20;

/// Run configuration, assembled by the CLI from flags and config file.
pub struct Options {
    /// Project root; working directories resolve relative to it.
    pub root: PathBuf,

    /// Mirror child output to the terminal as it is produced.
    pub verbose: bool,

    /// Resolve and report every step without executing anything.
    pub dry_run: bool,

    /// Lines kept from each stream when a step fails.
    pub tail: usize,

    /// Run privileged commands instead of skipping them.
    pub allow_privileged: bool,

    /// Privileged command patterns; empty means the built-in set.
    pub privileged_patterns: Vec<String>,

    /// Base environment for steps. `None` inherits the process environment.
    pub env: Option<Vec<(String, String)>>,

    /// Where mirrored output goes in verbose mode. `None` means the
    /// terminal.
    pub mirror: Option<Mirror>,
}

impl Options {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            verbose: false,
            dry_run: false,
            tail: DEFAULT_TAIL_LINES,
            allow_privileged: false,
            privileged_patterns: Vec::new(),
            env: None,
            mirror: None,
        }
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
    pub results: Vec<StepResult>,
    pub summary: Summary,
}

/// Executes workflows. One instance per run.
pub struct Runner {
    root: PathBuf,
    verbose: bool,
    dry_run: bool,
    tail: usize,
    gate: PrivilegedGate,
    base_env: Option<Vec<(String, String)>>,
    mirror: Option<Mirror>,
}

impl Runner {
    pub fn new(mut options: Options) -> Self {
        let allow = options.allow_privileged
            || std::env::var(ALLOW_PRIVILEGED_ENV).is_ok_and(|v| v == "1");
        let patterns = if options.privileged_patterns.is_empty() {
            default_privileged_patterns()
        } else {
            std::mem::take(&mut options.privileged_patterns)
        };
        let mirror = if options.verbose {
            Some(options.mirror.take().unwrap_or_else(Mirror::inherit))
        } else {
            None
        };
        Self {
            root: options.root,
            verbose: options.verbose,
            dry_run: options.dry_run,
            tail: options.tail,
            gate: PrivilegedGate::new(&patterns, allow),
            base_env: options.env,
            mirror,
        }
    }

    /// Run every runnable step of every job, in order.
    pub async fn run(
        &self,
        workflows: &[Workflow],
        renderer: &mut dyn RunRenderer,
    ) -> Result<RunReport, RunError> {
        renderer.run_started(workflows)?;
        let mut results = Vec::new();
        let mut total_jobs = 0;

        for wf in workflows {
            for job in &wf.jobs {
                total_jobs += 1;
                info!(workflow = %wf.path, job = %job.name, "job started");
                renderer.job_started(wf, job)?;
                for step in &job.steps {
                    if !step.is_runnable() {
                        continue;
                    }
                    let mut result = self.run_step(wf, job, step).await;
                    info!(
                        workflow = %wf.path,
                        job = %job.name,
                        step = %result.label(),
                        status = %result.status,
                        exit_code = result.exit_code,
                        "step finished"
                    );
                    // The renderer sees the full captured text; only the
                    // stored result is tail-truncated for later display.
                    renderer.step_finished(&result)?;
                    if result.status == StepStatus::Failed {
                        result.stdout = tail_lines(&result.stdout, self.tail);
                        result.stderr = tail_lines(&result.stderr, self.tail);
                    }
                    results.push(result);
                }
                renderer.job_finished(wf, job)?;
            }
        }

        let summary = summarize(workflows.len(), total_jobs, &results);
        renderer.run_finished(&results, &summary)?;
        Ok(RunReport { results, summary })
    }

    async fn run_step(&self, wf: &Workflow, job: &Job, step: &Step) -> StepResult {
        let mut result = StepResult {
            workflow_path: wf.path.clone(),
            workflow_name: wf.name.clone(),
            job_name: job.name.clone(),
            step_name: step.name.clone(),
            step_run: step.run.clone(),
            status: StepStatus::Skipped,
            duration: Duration::ZERO,
            duration_ms: 0,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            dry_run: self.dry_run,
        };

        if let Some(reason) = self.gate.skip_reason(&step.run) {
            result.stderr = reason;
            return result;
        }
        if self.dry_run {
            return result;
        }

        match self.execute(wf, job, step).await {
            Ok((stdout, stderr, exit_code, duration)) => {
                result.duration = duration;
                result.duration_ms = duration.as_millis() as u64;
                result.exit_code = exit_code;
                result.status = if exit_code == 0 {
                    StepStatus::Passed
                } else {
                    StepStatus::Failed
                };
                result.stdout = stdout;
                result.stderr = stderr;
            }
            Err(err) => {
                // Preparation and spawn failures are failed steps, not run
                // failures. 127 mirrors the shell's command-not-found code.
                warn!(step = %step.label(), error = %err, "step could not start");
                result.status = StepStatus::Failed;
                result.exit_code = 127;
                result.stderr = err.to_string();
            }
        }
        result
    }

    async fn execute(
        &self,
        wf: &Workflow,
        job: &Job,
        step: &Step,
    ) -> Result<(String, String, i32, Duration), StepError> {
        let argv = build_command(step, job, wf)?;
        let dir = resolve_working_directory(&self.root, wf, job, step)?;
        let base = match &self.base_env {
            Some(env) => env.clone(),
            None => process_env(),
        };
        let env = merge_env(&base, &[&wf.env, &job.env, &step.env]);
        let mirror = if self.verbose { self.mirror.as_ref() } else { None };
        let outcome = run_command(&argv, &dir, &env, mirror).await?;
        Ok((
            outcome.stdout,
            outcome.stderr,
            outcome.exit_code,
            outcome.duration,
        ))
    }
}

fn summarize(total_workflows: usize, total_jobs: usize, results: &[StepResult]) -> Summary {
    let passed = results
        .iter()
        .filter(|r| r.status == StepStatus::Passed)
        .count();
    let failed = results
        .iter()
        .filter(|r| r.status == StepStatus::Failed)
        .count();
    let skipped = results
        .iter()
        .filter(|r| r.status == StepStatus::Skipped)
        .count();
    // Cumulative step time, not loop wall-clock: orchestration and render
    // overhead stays out of the reported duration.
    let duration: Duration = results.iter().map(|r| r.duration).sum();
    Summary {
        total_workflows,
        total_jobs,
        total_steps: results.len(),
        passed,
        failed,
        skipped,
        duration,
        duration_ms: duration.as_millis() as u64,
        exit_code: if failed > 0 { 1 } else { 0 },
    }
}
