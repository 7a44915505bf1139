//! Batch pretty renderer
//!
//! Renders the workflow listing for `list` and the grouped step results
//! after a run. Streaming rendering lives in `stream`; this renderer only
//! writes once the run is over, so it works on non-terminal writers too.

use std::io::{self, Write};

use crate::engine::{StepResult, StepStatus, Summary};
use crate::output::{decorate_name, format_duration, RunRenderer};
use crate::workflow::Workflow;

/// Writes human-readable listings and results to any writer.
pub struct PrettyRenderer<W: Write> {
    out: W,
}

impl<W: Write> PrettyRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Workflow listing used by `list`: workflows, their jobs, and bullet
    /// lines for each runnable step.
    pub fn render_list(&mut self, workflows: &[Workflow]) -> io::Result<()> {
        for wf in workflows {
            writeln!(self.out, "{}", decorate_name(&wf.name, &wf.path))?;
            for job in &wf.jobs {
                writeln!(self.out, "  {}", job.name)?;
                for step in &job.steps {
                    if step.is_runnable() {
                        writeln!(self.out, "    • {}", step.label())?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Grouped step results followed by the summary line.
    pub fn render_results(&mut self, results: &[StepResult], summary: &Summary) -> io::Result<()> {
        let mut current_workflow = None;
        let mut current_job = None;
        for result in results {
            let wf_key = (&result.workflow_path, &result.workflow_name);
            if current_workflow != Some(wf_key) {
                current_workflow = Some(wf_key);
                current_job = None;
                writeln!(
                    self.out,
                    "{}",
                    decorate_name(&result.workflow_name, &result.workflow_path)
                )?;
            }
            if current_job != Some(&result.job_name) {
                current_job = Some(&result.job_name);
                writeln!(self.out, "  {}", result.job_name)?;
            }
            self.render_step(result)?;
        }
        writeln!(
            self.out,
            "SUMMARY: {} passed, {} failed, {} skipped ({})",
            summary.passed,
            summary.failed,
            summary.skipped,
            format_duration(summary.duration)
        )?;
        self.out.flush()
    }

    fn render_step(&mut self, result: &StepResult) -> io::Result<()> {
        writeln!(
            self.out,
            "    {} {} ({})",
            result.status.glyph(),
            result.label(),
            format_duration(result.duration)
        )?;
        if result.dry_run && !result.step_run.is_empty() {
            self.render_detail("command", &result.step_run)?;
        }
        match result.status {
            StepStatus::Failed => {
                if !result.stderr.is_empty() {
                    self.render_detail("stderr", &result.stderr)?;
                }
            }
            StepStatus::Skipped => {
                // Skip reasons travel in stderr.
                if !result.stderr.is_empty() {
                    self.render_detail("note", &result.stderr)?;
                }
            }
            StepStatus::Passed => {}
        }
        Ok(())
    }

    fn render_detail(&mut self, heading: &str, body: &str) -> io::Result<()> {
        writeln!(self.out, "      {heading}:")?;
        for line in body.trim_end().lines() {
            writeln!(self.out, "        {line}")?;
        }
        Ok(())
    }
}

/// `RunRenderer` that stays silent until `run_finished`, then prints the
/// full pretty report in one pass.
pub struct BatchRenderer<W: Write + Send> {
    inner: PrettyRenderer<W>,
}

impl<W: Write + Send> BatchRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            inner: PrettyRenderer::new(out),
        }
    }
}

impl<W: Write + Send> RunRenderer for BatchRenderer<W> {
    fn run_finished(&mut self, results: &[StepResult], summary: &Summary) -> io::Result<()> {
        self.inner.render_results(results, summary)
    }
}
