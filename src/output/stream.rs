//! Live streaming renderer
//!
//! Draws one line per job up front, rewrites the current job's line in
//! place while it runs, and expands failed jobs into a step-by-step block
//! once they finish. A background ticker refreshes the elapsed time on the
//! running job once a second; it only reads job state and writes through
//! the shared canvas, so the run loop and the ticker never race on output.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;

use crate::engine::{StepResult, StepStatus, Summary};
use crate::output::excerpt::clean_excerpt;
use crate::output::{decorate_name, format_duration, Canvas, MemoryCanvas, RunRenderer};
use crate::workflow::{Job, Workflow};

struct JobEntry {
    name: String,
    line: usize,
    // Last text drawn for this line, redrawn verbatim by the ticker for
    // jobs that are not currently running.
    text: String,
    started: Option<Instant>,
    done: bool,
    steps: Vec<StepResult>,
}

struct StreamState<C: Canvas> {
    canvas: C,
    jobs: Vec<JobEntry>,
    // Jobs execute in registration order; this is the one running next.
    current: usize,
}

/// Renderer for interactive terminals. Requires a tokio runtime.
pub struct StreamingRenderer<C: Canvas + 'static> {
    state: Arc<Mutex<StreamState<C>>>,
    ticker: Option<JoinHandle<()>>,
}

fn lock<C: Canvas>(state: &Arc<Mutex<StreamState<C>>>) -> io::Result<MutexGuard<'_, StreamState<C>>> {
    state
        .lock()
        .map_err(|_| io::Error::other("stream state poisoned"))
}

impl<C: Canvas + 'static> StreamingRenderer<C> {
    pub fn new(canvas: C) -> Self {
        Self {
            state: Arc::new(Mutex::new(StreamState {
                canvas,
                jobs: Vec::new(),
                current: 0,
            })),
            ticker: None,
        }
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl StreamingRenderer<MemoryCanvas> {
    /// Rendered lines so far. Test accessor.
    pub fn lines(&self) -> Vec<String> {
        match self.state.lock() {
            Ok(state) => state.canvas.lines().to_vec(),
            Err(_) => Vec::new(),
        }
    }
}

impl<C: Canvas + 'static> Drop for StreamingRenderer<C> {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

impl<C: Canvas + 'static> RunRenderer for StreamingRenderer<C> {
    fn run_started(&mut self, workflows: &[Workflow]) -> io::Result<()> {
        {
            let mut state = lock(&self.state)?;
            for wf in workflows {
                let header = decorate_name(&wf.name, &wf.path);
                state.canvas.append_line(&header)?;
                for job in &wf.jobs {
                    let text = format!("  • {}", job.name);
                    let line = state.canvas.append_line(&text)?;
                    state.jobs.push(JobEntry {
                        name: job.name.clone(),
                        line,
                        text,
                        started: None,
                        done: false,
                        steps: Vec::new(),
                    });
                }
            }
        }

        let state = Arc::clone(&self.state);
        self.ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let Ok(mut state) = state.lock() else { return };
                let lines: Vec<(usize, String)> = state
                    .jobs
                    .iter()
                    .map(|j| match j.started {
                        Some(started) if !j.done => (
                            j.line,
                            format!("  › {} ({})", j.name, format_duration(started.elapsed())),
                        ),
                        _ => (j.line, j.text.clone()),
                    })
                    .collect();
                for (line, text) in lines {
                    if state.canvas.rewrite_line(line, &text).is_err() {
                        return;
                    }
                }
            }
        }));
        Ok(())
    }

    fn job_started(&mut self, _workflow: &Workflow, _job: &Job) -> io::Result<()> {
        let mut state = lock(&self.state)?;
        let current = state.current;
        if let Some(entry) = state.jobs.get_mut(current) {
            entry.started = Some(Instant::now());
            entry.text = format!("  › {} (0s)", entry.name);
            let line = entry.line;
            let text = entry.text.clone();
            state.canvas.rewrite_line(line, &text)?;
        }
        Ok(())
    }

    fn step_finished(&mut self, result: &StepResult) -> io::Result<()> {
        let mut state = lock(&self.state)?;
        let current = state.current;
        if let Some(entry) = state.jobs.get_mut(current) {
            entry.steps.push(result.clone());
        }
        Ok(())
    }

    fn job_finished(&mut self, _workflow: &Workflow, _job: &Job) -> io::Result<()> {
        let mut state = lock(&self.state)?;
        let current = state.current;
        state.current += 1;
        let Some(entry) = state.jobs.get_mut(current) else {
            return Ok(());
        };
        entry.done = true;

        let status = job_status(&entry.steps);
        let duration: Duration = entry.steps.iter().map(|s| s.duration).sum();
        entry.text = format!(
            "  {} {} ({})",
            status.glyph(),
            entry.name,
            format_duration(duration)
        );
        let text = entry.text.clone();
        let line = entry.line;
        let block = if status == StepStatus::Failed {
            Some(failure_block(&entry.steps))
        } else {
            None
        };
        state.canvas.rewrite_line(line, &text)?;
        if let Some(block) = block {
            state.canvas.append_block(&block)?;
        }
        Ok(())
    }

    fn run_finished(&mut self, _results: &[StepResult], summary: &Summary) -> io::Result<()> {
        self.stop_ticker();
        let mut state = lock(&self.state)?;
        let line = format!(
            "SUMMARY: {} passed, {} failed, {} skipped ({})",
            summary.passed,
            summary.failed,
            summary.skipped,
            format_duration(summary.duration)
        );
        state.canvas.append_block(&line)?;
        Ok(())
    }
}

/// Terminal status for a job derived from its step results.
fn job_status(steps: &[StepResult]) -> StepStatus {
    if steps.iter().any(|s| s.status == StepStatus::Failed) {
        StepStatus::Failed
    } else if steps.is_empty() || steps.iter().all(|s| s.status == StepStatus::Skipped) {
        StepStatus::Skipped
    } else {
        StepStatus::Passed
    }
}

/// Expanded per-step detail printed under a failed job.
fn failure_block(steps: &[StepResult]) -> String {
    let mut lines = Vec::new();
    for step in steps {
        lines.push(format!(
            "    {} {} ({})",
            step.status.glyph(),
            step.label(),
            format_duration(step.duration)
        ));
        match step.status {
            StepStatus::Failed => {
                if !step.step_run.is_empty() {
                    lines.push("      command:".to_string());
                    for line in step.step_run.trim_end().lines() {
                        lines.push(format!("        {line}"));
                    }
                }
                let excerpt = clean_excerpt(&step.stdout, &step.stderr);
                for line in excerpt.lines() {
                    lines.push(format!("      {line}"));
                }
            }
            StepStatus::Skipped => {
                for line in step.stderr.trim_end().lines() {
                    lines.push(format!("      {line}"));
                }
            }
            StepStatus::Passed => {}
        }
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workflow() -> Workflow {
        Workflow {
            path: "ci.yml".into(),
            name: "CI".into(),
            env: Default::default(),
            defaults: Default::default(),
            jobs: vec![
                Job {
                    name: "build".into(),
                    raw_id: "build".into(),
                    env: Default::default(),
                    defaults: Default::default(),
                    steps: Vec::new(),
                },
                Job {
                    name: "test".into(),
                    raw_id: "test".into(),
                    env: Default::default(),
                    defaults: Default::default(),
                    steps: Vec::new(),
                },
            ],
        }
    }

    fn step(name: &str, status: StepStatus) -> StepResult {
        StepResult {
            workflow_path: "ci.yml".into(),
            workflow_name: "CI".into(),
            job_name: "build".into(),
            step_name: name.into(),
            step_run: "make".into(),
            status,
            duration: Duration::from_millis(100),
            duration_ms: 100,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: 0,
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn jobs_render_pending_then_running_then_done() {
        let wf = workflow();
        let mut renderer = StreamingRenderer::new(MemoryCanvas::new());
        renderer.run_started(std::slice::from_ref(&wf)).unwrap();
        assert_eq!(
            renderer.lines(),
            vec!["CI (ci.yml)", "  • build", "  • test"]
        );

        renderer.job_started(&wf, &wf.jobs[0]).unwrap();
        assert_eq!(renderer.lines()[1], "  › build (0s)");

        renderer.step_finished(&step("compile", StepStatus::Passed)).unwrap();
        renderer.job_finished(&wf, &wf.jobs[0]).unwrap();
        assert_eq!(renderer.lines()[1], "  ✓ build (100ms)");
        // Next job untouched.
        assert_eq!(renderer.lines()[2], "  • test");
    }

    #[tokio::test]
    async fn failed_job_expands_into_step_block() {
        let wf = workflow();
        let mut renderer = StreamingRenderer::new(MemoryCanvas::new());
        renderer.run_started(std::slice::from_ref(&wf)).unwrap();
        renderer.job_started(&wf, &wf.jobs[0]).unwrap();

        renderer.step_finished(&step("compile", StepStatus::Passed)).unwrap();
        let mut failed = step("unit tests", StepStatus::Failed);
        failed.stderr = "error: boom".into();
        failed.exit_code = 1;
        renderer.step_finished(&failed).unwrap();
        renderer.job_finished(&wf, &wf.jobs[0]).unwrap();

        let lines = renderer.lines();
        assert_eq!(lines[1], "  ✗ build (200ms)");
        assert_eq!(lines[3], "    ✓ compile (100ms)");
        assert_eq!(lines[4], "    ✗ unit tests (100ms)");
        assert_eq!(lines[5], "      command:");
        assert_eq!(lines[6], "        make");
        assert_eq!(lines[7], "      error: boom");
    }

    #[tokio::test]
    async fn all_skipped_job_renders_skipped() {
        let wf = workflow();
        let mut renderer = StreamingRenderer::new(MemoryCanvas::new());
        renderer.run_started(std::slice::from_ref(&wf)).unwrap();
        renderer.job_started(&wf, &wf.jobs[0]).unwrap();
        renderer.step_finished(&step("install", StepStatus::Skipped)).unwrap();
        renderer.job_finished(&wf, &wf.jobs[0]).unwrap();
        assert_eq!(renderer.lines()[1], "  - build (100ms)");
    }

    #[tokio::test]
    async fn summary_appended_at_end() {
        let wf = workflow();
        let mut renderer = StreamingRenderer::new(MemoryCanvas::new());
        renderer.run_started(std::slice::from_ref(&wf)).unwrap();
        let summary = Summary {
            passed: 2,
            total_steps: 2,
            duration: Duration::from_secs(3),
            duration_ms: 3000,
            ..Default::default()
        };
        renderer.run_finished(&[], &summary).unwrap();
        assert_eq!(
            renderer.lines().last().unwrap(),
            "SUMMARY: 2 passed, 0 failed, 0 skipped (3.0s)"
        );
    }

    #[test]
    fn job_status_aggregation() {
        assert_eq!(job_status(&[]), StepStatus::Skipped);
        assert_eq!(
            job_status(&[step("a", StepStatus::Skipped)]),
            StepStatus::Skipped
        );
        assert_eq!(
            job_status(&[step("a", StepStatus::Passed), step("b", StepStatus::Skipped)]),
            StepStatus::Passed
        );
        assert_eq!(
            job_status(&[step("a", StepStatus::Passed), step("b", StepStatus::Failed)]),
            StepStatus::Failed
        );
    }
}
