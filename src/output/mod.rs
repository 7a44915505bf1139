//! Rendering
//!
//! This module contains:
//! - `RunRenderer` - the capability the engine reports progress through
//! - `pretty` - batch renderer (list mode and after-the-run results)
//! - `stream` - live streaming renderer with a background elapsed ticker
//! - `json` - machine readable report
//! - `canvas` - line-indexed terminal abstraction behind the streamer
//! - `excerpt` - output noise filtering and test-report condensing

pub mod canvas;
pub mod excerpt;
pub mod json;
pub mod pretty;
pub mod stream;

use std::time::Duration;

use crate::engine::{StepResult, Summary};
use crate::workflow::{Job, Workflow};

pub use canvas::{AnsiCanvas, Canvas, MemoryCanvas};
pub use json::{render_json, Report};
pub use pretty::{BatchRenderer, PrettyRenderer};
pub use stream::StreamingRenderer;

/// How the engine reports progress. Chosen once per run from the output
/// configuration; the engine never inspects which implementation it got.
///
/// Streaming implements every event; the batch implementations only act on
/// `run_finished`. An `Err` from any method is fatal to the run.
pub trait RunRenderer: Send {
    fn run_started(&mut self, _workflows: &[Workflow]) -> std::io::Result<()> {
        Ok(())
    }

    fn job_started(&mut self, _workflow: &Workflow, _job: &Job) -> std::io::Result<()> {
        Ok(())
    }

    fn step_finished(&mut self, _result: &StepResult) -> std::io::Result<()> {
        Ok(())
    }

    fn job_finished(&mut self, _workflow: &Workflow, _job: &Job) -> std::io::Result<()> {
        Ok(())
    }

    fn run_finished(&mut self, _results: &[StepResult], _summary: &Summary) -> std::io::Result<()> {
        Ok(())
    }
}

/// Renderer that draws nothing. Used when the report is rendered separately
/// after the run (JSON mode, and tests that only inspect results).
#[derive(Debug, Default)]
pub struct NullRenderer;

impl RunRenderer for NullRenderer {}

/// `name (path)` unless the name is empty or already the path.
pub fn decorate_name(name: &str, path: &str) -> String {
    if name.is_empty() || name == path {
        path.to_string()
    } else {
        format!("{name} ({path})")
    }
}

/// Human display for durations: "0s", millisecond precision under a second,
/// tenths of a second up to a minute, then minutes and seconds.
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".to_string();
    }
    if d < Duration::from_secs(1) {
        return format!("{}ms", d.as_millis().max(1));
    }
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        return format!("{secs:.1}s");
    }
    format!("{}m{:.0}s", d.as_secs() / 60, secs % 60.0)
}
