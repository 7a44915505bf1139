//! Machine-readable report

use std::io::{self, Write};

use serde::Serialize;

use crate::engine::{StepResult, Summary};
use crate::workflow::{Warning, Workflow};

/// The full `--format json` document. Rendered once, after the run.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub provider: &'a str,
    pub workflows: &'a [Workflow],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub steps: &'a [StepResult],
    pub summary: &'a Summary,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    pub warnings: &'a [Warning],
}

/// Pretty-printed JSON with a trailing newline.
pub fn render_json<W: Write>(mut out: W, report: &Report<'_>) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, report)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::engine::StepStatus;
    use crate::workflow::parser::PROVIDER_NAME;

    #[test]
    fn report_serializes_expected_fields() {
        let step = StepResult {
            workflow_path: "ci.yml".into(),
            workflow_name: "CI".into(),
            job_name: "build".into(),
            step_name: "compile".into(),
            step_run: "make".into(),
            status: StepStatus::Failed,
            duration: Duration::from_millis(1200),
            duration_ms: 1200,
            stdout: String::new(),
            stderr: "error".into(),
            exit_code: 2,
            dry_run: false,
        };
        let summary = Summary {
            total_workflows: 1,
            total_jobs: 1,
            total_steps: 1,
            failed: 1,
            duration_ms: 1200,
            exit_code: 1,
            ..Default::default()
        };
        let report = Report {
            provider: PROVIDER_NAME,
            workflows: &[],
            steps: std::slice::from_ref(&step),
            summary: &summary,
            warnings: &[],
        };
        let mut buf = Vec::new();
        render_json(&mut buf, &report).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with('\n'));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["provider"], "github");
        assert_eq!(value["steps"][0]["status"], "failed");
        assert_eq!(value["steps"][0]["exit_code"], 2);
        assert_eq!(value["steps"][0]["duration_ms"], 1200);
        assert_eq!(value["summary"]["exit_code"], 1);
        // Empty optional sections stay out of the document.
        assert!(value.get("warnings").is_none());
        assert!(value["steps"][0].get("stdout").is_none());
    }
}
