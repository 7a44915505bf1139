//! Process execution
//!
//! Spawns a resolved command in a working directory with a merged
//! environment, captures both output streams, and normalizes the exit
//! status into a single integer. In verbose mode the captured bytes are
//! simultaneously mirrored to the supplied writers as they arrive.

use std::io::Write;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use regex::Regex;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

use crate::engine::error::StepError;

/// Writer shared between the two drain tasks and the caller.
pub type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Mirror sinks for verbose mode.
#[derive(Clone)]
pub struct Mirror {
    pub stdout: SharedWriter,
    pub stderr: SharedWriter,
}

impl Mirror {
    /// Mirror to the process's own stdout/stderr.
    pub fn inherit() -> Self {
        Self {
            stdout: Arc::new(Mutex::new(Box::new(std::io::stdout()))),
            stderr: Arc::new(Mutex::new(Box::new(std::io::stderr()))),
        }
    }
}

/// What a finished subprocess produced.
#[derive(Debug)]
pub struct ExecOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run `argv` to completion. Non-zero exit is not an error here; only a
/// failure to start or wait on the process is.
pub async fn run_command(
    argv: &[String],
    dir: &std::path::Path,
    env: &[(String, String)],
    mirror: Option<&Mirror>,
) -> Result<ExecOutcome, StepError> {
    let program = argv[0].clone();
    debug!(command = ?argv, dir = %dir.display(), "spawning step command");

    let mut cmd = Command::new(&program);
    cmd.args(&argv[1..])
        .current_dir(dir)
        .env_clear()
        .envs(env.iter().cloned())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let start = Instant::now();
    let mut child = cmd.spawn().map_err(|source| StepError::Spawn {
        program: program.clone(),
        source,
    })?;

    // Both pipes must be drained concurrently or a chatty process can
    // deadlock on a full pipe buffer.
    let stdout_pipe = child.stdout.take().expect("stdout piped");
    let stderr_pipe = child.stderr.take().expect("stderr piped");
    let stdout_task = tokio::spawn(drain(stdout_pipe, mirror.map(|m| m.stdout.clone())));
    let stderr_task = tokio::spawn(drain(stderr_pipe, mirror.map(|m| m.stderr.clone())));

    let status = child.wait().await.map_err(|source| StepError::Wait {
        program: program.clone(),
        source,
    })?;
    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    Ok(ExecOutcome {
        stdout,
        stderr: simplify_error(&stderr),
        exit_code: normalize_exit(&status),
        duration: start.elapsed(),
    })
}

async fn drain(
    mut reader: impl tokio::io::AsyncRead + Unpin,
    mirror: Option<SharedWriter>,
) -> String {
    let mut captured = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                captured.extend_from_slice(&chunk[..n]);
                if let Some(writer) = &mirror {
                    if let Ok(mut w) = writer.lock() {
                        let _ = w.write_all(&chunk[..n]);
                        let _ = w.flush();
                    }
                }
            }
        }
    }
    String::from_utf8_lossy(&captured).into_owned()
}

/// Fold exit status and termination signal into one integer: the exit code
/// when there is one, `128 + signal` for signal deaths on unix, else 1.
fn normalize_exit(status: &std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Keep only the last `max_lines` lines of `input`, order preserved.
pub fn tail_lines(input: &str, max_lines: usize) -> String {
    if input.is_empty() {
        return String::new();
    }
    let trimmed = input.trim_end_matches('\n');
    let lines: Vec<&str> = trimmed.split('\n').collect();
    if lines.len() <= max_lines {
        return lines.join("\n");
    }
    lines[lines.len() - max_lines..].join("\n")
}

/// Rewrite one recognized failure signature, a missing bundler binary, into
/// an actionable remediation message.
pub fn simplify_error(stderr: &str) -> String {
    if !stderr.to_lowercase().contains("could not find 'bundler'") {
        return stderr.to_string();
    }
    match parse_bundler_version(stderr) {
        Some(version) => format!(
            "missing bundler {version}; run `gem install bundler:{version}` or `bundle update --bundler`"
        ),
        None => "missing bundler; run `gem install bundler` or `bundle update --bundler`".into(),
    }
}

fn parse_bundler_version(stderr: &str) -> Option<String> {
    let re = Regex::new(r"bundler' \((\d+\.\d+(?:\.\d+)?)\)").ok()?;
    re.captures(stderr).map(|c| c[1].to_string())
}
