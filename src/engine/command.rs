//! Command resolution
//!
//! Builds the argument vector for a step from its shell specification and
//! script text. The shell is resolved step > job defaults > workflow
//! defaults; each known shell family has its own invocation flags.

use std::path::{Path, PathBuf};

use crate::engine::error::StepError;
use crate::workflow::{Job, Step, Workflow};

/// Resolve the full argument vector for a step.
pub fn build_command(step: &Step, job: &Job, wf: &Workflow) -> Result<Vec<String>, StepError> {
    let mut shell = step.shell.trim();
    if shell.is_empty() {
        shell = job.defaults.run_shell.trim();
    }
    if shell.is_empty() {
        shell = wf.defaults.run_shell.trim();
    }
    command_args(shell, &step.run)
}

fn command_args(shell_spec: &str, script: &str) -> Result<Vec<String>, StepError> {
    if shell_spec.is_empty() {
        if cfg!(windows) {
            return Ok(vec!["cmd".into(), "/C".into(), script.into()]);
        }
        return Ok(login_shell_args("bash", &[], script));
    }

    let mut fields = shell_spec.split_whitespace().map(String::from);
    let shell = fields.next().ok_or(StepError::EmptyShell)?;
    let extra: Vec<String> = fields.collect();
    let base = Path::new(&shell)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(shell.as_str())
        .to_lowercase();

    let args = match base.as_str() {
        // Login shells, so version managers configured in profile files
        // resolve the same interpreters CI would.
        "bash" | "zsh" | "ksh" | "fish" => return Ok(login_shell_args(&shell, &extra, script)),
        // Plain sh stays POSIX-portable: no login flag.
        "sh" => vec!["-c".to_string(), script.to_string()],
        "cmd" | "cmd.exe" => vec!["/C".to_string(), script.to_string()],
        "pwsh" | "powershell" | "powershell.exe" => {
            vec!["-Command".to_string(), script.to_string()]
        }
        "python" | "python3" | "python.exe" => vec!["-c".to_string(), script.to_string()],
        // Unrecognized interpreters get the script as a trailing argument.
        _ => vec![script.to_string()],
    };

    let mut argv = Vec::with_capacity(1 + extra.len() + args.len());
    argv.push(shell);
    argv.extend(extra);
    argv.extend(args);
    Ok(argv)
}

fn login_shell_args(shell: &str, extra: &[String], script: &str) -> Vec<String> {
    let script = match version_manager_prelude() {
        Some(prelude) => format!("{prelude}{script}"),
        None => script.to_string(),
    };
    let mut argv = Vec::with_capacity(3 + extra.len());
    argv.push(shell.to_string());
    argv.extend(extra.iter().cloned());
    argv.push("-lc".to_string());
    argv.push(script);
    argv
}

/// Sourcing command for an asdf installation, when one is discoverable via
/// `$ASDF_DIR` or `~/.asdf`. Keeps interpreter shims active inside the
/// spawned shell.
fn version_manager_prelude() -> Option<String> {
    let dir = std::env::var_os("ASDF_DIR")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".asdf")))?;
    prelude_for_dir(&dir)
}

fn prelude_for_dir(dir: &Path) -> Option<String> {
    let init = dir.join("asdf.sh");
    if init.is_file() {
        Some(format!(". \"{}\" && ", init.display()))
    } else {
        None
    }
}
