//! Working-directory resolution
//!
//! The first non-empty candidate of step, job default, workflow default is
//! resolved relative to the project root and validated. With no candidates
//! the project root is used, or the current directory when root is unknown.

use std::path::{Path, PathBuf};

use crate::engine::error::StepError;
use crate::workflow::{Job, Step, Workflow};

pub fn resolve_working_directory(
    root: &Path,
    wf: &Workflow,
    job: &Job,
    step: &Step,
) -> Result<PathBuf, StepError> {
    let candidates = [
        step.working_directory.trim(),
        job.defaults.working_directory.trim(),
        wf.defaults.working_directory.trim(),
    ];

    for candidate in candidates {
        if candidate.is_empty() {
            continue;
        }
        let path = if Path::new(candidate).is_absolute() {
            PathBuf::from(candidate)
        } else {
            root.join(candidate)
        };
        let meta = match std::fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StepError::WorkdirNotFound(path));
            }
            Err(source) => return Err(StepError::WorkdirStat { path, source }),
        };
        if !meta.is_dir() {
            return Err(StepError::WorkdirNotDirectory(path));
        }
        return Ok(path);
    }

    if root.as_os_str().is_empty() {
        return std::env::current_dir().map_err(StepError::NoWorkingDirectory);
    }
    Ok(root.to_path_buf())
}
