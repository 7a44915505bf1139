//! Workflow file discovery
//!
//! Without explicit paths, scans `.github/workflows` for `*.yml`/`*.yaml`
//! files. Explicit paths are validated and kept in the order given.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("no workflows discovered")]
    NoWorkflows,

    #[error("workflow {0:?} not found")]
    NotFound(String),

    #[error("workflow {0:?} is a directory")]
    IsDirectory(String),

    #[error("read workflow directory {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Returns workflow display paths relative to `root` where possible.
pub fn discover_workflows(
    root: &Path,
    explicit: &[String],
) -> Result<Vec<String>, DiscoveryError> {
    if !explicit.is_empty() {
        return resolve_explicit(root, explicit);
    }

    let dir = root.join(".github").join("workflows");
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(DiscoveryError::NoWorkflows)
        }
        Err(source) => {
            return Err(DiscoveryError::Io {
                path: dir.display().to_string(),
                source,
            })
        }
    };

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| DiscoveryError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("yml") | Some("yaml") => paths.push(display_path(root, &path)),
            _ => {}
        }
    }

    if paths.is_empty() {
        return Err(DiscoveryError::NoWorkflows);
    }
    paths.sort();
    Ok(paths)
}

fn resolve_explicit(root: &Path, explicit: &[String]) -> Result<Vec<String>, DiscoveryError> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(explicit.len());
    for input in explicit {
        let full = if Path::new(input).is_absolute() {
            PathBuf::from(input)
        } else {
            root.join(input)
        };
        match std::fs::metadata(&full) {
            Ok(meta) if meta.is_dir() => {
                return Err(DiscoveryError::IsDirectory(input.clone()));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DiscoveryError::NotFound(input.clone()));
            }
            Err(source) => {
                return Err(DiscoveryError::Io {
                    path: full.display().to_string(),
                    source,
                })
            }
        }
        let rel = display_path(root, &full);
        if seen.insert(rel.clone()) {
            resolved.push(rel);
        }
    }
    if resolved.is_empty() {
        return Err(DiscoveryError::NoWorkflows);
    }
    Ok(resolved)
}

fn display_path(root: &Path, path: &Path) -> String {
    match path.strip_prefix(root) {
        Ok(rel) if !rel.as_os_str().is_empty() => rel.display().to_string(),
        _ => path.display().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn scans_github_workflows_sorted() {
        let dir = tempdir().unwrap();
        let wf_dir = dir.path().join(".github").join("workflows");
        fs::create_dir_all(&wf_dir).unwrap();
        fs::write(wf_dir.join("deploy.yaml"), "name: deploy\n").unwrap();
        fs::write(wf_dir.join("ci.yml"), "name: ci\n").unwrap();
        fs::write(wf_dir.join("README.md"), "ignored").unwrap();

        let paths = discover_workflows(dir.path(), &[]).unwrap();
        assert_eq!(
            paths,
            vec![
                ".github/workflows/ci.yml".to_string(),
                ".github/workflows/deploy.yaml".to_string(),
            ]
        );
    }

    #[test]
    fn empty_directory_is_no_workflows() {
        let dir = tempdir().unwrap();
        let err = discover_workflows(dir.path(), &[]).unwrap_err();
        assert!(matches!(err, DiscoveryError::NoWorkflows));
    }

    #[test]
    fn explicit_paths_keep_order_and_dedupe() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.yml"), "name: b\n").unwrap();
        fs::write(dir.path().join("a.yml"), "name: a\n").unwrap();

        let paths = discover_workflows(
            dir.path(),
            &["b.yml".to_string(), "a.yml".to_string(), "b.yml".to_string()],
        )
        .unwrap();
        assert_eq!(paths, vec!["b.yml".to_string(), "a.yml".to_string()]);
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let dir = tempdir().unwrap();
        let err = discover_workflows(dir.path(), &["nope.yml".to_string()]).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotFound(_)));
    }

    #[test]
    fn explicit_directory_is_an_error() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        let err = discover_workflows(dir.path(), &["sub".to_string()]).unwrap_err();
        assert!(matches!(err, DiscoveryError::IsDirectory(_)));
    }
}
