//! Interpreter version checks
//!
//! Projects that pin a runtime with `.ruby-version` or `.node-version`
//! expect CI to honor the pin. Before a run we compare the pin against the
//! interpreter on PATH and warn on a major.minor mismatch. Warnings only;
//! never fatal, and patch-level differences are ignored.

use std::path::Path;
use std::process::Command;

use regex::Regex;
use tracing::debug;

use crate::workflow::Warning;

struct RuntimeCheck {
    pin_file: &'static str,
    program: &'static str,
    args: &'static [&'static str],
    version_pattern: &'static str,
}

const CHECKS: &[RuntimeCheck] = &[
    RuntimeCheck {
        pin_file: ".ruby-version",
        program: "ruby",
        args: &["--version"],
        version_pattern: r"(?i)ruby\s+(\d+\.\d+(?:\.\d+)?)",
    },
    RuntimeCheck {
        pin_file: ".node-version",
        program: "node",
        args: &["--version"],
        version_pattern: r"(?i)v?(\d+\.\d+(?:\.\d+)?)",
    },
];

/// Compare pinned runtime versions against the interpreters on PATH.
pub fn version_warnings(root: &Path, enabled: bool) -> Vec<Warning> {
    if !enabled {
        return Vec::new();
    }
    let mut warnings = Vec::new();
    for check in CHECKS {
        let pin_path = root.join(check.pin_file);
        let Ok(pinned) = std::fs::read_to_string(&pin_path) else {
            continue;
        };
        let pinned = pinned.trim();
        if pinned.is_empty() {
            continue;
        }

        if which::which(check.program).is_err() {
            warnings.push(Warning::new(
                check.pin_file,
                "",
                format!("pins {} {pinned} but {} is not on PATH", check.program, check.program),
            ));
            continue;
        }

        let Some(installed) = detect_version(check) else {
            debug!(program = check.program, "could not read interpreter version");
            warnings.push(Warning::new(
                check.pin_file,
                "",
                format!("pins {} {pinned} but its version could not be determined", check.program),
            ));
            continue;
        };
        if !compare_major_minor(pinned, &installed) {
            warnings.push(Warning::new(
                check.pin_file,
                "",
                format!(
                    "pins {} {pinned} but PATH has {installed}",
                    check.program
                ),
            ));
        }
    }
    warnings
}

fn detect_version(check: &RuntimeCheck) -> Option<String> {
    let output = Command::new(check.program).args(check.args).output().ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    let re = Regex::new(check.version_pattern).ok()?;
    let caps = re.captures(text.trim())?;
    Some(caps[1].to_string())
}

/// True when two version strings agree on major and minor.
fn compare_major_minor(a: &str, b: &str) -> bool {
    match (major_minor(a), major_minor(b)) {
        (Some(a), Some(b)) => a == b,
        // Give up quietly on unparseable pins.
        _ => true,
    }
}

fn major_minor(version: &str) -> Option<(u64, u64)> {
    let mut parts = version.trim().trim_start_matches('v').split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().unwrap_or("0").parse().ok()?;
    Some((major, minor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_minor_comparison() {
        assert!(compare_major_minor("3.2.4", "3.2.1"));
        assert!(compare_major_minor("3.2", "3.2.9"));
        assert!(!compare_major_minor("3.2.4", "3.3.0"));
        assert!(!compare_major_minor("20.11.1", "22.3.0"));
        assert!(compare_major_minor("not-a-version", "3.2.1"));
    }

    #[test]
    fn node_style_v_prefix_parses() {
        assert_eq!(major_minor("v20.11.1"), Some((20, 11)));
        assert_eq!(major_minor("3.2"), Some((3, 2)));
        assert_eq!(major_minor(""), None);
    }

    #[test]
    fn disabled_checks_return_nothing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".ruby-version"), "99.99.0").unwrap();
        assert!(version_warnings(dir.path(), false).is_empty());
    }

    #[test]
    fn unpinned_project_warns_about_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(version_warnings(dir.path(), true).is_empty());
    }
}
