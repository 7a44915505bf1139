//! Privileged-command gate
//!
//! Scripts that look like they need elevated permissions or mutate the host
//! are skipped by default. Patterns are deliberately coarse: a false
//! positive costs one skipped step with a note explaining the override.

use regex::Regex;
use tracing::debug;

/// Environment variable that disables the gate for a run.
pub const ALLOW_PRIVILEGED_ENV: &str = "REHEARSE_ALLOW_PRIVILEGED";

/// Decides whether a step's script must be skipped for safety.
pub struct PrivilegedGate {
    patterns: Vec<Regex>,
    allow: bool,
}

impl PrivilegedGate {
    /// Compile the supplied patterns. A pattern that fails to compile is
    /// dropped, never fatal to the run.
    pub fn new(raw_patterns: &[String], allow: bool) -> Self {
        let mut patterns = Vec::with_capacity(raw_patterns.len());
        for raw in raw_patterns {
            if raw.is_empty() {
                continue;
            }
            match Regex::new(raw) {
                Ok(re) => patterns.push(re),
                Err(e) => debug!(pattern = %raw, error = %e, "ignoring invalid privileged pattern"),
            }
        }
        Self { patterns, allow }
    }

    /// First matching pattern produces a skip message; `None` means run it.
    pub fn skip_reason(&self, script: &str) -> Option<String> {
        if self.allow {
            return None;
        }
        self.patterns.iter().find(|re| re.is_match(script)).map(|re| {
            format!(
                "skipped privileged command matching pattern {:?}; set {}=1 to run",
                re.as_str(),
                ALLOW_PRIVILEGED_ENV
            )
        })
    }
}

/// Patterns used when the configuration supplies none.
pub fn default_privileged_patterns() -> Vec<String> {
    [
        r"(?i)^sudo\b",
        r"(?i)\bapt-get\b",
        r"(?i)\bapt\b",
        r"(?i)\byum\b",
        r"(?i)\bdnf\b",
        r"(?i)\bzypper\b",
        r"(?i)\bpacman\b",
        r"(?i)\bbrew\b",
        r"(?i)\bchoco\b",
        r"(?i)\bwinget\b",
        r"(?i)\bpip\s+install\s+--user",
        r"(?i)\bnpm\s+install\s+-g",
        r"(?i)\byarn\s+global",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
