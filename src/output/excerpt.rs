//! Failure-output cleanup
//!
//! Failed jobs print an excerpt of what the step produced. Two transforms
//! keep that excerpt readable: known framework noise (deprecation banners,
//! migration notices) is dropped, and recognized RSpec failure output is
//! condensed into one line per failure.

use regex::Regex;

const NOISE_PATTERNS: &[&str] = &[
    r"(?i)deprecation warning",
    r"(?i)is deprecated",
    r"(?i)^== .* (migrating|migrated)",
    r"(?i)pending migration",
];

/// Combine a failed step's streams into a display excerpt: condensed when a
/// structured test report is recognized, noise-filtered otherwise.
pub fn clean_excerpt(stdout: &str, stderr: &str) -> String {
    let mut combined = String::new();
    for part in [stdout, stderr] {
        let part = part.trim_end();
        if part.is_empty() {
            continue;
        }
        if !combined.is_empty() {
            combined.push('\n');
        }
        combined.push_str(part);
    }

    if let Some(condensed) = condense_rspec(&combined) {
        return condensed;
    }
    filter_noise(&combined)
}

/// Drop lines matching known framework noise.
pub fn filter_noise(text: &str) -> String {
    let patterns: Vec<Regex> = NOISE_PATTERNS
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();
    text.lines()
        .filter(|line| !patterns.iter().any(|re| re.is_match(line)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reformat RSpec failure output into a condensed per-failure list. Returns
/// `None` when the text does not look like an RSpec report.
pub fn condense_rspec(text: &str) -> Option<String> {
    if !text.lines().any(|l| l.trim() == "Failures:") {
        return None;
    }
    let rerun_re = Regex::new(r"^rspec (\S+)").ok()?;
    if !text.lines().any(|l| rerun_re.is_match(l.trim())) {
        return None;
    }

    let title_re = Regex::new(r"^\s*\d+\)\s+(.*\S)").ok()?;
    let counts_re = Regex::new(r"^\d+ examples?, \d+ failures?").ok()?;

    let mut titles = Vec::new();
    let mut locations = Vec::new();
    let mut counts = None;
    let mut in_failed_examples = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed == "Failed examples:" {
            in_failed_examples = true;
            continue;
        }
        if in_failed_examples {
            if let Some(caps) = rerun_re.captures(trimmed) {
                locations.push(caps[1].to_string());
                continue;
            }
        } else if let Some(caps) = title_re.captures(line) {
            titles.push(caps[1].to_string());
            continue;
        }
        if counts_re.is_match(trimmed) {
            counts = Some(trimmed.to_string());
        }
    }

    if titles.is_empty() {
        return None;
    }

    let mut out = Vec::with_capacity(titles.len() + 1);
    for (i, title) in titles.iter().enumerate() {
        match locations.get(i) {
            Some(loc) => out.push(format!("✗ {title} ({loc})")),
            None => out.push(format!("✗ {title}")),
        }
    }
    if let Some(counts) = counts {
        out.push(counts);
    }
    Some(out.join("\n"))
}
