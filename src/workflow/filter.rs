//! Job and step filtering
//!
//! Filter patterns come from user flags: `/.../` delimits a regular
//! expression, anything else is a case-insensitive substring match.

use regex::Regex;

use super::{Job, Step, Workflow};

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("compile pattern {raw:?}: {source}")]
    BadRegex { raw: String, source: regex::Error },
}

/// A compiled filter condition.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    kind: PatternKind,
}

#[derive(Debug, Clone)]
enum PatternKind {
    Regex(Regex),
    Substring(String),
}

impl Pattern {
    /// Compile raw pattern strings; blank entries are dropped.
    pub fn compile(raw_patterns: &[String]) -> Result<Vec<Pattern>, FilterError> {
        let mut result = Vec::with_capacity(raw_patterns.len());
        for raw in raw_patterns {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let kind = if raw.len() >= 2 && raw.starts_with('/') && raw.ends_with('/') {
                let expr = &raw[1..raw.len() - 1];
                let regex = Regex::new(expr).map_err(|source| FilterError::BadRegex {
                    raw: raw.to_string(),
                    source,
                })?;
                PatternKind::Regex(regex)
            } else {
                PatternKind::Substring(raw.to_lowercase())
            };
            result.push(Pattern {
                raw: raw.to_string(),
                kind,
            });
        }
        Ok(result)
    }

    /// Whether the pattern matches the supplied string.
    pub fn matches(&self, s: &str) -> bool {
        if s.is_empty() {
            return false;
        }
        match &self.kind {
            PatternKind::Regex(re) => re.is_match(s),
            PatternKind::Substring(needle) => s.to_lowercase().contains(needle),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

/// Apply job and step filters, keeping only workflows that still contain
/// runnable steps. Steps without a `run` script are always dropped.
pub fn filter_workflows(
    workflows: Vec<Workflow>,
    job_patterns: &[Pattern],
    only_patterns: &[Pattern],
    skip_patterns: &[Pattern],
) -> Vec<Workflow> {
    let mut result = Vec::with_capacity(workflows.len());
    for mut wf in workflows {
        let jobs = std::mem::take(&mut wf.jobs);
        wf.jobs = jobs
            .into_iter()
            .filter_map(|mut job| {
                if !job_patterns.is_empty() && !matches_job(&job, job_patterns) {
                    return None;
                }
                let steps = std::mem::take(&mut job.steps);
                job.steps = steps
                    .into_iter()
                    .filter(|step| keep_step(step, only_patterns, skip_patterns))
                    .collect();
                if job.steps.is_empty() {
                    None
                } else {
                    Some(job)
                }
            })
            .collect();
        if !wf.jobs.is_empty() {
            result.push(wf);
        }
    }
    result
}

fn matches_job(job: &Job, patterns: &[Pattern]) -> bool {
    patterns
        .iter()
        .any(|p| p.matches(&job.name) || p.matches(&job.raw_id))
}

fn keep_step(step: &Step, only: &[Pattern], skip: &[Pattern]) -> bool {
    if step.run.is_empty() {
        return false;
    }
    if !only.is_empty() && !matches_step(step, only) {
        return false;
    }
    if !skip.is_empty() && matches_step(step, skip) {
        return false;
    }
    true
}

fn matches_step(step: &Step, patterns: &[Pattern]) -> bool {
    patterns
        .iter()
        .any(|p| p.matches(&step.name) || p.matches(&step.run))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Defaults;

    fn workflow() -> Workflow {
        Workflow {
            path: "ci.yml".into(),
            name: "ci".into(),
            env: Default::default(),
            defaults: Defaults::default(),
            jobs: vec![
                Job {
                    name: "Test suite".into(),
                    raw_id: "test".into(),
                    env: Default::default(),
                    defaults: Defaults::default(),
                    steps: vec![
                        Step {
                            name: "checkout".into(),
                            uses: "actions/checkout@v4".into(),
                            ..Default::default()
                        },
                        Step {
                            name: "rspec".into(),
                            run: "bundle exec rspec".into(),
                            ..Default::default()
                        },
                        Step {
                            name: "rubocop".into(),
                            run: "bundle exec rubocop".into(),
                            ..Default::default()
                        },
                    ],
                },
                Job {
                    name: "Deploy".into(),
                    raw_id: "deploy".into(),
                    env: Default::default(),
                    defaults: Defaults::default(),
                    steps: vec![Step {
                        name: "push".into(),
                        run: "cap deploy".into(),
                        ..Default::default()
                    }],
                },
            ],
        }
    }

    #[test]
    fn substring_patterns_are_case_insensitive() {
        let patterns = Pattern::compile(&["RSPEC".to_string()]).unwrap();
        assert!(patterns[0].matches("bundle exec rspec"));
        assert!(!patterns[0].matches("bundle exec rubocop"));
        assert!(!patterns[0].matches(""));
    }

    #[test]
    fn slash_delimited_patterns_are_regexes() {
        let patterns = Pattern::compile(&["/^ru.+p$/".to_string()]).unwrap();
        assert!(patterns[0].matches("rubocop"));
        assert!(!patterns[0].matches("rspec"));
    }

    #[test]
    fn bad_regex_is_an_error() {
        let err = Pattern::compile(&["/(unclosed/".to_string()]).unwrap_err();
        assert!(err.to_string().contains("/(unclosed/"));
    }

    #[test]
    fn blank_patterns_are_dropped() {
        let patterns = Pattern::compile(&["  ".to_string(), String::new()]).unwrap();
        assert!(patterns.is_empty());
    }

    #[test]
    fn job_patterns_match_name_or_id() {
        let patterns = Pattern::compile(&["deploy".to_string()]).unwrap();
        let filtered = filter_workflows(vec![workflow()], &patterns, &[], &[]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].jobs.len(), 1);
        assert_eq!(filtered[0].jobs[0].raw_id, "deploy");
    }

    #[test]
    fn uses_steps_are_always_dropped() {
        let filtered = filter_workflows(vec![workflow()], &[], &[], &[]);
        let test = &filtered[0].jobs[0];
        assert_eq!(test.steps.len(), 2);
        assert!(test.steps.iter().all(|s| s.uses.is_empty()));
    }

    #[test]
    fn only_and_skip_combine() {
        let only = Pattern::compile(&["bundle".to_string()]).unwrap();
        let skip = Pattern::compile(&["rubocop".to_string()]).unwrap();
        let filtered = filter_workflows(vec![workflow()], &[], &only, &skip);
        // Deploy job loses its only step and disappears with it.
        assert_eq!(filtered[0].jobs.len(), 1);
        assert_eq!(filtered[0].jobs[0].steps.len(), 1);
        assert_eq!(filtered[0].jobs[0].steps[0].name, "rspec");
    }

    #[test]
    fn empty_workflows_are_removed() {
        let patterns = Pattern::compile(&["nonexistent".to_string()]).unwrap();
        let filtered = filter_workflows(vec![workflow()], &patterns, &[], &[]);
        assert!(filtered.is_empty());
    }
}
