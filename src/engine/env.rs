//! Environment merging
//!
//! Overlays are applied in increasing precedence: workflow, then job, then
//! step. The merged environment is emitted as a key-sorted list so spawned
//! processes see a deterministic environment.

use std::collections::BTreeMap;

/// Merge a base environment with overlays; later overlays win.
pub fn merge_env(
    base: &[(String, String)],
    overlays: &[&BTreeMap<String, String>],
) -> Vec<(String, String)> {
    let mut merged: BTreeMap<String, String> = base.iter().cloned().collect();
    for overlay in overlays {
        for (k, v) in overlay.iter() {
            merged.insert(k.clone(), v.clone());
        }
    }
    merged.into_iter().collect()
}

/// The current process environment, as merge input.
pub fn process_env() -> Vec<(String, String)> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn step_env_wins_over_job_wins_over_workflow() {
        let wf = map(&[("A", "1")]);
        let job = map(&[("A", "2"), ("B", "1")]);
        let step = map(&[("B", "2")]);

        let merged = merge_env(&[], &[&wf, &job, &step]);
        assert_eq!(
            merged,
            vec![
                ("A".to_string(), "2".to_string()),
                ("B".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn untouched_base_keys_pass_through() {
        let base = vec![
            ("PATH".to_string(), "/usr/bin".to_string()),
            ("HOME".to_string(), "/home/dev".to_string()),
        ];
        let step = map(&[("CI", "true")]);

        let merged = merge_env(&base, &[&step]);
        assert_eq!(merged.len(), 3);
        assert!(merged.contains(&("PATH".to_string(), "/usr/bin".to_string())));
        assert!(merged.contains(&("HOME".to_string(), "/home/dev".to_string())));
    }

    #[test]
    fn output_is_key_sorted() {
        let base = vec![
            ("ZED".to_string(), "1".to_string()),
            ("ALPHA".to_string(), "2".to_string()),
        ];
        let merged = merge_env(&base, &[]);
        let keys: Vec<_> = merged.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["ALPHA", "ZED"]);
    }
}
