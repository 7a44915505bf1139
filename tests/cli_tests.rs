//! CLI tests against the compiled binary.

use std::path::Path;
use std::process::Command;

fn cli_command(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rehearse"));
    cmd.current_dir(root);
    cmd
}

fn write_workflow(root: &Path, name: &str, yaml: &str) {
    let dir = root.join(".github/workflows");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(name), yaml).unwrap();
}

const CI_YAML: &str = r#"
name: CI
jobs:
  build:
    steps:
      - name: greet
        run: echo hi
        shell: sh
"#;

#[test]
fn cli_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli_command(dir.path()).arg("--help").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Run CI workflow steps locally"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("list"));
}

#[test]
fn list_shows_jobs_and_steps() {
    let dir = tempfile::tempdir().unwrap();
    write_workflow(dir.path(), "ci.yml", CI_YAML);

    let output = cli_command(dir.path()).arg("list").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CI"));
    assert!(stdout.contains("build"));
    assert!(stdout.contains("greet"));
}

#[test]
fn run_exits_zero_on_success() {
    let dir = tempfile::tempdir().unwrap();
    write_workflow(dir.path(), "ci.yml", CI_YAML);

    let output = cli_command(dir.path())
        .args(["run", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("json report on stdout");
    assert_eq!(report["provider"], "github");
    assert_eq!(report["summary"]["passed"], 1);
    assert_eq!(report["summary"]["exit_code"], 0);
    assert_eq!(report["steps"][0]["status"], "passed");
}

#[test]
fn run_exits_one_when_a_step_fails() {
    let dir = tempfile::tempdir().unwrap();
    write_workflow(
        dir.path(),
        "ci.yml",
        r#"
jobs:
  build:
    steps:
      - name: broken
        run: exit 9
        shell: sh
"#,
    );

    let output = cli_command(dir.path())
        .args(["run", "--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("one or more steps failed"));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["steps"][0]["exit_code"], 9);
}

#[test]
fn run_exits_two_without_workflows() {
    let dir = tempfile::tempdir().unwrap();
    let output = cli_command(dir.path()).arg("run").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn dry_run_reports_commands_without_executing() {
    let dir = tempfile::tempdir().unwrap();
    write_workflow(
        dir.path(),
        "ci.yml",
        r#"
jobs:
  build:
    steps:
      - name: make marker
        run: touch marker-file
        shell: sh
"#,
    );

    let output = cli_command(dir.path())
        .args(["run", "--dry-run"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("touch marker-file"));
    assert!(stdout.contains("SUMMARY: 0 passed, 0 failed, 1 skipped"));
    assert!(!dir.path().join("marker-file").exists());
}

#[test]
fn nothing_to_do_is_reported_in_every_format() {
    let dir = tempfile::tempdir().unwrap();
    write_workflow(dir.path(), "ci.yml", CI_YAML);

    for format in ["pretty", "json"] {
        let output = cli_command(dir.path())
            .args(["run", "--format", format, "--job", "no-such-job"])
            .output()
            .unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("No matching jobs or steps"));
        // No report document is rendered when there is nothing to run.
        assert!(!stdout.contains("SUMMARY:"));
        assert!(!stdout.contains("\"summary\""));
    }
}

#[test]
fn job_filter_limits_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_workflow(
        dir.path(),
        "ci.yml",
        r#"
jobs:
  one:
    steps:
      - name: first
        run: echo one
        shell: sh
  two:
    steps:
      - name: second
        run: echo two
        shell: sh
"#,
    );

    let output = cli_command(dir.path())
        .args(["run", "--format", "json", "--job", "two"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["total_steps"], 1);
    assert_eq!(report["steps"][0]["step_name"], "second");
}

#[test]
fn config_file_sets_defaults() {
    let dir = tempfile::tempdir().unwrap();
    write_workflow(dir.path(), "ci.yml", CI_YAML);
    std::fs::write(dir.path().join(".rehearse.yml"), "format: json\n").unwrap();

    let output = cli_command(dir.path()).arg("run").output().unwrap();
    assert!(output.status.success());
    assert!(serde_json::from_slice::<serde_json::Value>(&output.stdout).is_ok());
}
