use std::path::Path;
use std::process::{Command, Output};

fn atrium(dir: &Path, line: &str) -> Output {
    Command::new(env!("CARGO_BIN_EXE_atrium"))
        .arg("--config")
        .arg(dir.join("missing-rc"))
        .arg("--history")
        .arg(dir.join("history"))
        .arg("--quiet")
        .arg("--exec")
        .arg(line)
        .output()
        .expect("failed to run atrium")
}

#[test]
fn test_exit_status_of_external_command() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(atrium(dir.path(), "true").status.code(), Some(0));
    assert_eq!(atrium(dir.path(), "sh -c 'exit 7'").status.code(), Some(7));
}

#[test]
fn test_exit_builtin() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(atrium(dir.path(), "exit 3").status.code(), Some(3));
    assert_eq!(atrium(dir.path(), "exit").status.code(), Some(0));
}

#[test]
fn test_pipeline_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = atrium(dir.path(), "printf 'b\\na\\nc\\n' | sort | head -n 2");
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "a\nb\n");
}

#[test]
fn test_command_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let output = atrium(dir.path(), "atrium-no-such-command-xyz");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("atrium: command not found: atrium-no-such-command-xyz"));
}

#[test]
fn test_signaled_foreground_status() {
    let dir = tempfile::tempdir().unwrap();
    let output = atrium(dir.path(), "sh -c 'kill -TERM $$'");
    assert_eq!(output.status.code(), Some(128 + 15));
}

#[test]
fn test_env_prefix_and_variables() {
    let dir = tempfile::tempdir().unwrap();
    let output = atrium(dir.path(), "GREETING=hi sh -c 'echo $GREETING'");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hi\n");
}

#[test]
fn test_rc_file_exports_and_aliases() {
    let dir = tempfile::tempdir().unwrap();
    let rc = dir.path().join("rc");
    std::fs::write(&rc, "export ATRIUM_RC_VAR=from-rc\nalias say='echo said'\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_atrium"))
        .arg("-c")
        .arg(&rc)
        .arg("-H")
        .arg(dir.path().join("history"))
        .arg("-e")
        .arg("say $ATRIUM_RC_VAR")
        .output()
        .expect("failed to run atrium");
    assert_eq!(String::from_utf8_lossy(&output.stdout), "said from-rc\n");
}

#[test]
fn test_syntax_error_status() {
    let dir = tempfile::tempdir().unwrap();
    let output = atrium(dir.path(), "echo 'unterminated");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unbalanced quotes"));
}
