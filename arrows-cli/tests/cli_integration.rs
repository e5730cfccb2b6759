//! Exercises the compiled `arrows` binary directly, the way a user invokes
//! it from a shell, checking the exit-code contract end to end.

use std::io::Write;
use std::process::{Command, Stdio};

fn arrows() -> Command {
    Command::new(env!("CARGO_BIN_EXE_arrows"))
}

#[test]
fn solve_an_already_solved_puzzle_exits_zero() {
    let input = "+----+----+\n| \u{2192}1 | \u{2192}0 |\n+----+----+\n";
    let mut child = arrows()
        .arg("solve")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn arrows binary");
    child.stdin.take().unwrap().write_all(input.as_bytes()).unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("status: Solved"));
}

#[test]
fn solve_with_unparsable_input_exits_one() {
    let mut child = arrows()
        .arg("solve")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn arrows binary");
    child.stdin.take().unwrap().write_all(b"not a puzzle").unwrap();
    let output = child.wait_with_output().unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn rules_check_accepts_the_builtin_pack_written_to_a_file() {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("arrows-cli-test-rules-{}.txt", std::process::id()));
    std::fs::write(
        &path,
        "rule force complexity 1: exists p (val(p) = nil ^ ahead_free(p) = 0) => set(p, sees_distinct(p))",
    )
    .unwrap();

    let output = arrows().arg("rules").arg("check").arg(&path).output().unwrap();
    std::fs::remove_file(&path).ok();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("1 rule(s) loaded successfully"));
}

#[test]
fn rules_check_rejects_a_malformed_file_with_exit_one() {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("arrows-cli-test-bad-rules-{}.txt", std::process::id()));
    std::fs::write(&path, "rule complexity 1 !! => set(p, 1)").unwrap();

    let output = arrows().arg("rules").arg("check").arg(&path).output().unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(output.status.code(), Some(1));
}
