//! End-to-end tests for the ieltsim binary.

use assert_cmd::Command;
use predicates::prelude::*;

use ieltsim_providers::mock::sample_test;

fn ieltsim() -> Command {
    Command::cargo_bin("ieltsim").unwrap()
}

#[test]
fn help_works() {
    ieltsim()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("IELTS practice-test simulator"));
}

#[test]
fn validate_accepts_the_sample_test() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.json");
    std::fs::write(&path, serde_json::to_string_pretty(&sample_test()).unwrap()).unwrap();

    ieltsim()
        .arg("validate")
        .arg("--test")
        .arg(&path)
        .assert()
        .success()
        .stderr(predicate::str::contains("OK: 3 passages, 40 questions"));
}

#[test]
fn validate_rejects_contract_violations() {
    let mut test = sample_test();
    test.reading.passages[0].question_groups[0].questions.pop();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.json");
    std::fs::write(&path, serde_json::to_string_pretty(&test).unwrap()).unwrap();

    ieltsim()
        .arg("validate")
        .arg("--test")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected 40 reading questions"));
}

#[test]
fn score_reports_raw_score_and_band() {
    let dir = tempfile::tempdir().unwrap();
    let test_path = dir.path().join("test.json");
    std::fs::write(
        &test_path,
        serde_json::to_string_pretty(&sample_test()).unwrap(),
    )
    .unwrap();

    // Questions 1 and 4 of the sample test are TRUE; 2 is FALSE.
    let answers_path = dir.path().join("answers.json");
    std::fs::write(
        &answers_path,
        r#"{"1": "true", "2": " FALSE ", "4": "maybe"}"#,
    )
    .unwrap();

    ieltsim()
        .arg("score")
        .arg("--test")
        .arg(&test_path)
        .arg("--answers")
        .arg(&answers_path)
        .assert()
        .success()
        .stderr(predicate::str::contains("Reading score: 2 / 40"));
}

#[test]
fn offline_full_run_produces_results() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("results");

    ieltsim()
        .arg("run")
        .arg("--section")
        .arg("full")
        .arg("--provider")
        .arg("mock")
        .arg("--output")
        .arg(&output)
        .current_dir(dir.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Overall"))
        .stderr(predicate::str::contains("Results saved to:"));

    let saved: Vec<_> = std::fs::read_dir(&output).unwrap().collect();
    assert_eq!(saved.len(), 1);
}

#[test]
fn run_rejects_unknown_section() {
    ieltsim()
        .arg("run")
        .arg("--section")
        .arg("listening")
        .arg("--provider")
        .arg("mock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown section"));
}
