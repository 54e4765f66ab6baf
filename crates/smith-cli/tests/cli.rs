// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn smith() -> Command {
    Command::cargo_bin("smith-dag").expect("binary built")
}

#[test]
fn prints_one_apply_call_per_table() {
    let output = smith()
        .args(["--nodes", "5", "--seed", "42", "--log-level", "error"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines.iter().all(|l| l.starts_with("table") && l.ends_with(".apply();")));
}

#[test]
fn same_seed_same_output() {
    let run = || {
        smith()
            .args(["--nodes", "8", "--density", "0.5", "--seed", "7", "--log-level", "error"])
            .output()
            .expect("run")
            .stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn missing_seed_is_drawn_and_logged() {
    smith()
        .args(["--nodes", "2"])
        .assert()
        .success()
        .stderr(predicate::str::contains("no --seed given"));
}

#[test]
fn print_matrix_precedes_the_apply_list() {
    smith()
        .args([
            "--nodes",
            "3",
            "--density",
            "0",
            "--seed",
            "1",
            "--print-matrix",
            "--log-level",
            "error",
        ])
        .assert()
        .success()
        .stdout(predicate::eq(
            "Lower Triangular Adjacency Matrix:\n0 0 0\n0 0 0\n0 0 0\n\
             table0.apply();\ntable1.apply();\ntable2.apply();\n",
        ));
}

#[test]
fn writes_dot_and_json_exports() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dot = dir.path().join("dag.dot");
    let json = dir.path().join("outcome.json");
    smith()
        .args(["--nodes", "4", "--density", "1", "--max-parallel", "1", "--seed", "3"])
        .arg("--dot")
        .arg(&dot)
        .arg("--json")
        .arg(&json)
        .args(["--log-level", "error"])
        .assert()
        .success();

    let dot = fs::read_to_string(&dot).expect("dot written");
    assert!(dot.starts_with("digraph G {\n"));
    assert_eq!(dot.matches(" -> ").count(), 6);

    let json = fs::read_to_string(&json).expect("json written");
    assert!(json.contains("\"tables_in_order\""));
    assert!(json.contains("\"seed\": 3"));
}

#[test]
fn config_file_values_are_overridden_by_flags() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = dir.path().join("smith.json");
    fs::write(&config, r#"{"dag": {"nodes": 9, "density": 0.0}}"#).expect("write config");
    smith()
        .arg("--config")
        .arg(&config)
        .args(["--nodes", "2", "--seed", "5", "--log-level", "error"])
        .assert()
        .success()
        .stdout(predicate::eq("table0.apply();\ntable1.apply();\n"));
}

#[test]
fn invalid_density_is_rejected() {
    smith()
        .args(["--density", "1.5", "--seed", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("density"));
}
