// Integration tests for the `scholarlink` binary: argument handling, exit
// codes, offline runs from a saved index, and a mocked end-to-end harvest.
// Run with: cargo test -p scholarlink-cli --test cli_tests

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use httpmock::prelude::*;
use tempfile::{tempdir, TempDir};

fn scholarlink(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_scholarlink"));
    cmd.current_dir(cwd);
    cmd.env_remove("SCHOLARLINK_CONFIG");
    cmd.env_remove("RUST_LOG");
    cmd
}

fn code(output: &Output) -> Option<i32> {
    output.status.code()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const SNAPSHOT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<OAI-PMH><ListRecords>
<record><header><identifier>oai:ecommons:1813/100</identifier><setSpec>col_1813_47</setSpec></header><metadata><dim:dim xmlns:dim="http://www.dspace.org/xmlns/dspace/dim">
<dim:field element="contributor" qualifier="author">Student, Sam</dim:field>
<dim:field element="contributor" qualifier="chair">Smith, John A.</dim:field>
<dim:field element="contributor" qualifier="committeeMember">Lee, Ann</dim:field>
<dim:field element="identifier" qualifier="uri">https://hdl.handle.net/1813/100</dim:field>
<dim:field element="subject">Hydrology</dim:field>
<dim:field element="subject">Soil physics</dim:field>
</dim:dim></metadata></record>
<record><header><identifier>oai:ecommons:1813/101</identifier></header><metadata><dim:dim xmlns:dim="http://www.dspace.org/xmlns/dspace/dim">
<dim:field element="contributor" qualifier="advisor">Okafor, Chidi</dim:field>
</dim:dim></metadata></record>
</ListRecords></OAI-PMH>
"#;

/// Data dir with a fresh snapshot and a saved name index.
fn offline_workspace() -> TempDir {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("records.xml"), SNAPSHOT).unwrap();
    fs::write(
        dir.path().join("names.json"),
        r#"{"http://vivo/p1": "Smith, John A.", "http://vivo/p2": "Lee, Ann", "http://vivo/p3": "Park, Min"}"#,
    )
    .unwrap();
    dir
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

// ---------------------------------------------------------------------------
// Usage
// ---------------------------------------------------------------------------

#[test]
fn no_source_prints_usage_and_exits_2() {
    let dir = tempdir().unwrap();
    let output = scholarlink(dir.path()).output().expect("run scholarlink");

    assert_eq!(code(&output), Some(2));
    let err = stderr(&output);
    assert!(err.contains("Usage:"), "stderr: {err}");
    assert!(err.contains("hint:"), "stderr: {err}");
    assert!(!dir.path().join("data").exists(), "no I/O before argument checks");
}

#[test]
fn uri_and_file_together_exit_2() {
    let dir = tempdir().unwrap();
    let output = scholarlink(dir.path())
        .args(["--uri", "http://vivo/dept", "--file", "depts.txt"])
        .output()
        .expect("run scholarlink");
    assert_eq!(code(&output), Some(2));
}

#[test]
fn zero_workers_exit_2() {
    let dir = offline_workspace();
    let output = scholarlink(dir.path())
        .args(["--names", "names.json", "--workers", "0"])
        .output()
        .expect("run scholarlink");
    assert_eq!(code(&output), Some(2));
    assert!(stderr(&output).contains("--workers"));
}

#[test]
fn invalid_config_exit_2() {
    let dir = offline_workspace();
    fs::write(dir.path().join("bad.toml"), "[match]\nacceptance_threshold = 150\n").unwrap();

    let output = scholarlink(dir.path())
        .args(["--names", "names.json", "--config", "bad.toml"])
        .output()
        .expect("run scholarlink");

    assert_eq!(code(&output), Some(2));
    assert!(stderr(&output).contains("acceptance_threshold"), "stderr: {}", stderr(&output));
}

#[test]
fn config_is_picked_up_from_working_directory() {
    let dir = offline_workspace();
    fs::write(dir.path().join("scholarlink.toml"), "[match]\nroles = []\n").unwrap();

    let output = scholarlink(dir.path())
        .args(["--names", "names.json"])
        .output()
        .expect("run scholarlink");
    assert_eq!(code(&output), Some(2), "stderr: {}", stderr(&output));
}

// ---------------------------------------------------------------------------
// Offline runs
// ---------------------------------------------------------------------------

#[test]
fn offline_run_writes_both_tables() {
    let dir = offline_workspace();
    let output = scholarlink(dir.path())
        .args(["--names", "names.json", "--json", "result.json"])
        .output()
        .expect("run scholarlink");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let data = dir.path().join("data");

    let people = read_rows(&data.join("person_matches.csv"));
    assert_eq!(
        people,
        vec![
            vec![
                "http://vivo/p1", "Smith, John A.", "https://hdl.handle.net/1813/100", "chair",
                "Smith, John A.", "Hydrology; Soil physics", "",
            ],
            vec![
                "http://vivo/p2", "Lee, Ann", "https://hdl.handle.net/1813/100", "committeeMember",
                "Lee, Ann", "Hydrology; Soil physics", "",
            ],
        ]
    );

    let records = read_rows(&data.join("record_matches.csv"));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0][0], "https://hdl.handle.net/1813/100");
    assert_eq!(records[0][1], "col_1813_47");

    let result: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("result.json")).unwrap())
            .expect("valid JSON result");
    assert_eq!(result["summary"]["person_matches"], 2);
    assert_eq!(result["summary"]["records_seen"], 2);

    let err = stderr(&output);
    assert!(err.contains("wrote"), "stderr: {err}");
    assert!(err.contains("2 person matches"), "stderr: {err}");
}

#[test]
fn quiet_run_keeps_only_warnings() {
    let dir = offline_workspace();
    let output = scholarlink(dir.path())
        .args(["--names", "names.json", "--quiet", "--workers", "3"])
        .output()
        .expect("run scholarlink");

    assert!(output.status.success());
    let err = stderr(&output);
    assert!(!err.contains("wrote"), "stderr: {err}");
    assert!(!err.contains("reconciled"), "stderr: {err}");
    // The second record has no handle.
    assert!(err.contains("skipping malformed record"), "stderr: {err}");
    assert!(dir.path().join("data/person_matches.csv").exists());
}

#[test]
fn unmatched_names_still_succeed_with_empty_tables() {
    let dir = offline_workspace();
    fs::write(dir.path().join("names.json"), r#"{"http://vivo/p9": "Nobody, Known"}"#).unwrap();

    let output = scholarlink(dir.path())
        .args(["--names", "names.json", "-q"])
        .output()
        .expect("run scholarlink");

    assert!(output.status.success());
    assert!(read_rows(&dir.path().join("data/person_matches.csv")).is_empty());
    assert!(read_rows(&dir.path().join("data/record_matches.csv")).is_empty());
}

#[test]
fn malformed_name_index_exit_4() {
    let dir = offline_workspace();
    fs::write(dir.path().join("names.json"), "[not an object").unwrap();

    let output = scholarlink(dir.path())
        .args(["--names", "names.json"])
        .output()
        .expect("run scholarlink");
    assert_eq!(code(&output), Some(4), "stderr: {}", stderr(&output));
}

#[test]
fn missing_name_index_exit_3() {
    let dir = offline_workspace();
    let output = scholarlink(dir.path())
        .args(["--names", "absent.json"])
        .output()
        .expect("run scholarlink");
    assert_eq!(code(&output), Some(3));
}

// ---------------------------------------------------------------------------
// Harvest against a mock server
// ---------------------------------------------------------------------------

#[test]
fn harvests_graph_and_records_end_to_end() {
    let server = MockServer::start();
    let dept = server.url("/dept");

    server.mock(|when, then| {
        when.method(GET).path("/dept");
        then.status(200).body(
            "<http://vivo/p1> <http://www.w3.org/1999/02/22-rdf-syntax-ns#type> <http://xmlns.com/foaf/0.1/Person> .\n\
             <http://vivo/p1> <http://www.w3.org/2000/01/rdf-schema#label> \"Smith, John A.\" .\n",
        );
    });
    let oai = server.mock(|when, then| {
        when.method(GET)
            .path("/oai")
            .query_param("verb", "ListRecords")
            .query_param("metadataPrefix", "dim");
        then.status(200).body(SNAPSHOT);
    });

    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("scholarlink.toml"),
        format!(
            "[harvest]\nendpoint = \"{}\"\nbackoff_secs = 0\n",
            server.url("/oai")
        ),
    )
    .unwrap();

    let output = scholarlink(dir.path())
        .args(["--uri", dept.as_str(), "-q"])
        .output()
        .expect("run scholarlink");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    oai.assert();

    let data = dir.path().join("data");
    let names: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(data.join("names.json")).unwrap()).unwrap();
    assert_eq!(names["http://vivo/p1"], "Smith, John A.");
    assert!(data.join("records.xml").exists());
    assert!(data.join("candidates.json").exists());

    let people = read_rows(&data.join("person_matches.csv"));
    assert_eq!(people.len(), 1);
    assert_eq!(people[0][0], "http://vivo/p1");

    // Snapshot is fresh now: a second run reads it without contacting OAI.
    let again = scholarlink(dir.path())
        .args(["--names", "data/names.json", "-q"])
        .output()
        .expect("run scholarlink");
    assert!(again.status.success());
    oai.assert_hits(1);
}

#[test]
fn upstream_failure_exit_50() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/oai");
        then.status(500);
    });

    let dir = offline_workspace();
    fs::write(
        dir.path().join("scholarlink.toml"),
        format!(
            "[harvest]\nendpoint = \"{}\"\nbackoff_secs = 0\nmax_retries = 1\n",
            server.url("/oai")
        ),
    )
    .unwrap();

    let output = scholarlink(dir.path())
        .args(["--names", "names.json", "--refresh", "-q"])
        .output()
        .expect("run scholarlink");
    assert_eq!(code(&output), Some(50), "stderr: {}", stderr(&output));
}
