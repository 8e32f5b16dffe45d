//! CLI integration tests

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::thread;

fn circuit_cli() -> Command {
    cargo_bin_cmd!("circuit-editor-cli")
}

/// Path to the library's graph fixtures (relative to workspace).
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("circuit-editor")
        .join("tests")
        .join("fixtures")
}

fn run_ok(args: &[&str], file: &Path) -> String {
    let output = circuit_cli()
        .args(&args[..1])
        .arg(file)
        .args(&args[1..])
        .output()
        .unwrap();
    assert!(output.status.success(), "{:?} failed: {:?}", args, output);
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

/// Answer exactly one HTTP request with `body`, returning the server's URL.
fn serve_once(status: &str, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/api", listener.local_addr().unwrap());
    let status = status.to_string();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 4096];
        let mut request = Vec::new();
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).unwrap();
    });
    url
}

#[test]
fn test_cli_help() {
    let mut cmd = circuit_cli();

    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("circuit"));
}

#[test]
fn test_cli_version() {
    let mut cmd = circuit_cli();

    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_cli_build_circuit() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("divider.json");

    run_ok(&["new"], &file);
    assert_eq!(run_ok(&["add", "voltage"], &file), "voltage-1");
    assert_eq!(
        run_ok(&["add", "resistor", "--x", "223", "--y", "-11"], &file),
        "resistor-1"
    );
    assert_eq!(
        run_ok(&["connect", "voltage-1", "resistor-1"], &file),
        "evoltage-1-resistor-1"
    );
    // reverse direction reuses the existing connection
    assert_eq!(
        run_ok(&["connect", "resistor-1", "voltage-1"], &file),
        "evoltage-1-resistor-1"
    );

    let mut cmd = circuit_cli();
    cmd.arg("stats").arg(&file).arg("--format").arg("json");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"totalNodes\": 2"))
        .stdout(predicate::str::contains("\"totalEdges\": 1"));

    let mut cmd = circuit_cli();
    cmd.arg("show").arg(&file);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"x\": 220.0"))
        .stdout(predicate::str::contains("\"y\": -20.0"))
        .stdout(predicate::str::contains("\"sourceHandle\": \"right\""));
}

#[test]
fn test_cli_new_refuses_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("circuit.json");
    run_ok(&["new"], &file);

    let mut cmd = circuit_cli();
    cmd.arg("new").arg(&file);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let mut cmd = circuit_cli();
    cmd.arg("new").arg(&file).arg("--force");
    cmd.assert().success();
}

#[test]
fn test_cli_unknown_kind_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("circuit.json");
    run_ok(&["new"], &file);

    let mut cmd = circuit_cli();
    cmd.arg("add").arg(&file).arg("transistor");
    cmd.assert().failure();
}

#[test]
fn test_cli_remove_cascades() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("circuit.json");
    std::fs::copy(fixtures_dir().join("rc_filter.json"), &file).unwrap();

    let out = run_ok(&["remove", "resistor-1"], &file);
    assert!(out.contains("2 connection(s)"), "{}", out);

    let mut cmd = circuit_cli();
    cmd.arg("stats").arg(&file).arg("-f").arg("json");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"totalNodes\": 2"))
        .stdout(predicate::str::contains("\"totalEdges\": 1"));
}

#[test]
fn test_cli_validate_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("lonely.json");
    run_ok(&["new"], &file);
    run_ok(&["add", "resistor"], &file);

    let mut cmd = circuit_cli();
    cmd.arg("validate").arg(&file);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("no voltage source"))
        .stdout(predicate::str::contains("not connected"));

    let mut cmd = circuit_cli();
    cmd.arg("validate").arg(&file).arg("--strict");
    cmd.assert().code(1);
}

#[test]
fn test_cli_validate_fixture_json() {
    let mut cmd = circuit_cli();
    cmd.arg("validate")
        .arg(fixtures_dir().join("rc_filter.json"))
        .arg("--format")
        .arg("json");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"isValid\": true"))
        .stdout(predicate::str::contains("\"warnings\": []"));
}

#[test]
fn test_cli_rejects_mismatched_file() {
    let mut cmd = circuit_cli();
    cmd.arg("stats").arg(fixtures_dir().join("invalid_mismatch.json"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_nonexistent_file() {
    let mut cmd = circuit_cli();
    cmd.arg("stats").arg("does_not_exist.json");
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_list_from_server() {
    let url = serve_once(
        "200 OK",
        r#"{"count": 1, "next": null, "previous": null, "results": [
            {"id": 7, "name": "RC filter", "description": null,
             "created_at": "2024-05-01T12:00:00Z", "updated_at": "2024-05-02T08:30:00Z"}
        ]}"#,
    );

    let mut cmd = circuit_cli();
    cmd.arg("list").arg("--api-url").arg(url);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("RC filter"))
        .stdout(predicate::str::contains("1 circuit(s) in total"));
}

#[test]
fn test_cli_pull_missing_circuit() {
    let url = serve_once("404 Not Found", r#"{"detail": "Not found."}"#);
    let dir = tempfile::tempdir().unwrap();

    let mut cmd = circuit_cli();
    cmd.arg("pull")
        .arg("99")
        .arg(dir.path().join("out.json"))
        .arg("--api-url")
        .arg(url);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Circuit 99 not found"));
}

#[test]
fn test_cli_unreachable_api() {
    let mut cmd = circuit_cli();
    cmd.arg("list").arg("--api-url").arg("http://127.0.0.1:9/api");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn test_cli_connect_refuses_taken_id() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("circuit.json");
    std::fs::copy(fixtures_dir().join("rc_filter.json"), &file).unwrap();
    run_ok(&["add", "inductor"], &file);

    let mut cmd = circuit_cli();
    cmd.arg("connect")
        .arg(&file)
        .arg("inductor-1")
        .arg("voltage-1")
        .arg("--id")
        .arg("ground-return");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("already in use"));

    // the file is still readable by later commands
    let mut cmd = circuit_cli();
    cmd.arg("stats").arg(&file).arg("-f").arg("json");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"totalEdges\": 3"));
}

#[test]
fn test_cli_rejects_non_finite_coordinates() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("circuit.json");
    run_ok(&["new"], &file);
    run_ok(&["add", "resistor"], &file);

    let mut cmd = circuit_cli();
    cmd.arg("move").arg(&file).arg("resistor-1").arg("NaN").arg("0");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("finite"));

    let mut cmd = circuit_cli();
    cmd.arg("add").arg(&file).arg("voltage").arg("--x").arg("inf");
    cmd.assert().failure();

    let mut cmd = circuit_cli();
    cmd.arg("show").arg(&file);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"x\": 100.0"));
}
