// Integration tests for `rollmatch run` / `rollmatch validate`.
// Run with: cargo test -p rollmatch-cli --test cli_run

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use httpmock::prelude::*;

const KEY_VARS: [&str; 3] = ["ROLLMATCH_OPENAI_KEY", "OPENAI_API_KEY", "AZURE_OPENAI_API_KEY"];

fn rollmatch() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rollmatch"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    for var in KEY_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("ROLLMATCH_CONFIG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn run_ok(cmd: &mut Command) -> Output {
    let output = cmd.output().expect("failed to run rollmatch");
    assert_exit(&output, 0);
    output
}

fn assert_exit(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "expected exit {code}, got {:?}\nstderr: {}",
        output.status.code(),
        String::from_utf8_lossy(&output.stderr),
    );
}

fn read_rows(path: &Path) -> Vec<csv::StringRecord> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.records().map(|r| r.unwrap()).collect()
}

fn header(path: &Path) -> Vec<String> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    reader.headers().unwrap().iter().map(str::to_string).collect()
}

// ---------------------------------------------------------------------------
// Lexical runs
// ---------------------------------------------------------------------------

#[test]
fn run_writes_report_csv() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("matches.csv");

    let output = run_ok(rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .arg("--config").arg(fixture("workshop.toml"))
        .arg("--output").arg(&out));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("6 surveyed, 3 matched (50.0%)"), "stderr: {stderr}");
    assert!(stderr.contains("Kai Ito"), "stderr: {stderr}");

    assert_eq!(header(&out)[0], "survey_name");
    assert_eq!(header(&out).len(), 19);
    let rows = read_rows(&out);
    assert_eq!(rows.len(), 6);
    assert_eq!(&rows[0][0], "Jon Smith");
    assert_eq!(&rows[0][4], "Jonathan Smith");
    assert_eq!(&rows[0][12], "matched-checked-in");
    assert_eq!(&rows[2][12], "unmatched");
}

#[test]
fn json_flag_prints_run() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_ok(rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .arg("--json")
        .arg("--output").arg(dir.path().join("m.csv")));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["meta"]["config_name"], "rollmatch");
    assert_eq!(json["summary"]["total_surveyed"], 6);
    assert_eq!(json["summary"]["matched_checked_in"], 2);
    assert_eq!(json["reports"][1]["category"], "matched-not-checked-in");
}

#[test]
fn config_from_env() {
    let dir = tempfile::tempdir().unwrap();
    let output = run_ok(rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .arg("--json")
        .arg("--output").arg(dir.path().join("m.csv"))
        .env("ROLLMATCH_CONFIG", fixture("workshop.toml")));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["meta"]["config_name"], "Workshop");
}

#[test]
fn matcher_flag_overrides_config() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("m.csv");
    run_ok(rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .arg("--config").arg(fixture("workshop.toml"))
        .args(["--matcher", "split_name"])
        .arg("--output").arg(&out));

    let rows = read_rows(&out);
    assert_eq!(&rows[5][0], "Mia Nguyen");
    assert_eq!(&rows[5][4], "Mia Tran");
    assert_eq!(&rows[5][8], "Linh Nguyen");
}

#[test]
fn strict_with_unmatched_exits_6() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("m.csv");
    let output = rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .arg("--strict")
        .arg("--output").arg(&out)
        .output()
        .unwrap();

    assert_exit(&output, 6);
    // Report is still written
    assert_eq!(read_rows(&out).len(), 6);
}

#[test]
fn threshold_zero_matches_more() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("m.csv");
    let output = run_ok(rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .args(["--threshold", "0"])
        .arg("--output").arg(&out));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("3 matched"), "stderr: {stderr}");
}

// ---------------------------------------------------------------------------
// Input handling
// ---------------------------------------------------------------------------

#[test]
fn windows_1252_survey_is_decoded() {
    let dir = tempfile::tempdir().unwrap();
    let survey = dir.path().join("survey.csv");
    let registration = dir.path().join("registration.csv");
    let out = dir.path().join("m.csv");

    std::fs::write(
        &survey,
        b"Full name to display on certificate\nRen\xE9e Dubois\nLiam O\x92Neil\n",
    )
    .unwrap();
    std::fs::write(
        &registration,
        "\u{feff}Student's full name,Checked in\nRenée Dubois,Checked in\nLiam O\u{2019}Neil,Checked in\n",
    )
    .unwrap();

    let output = run_ok(rollmatch().arg("run").arg(&survey).arg(&registration).arg("--output").arg(&out));
    assert!(String::from_utf8_lossy(&output.stderr).contains("decoded as Windows-1252"));

    let rows = read_rows(&out);
    assert_eq!(&rows[0][0], "Renée Dubois");
    assert_eq!(&rows[0][4], "Renée Dubois");
    assert_eq!(&rows[1][0], "Liam O\u{2019}Neil");
    assert_eq!(&rows[1][4], "Liam O\u{2019}Neil");
    assert_eq!(&rows[1][10], "100.0");
    assert_eq!(&rows[1][12], "matched-checked-in");
}

#[test]
fn empty_survey_writes_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let survey = dir.path().join("survey.csv");
    let out = dir.path().join("m.csv");
    std::fs::write(&survey, "Full name to display on certificate\n").unwrap();

    let output = run_ok(rollmatch().arg("run").arg(&survey).arg(fixture("registration.csv"))
        .arg("--output").arg(&out));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no survey entries"), "stderr: {stderr}");
    assert_eq!(header(&out).len(), 19);
    assert!(read_rows(&out).is_empty());
}

#[test]
fn missing_survey_file_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("m.csv");
    let output = rollmatch().args(["run", "tests/fixtures/nope.csv"]).arg(fixture("registration.csv"))
        .arg("--output").arg(&out)
        .output()
        .unwrap();

    assert_exit(&output, 3);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("nope.csv"), "stderr: {stderr}");
    assert!(!out.exists());
}

#[test]
fn missing_name_column_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    let survey = dir.path().join("survey.csv");
    let out = dir.path().join("m.csv");
    std::fs::write(&survey, "Name\nJon Smith\n").unwrap();

    let output = rollmatch().arg("run").arg(&survey).arg(fixture("registration.csv"))
        .arg("--output").arg(&out)
        .output()
        .unwrap();

    assert_exit(&output, 3);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("missing column 'Full name to display on certificate'"), "stderr: {stderr}");
    assert!(!out.exists());
}

#[test]
fn unwritable_output_exits_5() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("no-such-dir").join("m.csv");
    let output = rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .arg("--output").arg(&out)
        .output()
        .unwrap();

    assert_exit(&output, 5);
    assert!(String::from_utf8_lossy(&output.stderr).contains("no-such-dir"));
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn invalid_config_exits_4() {
    let output = rollmatch().args(["validate"]).arg(fixture("invalid.toml")).output().unwrap();
    assert_exit(&output, 4);
    assert!(String::from_utf8_lossy(&output.stderr).contains("between 0 and 100"));
}

#[test]
fn validate_accepts_good_config() {
    let output = run_ok(rollmatch().args(["validate"]).arg(fixture("workshop.toml")));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config ok: \"Workshop\""));
}

#[test]
fn threshold_flag_out_of_range_exits_4() {
    let output = rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .args(["--threshold", "150"])
        .output()
        .unwrap();
    assert_exit(&output, 4);
}

#[test]
fn unknown_matcher_is_usage_error() {
    let output = rollmatch().args(["run", "a.csv", "b.csv", "--matcher", "phonetic"]).output().unwrap();
    assert_exit(&output, 2);
}

// ---------------------------------------------------------------------------
// Semantic matcher
// ---------------------------------------------------------------------------

#[test]
fn semantic_without_key_exits_11() {
    let output = rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .args(["--matcher", "semantic"])
        .output()
        .unwrap();

    assert_exit(&output, 11);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("hint:  set ROLLMATCH_OPENAI_KEY"), "stderr: {stderr}");
}

#[test]
fn azure_without_endpoint_exits_4() {
    let output = rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .arg("--config").arg(fixture("azure-no-endpoint.toml"))
        .env("ROLLMATCH_OPENAI_KEY", "az-test")
        .output()
        .unwrap();

    assert_exit(&output, 4);
    assert!(String::from_utf8_lossy(&output.stderr).contains("semantic.endpoint"));
}

fn semantic_config(dir: &Path, endpoint: &str) -> PathBuf {
    let path = dir.join("semantic.toml");
    std::fs::write(
        &path,
        format!("matcher = \"semantic\"\n\n[semantic]\nendpoint = \"{endpoint}\"\ntimeout_secs = 5\n"),
    )
    .unwrap();
    path
}

#[test]
fn semantic_run_claims_model_picks() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("authorization", "Bearer sk-test");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({
                "choices": [{
                    "message": {
                        "role": "assistant",
                        "content": "{\"match_index\": 1, \"confidence\": 95, \"reasoning\": \"first listed\"}"
                    }
                }]
            }));
    });

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("m.csv");
    let config = semantic_config(dir.path(), &server.base_url());

    run_ok(rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .arg("--config").arg(&config)
        .arg("--output").arg(&out)
        .env("ROLLMATCH_OPENAI_KEY", "sk-test"));

    // Five registrations: each call claims the first remaining one; the
    // sixth survey entry has no candidates left and makes no call.
    mock.assert_hits(5);

    let rows = read_rows(&out);
    assert_eq!(&rows[0][4], "Jonathan Smith");
    assert_eq!(&rows[0][10], "95.0");
    assert_eq!(&rows[0][18], "first listed");
    assert_eq!(&rows[5][12], "unmatched");
}

#[test]
fn semantic_backend_failure_fails_soft() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(500).body("upstream exploded");
    });

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("m.csv");
    let config = semantic_config(dir.path(), &server.base_url());

    run_ok(rollmatch().args(["run"]).arg(fixture("survey.csv")).arg(fixture("registration.csv"))
        .arg("--config").arg(&config)
        .arg("--output").arg(&out)
        .env("OPENAI_API_KEY", "sk-test"));

    let rows = read_rows(&out);
    assert_eq!(rows.len(), 6);
    for row in &rows {
        assert_eq!(&row[12], "unmatched");
        assert_eq!(&row[10], "0.0");
        assert!(row[18].contains("API error (500)"), "reasoning: {}", &row[18]);
    }
}
