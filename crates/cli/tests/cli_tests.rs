// End-to-end tests for the `askgrid` binary.
// Run with: cargo test -p askgrid-cli --test cli_tests -- --nocapture

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use httpmock::prelude::*;

const PASSENGERS: &str = "\
PassengerId,Survived,Pclass,Sex,Age,Fare
1,0,3,male,22,7.25
2,1,1,female,38,71.2833
3,1,3,female,26,7.925
4,1,1,female,35,53.1
5,0,3,male,35,8.05
6,0,3,male,,8.4583
7,0,1,male,54,51.8625
8,0,3,male,2,21.075
9,1,3,female,27,11.1333
10,1,2,female,14,30.0708
11,1,3,female,4,16.7
12,1,1,female,58,26.55
";

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self { dir: tempfile::tempdir().unwrap() };
        ws.write_settings(r#"{ "ai": { "provider": "openai" } }"#);
        ws
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn write_settings(&self, json: &str) {
        self.write("settings.json", json.as_bytes());
    }

    fn point_at(&self, server: &MockServer) {
        self.write_settings(&format!(
            r#"{{ "ai": {{ "provider": "openai", "endpoint": "{}" }} }}"#,
            server.base_url()
        ));
    }

    /// Runs in the temp dir with a private settings file and no key in the
    /// environment
    fn askgrid(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_askgrid"));
        cmd.current_dir(self.dir.path())
            .env("ASKGRID_CONFIG", self.path("settings.json"))
            .env_remove("OPENAI_API_KEY")
            .env_remove("ASKGRID_OPENAI_KEY")
            .env_remove("RUST_LOG");
        cmd
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn completion(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
}

fn workbook(path: &Path) {
    let mut workbook = rust_xlsxwriter::Workbook::new();

    let first = workbook.add_worksheet();
    first.set_name("Summary").unwrap();
    first.write_string(0, 0, "Note").unwrap();
    first.write_string(1, 0, "see Passengers").unwrap();

    let second = workbook.add_worksheet();
    second.set_name("Passengers").unwrap();
    second.write_string(0, 0, "Sex").unwrap();
    second.write_string(0, 1, "Survived").unwrap();
    second.write_string(1, 0, "female").unwrap();
    second.write_number(1, 1, 1.0).unwrap();
    second.write_string(2, 0, "male").unwrap();
    second.write_number(2, 1, 0.0).unwrap();

    workbook.save(path).unwrap();
}

// ---------------------------------------------------------------------------
// preview
// ---------------------------------------------------------------------------

#[test]
fn preview_shows_requested_rows() {
    let ws = Workspace::new();
    ws.write("passengers.csv", PASSENGERS.as_bytes());

    let output = ws
        .askgrid()
        .args(["preview", "passengers.csv", "--rows", "3"])
        .output()
        .expect("askgrid preview");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "passengers.csv (first 3 rows)");
    assert!(lines[1].contains("PassengerId") && lines[1].contains("Fare"));
    assert!(lines[2].starts_with('0'));
    assert!(lines[4].starts_with('2'));
    assert_eq!(lines.len(), 5);
}

#[test]
fn preview_defaults_to_ten_rows() {
    let ws = Workspace::new();
    ws.write("passengers.csv", PASSENGERS.as_bytes());

    let output = ws.askgrid().args(["preview", "passengers.csv"]).output().unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).starts_with("passengers.csv (first 10 rows)\n"));
    assert_eq!(stdout(&output).lines().count(), 12);
}

#[test]
fn preview_rejects_txt_files() {
    let ws = Workspace::new();
    ws.write("passengers.csv", PASSENGERS.as_bytes());
    ws.write("data.txt", b"a,b\n1,2\n");

    let output = ws
        .askgrid()
        .args(["preview", "passengers.csv", "data.txt"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("error: Invalid file type: data.txt. Please upload a valid CSV or Excel file."));
    assert!(err.contains("error: No valid data uploaded. Please upload a valid CSV or Excel file."));
    assert!(stdout(&output).is_empty());
}

#[test]
fn preview_selects_dataset_and_sheet() {
    let ws = Workspace::new();
    ws.write("passengers.csv", PASSENGERS.as_bytes());
    workbook(&ws.path("book.xlsx"));

    let output = ws
        .askgrid()
        .args([
            "preview",
            "passengers.csv",
            "book.xlsx",
            "--sheet",
            "book.xlsx=Passengers",
            "--dataset",
            "book.xlsx",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("book.xlsx (first 10 rows)\n"));
    assert!(text.contains("Survived"));
    assert!(text.contains("female"));
}

#[test]
fn unknown_sheet_is_an_upload_error() {
    let ws = Workspace::new();
    workbook(&ws.path("book.xlsx"));

    let output = ws
        .askgrid()
        .args(["preview", "book.xlsx", "--sheet", "book.xlsx=Nope"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("Error uploading file book.xlsx"));
}

#[test]
fn unknown_dataset_is_usage_error() {
    let ws = Workspace::new();
    ws.write("passengers.csv", PASSENGERS.as_bytes());

    let output = ws
        .askgrid()
        .args(["preview", "passengers.csv", "--dataset", "other.csv"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let err = stderr(&output);
    assert!(err.contains("error: Dataset other.csv not found"));
    assert!(err.contains("hint:  loaded: passengers.csv"));
}

// ---------------------------------------------------------------------------
// sheets
// ---------------------------------------------------------------------------

#[test]
fn sheets_lists_names_in_order() {
    let ws = Workspace::new();
    workbook(&ws.path("book.xlsx"));

    let output = ws.askgrid().args(["sheets", "book.xlsx"]).output().unwrap();

    assert!(output.status.success());
    assert_eq!(stdout(&output), "Summary\nPassengers\n");
}

// ---------------------------------------------------------------------------
// chart
// ---------------------------------------------------------------------------

#[test]
fn chart_age_histogram() {
    let ws = Workspace::new();
    ws.write("passengers.csv", PASSENGERS.as_bytes());

    let output = ws.askgrid().args(["chart", "age", "passengers.csv"]).output().unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Age Distribution");
    // 10 bins, one missing age dropped
    assert_eq!(lines.len(), 11);
    let total: usize = lines[1..]
        .iter()
        .map(|l| l.rsplit(' ').next().unwrap().parse::<usize>().unwrap())
        .sum();
    assert_eq!(total, 11);
}

#[test]
fn chart_survival_by_sex() {
    let ws = Workspace::new();
    ws.write("passengers.csv", PASSENGERS.as_bytes());

    let output = ws.askgrid().args(["chart", "survival", "passengers.csv"]).output().unwrap();

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.starts_with("Survival Rate by Sex\n"));
    assert!(text.contains("female |"));
    assert!(text.contains("1.000"));
    assert!(text.contains("male |"));
    assert!(text.contains("0.000"));
}

#[test]
fn chart_json_output() {
    let ws = Workspace::new();
    ws.write("passengers.csv", PASSENGERS.as_bytes());

    let output = ws
        .askgrid()
        .args(["chart", "survival", "passengers.csv", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let chart: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(chart["title"], "Survival Rate by Sex");
    assert_eq!(chart["bars"][0]["label"], "female");
    assert_eq!(chart["bars"][0]["value"], 1.0);
    assert_eq!(chart["bars"][1]["label"], "male");
    assert_eq!(chart["bars"][1]["value"], 0.0);

    let output = ws
        .askgrid()
        .args(["chart", "age", "passengers.csv", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let hist: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    let bins = hist["bins"].as_array().unwrap();
    assert_eq!(bins.len(), 10);
    let total: u64 = bins.iter().map(|b| b["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 11);
    assert_eq!(bins[0]["start"], 2.0);
    assert_eq!(bins[9]["end"], 58.0);
}

#[test]
fn chart_missing_column_warns() {
    let ws = Workspace::new();
    ws.write("sales.csv", b"region,total\nnorth,10\nsouth,12\n");

    let output = ws.askgrid().args(["chart", "age", "sales.csv"]).output().unwrap();

    assert!(output.status.success());
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("warning: Age column not found in the dataset."));
}

// ---------------------------------------------------------------------------
// ask
// ---------------------------------------------------------------------------

#[test]
fn ask_prints_trimmed_answer() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(completion("  Women survived at a far higher rate.\n"));
    });

    let ws = Workspace::new();
    ws.point_at(&server);
    ws.write("passengers.csv", PASSENGERS.as_bytes());

    let output = ws
        .askgrid()
        .env("ASKGRID_OPENAI_KEY", "sk-test")
        .args(["ask", "passengers.csv", "-q", "Who survived?"])
        .output()
        .unwrap();

    mock.assert();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Answer: Women survived at a far higher rate.\n");
}

#[test]
fn ask_reads_key_from_key_env_file() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("Authorization", "Bearer sk-from-file");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(completion("ok"));
    });

    let ws = Workspace::new();
    ws.point_at(&server);
    ws.write("passengers.csv", PASSENGERS.as_bytes());
    ws.write("key.env", b"OPENAI_API_KEY=sk-from-file\n");

    let output = ws
        .askgrid()
        .args(["ask", "passengers.csv", "-q", "q"])
        .output()
        .unwrap();

    mock.assert();
    assert!(output.status.success(), "stderr: {}", stderr(&output));
}

#[test]
fn ask_api_failure_prints_none() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(401)
            .header("content-type", "application/json")
            .json_body(serde_json::json!({ "error": { "message": "Incorrect API key provided" } }));
    });

    let ws = Workspace::new();
    ws.point_at(&server);
    ws.write("passengers.csv", PASSENGERS.as_bytes());

    let output = ws
        .askgrid()
        .args(["ask", "passengers.csv", "-q", "Who survived?"])
        .output()
        .unwrap();

    mock.assert_calls(1);
    assert_eq!(output.status.code(), Some(13));
    assert_eq!(stdout(&output), "Answer: None\n");
    assert!(stderr(&output)
        .contains("error: Error with OpenAI API: API error (401): Incorrect API key provided"));
}

#[test]
fn ask_large_dataset_warns_about_truncation() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(completion("big"));
    });

    let ws = Workspace::new();
    ws.point_at(&server);
    let mut csv = String::from("id,comment\n");
    for i in 0..500 {
        csv.push_str(&format!("{},passenger comment number {}\n", i, i));
    }
    ws.write("big.csv", csv.as_bytes());

    let output = ws
        .askgrid()
        .env("ASKGRID_OPENAI_KEY", "sk-test")
        .args(["ask", "big.csv", "-q", "q"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stderr(&output).contains("warning: Dataset is too large, truncating it for the query."));
    assert_eq!(stdout(&output), "Answer: big\n");
}

#[test]
fn ask_with_ai_disabled() {
    let ws = Workspace::new();
    ws.write_settings(r#"{ "ai": { "provider": "none" } }"#);
    ws.write("passengers.csv", PASSENGERS.as_bytes());

    let output = ws
        .askgrid()
        .args(["ask", "passengers.csv", "-q", "q"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(10));
    assert!(stderr(&output).contains("error: AI is disabled"));
}

// ---------------------------------------------------------------------------
// chat
// ---------------------------------------------------------------------------

#[test]
fn chat_history_and_reask() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(completion("342 survived"));
    });

    let ws = Workspace::new();
    ws.point_at(&server);
    ws.write("passengers.csv", PASSENGERS.as_bytes());

    let mut child = ws
        .askgrid()
        .env("ASKGRID_OPENAI_KEY", "sk-test")
        .args(["chat", "passengers.csv"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"How many survived?\n:reask 1\n:history\n:feedback no cite the rows\n:quit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    mock.assert_calls(2);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Loaded passengers.csv"));
    assert!(text.contains("Reusing Question: How many survived?"));
    assert!(text.contains("1. File: passengers.csv | Question: How many survived?"));
    assert!(text.contains("2. File: passengers.csv | Question: How many survived?"));
    assert!(text.contains("Answer: 342 survived"));
    assert!(text.contains("Thank you for your feedback!"));
}

#[test]
fn chat_without_data_warns_on_questions() {
    let ws = Workspace::new();

    let mut child = ws
        .askgrid()
        .arg("chat")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child.stdin.take().unwrap().write_all(b"anything?\n:age\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    let err = stderr(&output);
    assert_eq!(
        err.matches("warning: No dataset loaded. Please upload a valid CSV or Excel file.").count(),
        2
    );
}

// ---------------------------------------------------------------------------
// ai doctor
// ---------------------------------------------------------------------------

#[test]
fn ai_doctor_json_disabled() {
    let ws = Workspace::new();
    ws.write_settings(r#"{ "ai": { "provider": "none" } }"#);

    let output = ws.askgrid().args(["ai", "doctor", "--json"]).output().unwrap();

    assert_eq!(output.status.code(), Some(10));
    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(report["schema_version"], 1);
    assert_eq!(report["status"], "disabled");
    assert_eq!(report["provider"], "none");
}

#[test]
fn ai_doctor_reports_environment_key() {
    let ws = Workspace::new();
    ws.write_settings(r#"{ "ai": { "provider": "openai", "model": "gpt-4o-mini" } }"#);

    let output = ws
        .askgrid()
        .env("ASKGRID_OPENAI_KEY", "sk-test")
        .args(["ai", "doctor", "--json"])
        .output()
        .unwrap();

    let report: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("valid JSON");
    assert_eq!(report["model"], "gpt-4o-mini");
    assert_eq!(report["key"], "present");
    assert_eq!(report["endpoint"], "https://api.openai.com/v1");
    assert!(!stdout(&output).contains("sk-test"));
}
