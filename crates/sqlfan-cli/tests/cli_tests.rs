//! End-to-end tests of the `sqlfan` binary against a temporary SQLite database

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Run `sqlfan` with a config file pointing at this workspace's database
    fn sqlfan(&self, args: &[&str]) -> Output {
        let config = self.write(
            "sqlfan.toml",
            &format!(
                "database_path = {:?}\nmax_concurrency = 2\n\n[retry]\nmax_attempts = 1\ndelay_ms = 0\n",
                self.path("warehouse.db").display().to_string()
            ),
        );
        run(&config, args)
    }
}

fn run(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sqlfan"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("SQLFAN_DATABASE")
        .env_remove("SQLFAN_MAX_CONCURRENCY")
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_exec_runs_script_and_reports_failures() {
    let ws = Workspace::new();
    let setup = ws.write("setup.sql", "CREATE TABLE ITEMS (ID INTEGER, NAME TEXT)");
    assert!(ws.sqlfan(&["exec", "--file", setup.to_str().unwrap()]).status.success());

    let script = ws.write(
        "report.sql",
        "INSERT INTO ITEMS VALUES (1, 'bolt'); SELECT * FROM MISSING; SELECT 'ok' AS STATUS",
    );
    let output = ws.sqlfan(&["exec", "--file", script.to_str().unwrap()]);
    let text = stdout(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(text.contains("[1] INSERT INTO ITEMS VALUES (1, 'bolt')"));
    assert!(text.contains("Error: "));
    assert!(text.contains("no such table: MISSING"));
    assert!(text.contains("STATUS"));
    assert!(text.contains("3 statement(s): 2 succeeded, 1 failed"));
}

#[test]
fn test_upload_then_query() {
    let ws = Workspace::new();
    let csv = ws.write("orders.csv", "ID,ITEM,QTY\n1,bolt,10\n2,nut,\n3,washer,7\n");

    let output = ws.sqlfan(&["upload", csv.to_str().unwrap(), "--table", "ORDERS"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("Uploaded 3 row(s)"));

    let script = ws.write("count.sql", "SELECT COUNT(*) AS N, SUM(QTY) AS TOTAL FROM ORDERS");
    let output = ws.sqlfan(&["exec", "--file", script.to_str().unwrap()]);
    let text = stdout(&output);
    assert!(output.status.success());
    assert!(text.contains(" 3 "));
    assert!(text.contains(" 17 "));
}

#[test]
fn test_upload_rejects_unknown_format() {
    let ws = Workspace::new();
    let file = ws.write("orders.json", "[]");

    let output = ws.sqlfan(&["upload", file.to_str().unwrap(), "--table", "ORDERS"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_generate_writes_rows() {
    let ws = Workspace::new();
    let output = ws.sqlfan(&[
        "generate",
        "--table",
        "FAKE",
        "--rows",
        "12",
        "--column",
        "id:integer:1:5",
        "--column",
        "day:date:2024-01-01:2024-01-12",
        "--seed",
        "42",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("Generated 12 row(s) into FAKE"));

    let script = ws.write("check.sql", "SELECT MIN(DAY) AS LO, MAX(DAY) AS HI FROM FAKE");
    let text = stdout(&ws.sqlfan(&["exec", "--file", script.to_str().unwrap()]));
    assert!(text.contains("2024-01-01"));
    assert!(text.contains("2024-01-12"));
}

#[test]
fn test_check_reports_missing_credentials() {
    let ws = Workspace::new();
    let output = ws.sqlfan(&["check"]);
    let text = stdout(&output);

    assert_eq!(output.status.code(), Some(1));
    assert!(text.contains("Credentials: missing account, role"));
    assert!(text.contains("reachable"));
}

#[test]
fn test_ddl_surfaces_driver_error() {
    let ws = Workspace::new();
    let output = ws.sqlfan(&["ddl", "SALES"]);

    // SQLite has no GET_DDL function
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("GET_DDL"));
}

#[test]
fn test_upload_workbook() {
    let ws = Workspace::new();
    let workbook = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../sqlfan-services/tests/fixtures/orders.xlsx"
    );

    let output = ws.sqlfan(&["upload", workbook, "--table", "ORDERS"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout(&output).contains("Uploaded 3 row(s)"));
}
