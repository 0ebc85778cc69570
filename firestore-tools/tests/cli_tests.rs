//! End-to-end tests running the `firestore-tools` binary
//!
//! Read tests point the binary at the in-process mock Firestore through
//! `--emulator-host`, so no credentials or network are needed.

use firestore_tools::test_utils::MockFirestore;
use std::process::Output;
use tokio::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_firestore-tools");

fn command() -> Command {
    let mut cmd = Command::new(BIN);
    cmd.arg("--no-config")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("FIRESTORE_EMULATOR_HOST")
        .env_remove("FIRESTORE_TOOLS_PROJECT")
        .env_remove("FIRESTORE_TOOLS_FORMAT")
        .env_remove("FIRESTORE_TOOLS_CREDENTIAL");
    cmd
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

async fn read(mock_url: &str, args: &[&str]) -> Output {
    command()
        .args(["--emulator-host", mock_url, "--project", "demo", "read"])
        .args(args)
        .output()
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_paths() {
    let mock = MockFirestore::new()
        .with_document("A/b/C/d")
        .with_document("A/e")
        .with_document("F/g");
    let (_mock, url) = mock.start().await.unwrap();

    let output = read(&url, &["--format", "paths"]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "/A\n/A/b\n/A/b/C\n/A/b/C/d\n/A/e\n/F\n/F/g\n"
    );
    assert!(stderr(&output).contains("Firestore Tools"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_text() {
    let mock = MockFirestore::new().with_document("users/alice");
    let (_mock, url) = mock.start().await.unwrap();

    let output = read(&url, &["--output", "/tmp"]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Reading from Firestore, credential file: credential.json"));
    assert!(out.contains("Document path: /"));
    assert!(out.contains("Output path: /tmp"));
    assert!(out.contains("Reading collection: /users\nusers\n"));
    assert!(out.contains("Reading document: /users/alice\nalice\n"));
    assert!(out.contains("Read 1 collections and 1 documents"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_json_from_collection() {
    let mock = MockFirestore::new()
        .with_document("users/alice/posts/p1")
        .with_document("orders/o1");
    let (_mock, url) = mock.start().await.unwrap();

    let output = read(&url, &["-f", "json", "/users"]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    let records: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let paths: Vec<&str> = records.iter().map(|r| r["path"].as_str().unwrap()).collect();
    assert_eq!(
        paths,
        vec!["/users", "/users/alice", "/users/alice/posts", "/users/alice/posts/p1"]
    );
    assert_eq!(records[0]["kind"], "collection");
    assert_eq!(records[3]["depth"], 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_max_depth() {
    let mock = MockFirestore::new().with_document("A/b/C/d");
    let (_mock, url) = mock.start().await.unwrap();

    let output = read(&url, &["--format", "paths", "--max-depth", "2"]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "/A\n/A/b\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_failure_exits_non_zero() {
    let mock = MockFirestore::new()
        .with_document("A/a1")
        .with_document("A/a2/X/x")
        .with_document("A/a3")
        .with_failure("A/a2");
    let (_mock, url) = mock.start().await.unwrap();

    let output = read(&url, &["--format", "paths"]).await;

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout(&output), "/A\n/A/a1\n/A/a2\n");
    let err = stderr(&output);
    assert!(err.contains("Error: Failed to list collections of document /A/a2"), "{}", err);
    assert!(err.contains("PERMISSION_DENIED"), "{}", err);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_read_empty_database() {
    let (_mock, url) = MockFirestore::new().start().await.unwrap();

    let output = read(&url, &["--format", "paths"]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "");
}

#[tokio::test]
async fn test_read_without_credentials() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing.json");

    let output = command()
        .args(["read", "--cred"])
        .arg(&missing)
        .output()
        .await
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Cannot read credential file"));
}

#[tokio::test]
async fn test_read_rejects_bad_path() {
    let output = command().args(["read", "users//alice"]).output().await.unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Invalid path"));
}

#[tokio::test]
async fn test_write_is_a_stub() {
    let output = command()
        .args(["write", "--data", "{}"])
        .output()
        .await
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout(&output), "Dropped the database\n");
}

#[tokio::test]
async fn test_copy_file() {
    let dir = tempfile::tempdir().unwrap();
    let foo = dir.path().join("foo.txt");
    let bar = dir.path().join("bar.txt");
    let out = dir.path().join("out.txt");
    std::fs::write(&foo, "foo\n").unwrap();
    std::fs::write(&bar, "bar\n").unwrap();

    let output = command()
        .arg("copy-file")
        .args([&foo, &bar, &out])
        .output()
        .await
        .unwrap();

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "foo\nbar\n");
}

#[tokio::test]
async fn test_copy_file_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let foo = dir.path().join("foo.txt");
    std::fs::write(&foo, "hello\n").unwrap();

    let output = command()
        .arg("copy-file")
        .arg(&foo)
        .arg("-")
        .output()
        .await
        .unwrap();

    assert!(output.status.success());
    assert_eq!(stdout(&output), "hello\n");
}

#[tokio::test]
async fn test_config_set_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cli.toml");
    let path_str = path.to_string_lossy().to_string();

    let output = Command::new(BIN)
        .env("NO_COLOR", "1")
        .args(["--config", &path_str, "config", "set", "project", "demo"])
        .output()
        .await
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(std::fs::read_to_string(&path)
        .unwrap()
        .contains("project = \"demo\""));

    let output = Command::new(BIN)
        .env_remove("FIRESTORE_TOOLS_PROJECT")
        .args(["--config", &path_str, "-f", "json", "config", "show"])
        .output()
        .await
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
    let shown: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(shown["project"], "demo");

    let output = Command::new(BIN)
        .args(["--config", &path_str, "config", "path"])
        .output()
        .await
        .unwrap();
    assert_eq!(stdout(&output).trim(), path_str);
}

#[tokio::test]
async fn test_progress_rejects_out_of_range_count() {
    let output = command()
        .args(["progress", "--count", "0"])
        .output()
        .await
        .unwrap();

    assert!(!output.status.success());
}
