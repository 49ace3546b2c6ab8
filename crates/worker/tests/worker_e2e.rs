//! End-to-end tests for the `chunkcast` binary.
//!
//! These spawn the real worker, feed it task messages on stdin and inspect the
//! SQLite database it leaves behind. No ffmpeg is needed: the configured path
//! points nowhere, so conversions fail at the transcode stage.

use std::io::Write;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::{NamedTempFile, TempDir};
use tokio::io::AsyncWriteExt;
use tokio::time::{sleep, timeout};

use chunkcast_core::{
    testing::fixtures, ErrorFilter, ErrorStore, FailureStage, ProcessingLedger, SqliteErrorStore,
    SqliteLedger,
};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Write a config pointing at `db_path` with an ffmpeg that does not exist.
fn write_config(db_path: &Path, metrics_port: Option<u16>) -> NamedTempFile {
    let metrics = match metrics_port {
        Some(port) => format!(
            "[metrics]\nenabled = true\nhost = \"127.0.0.1\"\nport = {}\n",
            port
        ),
        None => String::new(),
    };
    let content = format!(
        r#"
[database]
path = "{}"

[transcoder]
ffmpeg_path = "/nonexistent/bin/ffmpeg"

[logging]
filter = "error"

{}
"#,
        db_path.display(),
        metrics
    );

    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the worker with piped stdin
fn spawn_worker(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_chunkcast"))
        .env("CHUNKCAST_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn worker")
}

fn upload_dir(root: &Path) -> PathBuf {
    let dir = root.join("uploads").join("42");
    std::fs::create_dir_all(&dir).unwrap();
    fixtures::write_fragments(
        &dir,
        &[
            ("chunk_2.chunk", b"BB"),
            ("chunk_1.chunk", b"AA"),
            ("chunk_3.chunk", b"CC"),
        ],
    );
    dir
}

#[tokio::test]
async fn test_worker_processes_stdin_until_eof() {
    let root = TempDir::new().unwrap();
    let db_path = root.path().join("chunkcast.db");
    let dir = upload_dir(root.path());
    let config = write_config(&db_path, None);

    let mut worker = spawn_worker(config.path());
    let mut stdin = worker.stdin.take().unwrap();
    let mut input = fixtures::task_message(42, &dir);
    input.extend_from_slice(b"\n{not valid json\n");
    stdin.write_all(&input).await.unwrap();
    drop(stdin);

    let status = timeout(Duration::from_secs(30), worker.wait())
        .await
        .expect("Worker did not exit after stdin closed")
        .unwrap();
    assert!(status.success());

    // The merged file is kept for the next attempt.
    assert_eq!(std::fs::read(dir.join("merged.mp4")).unwrap(), b"AABBCC");

    let errors = SqliteErrorStore::new(&db_path).unwrap();
    assert_eq!(errors.count(&ErrorFilter::new()).unwrap(), 2);
    let transcode = errors
        .query(&ErrorFilter::new().with_stage(FailureStage::Transcode))
        .unwrap();
    assert_eq!(transcode.len(), 1);
    assert_eq!(transcode[0].video_id, 42);
    assert!(transcode[0].detail.contains("/nonexistent/bin/ffmpeg"));
    assert_eq!(
        errors
            .count(&ErrorFilter::new().with_stage(FailureStage::Decode))
            .unwrap(),
        1
    );

    let ledger = SqliteLedger::new(&db_path).unwrap();
    assert!(!ledger.is_processed(42).unwrap());
}

#[tokio::test]
async fn test_worker_skips_already_processed_video() {
    let root = TempDir::new().unwrap();
    let db_path = root.path().join("chunkcast.db");
    let dir = upload_dir(root.path());
    let config = write_config(&db_path, None);

    SqliteLedger::new(&db_path).unwrap().mark_processed(42).unwrap();

    let mut worker = spawn_worker(config.path());
    let mut stdin = worker.stdin.take().unwrap();
    stdin
        .write_all(&fixtures::task_message(42, &dir))
        .await
        .unwrap();
    drop(stdin);

    let status = timeout(Duration::from_secs(30), worker.wait())
        .await
        .expect("Worker did not exit after stdin closed")
        .unwrap();
    assert!(status.success());

    assert!(!dir.join("merged.mp4").exists());
    let errors = SqliteErrorStore::new(&db_path).unwrap();
    assert_eq!(errors.count(&ErrorFilter::new()).unwrap(), 0);
}

#[tokio::test]
async fn test_worker_rejects_invalid_config() {
    let root = TempDir::new().unwrap();
    let mut config = NamedTempFile::new().unwrap();
    writeln!(
        config,
        "[database]\npath = \"{}\"\n\n[transcoder]\nmanifest_name = \"output.m3u8\"",
        root.path().join("chunkcast.db").display()
    )
    .unwrap();

    let mut worker = spawn_worker(config.path());
    drop(worker.stdin.take());

    let status = timeout(Duration::from_secs(30), worker.wait())
        .await
        .expect("Worker did not exit")
        .unwrap();
    assert!(!status.success());
}

#[tokio::test]
async fn test_worker_serves_health_while_running() {
    let root = TempDir::new().unwrap();
    let port = get_available_port();
    let config = write_config(&root.path().join("chunkcast.db"), Some(port));

    let mut worker = spawn_worker(config.path());
    // Keep stdin open so the worker stays up.
    let stdin = worker.stdin.take().unwrap();

    let mut healthy = false;
    for _ in 0..100 {
        if let Ok(mut stream) = tokio::net::TcpStream::connect(("127.0.0.1", port)).await {
            stream
                .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
                .await
                .unwrap();
            let mut response = Vec::new();
            tokio::io::AsyncReadExt::read_to_end(&mut stream, &mut response)
                .await
                .unwrap();
            let response = String::from_utf8_lossy(&response);
            healthy = response.starts_with("HTTP/1.1 200") && response.contains(r#"{"status":"ok"}"#);
            break;
        }
        sleep(Duration::from_millis(50)).await;
    }
    assert!(healthy, "Health endpoint did not respond");

    drop(stdin);
    let status = timeout(Duration::from_secs(30), worker.wait())
        .await
        .expect("Worker did not exit after stdin closed")
        .unwrap();
    assert!(status.success());
}
