//! Shared integration-test harness for spawning the `crossway` binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};

/// How long to wait for the controller to report its listen address.
pub const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Absolute path of a file under `tests/fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Runs the binary to completion with `args` and returns its output.
#[allow(clippy::missing_panics_doc)]
pub fn spawn_command(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_crossway"))
        .args(args)
        .output()
        .expect("failed to run crossway")
}

/// A running controller bound to an ephemeral port.
///
/// The child process is killed on drop via `kill_on_drop(true)`.
pub struct ControllerProcess {
    child: Child,
    /// `http://127.0.0.1:<port>`
    pub base_url: String,
    pub client: reqwest::Client,
}

impl ControllerProcess {
    /// Starts `crossway run` with `config` (if any) on `127.0.0.1:0`.
    ///
    /// Reads stderr until the "HTTP server listening" line to discover
    /// the port.
    #[allow(clippy::missing_panics_doc)]
    pub async fn start(config: Option<&Path>) -> Self {
        let mut args = vec!["run", "--http", "127.0.0.1:0", "-v", "--color", "never"];
        if let Some(path) = config {
            args.push("--config");
            args.push(path.to_str().expect("non-UTF-8 config path"));
        }

        let mut child = Command::new(env!("CARGO_BIN_EXE_crossway"))
            .args(&args)
            .env_remove("CROSSWAY_LOG_LEVEL")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .expect("failed to spawn crossway");

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut reader = BufReader::new(stderr);
        let mut line = String::new();

        let port = tokio::time::timeout(STARTUP_TIMEOUT, async {
            loop {
                line.clear();
                let n = reader
                    .read_line(&mut line)
                    .await
                    .expect("failed to read stderr");
                assert!(n > 0, "controller exited before printing listening address");

                if line.contains("HTTP") && line.contains("listening") {
                    let start = line.find("127.0.0.1:").expect("no address in line");
                    let digits: String = line[start + "127.0.0.1:".len()..]
                        .chars()
                        .take_while(char::is_ascii_digit)
                        .collect();
                    return digits.parse::<u16>().expect("invalid port");
                }
            }
        })
        .await
        .expect("timed out waiting for controller startup");

        // Keep draining stderr so the child never blocks on a full pipe.
        tokio::spawn(async move {
            let mut sink = String::new();
            while reader.read_line(&mut sink).await.map(|n| n > 0).unwrap_or(false) {
                sink.clear();
            }
        });

        Self {
            child,
            base_url: format!("http://127.0.0.1:{port}"),
            client: reqwest::Client::new(),
        }
    }

    /// Full URL for an API path such as `/api/v1/status`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[allow(clippy::missing_panics_doc)]
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("failed to send HTTP request")
    }

    #[allow(clippy::missing_panics_doc)]
    pub async fn status(&self) -> serde_json::Value {
        self.get("/api/v1/status")
            .await
            .json()
            .await
            .expect("status body is not JSON")
    }

    /// Kills the process.
    pub async fn shutdown(mut self) {
        let _ = self.child.kill().await;
    }
}
