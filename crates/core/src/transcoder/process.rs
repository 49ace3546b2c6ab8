//! Process boundary for external tools.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Outcome of a finished external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// Whether the process exited with status zero.
    pub success: bool,
    /// Captured stdout followed by captured stderr.
    pub output: Vec<u8>,
}

impl ProcessOutput {
    pub fn combined_output_lossy(&self) -> String {
        String::from_utf8_lossy(&self.output).to_string()
    }
}

/// Runs an external program to completion and captures its output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` and waits for it to exit.
    ///
    /// Returns `Err` only when the process could not be started.
    async fn run(&self, program: &Path, args: &[String]) -> std::io::Result<ProcessOutput>;
}

/// Runs commands with `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &Path, args: &[String]) -> std::io::Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            output: combined,
        })
    }
}
