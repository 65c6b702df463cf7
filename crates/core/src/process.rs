//! Process execution utilities
//!
//! Runs external filters that read a buffer on stdin and write the result to
//! stdout, the way the image optimizer toolchain (mozjpeg, pngquant, gifsicle)
//! is driven.

use crate::error::{Error, Result};
use std::io::Write;
use std::process::{Command, Output, Stdio};

/// Result of a filter command execution
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,
    /// Exit code of the command
    pub exit_code: i32,
    /// Raw standard output
    pub stdout: Vec<u8>,
    /// Standard error, lossily decoded
    pub stderr: String,
}

impl CommandResult {
    /// Create from std::process::Output
    pub fn from_output(output: Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code().unwrap_or(-1),
            stdout: output.stdout,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Return stdout on success, a `CommandFailed` error otherwise
    pub fn into_stdout(self, program: &str) -> Result<Vec<u8>> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(Error::command_failed(program, self.exit_code, &self.stderr))
        }
    }
}

/// Run `program` with `input` piped to its stdin and capture its output.
///
/// Stdin is fed from a separate thread so a filter that starts writing
/// before it has consumed all input cannot deadlock on a full pipe.
pub fn run_filter(program: &str, args: &[&str], input: &[u8]) -> Result<CommandResult> {
    if !command_exists(program) {
        return Err(Error::command_not_found(program));
    }

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::process(format!("Failed to execute {}: {}", program, e)).with_source(e))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| Error::process(format!("Failed to open stdin of {}", program)))?;

    let output = std::thread::scope(|scope| {
        let writer = scope.spawn(move || {
            // The filter may exit before reading everything; its exit
            // status is checked instead of the write result.
            let _ = stdin.write_all(input);
        });
        let output = child.wait_with_output();
        let _ = writer.join();
        output
    })
    .map_err(|e| Error::process(format!("Failed to wait for {}: {}", program, e)).with_source(e))?;

    Ok(CommandResult::from_output(output))
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    which::which(program).is_ok()
}
