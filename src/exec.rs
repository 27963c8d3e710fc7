/*
 * This file is part of Pangomon.
 *
 * Copyright (C) 2025 Pangomon contributors
 *
 * Pangomon is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Pangomon is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Pangomon. If not, see <https://www.gnu.org/licenses/>.
 */

//! Child-process plumbing shared by every external helper invocation.
//!
//! All reads and control actions go through a single [`Runner`] seam so the
//! callers stay testable, and every invocation runs under a watchdog
//! timeout: the Clevo EC helper is known to stall on embedded-controller
//! access, and a stalled helper must never hang the UI thread.

use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Poll granularity while waiting for a child to exit.
const WAIT_SLICE: Duration = Duration::from_millis(25);

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("{0}: not found")]
    Missing(String),
    #[error("{0}: permission denied")]
    PermissionDenied(String),
    #[error("{program}: no exit within {timeout_ms} ms, killed")]
    TimedOut { program: String, timeout_ms: u64 },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Captured result of a finished child process.
#[derive(Debug, Clone, Default)]
pub struct CmdOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// stdout followed by stderr; EC diagnostics land on either stream
    /// depending on the helper build, so readers filter the merged text.
    pub fn merged(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait Runner {
    fn run(&self, program: &str, args: &[String]) -> Result<CmdOutput, ExecError>;
}

/// Production runner: spawns the child, drains its pipes on side threads,
/// and kills it when the deadline passes.
pub struct WatchdogRunner {
    timeout: Duration,
}

impl WatchdogRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Runner for WatchdogRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<CmdOutput, ExecError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ExecError::Missing(program.to_string()),
                io::ErrorKind::PermissionDenied => ExecError::PermissionDenied(program.to_string()),
                _ => ExecError::Io(e),
            })?;

        // Drain both pipes off-thread so a chatty child can't block on a
        // full pipe while we poll try_wait.
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let out_handle = thread::spawn(move || read_pipe(stdout));
        let err_handle = thread::spawn(move || read_pipe(stderr));

        let deadline = Instant::now() + self.timeout;
        let code = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status.code(),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ExecError::TimedOut {
                            program: program.to_string(),
                            timeout_ms: self.timeout.as_millis() as u64,
                        });
                    }
                    thread::sleep(WAIT_SLICE);
                }
                Err(e) => return Err(ExecError::Io(e)),
            }
        };

        let stdout = out_handle.join().unwrap_or_default();
        let stderr = err_handle.join().unwrap_or_default();
        Ok(CmdOutput { code, stdout, stderr })
    }
}

fn read_pipe<R: Read>(src: Option<R>) -> String {
    let mut buf = String::new();
    if let Some(mut r) = src {
        let _ = r.read_to_string(&mut buf);
    }
    buf
}

pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Invocation for a privileged read helper: direct when already root,
/// through sudo otherwise (the helpers are expected to be in sudoers
/// with NOPASSWD for the monitoring user).
pub fn elevated_read(helper: &str) -> (String, Vec<String>) {
    if is_root() {
        (helper.to_string(), Vec::new())
    } else {
        ("sudo".to_string(), vec![helper.to_string()])
    }
}

/// Invocation for a control action: always through the polkit prompt.
pub fn elevated_write(program: &str, args: &[String]) -> (String, Vec<String>) {
    let mut v = Vec::with_capacity(args.len() + 1);
    v.push(program.to_string());
    v.extend(args.iter().cloned());
    ("pkexec".to_string(), v)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(ms: u64) -> WatchdogRunner {
        WatchdogRunner::new(Duration::from_millis(ms))
    }

    #[test]
    fn test_run_captures_stdout() {
        let out = runner(2000)
            .run("sh", &["-c".to_string(), "echo hello".to_string()])
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn test_run_captures_stderr_and_code() {
        let out = runner(2000)
            .run("sh", &["-c".to_string(), "echo oops >&2; exit 3".to_string()])
            .unwrap();
        assert!(!out.success());
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn test_merged_output_order() {
        let out = CmdOutput {
            code: Some(0),
            stdout: "a".to_string(),
            stderr: "b".to_string(),
        };
        assert_eq!(out.merged(), "a\nb");
        let only_err = CmdOutput {
            code: Some(0),
            stdout: String::new(),
            stderr: "b".to_string(),
        };
        assert_eq!(only_err.merged(), "b");
    }

    #[test]
    fn test_missing_binary_maps_to_missing() {
        let err = runner(2000)
            .run("/nonexistent/pangomon-helper", &[])
            .unwrap_err();
        assert!(matches!(err, ExecError::Missing(_)));
    }

    #[test]
    fn test_watchdog_kills_stalled_child() {
        let start = Instant::now();
        let err = runner(150)
            .run("sh", &["-c".to_string(), "sleep 30".to_string()])
            .unwrap_err();
        assert!(matches!(err, ExecError::TimedOut { .. }));
        // The child must not have been waited on for anywhere near 30s.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_elevated_write_goes_through_pkexec() {
        let (prog, args) = elevated_write("systemctl", &["start".to_string(), "x".to_string()]);
        assert_eq!(prog, "pkexec");
        assert_eq!(args, vec!["systemctl", "start", "x"]);
    }
}
