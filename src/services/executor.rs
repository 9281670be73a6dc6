use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;

/// One external converter invocation: program, argument vector, and the
/// time budget it must finish within.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    /// Rendering of the invocation for logs.
    pub fn display(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }
}

/// How a single executor step ended. The three failure classes are kept
/// apart because the strategy's fallback decision differs per class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    Success,
    NonZeroExit(Option<i32>),
    TimedOut,
    LaunchError(String),
}

/// Result of running one external tool to completion (or cutting it off).
#[derive(Debug, Clone)]
pub struct ConversionOutcome {
    pub status: OutcomeStatus,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

impl ConversionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Success)
    }

    /// The diagnostic text worth surfacing for a failed step: stderr if
    /// the tool produced any, otherwise the launch failure message.
    pub fn diagnostic(&self) -> &str {
        if !self.stderr.trim().is_empty() {
            &self.stderr
        } else if let OutcomeStatus::LaunchError(msg) = &self.status {
            msg
        } else {
            &self.stderr
        }
    }
}

/// Seam for invoking external converter tools, so strategy and service
/// logic can be exercised against scripted outcomes in tests.
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &ToolCommand) -> ConversionOutcome;
}

/// Production runner: spawns the tool as a child process, captures its
/// output fully, and kills it if the deadline passes. `kill_on_drop`
/// guarantees no orphaned children survive a timeout or an unwinding
/// request task.
pub struct ProcessRunner;

#[async_trait::async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &ToolCommand) -> ConversionOutcome {
        let started = Instant::now();

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("Failed to launch {}: {}", command.program, e);
                return ConversionOutcome {
                    status: OutcomeStatus::LaunchError(e.to_string()),
                    stdout: String::new(),
                    stderr: String::new(),
                    elapsed: started.elapsed(),
                };
            }
        };

        match tokio::time::timeout(command.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let status = if output.status.success() {
                    OutcomeStatus::Success
                } else {
                    OutcomeStatus::NonZeroExit(output.status.code())
                };
                ConversionOutcome {
                    status,
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    elapsed: started.elapsed(),
                }
            }
            Ok(Err(e)) => ConversionOutcome {
                status: OutcomeStatus::LaunchError(e.to_string()),
                stdout: String::new(),
                stderr: String::new(),
                elapsed: started.elapsed(),
            },
            // Dropping the wait future kills the child (kill_on_drop)
            Err(_) => {
                tracing::warn!(
                    "⏱️  {} exceeded its {:?} budget, terminating",
                    command.program,
                    command.timeout
                );
                ConversionOutcome {
                    status: OutcomeStatus::TimedOut,
                    stdout: String::new(),
                    stderr: String::new(),
                    elapsed: started.elapsed(),
                }
            }
        }
    }
}
