//! Command execution boundary.
//!
//! Every external tool the pipeline touches (build commands, the process
//! supervisor, the reverse-proxy syntax check) goes through the
//! [`CommandExecutor`] trait so tests can substitute a scripted double and
//! assert on exactly which commands were invoked.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::PipelineError;

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: None,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Command line rendered for diagnostics.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Captured result of an external command. Output is opaque diagnostic text.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
    pub duration: Duration,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status == Some(0)
    }

    /// Convert a non-success output into the typed command error.
    pub fn into_error(self, spec: &CommandSpec) -> PipelineError {
        PipelineError::ExternalCommand {
            command: spec.display(),
            status: self.status,
            stderr: if self.stderr.is_empty() {
                self.stdout
            } else {
                self.stderr
            },
            timed_out: self.timed_out,
        }
    }
}

#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command to completion, capturing exit status and output.
    /// A timeout kills the child and yields `timed_out = true` rather than
    /// an error; spawn failures are errors.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, PipelineError>;
}

/// Executor backed by real child processes.
pub struct SystemExecutor;

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, PipelineError> {
        debug!("Running command: {}", spec.display());
        let start = Instant::now();

        let mut command = tokio::process::Command::new(&spec.program);
        command.args(&spec.args);
        command.kill_on_drop(true);
        if let Some(cwd) = &spec.cwd {
            command.current_dir(cwd);
        }

        let output = match tokio::time::timeout(spec.timeout, command.output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    "Command `{}` timed out after {:?}",
                    spec.display(),
                    spec.timeout
                );
                return Ok(CommandOutput {
                    status: None,
                    stdout: String::new(),
                    stderr: String::new(),
                    timed_out: true,
                    duration: start.elapsed(),
                });
            }
        };

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            timed_out: false,
            duration: start.elapsed(),
        })
    }
}

/// Scripted executor for tests: returns queued responses in order and logs
/// every invocation so callers can assert on call counts and arguments.
pub struct ScriptedExecutor {
    responses: std::sync::Mutex<std::collections::VecDeque<CommandOutput>>,
    calls: std::sync::Mutex<Vec<CommandSpec>>,
    default_status: i32,
}

impl ScriptedExecutor {
    /// Every call succeeds with empty output unless responses are queued.
    pub fn succeeding() -> Self {
        Self {
            responses: std::sync::Mutex::new(std::collections::VecDeque::new()),
            calls: std::sync::Mutex::new(Vec::new()),
            default_status: 0,
        }
    }

    /// Every call fails with exit status 1 unless responses are queued.
    pub fn failing() -> Self {
        Self {
            default_status: 1,
            ..Self::succeeding()
        }
    }

    pub fn push_response(&self, output: CommandOutput) {
        self.responses
            .lock()
            .expect("scripted executor lock poisoned")
            .push_back(output);
    }

    pub fn push_exit(&self, status: i32, stderr: &str) {
        self.push_response(CommandOutput {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.to_string(),
            timed_out: false,
            duration: Duration::from_millis(1),
        });
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls
            .lock()
            .expect("scripted executor lock poisoned")
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .expect("scripted executor lock poisoned")
            .len()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, PipelineError> {
        self.calls
            .lock()
            .expect("scripted executor lock poisoned")
            .push(spec.clone());

        let queued = self
            .responses
            .lock()
            .expect("scripted executor lock poisoned")
            .pop_front();

        Ok(queued.unwrap_or(CommandOutput {
            status: Some(self.default_status),
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
            duration: Duration::from_millis(1),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_display() {
        let spec = CommandSpec::new("nginx", &["-t", "-c", "/tmp/app.conf"]);
        assert_eq!(spec.display(), "nginx -t -c /tmp/app.conf");

        let bare = CommandSpec::new("pm2", &[]);
        assert_eq!(bare.display(), "pm2");
    }

    #[test]
    fn test_command_output_success() {
        let ok = CommandOutput {
            status: Some(0),
            stdout: String::new(),
            stderr: String::new(),
            timed_out: false,
            duration: Duration::from_millis(5),
        };
        assert!(ok.success());

        let timed_out = CommandOutput {
            timed_out: true,
            ..ok.clone()
        };
        assert!(!timed_out.success());

        let nonzero = CommandOutput {
            status: Some(2),
            ..ok
        };
        assert!(!nonzero.success());
    }

    #[tokio::test]
    async fn test_system_executor_success() {
        let spec = CommandSpec::new("echo", &["hello"]).with_timeout(Duration::from_secs(5));
        let output = SystemExecutor.run(&spec).await.unwrap();
        assert!(output.success());
        assert!(output.stdout.contains("hello"));
    }

    #[tokio::test]
    async fn test_system_executor_spawn_failure() {
        let spec = CommandSpec::new("nonexistent_command_54321", &[]);
        let result = SystemExecutor.run(&spec).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_system_executor_timeout() {
        let spec = CommandSpec::new("sleep", &["5"]).with_timeout(Duration::from_millis(50));
        let output = SystemExecutor.run(&spec).await.unwrap();
        assert!(output.timed_out);
        assert!(!output.success());
        assert!(output.status.is_none());
    }

    #[tokio::test]
    async fn test_scripted_executor_records_calls() {
        let executor = ScriptedExecutor::succeeding();
        let spec = CommandSpec::new("pm2", &["restart", "app"]);
        executor.run(&spec).await.unwrap();
        executor.run(&spec).await.unwrap();

        assert_eq!(executor.call_count(), 2);
        assert_eq!(executor.calls()[0].program, "pm2");
    }

    #[tokio::test]
    async fn test_scripted_executor_queued_responses() {
        let executor = ScriptedExecutor::succeeding();
        executor.push_exit(1, "restart failed");

        let spec = CommandSpec::new("pm2", &["restart", "app"]);
        let first = executor.run(&spec).await.unwrap();
        let second = executor.run(&spec).await.unwrap();

        assert!(!first.success());
        assert_eq!(first.stderr, "restart failed");
        // Queue exhausted, falls back to the default
        assert!(second.success());
    }

    #[test]
    fn test_into_error_prefers_stderr() {
        let spec = CommandSpec::new("npm", &["run", "build"]);
        let output = CommandOutput {
            status: Some(1),
            stdout: "stdout text".to_string(),
            stderr: "stderr text".to_string(),
            timed_out: false,
            duration: Duration::from_millis(1),
        };
        let err = output.into_error(&spec);
        assert!(err.to_string().contains("stderr text"));
    }
}
