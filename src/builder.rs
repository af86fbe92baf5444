//! Two-target build runner.
//!
//! Runs the backend and frontend build commands in that order, each under
//! its own timeout. If the backend build fails the frontend command is
//! never started and the pair is reported failed.

use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::RunConfig;
use crate::exec::{CommandExecutor, CommandSpec};
use crate::types::{Phase, PhaseResult};

/// Outcome of the build pair: one result per target, in execution order.
/// A skipped frontend build produces no result at all.
#[derive(Debug)]
pub struct BuildPair {
    pub results: Vec<PhaseResult>,
}

impl BuildPair {
    pub fn succeeded(&self) -> bool {
        self.results.len() == 2 && self.results.iter().all(|r| r.success)
    }
}

pub struct BuildRunner<'a> {
    executor: &'a dyn CommandExecutor,
    timeout: Duration,
}

impl<'a> BuildRunner<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, timeout: Duration) -> Self {
        Self { executor, timeout }
    }

    /// Run the backend then the frontend build command, fail-fast.
    pub async fn run_pair(&self, config: &RunConfig, root: &Path) -> BuildPair {
        let mut results = Vec::with_capacity(2);

        let backend = self
            .run_target(Phase::BackendBuild, &config.build.backend_command, root)
            .await;
        let backend_ok = backend.success;
        results.push(backend);

        if !backend_ok {
            info!("Backend build failed, skipping frontend build");
            return BuildPair { results };
        }

        let frontend = self
            .run_target(Phase::FrontendBuild, &config.build.frontend_command, root)
            .await;
        results.push(frontend);

        BuildPair { results }
    }

    async fn run_target(&self, phase: Phase, command: &[String], root: &Path) -> PhaseResult {
        if command.is_empty() {
            return PhaseResult::failed(phase, 0, "build command is empty".to_string());
        }

        let args: Vec<&str> = command[1..].iter().map(String::as_str).collect();
        let spec = CommandSpec::new(command[0].clone(), &args)
            .with_cwd(root)
            .with_timeout(self.timeout);

        info!("Running {} command: {}", phase, spec.display());
        match self.executor.run(&spec).await {
            Ok(output) => {
                let duration_ms = output.duration.as_millis() as u64;
                if output.success() {
                    PhaseResult::succeeded(phase, duration_ms, Some(output.stdout))
                } else {
                    let err = output.into_error(&spec);
                    PhaseResult::failed(phase, duration_ms, err.to_string())
                }
            }
            Err(err) => PhaseResult::failed(phase, 0, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ScriptedExecutor;

    fn config() -> RunConfig {
        RunConfig::default()
    }

    #[tokio::test]
    async fn test_both_builds_succeed() {
        let executor = ScriptedExecutor::succeeding();
        let runner = BuildRunner::new(&executor, Duration::from_secs(60));

        let pair = runner.run_pair(&config(), Path::new(".")).await;

        assert!(pair.succeeded());
        assert_eq!(pair.results.len(), 2);
        assert_eq!(pair.results[0].phase, Phase::BackendBuild);
        assert_eq!(pair.results[1].phase, Phase::FrontendBuild);
        assert_eq!(executor.call_count(), 2);
    }

    #[tokio::test]
    async fn test_backend_failure_skips_frontend() {
        let executor = ScriptedExecutor::succeeding();
        executor.push_exit(1, "tsc: error TS2304");
        let runner = BuildRunner::new(&executor, Duration::from_secs(60));

        let pair = runner.run_pair(&config(), Path::new(".")).await;

        assert!(!pair.succeeded());
        assert_eq!(pair.results.len(), 1);
        assert!(!pair.results[0].success);
        assert!(pair.results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("TS2304"));
        // Frontend command never invoked
        assert_eq!(executor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_frontend_failure_reported() {
        let executor = ScriptedExecutor::succeeding();
        executor.push_exit(0, "");
        executor.push_exit(2, "vite build failed");
        let runner = BuildRunner::new(&executor, Duration::from_secs(60));

        let pair = runner.run_pair(&config(), Path::new(".")).await;

        assert!(!pair.succeeded());
        assert_eq!(pair.results.len(), 2);
        assert!(pair.results[0].success);
        assert!(!pair.results[1].success);
    }

    #[tokio::test]
    async fn test_commands_run_in_workspace_root() {
        let executor = ScriptedExecutor::succeeding();
        let runner = BuildRunner::new(&executor, Duration::from_secs(60));

        runner.run_pair(&config(), Path::new("/tmp/workspace")).await;

        let calls = executor.calls();
        assert_eq!(calls[0].cwd.as_deref(), Some(Path::new("/tmp/workspace")));
        assert_eq!(calls[0].program, "npm");
        assert_eq!(calls[0].args, vec!["run", "build:server"]);
        assert_eq!(calls[1].args, vec!["run", "build:client"]);
    }

    #[tokio::test]
    async fn test_timeout_reported_as_failure() {
        let executor = ScriptedExecutor::succeeding();
        executor.push_response(crate::exec::CommandOutput {
            status: None,
            stdout: String::new(),
            stderr: String::new(),
            timed_out: true,
            duration: Duration::from_secs(600),
        });
        let runner = BuildRunner::new(&executor, Duration::from_secs(600));

        let pair = runner.run_pair(&config(), Path::new(".")).await;

        assert!(!pair.results[0].success);
        assert!(pair.results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("timed out"));
        assert_eq!(executor.call_count(), 1);
    }
}
