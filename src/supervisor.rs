//! Process supervisor adapter.
//!
//! Thin command adapter over the external supervisor CLI. Each operation is
//! independently fallible; the deploy pipeline treats "restart failed, start
//! succeeded" as success because the supervisor's own idempotence rules are
//! opaque to this layer.

use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::SupervisorConfig;
use crate::error::PipelineError;
use crate::exec::{CommandExecutor, CommandOutput, CommandSpec};

pub struct SupervisorAdapter<'a> {
    executor: &'a dyn CommandExecutor,
    binary: String,
    manifest: String,
    app_name: String,
    timeout: Duration,
}

impl<'a> SupervisorAdapter<'a> {
    pub fn new(
        executor: &'a dyn CommandExecutor,
        config: &SupervisorConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            executor,
            binary: config.binary.clone(),
            manifest: config.manifest.to_string_lossy().into_owned(),
            app_name: config.app_name.clone(),
            timeout,
        }
    }

    async fn invoke(&self, args: &[&str], root: &Path) -> Result<CommandOutput, PipelineError> {
        let spec = CommandSpec::new(self.binary.clone(), args)
            .with_cwd(root)
            .with_timeout(self.timeout);
        self.executor.run(&spec).await
    }

    async fn invoke_checked(&self, args: &[&str], root: &Path) -> Result<(), PipelineError> {
        let spec = CommandSpec::new(self.binary.clone(), args)
            .with_cwd(root)
            .with_timeout(self.timeout);
        let output = self.executor.run(&spec).await?;
        if output.success() {
            Ok(())
        } else {
            Err(output.into_error(&spec))
        }
    }

    /// Start the application from the manifest.
    pub async fn start(&self, root: &Path) -> Result<(), PipelineError> {
        info!("Starting {} via {}", self.app_name, self.binary);
        self.invoke_checked(&["start", &self.manifest], root).await
    }

    /// Stop the named application.
    pub async fn stop(&self, root: &Path) -> Result<(), PipelineError> {
        self.invoke_checked(&["stop", &self.app_name], root).await
    }

    /// Restart, falling back to start when restart fails (the app may not
    /// be registered yet). Succeeds if either invocation succeeds.
    pub async fn restart_or_start(&self, root: &Path) -> Result<(), PipelineError> {
        match self.invoke_checked(&["restart", &self.app_name], root).await {
            Ok(()) => Ok(()),
            Err(restart_err) => {
                warn!(
                    "Restart of {} failed ({}), trying start",
                    self.app_name, restart_err
                );
                self.start(root).await
            }
        }
    }

    /// Raw status listing, for display.
    pub async fn status(&self, root: &Path) -> Result<String, PipelineError> {
        let output = self.invoke(&["status", &self.app_name], root).await?;
        if output.success() {
            Ok(output.stdout)
        } else {
            let spec = CommandSpec::new(self.binary.clone(), &["status", &self.app_name]);
            Err(output.into_error(&spec))
        }
    }

    /// Flush the supervisor's accumulated logs. Best-effort housekeeping.
    pub async fn flush_logs(&self, root: &Path) -> Result<(), PipelineError> {
        self.invoke_checked(&["flush"], root).await
    }
}
