//! Reverse-proxy config lifecycle.
//!
//! State machine: NoConfig → Generated → Validated → Applied, with a
//! parallel backed-up flag set whenever an existing file is overwritten.
//! Validation shells out to the proxy binary's syntax-check mode and is
//! treated as authoritative. Apply never auto-restores on validation
//! failure; the broken file is left in place and restore is a separate,
//! explicit operation.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use super::render::ReverseProxyConfig;
use crate::config::ProxyConfig;
use crate::error::PipelineError;
use crate::exec::{CommandExecutor, CommandSpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigState {
    NoConfig,
    Generated,
    Validated,
    Applied,
}

pub struct ProxyConfigManager<'a> {
    executor: &'a dyn CommandExecutor,
    binary: String,
    config_path: PathBuf,
    backup_dir: PathBuf,
    check_timeout: Duration,
    state: ConfigState,
    backed_up: bool,
    rendered: Option<String>,
}

impl<'a> ProxyConfigManager<'a> {
    pub fn new(
        executor: &'a dyn CommandExecutor,
        proxy: &ProxyConfig,
        check_timeout: Duration,
    ) -> Self {
        Self {
            executor,
            binary: proxy.binary.clone(),
            config_path: proxy.config_path.clone(),
            backup_dir: proxy.backup_dir.clone(),
            check_timeout,
            state: ConfigState::NoConfig,
            backed_up: false,
            rendered: None,
        }
    }

    pub fn state(&self) -> ConfigState {
        self.state
    }

    pub fn backed_up(&self) -> bool {
        self.backed_up
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Render the config text and hold it for apply.
    pub fn generate(&mut self, config: &ReverseProxyConfig) -> &str {
        let text = config.render();
        self.rendered = Some(text);
        self.state = ConfigState::Generated;
        self.rendered.as_deref().unwrap_or_default()
    }

    /// Copy the current live config to a timestamped backup path. No-op
    /// when no live file exists yet.
    pub fn backup(&mut self) -> Result<Option<PathBuf>, PipelineError> {
        if !self.config_path.exists() {
            return Ok(None);
        }

        std::fs::create_dir_all(&self.backup_dir)?;
        let stamp = Utc::now().format("%Y%m%d-%H%M%S%.3f");
        let file_name = self
            .config_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "config".to_string());
        let backup_path = self.backup_dir.join(format!("{file_name}.{stamp}.bak"));

        std::fs::copy(&self.config_path, &backup_path)?;
        self.backed_up = true;
        info!("Backed up proxy config to {}", backup_path.display());
        Ok(Some(backup_path))
    }

    /// Syntax-check a config file with the proxy binary. Authoritative: no
    /// config parsing is attempted here.
    pub async fn validate_file(&mut self, path: &Path) -> Result<(), PipelineError> {
        let path_arg = path.to_string_lossy();
        let spec = CommandSpec::new(self.binary.clone(), &["-t", "-c", path_arg.as_ref()])
            .with_timeout(self.check_timeout);

        let output = self.executor.run(&spec).await?;
        if !output.success() {
            let detail = if output.stderr.is_empty() {
                output.stdout
            } else {
                output.stderr
            };
            return Err(PipelineError::ConfigValidation {
                path: path.to_path_buf(),
                detail,
            });
        }

        if self.state == ConfigState::Generated {
            self.state = ConfigState::Validated;
        }
        Ok(())
    }

    /// Backup, write, then validate. On validation failure the broken file
    /// stays in place for inspection; restore is explicit.
    pub async fn apply(&mut self) -> Result<(), PipelineError> {
        let text = self
            .rendered
            .clone()
            .ok_or_else(|| PipelineError::ConfigValidation {
                path: self.config_path.clone(),
                detail: "no generated config to apply".to_string(),
            })?;

        self.backup()?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, &text)?;
        info!("Wrote proxy config to {}", self.config_path.display());

        let path = self.config_path.clone();
        self.validate_file(&path).await.map_err(|err| {
            warn!(
                "Proxy config failed validation after write, leaving {} in place",
                self.config_path.display()
            );
            err
        })?;

        self.state = ConfigState::Applied;
        Ok(())
    }

    /// Restore a backup over the live config path. Fails with a distinct
    /// error when the backup does not exist.
    pub fn restore(&mut self, backup_path: &Path) -> Result<(), PipelineError> {
        if !backup_path.exists() {
            return Err(PipelineError::BackupMissing {
                path: backup_path.to_path_buf(),
            });
        }
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::copy(backup_path, &self.config_path)?;
        info!(
            "Restored proxy config from {}",
            backup_path.display()
        );
        Ok(())
    }

    /// Newest backup under the backup directory, by file name. Timestamped
    /// names sort chronologically.
    pub fn latest_backup(&self) -> Result<Option<PathBuf>, PipelineError> {
        if !self.backup_dir.exists() {
            return Ok(None);
        }
        let mut backups: Vec<PathBuf> = std::fs::read_dir(&self.backup_dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("bak"))
            .collect();
        backups.sort();
        Ok(backups.pop())
    }
}
