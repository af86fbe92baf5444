//! Typed failure taxonomy for the orchestration pipeline.
//!
//! Every failure that crosses a phase boundary is wrapped in a
//! [`PipelineError`] so the orchestrator can decide abort-vs-continue
//! without inspecting error strings.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{ErrorRecord, Phase, Severity};

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing prerequisite paths or insufficient disk space. Reported
    /// before any mutation occurs; lists every violation, not just the first.
    #[error("workspace validation failed: {}", violations.join("; "))]
    Validation { violations: Vec<String> },

    /// A source file still matches a dialect indicator after rewrite, or
    /// its output is implausibly small.
    #[error("conversion of {} failed: {}", file.display(), violations.join("; "))]
    Transformation {
        file: PathBuf,
        violations: Vec<String>,
    },

    /// Non-zero exit or timeout from a shelled-out tool.
    #[error("command `{command}` failed{}: {stderr}", if *timed_out { " (timed out)" } else { "" })]
    ExternalCommand {
        command: String,
        status: Option<i32>,
        stderr: String,
        timed_out: bool,
    },

    /// Reverse-proxy syntax check failed after the file was written. The
    /// broken file is left in place for inspection, never auto-restored.
    #[error("proxy config validation failed for {}: {detail}", path.display())]
    ConfigValidation { path: PathBuf, detail: String },

    /// Restore was asked for a backup that does not exist.
    #[error("backup not found: {}", path.display())]
    BackupMissing { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Intrinsic severity, before the orchestrator applies the best-effort
    /// override for advisory step kinds.
    pub fn severity(&self) -> Severity {
        // Every variant is fatal on its own; advisory classification only
        // comes from the step kind that raised it.
        Severity::Fatal
    }

    /// Wrap into a run-report record for the given phase.
    pub fn classify(&self, phase: Phase, best_effort: bool) -> ErrorRecord {
        let severity = if best_effort {
            Severity::Advisory
        } else {
            self.severity()
        };
        ErrorRecord {
            phase,
            message: self.to_string(),
            severity,
        }
    }
}

/// Classify an arbitrary error at a phase boundary.
pub fn classify(err: &anyhow::Error, phase: Phase, best_effort: bool) -> ErrorRecord {
    if let Some(pipeline_err) = err.downcast_ref::<PipelineError>() {
        return pipeline_err.classify(phase, best_effort);
    }
    ErrorRecord {
        phase,
        message: format!("{err:#}"),
        severity: if best_effort {
            Severity::Advisory
        } else {
            Severity::Fatal
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_all_violations() {
        let err = PipelineError::Validation {
            violations: vec!["missing package.json".to_string(), "low disk".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("missing package.json"));
        assert!(msg.contains("low disk"));
    }

    #[test]
    fn test_transformation_error_names_file_and_violations() {
        let err = PipelineError::Transformation {
            file: PathBuf::from("server/widget.js"),
            violations: vec!["residual indicator: import.meta".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("conversion of server/widget.js failed"));
        assert!(msg.contains("residual indicator"));
    }

    #[test]
    fn test_external_command_timeout_message() {
        let err = PipelineError::ExternalCommand {
            command: "npm run build".to_string(),
            status: None,
            stderr: String::new(),
            timed_out: true,
        };
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_classify_fatal_by_default() {
        let err = PipelineError::ConfigValidation {
            path: PathBuf::from("/etc/nginx/nginx.conf"),
            detail: "unexpected token".to_string(),
        };
        let record = err.classify(Phase::ProxyConfiguration, false);
        assert_eq!(record.severity, Severity::Fatal);
        assert_eq!(record.phase, Phase::ProxyConfiguration);
    }

    #[test]
    fn test_classify_best_effort_is_advisory() {
        let err = PipelineError::ExternalCommand {
            command: "pm2 flush".to_string(),
            status: Some(1),
            stderr: "no logs".to_string(),
            timed_out: false,
        };
        let record = err.classify(Phase::Housekeeping, true);
        assert_eq!(record.severity, Severity::Advisory);
    }

    #[test]
    fn test_classify_anyhow_passthrough() {
        let err = anyhow::anyhow!("something unexpected");
        let record = classify(&err, Phase::BackendBuild, false);
        assert_eq!(record.severity, Severity::Fatal);
        assert!(record.message.contains("something unexpected"));
    }

    #[test]
    fn test_backup_missing_is_distinct() {
        let err = PipelineError::BackupMissing {
            path: PathBuf::from("/var/backups/nginx.conf.bak"),
        };
        assert!(err.to_string().starts_with("backup not found"));
    }
}
