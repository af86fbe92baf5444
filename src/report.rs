//! Run report generation.
//!
//! The top-level aggregate of a pipeline run: ordered phase results, the
//! classified errors, and the overall verdict. Rendered as colored text
//! for the terminal or as JSON for machine consumption. Never persisted
//! by this crate.

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::types::{ErrorRecord, HealthCheckResult, Phase, PhaseResult, Severity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub phases: Vec<PhaseResult>,
    pub errors: Vec<ErrorRecord>,
    pub health: Vec<HealthCheckResult>,
    /// Set when a fatal error stopped the run before all phases executed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aborted_at: Option<Phase>,
    pub total_duration_ms: u64,
    pub success: bool,
}

impl RunReport {
    pub fn new() -> Self {
        let started_at = Utc::now();
        Self {
            run_id: format!("run-{}", started_at.format("%Y%m%d-%H%M%S")),
            started_at,
            phases: Vec::new(),
            errors: Vec::new(),
            health: Vec::new(),
            aborted_at: None,
            total_duration_ms: 0,
            success: false,
        }
    }

    pub fn advisory_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.severity == Severity::Advisory)
            .count()
    }

    pub fn fatal_error(&self) -> Option<&ErrorRecord> {
        self.errors.iter().find(|e| e.severity == Severity::Fatal)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// One-line verdict: aborted-at-phase vs completed-with-warnings.
    pub fn verdict(&self) -> String {
        match self.aborted_at {
            Some(phase) => {
                let reason = self
                    .fatal_error()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "unknown error".to_string());
                format!("pipeline aborted at {phase}: {reason}")
            }
            None => match self.advisory_count() {
                0 => "pipeline completed".to_string(),
                n => format!("pipeline completed with {n} advisory warnings"),
            },
        }
    }

    /// Render the colored terminal summary.
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!(
            "{} {} ({})\n\n",
            "Run".bold(),
            self.run_id,
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        for result in &self.phases {
            let marker = if result.success {
                "✓".green()
            } else {
                "✗".red()
            };
            out.push_str(&format!(
                "  {} {} ({} ms)\n",
                marker, result.phase, result.duration_ms
            ));
            if let Some(error) = &result.error {
                out.push_str(&format!("      {}\n", error.red()));
            }
        }

        if !self.health.is_empty() {
            out.push('\n');
            out.push_str(&format!("{}\n", "Health".bold()));
            for probe in &self.health {
                let marker = if probe.healthy {
                    "✓".green()
                } else {
                    "✗".yellow()
                };
                out.push_str(&format!("  {} {} ({})", marker, probe.name, probe.url));
                if let Some(detail) = &probe.detail {
                    out.push_str(&format!(" {}", detail.dimmed()));
                }
                out.push('\n');
            }
        }

        let advisories: Vec<&ErrorRecord> = self
            .errors
            .iter()
            .filter(|e| e.severity == Severity::Advisory)
            .collect();
        if !advisories.is_empty() {
            out.push('\n');
            out.push_str(&format!("{}\n", "Warnings".yellow().bold()));
            for record in advisories {
                out.push_str(&format!("  {} {}\n", record.phase, record.message.yellow()));
            }
        }

        out.push('\n');
        let verdict = self.verdict();
        if self.success {
            out.push_str(&format!("{}", verdict.green().bold()));
        } else {
            out.push_str(&format!("{}", verdict.red().bold()));
        }
        out.push_str(&format!(" in {} ms\n", self.total_duration_ms));

        out
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}
