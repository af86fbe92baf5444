use serde::{Deserialize, Serialize};

/// One discrete, independently-reportable step of the orchestration pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    WorkspaceValidation,
    SourceConversion,
    BackendBuild,
    FrontendBuild,
    OutputOrganization,
    ProxyConfiguration,
    ProcessSupervision,
    HealthCheck,
    Housekeeping,
}

impl Phase {
    pub fn all() -> Vec<Phase> {
        vec![
            Phase::WorkspaceValidation,
            Phase::SourceConversion,
            Phase::BackendBuild,
            Phase::FrontendBuild,
            Phase::OutputOrganization,
            Phase::ProxyConfiguration,
            Phase::ProcessSupervision,
            Phase::HealthCheck,
            Phase::Housekeeping,
        ]
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::WorkspaceValidation => write!(f, "workspace validation"),
            Phase::SourceConversion => write!(f, "source conversion"),
            Phase::BackendBuild => write!(f, "backend build"),
            Phase::FrontendBuild => write!(f, "frontend build"),
            Phase::OutputOrganization => write!(f, "output organization"),
            Phase::ProxyConfiguration => write!(f, "proxy configuration"),
            Phase::ProcessSupervision => write!(f, "process supervision"),
            Phase::HealthCheck => write!(f, "health check"),
            Phase::Housekeeping => write!(f, "housekeeping"),
        }
    }
}

/// Coarse error severity decided at phase boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// Aborts the remaining pipeline phases
    Fatal,
    /// Logged as a warning, pipeline continues
    Advisory,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Fatal => write!(f, "fatal"),
            Severity::Advisory => write!(f, "advisory"),
        }
    }
}

/// A classified failure attached to the run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub phase: Phase,
    pub message: String,
    pub severity: Severity,
}

/// Result of a single pipeline phase. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseResult {
    pub phase: Phase,
    pub success: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PhaseResult {
    pub fn succeeded(phase: Phase, duration_ms: u64, output: Option<String>) -> Self {
        Self {
            phase,
            success: true,
            duration_ms,
            output,
            error: None,
        }
    }

    pub fn failed(phase: Phase, duration_ms: u64, error: impl Into<String>) -> Self {
        Self {
            phase,
            success: false,
            duration_ms,
            output: None,
            error: Some(error.into()),
        }
    }
}

/// Outcome of probing one HTTP endpoint. A failed probe is data, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub name: String,
    pub url: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(format!("{}", Phase::BackendBuild), "backend build");
        assert_eq!(format!("{}", Phase::ProxyConfiguration), "proxy configuration");
    }

    #[test]
    fn test_phase_all_is_ordered() {
        let all = Phase::all();
        assert_eq!(all.first(), Some(&Phase::WorkspaceValidation));
        assert_eq!(all.last(), Some(&Phase::Housekeeping));
        assert_eq!(all.len(), 9);
    }

    #[test]
    fn test_phase_result_succeeded() {
        let result = PhaseResult::succeeded(Phase::BackendBuild, 1200, Some("ok".to_string()));
        assert!(result.success);
        assert_eq!(result.duration_ms, 1200);
        assert_eq!(result.output.as_deref(), Some("ok"));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_phase_result_failed() {
        let result = PhaseResult::failed(Phase::FrontendBuild, 300, "exit status 1");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("exit status 1"));
        assert!(result.output.is_none());
    }

    #[test]
    fn test_phase_result_serialization() {
        let result = PhaseResult::succeeded(Phase::HealthCheck, 42, None);
        let json = serde_json::to_string(&result).unwrap();
        let back: PhaseResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phase, Phase::HealthCheck);
        assert!(back.success);
        // None fields are skipped entirely
        assert!(!json.contains("output"));
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(format!("{}", Severity::Fatal), "fatal");
        assert_eq!(format!("{}", Severity::Advisory), "advisory");
    }

    #[test]
    fn test_error_record_serialization() {
        let record = ErrorRecord {
            phase: Phase::ProxyConfiguration,
            message: "syntax check failed".to_string(),
            severity: Severity::Fatal,
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: ErrorRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back.phase, Phase::ProxyConfiguration);
        assert_eq!(back.severity, Severity::Fatal);
    }
}
