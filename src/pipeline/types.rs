//! Pipeline types and trait definitions.

use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::RunConfig;
use crate::exec::CommandExecutor;
use crate::types::{HealthCheckResult, Phase, PhaseResult};

/// Context threaded through the orchestrator. Explicit rather than global
/// so repeated runs in tests don't leak state.
pub struct PipelineContext {
    /// Immutable run configuration
    pub config: RunConfig,

    /// Resolved workspace root
    pub root: PathBuf,

    /// Command execution boundary, injectable for tests
    pub executor: Arc<dyn CommandExecutor>,

    /// Health probe results accumulated during the run
    pub health: Vec<HealthCheckResult>,

    /// Metadata accumulated during the run
    pub metadata: HashMap<String, serde_json::Value>,
}

impl PipelineContext {
    pub fn new(config: RunConfig, root: PathBuf, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            config,
            root,
            executor,
            health: Vec::new(),
            metadata: HashMap::new(),
        }
    }
}

/// What one stage produced: one or more phase results, plus advisory
/// warnings that should reach the run report without failing it.
#[derive(Debug, Default)]
pub struct StageOutcome {
    pub phases: Vec<PhaseResult>,
    pub advisories: Vec<String>,
}

impl StageOutcome {
    pub fn single(result: PhaseResult) -> Self {
        Self {
            phases: vec![result],
            advisories: Vec::new(),
        }
    }

    pub fn with_advisories(mut self, advisories: Vec<String>) -> Self {
        self.advisories = advisories;
        self
    }

    /// True when every produced phase result succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.phases.iter().all(|p| p.success)
    }

    /// First failed phase, if any.
    pub fn first_failure(&self) -> Option<&PhaseResult> {
        self.phases.iter().find(|p| !p.success)
    }
}

/// Trait for pipeline stages.
#[async_trait::async_trait]
pub trait PipelineStage: Send + Sync {
    /// Name of this stage
    fn name(&self) -> &str;

    /// Phase used when classifying an error raised by this stage
    fn phase(&self) -> Phase;

    /// Best-effort stages never abort the run; their failures are
    /// downgraded to advisories at the phase boundary.
    fn best_effort(&self) -> bool {
        false
    }

    /// Execute this stage
    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StageOutcome>;
}
