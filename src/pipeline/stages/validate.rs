//! Workspace validation stage.

use anyhow::Result;
use std::time::Instant;

use crate::pipeline::types::{PipelineContext, PipelineStage, StageOutcome};
use crate::types::{Phase, PhaseResult};
use crate::workspace::{build_required_paths, deploy_required_paths, WorkspaceValidator};

/// Read-only prerequisite checks. Runs before any mutation; the required
/// path set depends on which pipeline is running.
pub struct ValidateStage {
    deploy: bool,
}

impl ValidateStage {
    pub fn for_build() -> Self {
        Self { deploy: false }
    }

    pub fn for_deploy() -> Self {
        Self { deploy: true }
    }
}

#[async_trait::async_trait]
impl PipelineStage for ValidateStage {
    fn name(&self) -> &str {
        "Validate"
    }

    fn phase(&self) -> Phase {
        Phase::WorkspaceValidation
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StageOutcome> {
        let start = Instant::now();

        let required = if self.deploy {
            deploy_required_paths(&ctx.config)
        } else {
            build_required_paths(&ctx.config)
        };

        let validator = WorkspaceValidator::new(ctx.config.workspace.min_free_bytes);
        let check = validator.check(&ctx.root, &required);
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = if check.is_ok() {
            PhaseResult::succeeded(
                self.phase(),
                duration_ms,
                Some(format!("{} paths checked", check.checked)),
            )
        } else {
            PhaseResult::failed(self.phase(), duration_ms, check.violations.join("; "))
        };

        Ok(StageOutcome::single(result))
    }
}
