//! Output organization stage.

use anyhow::Result;
use std::time::Instant;

use crate::organize::OutputOrganizer;
use crate::pipeline::types::{PipelineContext, PipelineStage, StageOutcome};
use crate::types::{Phase, PhaseResult};

pub struct OrganizeStage;

#[async_trait::async_trait]
impl PipelineStage for OrganizeStage {
    fn name(&self) -> &str {
        "Organize"
    }

    fn phase(&self) -> Phase {
        Phase::OutputOrganization
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StageOutcome> {
        let start = Instant::now();

        let organizer = OutputOrganizer::new(&ctx.config, &ctx.root);
        let summary = organizer.organize(&ctx.config)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = PhaseResult::succeeded(
            self.phase(),
            duration_ms,
            Some(format!("{} entries organized", summary.moved)),
        );

        Ok(StageOutcome::single(result).with_advisories(summary.warnings))
    }
}
