//! Process supervision stage.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::pipeline::types::{PipelineContext, PipelineStage, StageOutcome};
use crate::supervisor::SupervisorAdapter;
use crate::types::{Phase, PhaseResult};

pub struct SuperviseStage;

#[async_trait::async_trait]
impl PipelineStage for SuperviseStage {
    fn name(&self) -> &str {
        "Supervise"
    }

    fn phase(&self) -> Phase {
        Phase::ProcessSupervision
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StageOutcome> {
        let start = Instant::now();

        let adapter = SupervisorAdapter::new(
            ctx.executor.as_ref(),
            &ctx.config.supervisor,
            Duration::from_secs(ctx.config.timeouts.supervisor_secs),
        );

        let result = match adapter.restart_or_start(&ctx.root).await {
            Ok(()) => PhaseResult::succeeded(
                self.phase(),
                start.elapsed().as_millis() as u64,
                Some(format!("{} running", ctx.config.supervisor.app_name)),
            ),
            Err(err) => PhaseResult::failed(
                self.phase(),
                start.elapsed().as_millis() as u64,
                err.to_string(),
            ),
        };

        Ok(StageOutcome::single(result))
    }
}
