//! Best-effort post-deploy housekeeping.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::pipeline::types::{PipelineContext, PipelineStage, StageOutcome};
use crate::supervisor::SupervisorAdapter;
use crate::types::{Phase, PhaseResult};

/// Flushes accumulated supervisor logs after a deploy. Failures never
/// abort the run.
pub struct HousekeepingStage;

#[async_trait::async_trait]
impl PipelineStage for HousekeepingStage {
    fn name(&self) -> &str {
        "Housekeeping"
    }

    fn phase(&self) -> Phase {
        Phase::Housekeeping
    }

    fn best_effort(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StageOutcome> {
        let start = Instant::now();

        let adapter = SupervisorAdapter::new(
            ctx.executor.as_ref(),
            &ctx.config.supervisor,
            Duration::from_secs(ctx.config.timeouts.supervisor_secs),
        );

        let result = match adapter.flush_logs(&ctx.root).await {
            Ok(()) => PhaseResult::succeeded(
                self.phase(),
                start.elapsed().as_millis() as u64,
                Some("supervisor logs flushed".to_string()),
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
