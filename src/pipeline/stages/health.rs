//! Health probe stage.
//!
//! Probe failures are surfaced as advisories, never as a fatal result: an
//! already-applied deployment is not rolled back because an endpoint is
//! still warming up.

use anyhow::Result;
use std::time::{Duration, Instant};

use crate::health::{default_endpoints, HealthProber};
use crate::pipeline::types::{PipelineContext, PipelineStage, StageOutcome};
use crate::types::{Phase, PhaseResult};

pub struct HealthStage;

#[async_trait::async_trait]
impl PipelineStage for HealthStage {
    fn name(&self) -> &str {
        "Health"
    }

    fn phase(&self) -> Phase {
        Phase::HealthCheck
    }

    fn best_effort(&self) -> bool {
        true
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StageOutcome> {
        let start = Instant::now();

        let endpoints = default_endpoints(&ctx.config);
        let prober = HealthProber::new(Duration::from_secs(ctx.config.timeouts.probe_secs));
        let results = prober.probe_all(&endpoints).await;

        let healthy = results.iter().filter(|r| r.healthy).count();
        let advisories: Vec<String> = results
            .iter()
            .filter(|r| !r.healthy)
            .map(|r| {
                format!(
                    "unhealthy endpoint {} ({}): {}",
                    r.name,
                    r.url,
                    r.detail.as_deref().unwrap_or("no detail")
                )
            })
            .collect();

        let summary = format!("{}/{} endpoints healthy", healthy, results.len());
        ctx.health = results;

        let result = PhaseResult::succeeded(
            self.phase(),
            start.elapsed().as_millis() as u64,
            Some(summary),
        );
        Ok(StageOutcome::single(result).with_advisories(advisories))
    }
}
