//! Source conversion stage.

use anyhow::Result;
use std::time::Instant;
use tracing::info;

use crate::convert::ModuleConverter;
use crate::error::PipelineError;
use crate::pipeline::types::{PipelineContext, PipelineStage, StageOutcome};
use crate::types::{Phase, PhaseResult};

/// Converts the configured source directory in place.
pub struct ConvertStage;

#[async_trait::async_trait]
impl PipelineStage for ConvertStage {
    fn name(&self) -> &str {
        "Convert"
    }

    fn phase(&self) -> Phase {
        Phase::SourceConversion
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StageOutcome> {
        let start = Instant::now();
        let dir = ctx.root.join(&ctx.config.build.convert_dir);

        if !dir.exists() {
            return Ok(StageOutcome::single(PhaseResult::failed(
                self.phase(),
                0,
                format!("conversion directory missing: {}", dir.display()),
            )));
        }

        let converter = ModuleConverter::default();
        let batch = converter.convert_dir(&dir)?;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Converted {} of {} files ({} failed)",
            batch.converted(),
            batch.reports.len(),
            batch.failed()
        );

        let result = if batch.all_passed() {
            PhaseResult::succeeded(
                self.phase(),
                duration_ms,
                Some(format!(
                    "{} of {} files converted",
                    batch.converted(),
                    batch.reports.len()
                )),
            )
        } else {
            let detail: Vec<String> = batch
                .failures()
                .map(|r| {
                    PipelineError::Transformation {
                        file: r.file.clone(),
                        violations: r.violations.clone(),
                    }
                    .to_string()
                })
                .collect();
            PhaseResult::failed(self.phase(), duration_ms, detail.join("\n"))
        };

        Ok(StageOutcome::single(result))
    }
}
