//! Pipeline execution engine.
//!
//! Runs stages strictly sequentially and consults the error classifier at
//! every phase boundary, never mid-phase. Fatal classification aborts the
//! remaining stages but preserves all phase results collected so far;
//! advisory classification is recorded and the run continues.

use std::time::Instant;
use tracing::{info, warn};

use super::stages::{
    BuildStage, ConvertStage, HealthStage, HousekeepingStage, OrganizeStage, ProxyStage,
    SuperviseStage, ValidateStage,
};
use super::types::{PipelineContext, PipelineStage};
use crate::error::classify;
use crate::report::RunReport;
use crate::types::{ErrorRecord, Severity};

pub struct Pipeline {
    stages: Vec<Box<dyn PipelineStage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn add_stage(mut self, stage: Box<dyn PipelineStage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Validate, convert, build, organize. No deployment side effects.
    pub fn build_only() -> Self {
        Self::new()
            .add_stage(Box::new(ValidateStage::for_build()))
            .add_stage(Box::new(ConvertStage))
            .add_stage(Box::new(BuildStage))
            .add_stage(Box::new(OrganizeStage))
    }

    /// The full deploy pipeline: the build set plus proxy configuration,
    /// supervisor restart, health probes, and housekeeping.
    pub fn build_and_deploy() -> Self {
        Self::new()
            .add_stage(Box::new(ValidateStage::for_deploy()))
            .add_stage(Box::new(ConvertStage))
            .add_stage(Box::new(BuildStage))
            .add_stage(Box::new(OrganizeStage))
            .add_stage(Box::new(ProxyStage))
            .add_stage(Box::new(SuperviseStage))
            .add_stage(Box::new(HealthStage))
            .add_stage(Box::new(HousekeepingStage))
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Run the complete pipeline, always returning a finalized report.
    pub async fn run(&self, ctx: &mut PipelineContext) -> RunReport {
        let start = Instant::now();
        let mut report = RunReport::new();

        info!("Starting pipeline with {} stages", self.stages.len());

        for (idx, stage) in self.stages.iter().enumerate() {
            info!(
                "Running stage {}/{}: {}",
                idx + 1,
                self.stages.len(),
                stage.name()
            );

            match stage.execute(ctx).await {
                Ok(outcome) => {
                    let failed = outcome.first_failure().cloned();
                    report.phases.extend(outcome.phases);
                    for advisory in outcome.advisories {
                        warn!("{}: {}", stage.name(), advisory);
                        report.errors.push(ErrorRecord {
                            phase: stage.phase(),
                            message: advisory,
                            severity: Severity::Advisory,
                        });
                    }

                    if let Some(failure) = failed {
                        let message = failure
                            .error
                            .clone()
                            .unwrap_or_else(|| format!("{} failed", failure.phase));
                        if stage.best_effort() {
                            report.errors.push(ErrorRecord {
                                phase: failure.phase,
                                message,
                                severity: Severity::Advisory,
                            });
                        } else {
                            report.errors.push(ErrorRecord {
                                phase: failure.phase,
                                message,
                                severity: Severity::Fatal,
                            });
                            report.aborted_at = Some(failure.phase);
                            break;
                        }
                    }
                }
                Err(err) => {
                    let record = classify(&err, stage.phase(), stage.best_effort());
                    let fatal = record.severity == Severity::Fatal;
                    report.errors.push(record);
                    if fatal {
                        report.aborted_at = Some(stage.phase());
                        break;
                    }
                }
            }
        }

        report.health = std::mem::take(&mut ctx.health);
        report.total_duration_ms = start.elapsed().as_millis() as u64;
        report.success = report.aborted_at.is_none() && report.fatal_error().is_none();

        info!("{}", report.verdict());
        report
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
