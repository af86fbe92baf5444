//! Build stage: backend then frontend, fail-fast.

use anyhow::Result;
use std::time::Duration;
use tracing::info;
use walkdir::WalkDir;

use crate::builder::BuildRunner;
use crate::convert::ModuleConverter;
use crate::pipeline::types::{PipelineContext, PipelineStage, StageOutcome};
use crate::types::Phase;

pub struct BuildStage;

#[async_trait::async_trait]
impl PipelineStage for BuildStage {
    fn name(&self) -> &str {
        "Build"
    }

    fn phase(&self) -> Phase {
        Phase::BackendBuild
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StageOutcome> {
        let output_dir = ctx.root.join(&ctx.config.build.output_dir);

        if ctx.config.flags.cleanup_before_build && output_dir.exists() {
            info!("Removing stale output directory {}", output_dir.display());
            std::fs::remove_dir_all(&output_dir)?;
        }

        let runner = BuildRunner::new(
            ctx.executor.as_ref(),
            Duration::from_secs(ctx.config.timeouts.build_secs),
        );
        let pair = runner.run_pair(&ctx.config, &ctx.root).await;

        let mut advisories = Vec::new();
        if pair.succeeded() && ctx.config.flags.validate_after_build {
            advisories = residual_scan(ctx, &output_dir);
        }

        Ok(StageOutcome {
            phases: pair.results,
            advisories,
        })
    }
}

/// Post-build smoke check: the built backend output must carry no residual
/// dialect indicators. Findings are advisory.
fn residual_scan(ctx: &PipelineContext, output_dir: &std::path::Path) -> Vec<String> {
    let backend_name = match ctx.config.workspace.backend_dir.file_name() {
        Some(name) => name,
        None => return Vec::new(),
    };
    let backend_out = output_dir.join(backend_name);
    if !backend_out.exists() {
        return Vec::new();
    }

    let converter = ModuleConverter::default();
    let mut findings = Vec::new();
    for entry in WalkDir::new(&backend_out)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let is_js = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("js") | Some("cjs")
        );
        if !is_js {
            continue;
        }
        if let Ok(text) = std::fs::read_to_string(path) {
            if converter.needs_conversion(&text) {
                findings.push(format!(
                    "built output still carries dialect indicators: {}",
                    path.display()
                ));
            }
        }
    }
    findings
}
