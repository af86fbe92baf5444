//! Reverse-proxy configuration stage.

use anyhow::Result;
use std::time::{Duration, Instant};
use tracing::info;

use crate::pipeline::types::{PipelineContext, PipelineStage, StageOutcome};
use crate::proxy::{ProxyConfigManager, ReverseProxyConfig};
use crate::types::{Phase, PhaseResult};

pub struct ProxyStage;

#[async_trait::async_trait]
impl PipelineStage for ProxyStage {
    fn name(&self) -> &str {
        "Proxy"
    }

    fn phase(&self) -> Phase {
        Phase::ProxyConfiguration
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<StageOutcome> {
        let start = Instant::now();

        if !ctx.config.flags.enable_reverse_proxy {
            info!("Reverse proxy disabled, skipping configuration");
            return Ok(StageOutcome::single(PhaseResult::succeeded(
                self.phase(),
                0,
                Some("reverse proxy disabled".to_string()),
            )));
        }

        let document_root = ctx
            .root
            .join(&ctx.config.build.output_dir)
            .join("frontend");
        let render_input = ReverseProxyConfig::from_run_config(&ctx.config, document_root);

        let mut manager = ProxyConfigManager::new(
            ctx.executor.as_ref(),
            &ctx.config.proxy,
            Duration::from_secs(ctx.config.timeouts.proxy_check_secs),
        );
        manager.generate(&render_input);

        let result = match manager.apply().await {
            Ok(()) => PhaseResult::succeeded(
                self.phase(),
                start.elapsed().as_millis() as u64,
                Some(format!("applied {}", manager.config_path().display())),
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
