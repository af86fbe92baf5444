// Library exports for the Timonel build-and-deploy orchestrator
pub mod builder;
pub mod config;
pub mod convert;
pub mod error;
pub mod exec;
pub mod health;
pub mod organize;
pub mod pipeline;
pub mod proxy;
pub mod report;
pub mod supervisor;
pub mod tools;
pub mod types;
pub mod workspace;

// Re-export key types for convenience
pub use config::{RunConfig, CONFIG_FILENAME};
pub use convert::{ConversionReport, ModuleConverter};
pub use error::PipelineError;
pub use exec::{CommandExecutor, CommandSpec, ScriptedExecutor, SystemExecutor};
pub use pipeline::{Pipeline, PipelineContext, PipelineStage, StageOutcome};
pub use report::RunReport;
pub use types::{ErrorRecord, HealthCheckResult, Phase, PhaseResult, Severity};
