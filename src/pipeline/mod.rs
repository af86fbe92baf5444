//! Build-and-deploy orchestration pipeline.
//!
//! Phases execute strictly sequentially because each phase's preconditions
//! are the previous phase's postconditions:
//! 1. Validate - workspace prerequisites and disk space
//! 2. Convert - ESM sources rewritten to CommonJS
//! 3. Build - backend then frontend, fail-fast
//! 4. Organize - built files moved into the serving layout
//! 5. Proxy - reverse-proxy config generated, backed up, applied
//! 6. Supervise - application restarted under the process supervisor
//! 7. Health - endpoints probed, results reported
//! 8. Housekeeping - best-effort log flushing
//!
//! A single run owns the workspace for its entire duration; concurrent
//! runs against the same workspace are unsupported.

mod execution;
mod stages;
mod types;

pub use types::{PipelineContext, PipelineStage, StageOutcome};

pub use execution::Pipeline;

pub use stages::{
    BuildStage, ConvertStage, HealthStage, HousekeepingStage, OrganizeStage, ProxyStage,
    SuperviseStage, ValidateStage,
};
