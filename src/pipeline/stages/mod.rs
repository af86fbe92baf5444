//! Pipeline stage implementations.

mod build;
mod convert;
mod health;
mod housekeeping;
mod organize;
mod proxy;
mod supervise;
mod validate;

pub use build::BuildStage;
pub use convert::ConvertStage;
pub use health::HealthStage;
pub use housekeeping::HousekeepingStage;
pub use organize::OrganizeStage;
pub use proxy::ProxyStage;
pub use supervise::SuperviseStage;
pub use validate::ValidateStage;
