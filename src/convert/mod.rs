//! ESM-to-CommonJS source conversion.

pub mod engine;
pub mod rules;

pub use engine::{ConversionBatch, ConversionOutcome, ConversionReport, ModuleConverter};
pub use rules::{Replacement, RewriteRule, RuleCategory, RuleSet};
