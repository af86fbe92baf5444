//! Module conversion engine.
//!
//! Takes raw source text, decides whether it uses the ESM dialect at all
//! (short-circuiting when it does not), runs the ordered rule categories,
//! optionally injects a browser-global shim, then re-scans the output for
//! residual dialect indicators as a post-condition.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::rules::RuleSet;
use crate::error::PipelineError;

/// Outputs smaller than this on a non-trivial input indicate a truncation
/// bug in the rewrite rather than a legitimate conversion.
const MIN_OUTPUT_BYTES: usize = 24;

/// Marker line at the top of the injected shim block, also used to avoid
/// injecting twice.
const SHIM_MARKER: &str = "/* runtime shim: browser globals */";

const BROWSER_SHIM: &str = "\
/* runtime shim: browser globals */
if (typeof globalThis.window === \"undefined\") { globalThis.window = globalThis; }
if (typeof globalThis.document === \"undefined\") {
  globalThis.document = { addEventListener: () => {}, querySelector: () => null };
}
if (typeof globalThis.localStorage === \"undefined\") {
  const store = new Map();
  globalThis.localStorage = {
    getItem: (k) => (store.has(k) ? store.get(k) : null),
    setItem: (k, v) => store.set(k, String(v)),
    removeItem: (k) => store.delete(k),
    clear: () => store.clear(),
  };
}

";

/// Per-file conversion report.
#[derive(Debug, Clone)]
pub struct ConversionReport {
    pub file: PathBuf,
    /// Whether the necessity check found dialect indicators at all.
    pub converted: bool,
    /// Whether the text actually changed.
    pub changed: bool,
    /// Replacement counts per rule category.
    pub category_changes: BTreeMap<String, usize>,
    /// Residual-indicator and size violations found after rewriting.
    pub violations: Vec<String>,
    pub shim_injected: bool,
}

impl ConversionReport {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Conversion result for one file: the final text plus its report. When the
/// necessity check short-circuits, `text` is the original input unchanged.
pub struct ConversionOutcome {
    pub text: String,
    pub report: ConversionReport,
}

/// Aggregate over a batch of files.
#[derive(Debug, Default)]
pub struct ConversionBatch {
    pub reports: Vec<ConversionReport>,
}

impl ConversionBatch {
    pub fn succeeded(&self) -> usize {
        self.reports.iter().filter(|r| r.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.reports.iter().filter(|r| !r.passed()).count()
    }

    pub fn converted(&self) -> usize {
        self.reports.iter().filter(|r| r.converted).count()
    }

    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionReport> {
        self.reports.iter().filter(|r| !r.passed())
    }
}

/// The conversion engine. Holds the compiled rule set and the indicator
/// patterns used by both the necessity check and the post-condition scan.
pub struct ModuleConverter {
    rules: RuleSet,
    indicators: Vec<(Regex, &'static str)>,
    browser_globals: Regex,
    inject_shim: bool,
}

impl Default for ModuleConverter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ModuleConverter {
    pub fn new(inject_shim: bool) -> Self {
        // The indicator set defines the dialect boundary: CommonJS output
        // (and the shim) must never match any of these, or conversion would
        // not be idempotent.
        let indicators = vec![
            (
                Regex::new(r#"(?m)^\s*import[\s{*'"]"#).expect("invalid indicator pattern"),
                "static import statement",
            ),
            (
                Regex::new(r"(?m)^\s*export[\s{]").expect("invalid indicator pattern"),
                "export statement",
            ),
            (
                Regex::new(r"\bimport\s*\(").expect("invalid indicator pattern"),
                "dynamic import expression",
            ),
            (
                Regex::new(r"import\.meta").expect("invalid indicator pattern"),
                "import.meta reference",
            ),
        ];

        Self {
            rules: RuleSet::standard(),
            indicators,
            browser_globals: Regex::new(r"\b(window|document|localStorage)\b")
                .expect("invalid browser-global pattern"),
            inject_shim,
        }
    }

    /// Necessity check: does this text contain any dialect indicator?
    pub fn needs_conversion(&self, text: &str) -> bool {
        self.indicators.iter().any(|(re, _)| re.is_match(text))
    }

    /// Convert one file's text. Short-circuits when no indicator is present.
    pub fn convert(&self, file: impl Into<PathBuf>, text: &str) -> ConversionOutcome {
        let file = file.into();

        if !self.needs_conversion(text) {
            return ConversionOutcome {
                text: text.to_string(),
                report: ConversionReport {
                    file,
                    converted: false,
                    changed: false,
                    category_changes: BTreeMap::new(),
                    violations: Vec::new(),
                    shim_injected: false,
                },
            };
        }

        let mut out = text.to_string();
        let mut category_changes = BTreeMap::new();

        for (category, rules) in self.rules.categories() {
            let mut count = 0;
            for rule in rules {
                let (next, replaced) = rule.apply(&out);
                if replaced > 0 {
                    debug!(
                        "{}: {} x{} ({})",
                        file.display(),
                        rule.description,
                        replaced,
                        category
                    );
                }
                count += replaced;
                out = next;
            }
            category_changes.insert(category.to_string(), count);
        }

        let mut shim_injected = false;
        if self.inject_shim
            && self.browser_globals.is_match(&out)
            && !out.starts_with(SHIM_MARKER)
        {
            out = format!("{BROWSER_SHIM}{out}");
            shim_injected = true;
        }

        let mut violations = Vec::new();
        for (re, description) in &self.indicators {
            if re.is_match(&out) {
                violations.push(format!("residual dialect indicator: {description}"));
            }
        }
        if out.len() < MIN_OUTPUT_BYTES && text.len() >= MIN_OUTPUT_BYTES * 4 {
            violations.push(format!(
                "output implausibly small: {} bytes from {} bytes of input",
                out.len(),
                text.len()
            ));
        }

        let changed = out != text;
        ConversionOutcome {
            text: out,
            report: ConversionReport {
                file,
                converted: true,
                changed,
                category_changes,
                violations,
                shim_injected,
            },
        }
    }

    /// Convert a file on disk in place. The rewritten text is only written
    /// back when the post-condition scan passes; a failing file keeps its
    /// original content for inspection.
    pub fn convert_path(&self, path: &Path) -> Result<ConversionReport, PipelineError> {
        let text = std::fs::read_to_string(path)?;
        let outcome = self.convert(path, &text);
        if outcome.report.passed() && outcome.report.changed {
            std::fs::write(path, &outcome.text)?;
        } else if !outcome.report.passed() {
            warn!(
                "Conversion of {} failed: {}",
                path.display(),
                outcome.report.violations.join("; ")
            );
        }
        Ok(outcome.report)
    }

    /// Convert every `.js`/`.mjs` file under `dir`. Never aborts early on a
    /// single file's failure; the batch partitions succeeded from failed.
    pub fn convert_dir(&self, dir: &Path) -> Result<ConversionBatch, PipelineError> {
        let mut batch = ConversionBatch::default();

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .map(|entry| entry.into_path())
            .filter(|path| {
                matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("js") | Some("mjs")
                )
            })
            .collect();
        files.sort();

        for path in files {
            match self.convert_path(&path) {
                Ok(report) => batch.reports.push(report),
                Err(err) => batch.reports.push(ConversionReport {
                    file: path,
                    converted: false,
                    changed: false,
                    category_changes: BTreeMap::new(),
                    violations: vec![format!("read failed: {err}")],
                    shim_injected: false,
                }),
            }
        }

        Ok(batch)
    }
}
