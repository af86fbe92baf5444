//! Rewrite rules for converting ESM-dialect sources to CommonJS.
//!
//! Rules are grouped into ordered categories. Categories are applied
//! strictly in declaration order because later categories assume earlier
//! ones already ran: the meta-env accessors are syntactic subsets of the
//! import patterns, and the export rules must not re-match text produced
//! by the import rules.

use regex::{Captures, Regex};

/// Replacement payload: a literal (may reference capture groups with `$n`)
/// or a pure function of the captured groups.
pub enum Replacement {
    Literal(String),
    Computed(fn(&Captures) -> String),
}

/// One pattern → replacement rewrite.
pub struct RewriteRule {
    pub pattern: Regex,
    pub replacement: Replacement,
    pub description: &'static str,
}

impl RewriteRule {
    fn literal(pattern: &str, replacement: &str, description: &'static str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("invalid rewrite pattern"),
            replacement: Replacement::Literal(replacement.to_string()),
            description,
        }
    }

    fn computed(
        pattern: &str,
        replacement: fn(&Captures) -> String,
        description: &'static str,
    ) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("invalid rewrite pattern"),
            replacement: Replacement::Computed(replacement),
            description,
        }
    }

    /// Apply this rule everywhere it matches, returning the rewritten text
    /// and the number of matches replaced.
    pub fn apply(&self, text: &str) -> (String, usize) {
        let count = self.pattern.find_iter(text).count();
        if count == 0 {
            return (text.to_string(), 0);
        }
        let rewritten = match &self.replacement {
            Replacement::Literal(rep) => self.pattern.replace_all(text, rep.as_str()).into_owned(),
            Replacement::Computed(f) => self
                .pattern
                .replace_all(text, |caps: &Captures| f(caps))
                .into_owned(),
        };
        (rewritten, count)
    }
}

/// Ordered rule categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuleCategory {
    MetaEnv,
    Imports,
    Exports,
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleCategory::MetaEnv => write!(f, "meta-env"),
            RuleCategory::Imports => write!(f, "imports"),
            RuleCategory::Exports => write!(f, "exports"),
        }
    }
}

/// The full ordered rule set.
pub struct RuleSet {
    categories: Vec<(RuleCategory, Vec<RewriteRule>)>,
}

impl RuleSet {
    pub fn standard() -> Self {
        Self {
            categories: vec![
                (RuleCategory::MetaEnv, meta_env_rules()),
                (RuleCategory::Imports, import_rules()),
                (RuleCategory::Exports, export_rules()),
            ],
        }
    }

    pub fn categories(&self) -> &[(RuleCategory, Vec<RewriteRule>)] {
        &self.categories
    }
}

/// Meta-environment accessors. Specific accessors must come before the
/// generic `import.meta.env` rule or it would clobber them.
fn meta_env_rules() -> Vec<RewriteRule> {
    vec![
        RewriteRule::literal(
            r"import\.meta\.env\.(VITE_[A-Za-z0-9_]+)",
            "process.env.$1",
            "VITE_-prefixed env accessor",
        ),
        RewriteRule::literal(
            r"import\.meta\.env\.MODE",
            r#"(process.env.NODE_ENV || "development")"#,
            "env MODE accessor",
        ),
        RewriteRule::literal(
            r"import\.meta\.env\.PROD",
            r#"(process.env.NODE_ENV === "production")"#,
            "env PROD accessor",
        ),
        RewriteRule::literal(
            r"import\.meta\.env\.DEV",
            r#"(process.env.NODE_ENV !== "production")"#,
            "env DEV accessor",
        ),
        RewriteRule::literal(
            r"import\.meta\.env",
            "process.env",
            "generic env object accessor",
        ),
        RewriteRule::literal(
            r"import\.meta\.url",
            r#"require("url").pathToFileURL(__filename).href"#,
            "module URL accessor",
        ),
    ]
}

fn import_rules() -> Vec<RewriteRule> {
    vec![
        RewriteRule::computed(
            r#"import\s+([A-Za-z_$][\w$]*)\s*,\s*\{([^}]*)\}\s*from\s*['"]([^'"]+)['"];?"#,
            |caps| {
                format!(
                    "const {} = require(\"{}\");\nconst {{ {} }} = require(\"{}\");",
                    &caps[1],
                    &caps[3],
                    destructure_list(&caps[2]),
                    &caps[3]
                )
            },
            "combined default + named import",
        ),
        RewriteRule::literal(
            r#"import\s*\*\s*as\s+([A-Za-z_$][\w$]*)\s+from\s*['"]([^'"]+)['"];?"#,
            "const $1 = require(\"$2\");",
            "namespace import",
        ),
        RewriteRule::computed(
            r#"import\s*\{([^}]*)\}\s*from\s*['"]([^'"]+)['"];?"#,
            |caps| {
                format!(
                    "const {{ {} }} = require(\"{}\");",
                    destructure_list(&caps[1]),
                    &caps[2]
                )
            },
            "named import",
        ),
        RewriteRule::literal(
            r#"import\s+([A-Za-z_$][\w$]*)\s+from\s*['"]([^'"]+)['"];?"#,
            "const $1 = require(\"$2\");",
            "default import",
        ),
        RewriteRule::literal(
            r#"import\s*['"]([^'"]+)['"];?"#,
            "require(\"$1\");",
            "side-effect import",
        ),
        RewriteRule::literal(r"\bimport\s*\(", "require(", "dynamic import"),
    ]
}

fn export_rules() -> Vec<RewriteRule> {
    vec![
        RewriteRule::computed(
            r#"export\s*\*\s*from\s*['"]([^'"]+)['"];?"#,
            |caps| format!("Object.assign(module.exports, require(\"{}\"));", &caps[1]),
            "wildcard re-export",
        ),
        RewriteRule::computed(
            r#"export\s*\{([^}]*)\}\s*from\s*['"]([^'"]+)['"];?"#,
            |caps| {
                export_items(&caps[1])
                    .into_iter()
                    .map(|(orig, alias)| {
                        format!(
                            "module.exports.{} = require(\"{}\").{};",
                            alias, &caps[2], orig
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            },
            "named re-export",
        ),
        RewriteRule::computed(
            r"export\s*\{([^}]*)\}\s*;?",
            |caps| {
                export_items(&caps[1])
                    .into_iter()
                    .map(|(orig, alias)| format!("module.exports.{} = {};", alias, orig))
                    .collect::<Vec<_>>()
                    .join("\n")
            },
            "named export list",
        ),
        RewriteRule::literal(
            r"export\s+default\s+",
            "module.exports = ",
            "default export",
        ),
        RewriteRule::computed(
            r"(?m)^(\s*)export\s+(async\s+)?function\s+([A-Za-z_$][\w$]*)",
            |caps| {
                // Function declarations hoist, so the export assignment can
                // precede the body.
                let indent = &caps[1];
                let async_kw = caps.get(2).map_or("", |m| m.as_str());
                let name = &caps[3];
                format!(
                    "{indent}module.exports.{name} = {name};\n{indent}{async_kw}function {name}"
                )
            },
            "exported function declaration",
        ),
        RewriteRule::computed(
            r"(?m)^(\s*)export\s+(const|let|var)\s+([A-Za-z_$][\w$]*)(.*;)\s*$",
            |caps| {
                let indent = &caps[1];
                let kw = &caps[2];
                let name = &caps[3];
                let rest = &caps[4];
                format!("{indent}{kw} {name}{rest}\n{indent}module.exports.{name} = {name};")
            },
            "exported single-line declaration",
        ),
        // Multi-line initializers keep the binding; the declaration itself
        // is rewritten so no dialect indicator survives.
        RewriteRule::literal(
            r"(?m)^(\s*)export\s+(const|let|var)\s+",
            "$1$2 ",
            "exported multi-line declaration",
        ),
        RewriteRule::literal(
            r"(?m)^(\s*)export\s+class\s+",
            "$1class ",
            "exported class declaration",
        ),
    ]
}

/// `a as b, c` → `a: b, c` for a `const { … } = require(…)` binding.
fn destructure_list(list: &str) -> String {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match split_alias(item) {
            Some((orig, alias)) => format!("{orig}: {alias}"),
            None => item.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `a as b, c` → `[(a, b), (c, c)]` as (original, exported-as) pairs.
fn export_items(list: &str) -> Vec<(String, String)> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match split_alias(item) {
            Some((orig, alias)) => (orig.to_string(), alias.to_string()),
            None => (item.to_string(), item.to_string()),
        })
        .collect()
}

fn split_alias(item: &str) -> Option<(&str, &str)> {
    let mut parts = item.split_whitespace();
    let orig = parts.next()?;
    if parts.next()? != "as" {
        return None;
    }
    let alias = parts.next()?;
    Some((orig, alias))
}
