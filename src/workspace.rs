//! Workspace validation.
//!
//! Read-only prerequisite checks run at the start of both pipelines, with
//! different required-path sets. Every violation is collected so the caller
//! can report all problems at once.

use std::path::{Path, PathBuf};
use sysinfo::Disks;
use tracing::debug;

use crate::config::RunConfig;
use crate::error::PipelineError;

/// Required relative paths for the build pipeline.
pub fn build_required_paths(config: &RunConfig) -> Vec<PathBuf> {
    vec![
        PathBuf::from("package.json"),
        PathBuf::from("tsconfig.json"),
        config.workspace.backend_dir.clone(),
        config.workspace.frontend_dir.clone(),
    ]
}

/// Required relative paths for the deploy pipeline (build set plus the
/// supervisor manifest and the backend package manifest).
pub fn deploy_required_paths(config: &RunConfig) -> Vec<PathBuf> {
    let mut paths = build_required_paths(config);
    paths.push(config.supervisor.manifest.clone());
    paths.push(config.workspace.backend_dir.join("package.json"));
    paths
}

/// Outcome of a workspace check.
#[derive(Debug, Clone)]
pub struct WorkspaceCheck {
    pub checked: usize,
    pub violations: Vec<String>,
}

impl WorkspaceCheck {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_result(self) -> Result<(), PipelineError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(PipelineError::Validation {
                violations: self.violations,
            })
        }
    }
}

/// Read-only validator for workspace prerequisites.
pub struct WorkspaceValidator {
    min_free_bytes: u64,
}

impl WorkspaceValidator {
    pub fn new(min_free_bytes: u64) -> Self {
        Self { min_free_bytes }
    }

    /// Check that every required path exists under `root` and that the disk
    /// holding `root` has enough free space. Collects every violation.
    pub fn check(&self, root: &Path, required: &[PathBuf]) -> WorkspaceCheck {
        let mut violations = Vec::new();

        if !root.exists() {
            violations.push(format!("workspace root does not exist: {}", root.display()));
            return WorkspaceCheck {
                checked: required.len(),
                violations,
            };
        }

        for rel in required {
            let path = root.join(rel);
            if !path.exists() {
                violations.push(format!("missing required path: {}", rel.display()));
            }
        }

        if let Some(available) = available_space_for(root) {
            debug!(
                "Disk space for {}: {} bytes available, {} required",
                root.display(),
                available,
                self.min_free_bytes
            );
            if available < self.min_free_bytes {
                violations.push(format!(
                    "insufficient disk space: {} bytes available, {} required",
                    available, self.min_free_bytes
                ));
            }
        } else {
            debug!("Could not determine disk space for {}", root.display());
        }

        WorkspaceCheck {
            checked: required.len(),
            violations,
        }
    }
}

/// Available space on the disk whose mount point is the longest prefix of
/// `path`. `None` when no mount matches (the check is then skipped).
fn available_space_for(path: &Path) -> Option<u64> {
    let canonical = path.canonicalize().ok()?;
    let disks = Disks::new_with_refreshed_list();
    disks
        .iter()
        .filter(|disk| canonical.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| disk.available_space())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_check_all_present() {
        let temp_dir = TempDir::new().unwrap();
        touch(temp_dir.path(), "package.json");
        touch(temp_dir.path(), "tsconfig.json");
        std::fs::create_dir(temp_dir.path().join("server")).unwrap();
        std::fs::create_dir(temp_dir.path().join("client")).unwrap();

        let validator = WorkspaceValidator::new(0);
        let required = build_required_paths(&RunConfig::default());
        let check = validator.check(temp_dir.path(), &required);

        assert!(check.is_ok());
        assert_eq!(check.checked, 4);
    }

    #[test]
    fn test_check_reports_every_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        // 2 of 5 present, 3 missing
        touch(temp_dir.path(), "package.json");
        std::fs::create_dir(temp_dir.path().join("server")).unwrap();

        let required = vec![
            PathBuf::from("package.json"),
            PathBuf::from("tsconfig.json"),
            PathBuf::from("server"),
            PathBuf::from("client"),
            PathBuf::from("ecosystem.config.cjs"),
        ];
        let validator = WorkspaceValidator::new(0);
        let check = validator.check(temp_dir.path(), &required);

        assert_eq!(check.violations.len(), 3);
        assert!(check.violations.iter().any(|v| v.contains("tsconfig.json")));
        assert!(check.violations.iter().any(|v| v.contains("client")));
        assert!(check
            .violations
            .iter()
            .any(|v| v.contains("ecosystem.config.cjs")));
    }

    #[test]
    fn test_check_missing_root() {
        let validator = WorkspaceValidator::new(0);
        let check = validator.check(
            Path::new("/nonexistent/workspace/root"),
            &[PathBuf::from("package.json")],
        );
        assert!(!check.is_ok());
        assert!(check.violations[0].contains("workspace root"));
    }

    #[test]
    fn test_check_insufficient_disk_space() {
        let temp_dir = TempDir::new().unwrap();
        // Absurdly high threshold forces the disk-space violation
        let validator = WorkspaceValidator::new(u64::MAX);
        let check = validator.check(temp_dir.path(), &[]);

        assert!(!check.is_ok());
        assert!(check
            .violations
            .iter()
            .any(|v| v.contains("insufficient disk space")));
    }

    #[test]
    fn test_into_result_carries_violations() {
        let check = WorkspaceCheck {
            checked: 2,
            violations: vec!["missing required path: a".to_string()],
        };
        let err = check.into_result().unwrap_err();
        assert!(err.to_string().contains("missing required path: a"));
    }

    #[test]
    fn test_deploy_paths_extend_build_paths() {
        let config = RunConfig::default();
        let build = build_required_paths(&config);
        let deploy = deploy_required_paths(&config);
        assert_eq!(deploy.len(), build.len() + 2);
        assert!(deploy.contains(&PathBuf::from("ecosystem.config.cjs")));
        assert!(deploy.contains(&PathBuf::from("server/package.json")));
    }
}
