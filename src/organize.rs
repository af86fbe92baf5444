//! Output organizer.
//!
//! After both builds succeed, moves produced files into the canonical
//! serving layout. Every relocation is check-then-act; a missing source is
//! skipped with a warning instead of failing the pipeline.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::error::PipelineError;

/// File extensions treated as static web assets.
const STATIC_EXTENSIONS: &[&str] = &[
    "html", "css", "svg", "png", "jpg", "jpeg", "gif", "ico", "map", "woff", "woff2", "webp",
];

/// Directory names under the output root treated as static asset trees.
const STATIC_DIRS: &[&str] = &["assets", "static", "public", "images", "fonts"];

#[derive(Debug, Default)]
pub struct OrganizeSummary {
    pub moved: usize,
    pub warnings: Vec<String>,
}

pub struct OutputOrganizer {
    root: PathBuf,
    output_dir: PathBuf,
}

impl OutputOrganizer {
    pub fn new(config: &RunConfig, root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            output_dir: root.join(&config.build.output_dir),
        }
    }

    /// Run all relocation steps. IO failures on present sources are real
    /// errors; absent sources only produce warnings.
    pub fn organize(&self, config: &RunConfig) -> Result<OrganizeSummary, PipelineError> {
        let mut summary = OrganizeSummary::default();

        if !self.output_dir.exists() {
            summary
                .warnings
                .push(format!("output directory missing: {}", self.output_dir.display()));
            return Ok(summary);
        }

        self.collect_frontend_assets(&mut summary)?;
        self.relocate_shared(config, &mut summary)?;
        self.copy_data(config, &mut summary)?;

        for warning in &summary.warnings {
            warn!("{warning}");
        }
        info!("Organized {} entries into serving layout", summary.moved);
        Ok(summary)
    }

    /// Move static assets at the top of the output tree into `frontend/`.
    fn collect_frontend_assets(&self, summary: &mut OrganizeSummary) -> Result<(), PipelineError> {
        let frontend = self.output_dir.join("frontend");

        for entry in std::fs::read_dir(&self.output_dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();

            let is_static = if path.is_dir() {
                STATIC_DIRS.contains(&name.as_ref())
            } else {
                path.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| STATIC_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            };

            if is_static {
                std::fs::create_dir_all(&frontend)?;
                let dest = frontend.join(name.as_ref());
                replace(&path, &dest)?;
                summary.moved += 1;
            }
        }
        Ok(())
    }

    /// Relocate the backend build's `shared` subtree to the output root.
    fn relocate_shared(
        &self,
        config: &RunConfig,
        summary: &mut OrganizeSummary,
    ) -> Result<(), PipelineError> {
        let backend_name = match config.workspace.backend_dir.file_name() {
            Some(name) => name.to_os_string(),
            None => {
                summary
                    .warnings
                    .push("backend directory has no name, skipping shared relocation".to_string());
                return Ok(());
            }
        };

        let source = self.output_dir.join(&backend_name).join("shared");
        if !source.exists() {
            summary.warnings.push(format!(
                "shared subtree not produced by backend build: {}",
                source.display()
            ));
            return Ok(());
        }

        replace(&source, &self.output_dir.join("shared"))?;
        summary.moved += 1;
        Ok(())
    }

    /// Copy (not move) the source data directory into the output tree.
    fn copy_data(
        &self,
        config: &RunConfig,
        summary: &mut OrganizeSummary,
    ) -> Result<(), PipelineError> {
        let source = self.root.join(&config.workspace.data_dir);
        if !source.exists() {
            summary
                .warnings
                .push(format!("data directory not found: {}", source.display()));
            return Ok(());
        }

        let dest = self.output_dir.join("data");
        if dest.exists() {
            std::fs::remove_dir_all(&dest)?;
        }
        copy_dir(&source, &dest)?;
        summary.moved += 1;
        Ok(())
    }
}

/// Move `source` to `dest`, removing any stale copy first.
fn replace(source: &Path, dest: &Path) -> Result<(), PipelineError> {
    if dest.exists() {
        if dest.is_dir() {
            std::fs::remove_dir_all(dest)?;
        } else {
            std::fs::remove_file(dest)?;
        }
    }
    std::fs::rename(source, dest)?;
    Ok(())
}

fn copy_dir(source: &Path, dest: &Path) -> Result<(), PipelineError> {
    std::fs::create_dir_all(dest)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let target = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
