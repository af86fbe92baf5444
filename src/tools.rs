use tracing::info;
use which::which;

use crate::exec::{CommandExecutor, CommandSpec};
use std::time::Duration;

/// Detected tool information
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub version: Option<String>,
    pub path: String,
    pub available: bool,
}

/// Availability of the external tools the pipeline shells out to
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    pub node: Option<ToolInfo>,
    pub npm: Option<ToolInfo>,
    pub proxy: Option<ToolInfo>,
    pub supervisor: Option<ToolInfo>,
}

impl ToolRegistry {
    /// Detect all external tools the pipeline depends on.
    pub async fn detect(
        executor: &dyn CommandExecutor,
        proxy_binary: &str,
        supervisor_binary: &str,
    ) -> Self {
        info!("Detecting external tools...");

        Self {
            node: detect_tool(executor, "node").await,
            npm: detect_tool(executor, "npm").await,
            proxy: detect_tool(executor, proxy_binary).await,
            supervisor: detect_tool(executor, supervisor_binary).await,
        }
    }

    /// Tools required by the build pipeline.
    pub fn can_build(&self) -> bool {
        self.node.is_some() && self.npm.is_some()
    }

    /// Tools required by the deploy pipeline on top of the build set.
    pub fn can_deploy(&self) -> bool {
        self.can_build() && self.supervisor.is_some()
    }

    pub fn available_tools(&self) -> Vec<&ToolInfo> {
        [&self.node, &self.npm, &self.proxy, &self.supervisor]
            .into_iter()
            .filter_map(|t| t.as_ref())
            .collect()
    }

    pub fn missing_tools(&self, names: &[&str]) -> Vec<String> {
        let available: Vec<&str> = self
            .available_tools()
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        names
            .iter()
            .filter(|name| !available.contains(*name))
            .map(|name| name.to_string())
            .collect()
    }
}

/// Detect a single tool on PATH and ask it for its version.
async fn detect_tool(executor: &dyn CommandExecutor, name: &str) -> Option<ToolInfo> {
    let path = which(name).ok()?;

    let spec = CommandSpec::new(name, &["--version"]).with_timeout(Duration::from_secs(10));
    let version = match executor.run(&spec).await {
        Ok(output) if output.success() => {
            Some(output.stdout.lines().next().unwrap_or("").trim().to_string())
        }
        _ => None,
    };

    Some(ToolInfo {
        name: name.to_string(),
        version,
        path: path.to_string_lossy().into_owned(),
        available: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ScriptedExecutor;

    #[tokio::test]
    async fn test_detect_missing_tool() {
        let executor = ScriptedExecutor::succeeding();
        let info = detect_tool(&executor, "definitely_not_installed_54321").await;
        assert!(info.is_none());
        // No version probe for a tool that is not on PATH
        assert_eq!(executor.call_count(), 0);
    }

    #[tokio::test]
    async fn test_detect_present_tool() {
        // `sh` exists on any platform these tests run on
        let executor = ScriptedExecutor::succeeding();
        executor.push_response(crate::exec::CommandOutput {
            status: Some(0),
            stdout: "sh version 1.0\n".to_string(),
            stderr: String::new(),
            timed_out: false,
            duration: Duration::from_millis(1),
        });

        let info = detect_tool(&executor, "sh").await.unwrap();
        assert!(info.available);
        assert_eq!(info.version.as_deref(), Some("sh version 1.0"));
        assert!(!info.path.is_empty());
    }

    #[tokio::test]
    async fn test_version_probe_failure_keeps_tool_available() {
        let executor = ScriptedExecutor::failing();
        let info = detect_tool(&executor, "sh").await.unwrap();
        assert!(info.available);
        assert!(info.version.is_none());
    }

    #[test]
    fn test_missing_tools() {
        let registry = ToolRegistry {
            node: Some(ToolInfo {
                name: "node".to_string(),
                version: None,
                path: "/usr/bin/node".to_string(),
                available: true,
            }),
            npm: None,
            proxy: None,
            supervisor: None,
        };
        assert!(!registry.can_build());
        assert_eq!(registry.missing_tools(&["node", "npm"]), vec!["npm"]);
    }

    #[test]
    fn test_can_deploy_requires_supervisor() {
        let tool = |name: &str| {
            Some(ToolInfo {
                name: name.to_string(),
                version: None,
                path: format!("/usr/bin/{name}"),
                available: true,
            })
        };
        let mut registry = ToolRegistry {
            node: tool("node"),
            npm: tool("npm"),
            proxy: None,
            supervisor: None,
        };
        assert!(registry.can_build());
        assert!(!registry.can_deploy());

        registry.supervisor = tool("pm2");
        assert!(registry.can_deploy());
    }
}
