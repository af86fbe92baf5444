use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default config file name looked up in the workspace root.
pub const CONFIG_FILENAME: &str = "timonel.toml";

/// Top-level run configuration. Constructed once per invocation and treated
/// as immutable for the lifetime of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Configuration file version
    pub version: String,

    /// Workspace layout
    pub workspace: WorkspaceConfig,

    /// Per-external-call timeouts (seconds)
    pub timeouts: TimeoutConfig,

    /// Boolean feature flags
    pub flags: FeatureFlags,

    /// External build commands
    pub build: BuildConfig,

    /// Reverse-proxy template fields
    pub proxy: ProxyConfig,

    /// Process supervisor settings
    pub supervisor: SupervisorConfig,

    /// Health probe endpoints
    pub health: HealthConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            workspace: WorkspaceConfig::default(),
            timeouts: TimeoutConfig::default(),
            flags: FeatureFlags::default(),
            build: BuildConfig::default(),
            proxy: ProxyConfig::default(),
            supervisor: SupervisorConfig::default(),
            health: HealthConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Workspace root directory
    pub root: PathBuf,

    /// Backend source directory (relative to root)
    pub backend_dir: PathBuf,

    /// Frontend source directory (relative to root)
    pub frontend_dir: PathBuf,

    /// Data directory copied into the output tree (relative to root)
    pub data_dir: PathBuf,

    /// Minimum free disk space required before any mutation (bytes)
    pub min_free_bytes: u64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            backend_dir: PathBuf::from("server"),
            frontend_dir: PathBuf::from("client"),
            data_dir: PathBuf::from("data"),
            min_free_bytes: 500 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Per-build-command timeout
    pub build_secs: u64,

    /// Per-health-probe timeout
    pub probe_secs: u64,

    /// Per-supervisor-call timeout
    pub supervisor_secs: u64,

    /// Proxy syntax-check timeout
    pub proxy_check_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            build_secs: 600,
            probe_secs: 5,
            supervisor_secs: 60,
            proxy_check_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Re-scan converted output for residual dialect indicators after build
    pub validate_after_build: bool,

    /// Remove the output directory before building
    pub cleanup_before_build: bool,

    /// Generate and apply reverse-proxy configuration during deploy
    pub enable_reverse_proxy: bool,

    /// Render TLS listener directives (requires cert/key paths)
    pub enable_tls: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            validate_after_build: true,
            cleanup_before_build: false,
            enable_reverse_proxy: true,
            enable_tls: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Backend build command and arguments
    pub backend_command: Vec<String>,

    /// Frontend build command and arguments
    pub frontend_command: Vec<String>,

    /// Build output directory (relative to root)
    pub output_dir: PathBuf,

    /// Directory whose module-system sources are converted (relative to root)
    pub convert_dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            backend_command: vec![
                "npm".to_string(),
                "run".to_string(),
                "build:server".to_string(),
            ],
            frontend_command: vec![
                "npm".to_string(),
                "run".to_string(),
                "build:client".to_string(),
            ],
            output_dir: PathBuf::from("dist"),
            convert_dir: PathBuf::from("server"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Reverse-proxy binary used for the syntax-check dry run
    pub binary: String,

    /// Live configuration file path
    pub config_path: PathBuf,

    /// Directory that receives timestamped backups
    pub backup_dir: PathBuf,

    /// Listen port
    pub listen_port: u16,

    /// Server names
    pub server_names: Vec<String>,

    /// Backend upstream URL
    pub backend_upstream: String,

    /// Frontend upstream URL (used in development mode)
    pub frontend_upstream: String,

    /// TLS certificate path (required when TLS is enabled)
    pub tls_cert: Option<PathBuf>,

    /// TLS key path (required when TLS is enabled)
    pub tls_key: Option<PathBuf>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            binary: "nginx".to_string(),
            config_path: PathBuf::from("/etc/nginx/conf.d/app.conf"),
            backup_dir: PathBuf::from("/etc/nginx/backups"),
            listen_port: 80,
            server_names: vec!["localhost".to_string()],
            backend_upstream: "http://127.0.0.1:3000".to_string(),
            frontend_upstream: "http://127.0.0.1:5173".to_string(),
            tls_cert: None,
            tls_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Process supervisor binary
    pub binary: String,

    /// Supervisor manifest file (relative to root)
    pub manifest: PathBuf,

    /// Application name registered with the supervisor
    pub app_name: String,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            binary: "pm2".to_string(),
            manifest: PathBuf::from("ecosystem.config.cjs"),
            app_name: "app".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Extra (name, URL) probes appended to the default endpoint set
    pub endpoints: Vec<HealthEndpoint>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
        }
    }
}

/// One probed endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthEndpoint {
    pub name: String,
    pub url: String,
}

impl RunConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check configuration invariants, collecting every violation.
    pub fn validate(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.timeouts.build_secs == 0 {
            violations.push("timeouts.build_secs must be > 0".to_string());
        }
        if self.timeouts.probe_secs == 0 {
            violations.push("timeouts.probe_secs must be > 0".to_string());
        }
        if self.timeouts.supervisor_secs == 0 {
            violations.push("timeouts.supervisor_secs must be > 0".to_string());
        }
        if self.timeouts.proxy_check_secs == 0 {
            violations.push("timeouts.proxy_check_secs must be > 0".to_string());
        }
        if self.proxy.listen_port == 0 {
            violations.push("proxy.listen_port must be a valid port".to_string());
        }
        if self.flags.enable_tls {
            if self.proxy.tls_cert.is_none() {
                violations.push("proxy.tls_cert is required when TLS is enabled".to_string());
            }
            if self.proxy.tls_key.is_none() {
                violations.push("proxy.tls_key is required when TLS is enabled".to_string());
            }
        }
        if self.build.backend_command.is_empty() {
            violations.push("build.backend_command must not be empty".to_string());
        }
        if self.build.frontend_command.is_empty() {
            violations.push("build.frontend_command must not be empty".to_string());
        }

        violations
    }
}
