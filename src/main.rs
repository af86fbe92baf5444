use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use timonel::config::{RunConfig, CONFIG_FILENAME};
use timonel::exec::SystemExecutor;
use timonel::health::{default_endpoints, HealthProber};
use timonel::pipeline::{Pipeline, PipelineContext};
use timonel::proxy::{ProxyConfigManager, ReverseProxyConfig};
use timonel::supervisor::SupervisorAdapter;
use timonel::tools::ToolRegistry;
use timonel::workspace::{deploy_required_paths, WorkspaceValidator};
use timonel::ModuleConverter;

#[derive(Parser)]
#[command(name = "timonel")]
#[command(version, about = "Build and deploy orchestrator for node web workspaces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file into the workspace
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,
    },

    /// Check workspace prerequisites, configuration, and external tools
    Check,

    /// Convert module-system sources in place, without building
    Convert {
        /// Directory to convert (defaults to the configured one)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Run the build pipeline: validate, convert, build, organize
    Build {
        /// Emit the run report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Run the full deploy pipeline
    Deploy {
        /// Emit the run report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Reverse-proxy configuration operations
    Proxy {
        #[command(subcommand)]
        command: ProxyCommands,
    },

    /// Show supervisor status and probe health endpoints
    Status,
}

#[derive(Subcommand)]
enum ProxyCommands {
    /// Render the config text to stdout or a file
    Render {
        /// Write to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Generate, back up, write, and validate the live config
    Apply,

    /// Restore the live config from a backup
    Restore {
        /// Backup file to restore (defaults to the newest one)
        #[arg(long)]
        backup: Option<PathBuf>,
    },
}

fn load_config(root: &Path) -> Result<RunConfig> {
    let path = root.join(CONFIG_FILENAME);
    let config = if path.exists() {
        RunConfig::load(&path)
            .with_context(|| format!("failed to load {}", path.display()))?
    } else {
        info!("No {} found, using defaults", CONFIG_FILENAME);
        RunConfig::default()
    };

    let violations = config.validate();
    if !violations.is_empty() {
        for violation in &violations {
            eprintln!("{} {}", "config error:".red(), violation);
        }
        anyhow::bail!("invalid configuration ({} violations)", violations.len());
    }
    Ok(config)
}

fn cmd_init(root: &Path, force: bool) -> Result<()> {
    let path = root.join(CONFIG_FILENAME);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    RunConfig::default().save(&path)?;
    println!("Wrote {}", path.display());
    Ok(())
}

async fn cmd_check(root: &Path) -> Result<()> {
    let config = load_config(root)?;
    let executor = SystemExecutor;

    println!("{}", "Configuration".bold());
    println!("  {} valid", "✓".green());

    println!("\n{}", "Tools".bold());
    let registry = ToolRegistry::detect(
        &executor,
        &config.proxy.binary,
        &config.supervisor.binary,
    )
    .await;
    for tool in registry.available_tools() {
        println!(
            "  {} {} {}",
            "✓".green(),
            tool.name,
            tool.version.as_deref().unwrap_or("").dimmed()
        );
    }
    for missing in registry.missing_tools(&["node", "npm"]) {
        println!("  {} {} not found", "✗".red(), missing);
    }
    if registry.can_deploy() {
        println!("  {} deploy toolchain complete", "✓".green());
    } else if registry.can_build() {
        println!(
            "  {} build only: {} not found",
            "!".yellow(),
            config.supervisor.binary
        );
    }

    println!("\n{}", "Workspace".bold());
    let validator = WorkspaceValidator::new(config.workspace.min_free_bytes);
    let check = validator.check(root, &deploy_required_paths(&config));
    if check.is_ok() {
        println!("  {} {} paths present", "✓".green(), check.checked);
    } else {
        for violation in &check.violations {
            println!("  {} {}", "✗".red(), violation);
        }
        anyhow::bail!("workspace check failed");
    }

    Ok(())
}

fn cmd_convert(root: &Path, dir: Option<PathBuf>) -> Result<()> {
    let config = load_config(root)?;
    let dir = root.join(dir.unwrap_or_else(|| config.build.convert_dir.clone()));

    let converter = ModuleConverter::default();
    let batch = converter.convert_dir(&dir)?;

    println!(
        "{} of {} files converted, {} unchanged, {} failed",
        batch.converted(),
        batch.reports.len(),
        batch.reports.len() - batch.converted(),
        batch.failed()
    );
    for failure in batch.failures() {
        println!(
            "  {} {}: {}",
            "✗".red(),
            failure.file.display(),
            failure.violations.join("; ")
        );
    }

    if batch.all_passed() {
        Ok(())
    } else {
        anyhow::bail!("{} files failed conversion", batch.failed())
    }
}

async fn run_pipeline(pipeline: Pipeline, root: &Path, json: bool) -> Result<()> {
    let config = load_config(root)?;
    let mut ctx = PipelineContext::new(config, root.to_path_buf(), Arc::new(SystemExecutor));

    let report = pipeline.run(&mut ctx).await;

    if json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }

    if report.success {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

async fn cmd_proxy_render(root: &Path, output: Option<PathBuf>) -> Result<()> {
    let config = load_config(root)?;
    let document_root = root.join(&config.build.output_dir).join("frontend");
    let text = ReverseProxyConfig::from_run_config(&config, document_root).render();

    match output {
        Some(path) => {
            std::fs::write(&path, text)?;
            println!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

async fn cmd_proxy_apply(root: &Path) -> Result<()> {
    let config = load_config(root)?;
    let executor = SystemExecutor;
    let document_root = root.join(&config.build.output_dir).join("frontend");
    let render_input = ReverseProxyConfig::from_run_config(&config, document_root);

    let mut manager = ProxyConfigManager::new(
        &executor,
        &config.proxy,
        Duration::from_secs(config.timeouts.proxy_check_secs),
    );
    manager.generate(&render_input);
    manager.apply().await?;

    println!(
        "{} applied {}",
        "✓".green(),
        config.proxy.config_path.display()
    );
    Ok(())
}

async fn cmd_proxy_restore(root: &Path, backup: Option<PathBuf>) -> Result<()> {
    let config = load_config(root)?;
    let executor = SystemExecutor;
    let mut manager = ProxyConfigManager::new(
        &executor,
        &config.proxy,
        Duration::from_secs(config.timeouts.proxy_check_secs),
    );

    let backup = match backup {
        Some(path) => path,
        None => manager
            .latest_backup()?
            .context("no backups found to restore")?,
    };
    manager.restore(&backup)?;

    println!("{} restored from {}", "✓".green(), backup.display());
    Ok(())
}

async fn cmd_status(root: &Path) -> Result<()> {
    let config = load_config(root)?;
    let executor = SystemExecutor;

    println!("{}", "Tools".bold());
    let registry = ToolRegistry::detect(
        &executor,
        &config.proxy.binary,
        &config.supervisor.binary,
    )
    .await;
    for tool in registry.available_tools() {
        println!(
            "  {} {} {}",
            "✓".green(),
            tool.name,
            tool.version.as_deref().unwrap_or("").dimmed()
        );
    }

    let adapter = SupervisorAdapter::new(
        &executor,
        &config.supervisor,
        Duration::from_secs(config.timeouts.supervisor_secs),
    );
    match adapter.status(root).await {
        Ok(status) => {
            println!("{}", "Supervisor".bold());
            println!("{status}");
        }
        Err(err) => println!("{} supervisor status unavailable: {err}", "✗".red()),
    }

    println!("{}", "Health".bold());
    let prober = HealthProber::new(Duration::from_secs(config.timeouts.probe_secs));
    let results = prober.probe_all(&default_endpoints(&config)).await;
    for probe in &results {
        let marker = if probe.healthy {
            "✓".green()
        } else {
            "✗".yellow()
        };
        println!("  {} {} ({})", marker, probe.name, probe.url);
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter_layer = if cli.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::new("info")
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Timonel v{}", env!("CARGO_PKG_VERSION"));

    let root = cli.root.clone();
    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Init { force } => cmd_init(&root, force),
        Commands::Check => rt.block_on(cmd_check(&root)),
        Commands::Convert { dir } => cmd_convert(&root, dir),
        Commands::Build { json } => rt.block_on(run_pipeline(Pipeline::build_only(), &root, json)),
        Commands::Deploy { json } => {
            rt.block_on(run_pipeline(Pipeline::build_and_deploy(), &root, json))
        }
        Commands::Proxy { command } => match command {
            ProxyCommands::Render { output } => rt.block_on(cmd_proxy_render(&root, output)),
            ProxyCommands::Apply => rt.block_on(cmd_proxy_apply(&root)),
            ProxyCommands::Restore { backup } => rt.block_on(cmd_proxy_restore(&root, backup)),
        },
        Commands::Status => rt.block_on(cmd_status(&root)),
    }
}
