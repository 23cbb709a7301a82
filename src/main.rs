/// Version injected at compile time via HOSTSYNC_VERSION env var (set by CI/CD),
/// or the crate version for local builds.
pub const VERSION: &str = match option_env!("HOSTSYNC_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hostsync::config::Config;
use hostsync::manifest::DEFAULT_MANIFEST_PATH;
use hostsync::{
    ApiClient, ApiSettings, DeploySettings, DeploymentReport, Manifest, Reconciler, Secret,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Reconcile hosting.de resources with a project manifest
#[derive(Parser, Debug)]
#[command(name = "hostsync", version = VERSION, about, long_about = None)]
struct Args {
    /// API token of the hosting.de account
    #[arg(long, env = "HOSTSYNC_AUTH_TOKEN", hide_env_values = true)]
    auth_token: String,

    /// Public key installed on newly created webspace users
    #[arg(long, env = "HOSTSYNC_SSH_PUBLIC_KEY", hide_env_values = true)]
    ssh_public_key: Option<String>,

    /// Project prefix for every resource name
    #[arg(short, long, env = "HOSTSYNC_PROJECT")]
    project: Option<String>,

    /// Path of the manifest
    #[arg(short, long, default_value = DEFAULT_MANIFEST_PATH)]
    manifest: PathBuf,

    /// Provider API endpoint
    #[arg(long)]
    base_uri: Option<String>,

    /// PHP version used when the manifest does not pin one
    #[arg(long, env = "PHP_VERSION")]
    php_version: Option<String>,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or update the resources of one application
    Deploy {
        /// Key of the application in the manifest
        app: String,
    },
    /// Delete project resources the manifest no longer declares
    Prune,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<&PathBuf>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let Some(log_path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("hostsync {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.as_ref())?;

    let config = Config::load();
    // Prune deletes by prefix, so it never guesses the project from the directory
    let project = match args.command {
        Command::Prune => config.configured_project(args.project.as_deref()),
        Command::Deploy { .. } => config.effective_project(args.project.as_deref()),
    }
    .context("No project configured, pass --project or set HOSTSYNC_PROJECT")?;
    let base_uri = config.effective_base_uri(args.base_uri.as_deref());

    let manifest = Manifest::from_path(&args.manifest)?;

    let settings = ApiSettings::new(&base_uri, Secret::new(args.auth_token.clone()))?;
    let client = ApiClient::new(settings)?;

    let ssh_public_key = match (&args.command, &args.ssh_public_key) {
        (Command::Deploy { .. }, None) => {
            anyhow::bail!("--ssh-public-key (or HOSTSYNC_SSH_PUBLIC_KEY) is required to deploy")
        }
        (_, key) => Secret::new(key.clone().unwrap_or_default()),
    };

    let reconciler = Reconciler::new(
        client,
        DeploySettings {
            project,
            ssh_public_key,
            default_php_version: config.effective_php_version(args.php_version.as_deref()),
        },
    );

    let mut report = DeploymentReport::new();
    let result = match &args.command {
        Command::Deploy { app } => reconciler.deploy(&manifest, app, &mut report).await,
        Command::Prune => reconciler.prune(&manifest, &mut report).await,
    };

    // The report carries credentials created before a failure, so it is
    // printed either way.
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Err(err) = result {
        tracing::error!("{}", err);
        return Err(err.into());
    }

    Ok(())
}
