//! Ballot daemon — entry point for running the election platform server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use ballot_store_lmdb::LmdbEnvironment;
use ballot_utils::LogFormat;
use clap::Parser;
use serde::Deserialize;

#[derive(Parser)]
#[command(name = "ballot-daemon", about = "Digital election platform daemon")]
struct Cli {
    /// Address to bind the API server to.
    /// When a config file is provided, defaults to the file's value.
    #[arg(long, env = "BALLOT_LISTEN")]
    listen: Option<String>,

    /// API server port.
    #[arg(long, env = "BALLOT_PORT")]
    port: Option<u16>,

    /// Data directory for LMDB storage.
    #[arg(long, env = "BALLOT_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// LMDB map size in megabytes.
    #[arg(long, env = "BALLOT_MAP_SIZE_MB")]
    map_size_mb: Option<usize>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "BALLOT_LOG_LEVEL")]
    log_level: String,

    /// Log output format: "human" or "json".
    #[arg(long, default_value = "human", env = "BALLOT_LOG_FORMAT")]
    log_format: LogFormat,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the API server.
    Serve,
}

/// File-backed base configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct DaemonConfig {
    listen: String,
    port: u16,
    data_dir: PathBuf,
    map_size_mb: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./ballot_data"),
            map_size_mb: 1024,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    ballot_utils::init_logging(cli.log_format, &cli.log_level);

    let file_config: Option<DaemonConfig> = if let Some(ref config_path) = cli.config {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str::<DaemonConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("Loaded config from {}", config_path.display());
                    Some(cfg)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {e}, using CLI defaults");
                    None
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {e}, using CLI defaults",
                    config_path.display()
                );
                None
            }
        }
    } else {
        None
    };

    let base = file_config.unwrap_or_default();
    let config = DaemonConfig {
        listen: cli.listen.unwrap_or(base.listen),
        port: cli.port.unwrap_or(base.port),
        data_dir: cli.data_dir.unwrap_or(base.data_dir),
        map_size_mb: cli.map_size_mb.unwrap_or(base.map_size_mb),
    };

    match cli.command {
        Command::Serve => {
            let addr: SocketAddr = format!("{}:{}", config.listen, config.port).parse()?;
            tracing::info!(
                "Starting ballot platform on {} (data dir: {})",
                addr,
                config.data_dir.display(),
            );

            let store = Arc::new(LmdbEnvironment::open(
                &config.data_dir,
                config.map_size_mb * 1024 * 1024,
            )?);

            ballot_rpc::serve(store, addr).await?;

            tracing::info!("Ballot daemon exited cleanly");
        }
    }

    Ok(())
}
