//! keyproof daemon: verifies user proofs and keeps the search index current.

mod commands;
mod logging;

use clap::Parser;
use keyproof_users::UsersConfig;
use logging::{init_logging, LogFormat};
use serde_json::Value;
use std::path::PathBuf;

use crate::commands::App;

#[derive(Parser)]
#[command(name = "keyproof-daemon", about = "keyproof user proof verifier")]
struct Cli {
    /// Data directory for the document store.
    #[arg(long, env = "KEYPROOF_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "KEYPROOF_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "KEYPROOF_LOG_FORMAT")]
    log_format: Option<String>,

    /// Bearer token for the twitter API.
    #[arg(long, env = "KEYPROOF_TWITTER_BEARER_TOKEN", hide_env_values = true)]
    twitter_bearer_token: Option<String>,

    /// Timeout in seconds for a single proof check.
    #[arg(long, env = "KEYPROOF_HTTP_TIMEOUT_SECS")]
    http_timeout_secs: Option<u64>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "KEYPROOF_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Check a claim without storing anything.
    Check {
        #[arg(long)]
        kid: String,
        #[arg(long)]
        service: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
    },
    /// Re-check a key's current claim and update the indexes.
    Update { kid: String },
    /// Show the stored result for a key.
    Find { kid: String },
    /// Search by key id or `name@service` prefix.
    Search {
        query: String,
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    /// List keys whose stored result has a status.
    Status { status: String },
    /// List keys due for a re-check.
    Expired,
    /// Re-check expired keys periodically until Ctrl+C.
    Sweep {
        /// Run a single pass and exit.
        #[arg(long)]
        once: bool,
    },
    /// Rebuild the identity indexes from the kid records.
    Reindex,
    /// Import a sigchain from a JSON file and update the key.
    Import { path: PathBuf },
}

fn load_config(cli: &Cli) -> anyhow::Result<UsersConfig> {
    let mut config = match &cli.config {
        Some(path) => UsersConfig::from_toml_file(&path.to_string_lossy())?,
        None => UsersConfig::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(token) = &cli.twitter_bearer_token {
        config.twitter_bearer_token = Some(token.clone());
    }
    if let Some(secs) = cli.http_timeout_secs {
        config.http_timeout_secs = secs;
    }
    Ok(config)
}

fn print(value: Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let format: LogFormat = config.log_format.parse().map_err(anyhow::Error::msg)?;
    init_logging(format, &config.log_level);

    if let Some(path) = &cli.config {
        tracing::info!("loaded config from {}", path.display());
    }
    let app = App::open(config)?;

    match cli.command {
        Command::Check {
            kid,
            service,
            name,
            url,
        } => {
            let result = commands::check(&app, &kid, &service, &name, &url).await?;
            print(serde_json::to_value(result)?)?;
        }
        Command::Update { kid } => {
            let result = commands::update(&app, &kid).await?;
            print(serde_json::to_value(result)?)?;
        }
        Command::Find { kid } => {
            let result = commands::find(&app, &kid)?;
            print(serde_json::to_value(result)?)?;
        }
        Command::Search { query, limit } => {
            let results = commands::search(&app, &query, limit)?;
            print(serde_json::to_value(results)?)?;
        }
        Command::Status { status } => {
            let kids = commands::status(&app, &status)?;
            print(serde_json::to_value(kids)?)?;
        }
        Command::Expired => {
            let kids = app
                .users
                .expired(app.config.stale_after(), app.config.max_age())?;
            print(serde_json::to_value(kids)?)?;
        }
        Command::Sweep { once } => {
            if once {
                let report = app
                    .users
                    .check_expired(app.config.stale_after(), app.config.max_age())
                    .await?;
                print(serde_json::json!({
                    "checked": report.checked,
                    "failed": report.failed,
                }))?;
            } else {
                tracing::info!(
                    interval_secs = app.config.sweep_interval_secs,
                    "starting sweep, Ctrl+C to stop"
                );
                commands::sweep(&app, app.config.sweep_interval(), async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;
            }
        }
        Command::Reindex => {
            let indexed = app.users.reindex()?;
            print(serde_json::json!({ "indexed": indexed }))?;
        }
        Command::Import { path } => {
            let json = std::fs::read_to_string(&path)?;
            let kid = commands::import(&app, &json)?;
            let result = app.users.update(&kid).await?;
            print(serde_json::json!({ "kid": kid, "result": result }))?;
        }
    }

    Ok(())
}
