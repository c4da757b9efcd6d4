use anyhow::{Context, Result};
use clap::Parser;
use lightfinder_api::{shutdown_signal, QueryService, Server, ServerConfig};
use lightfinder_core::config::{AppConfig, LogFormat};
use lightfinder_core::Registry;
use lightfinder_discovery::{build_enumerators, Scheduler};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Lightfinder - resolve smart light hardware addresses to their current IP
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "LIGHTFINDER_CONFIG")]
    config: Option<PathBuf>,

    /// Override HTTP listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override subnet broadcast address
    #[arg(short, long)]
    broadcast: Option<String>,

    /// Override polling interval in seconds
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Override log level
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.http.port = port;
        }
        if let Some(ref broadcast) = self.broadcast {
            config.discovery.wiz.broadcast_address = broadcast.clone();
        }
        if let Some(secs) = self.interval_secs {
            config.discovery.polling_interval_secs = secs;
        }
        if let Some(ref level) = self.log_level {
            config.logging.level = level.clone();
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let level = &config.logging.level;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives = [
            "lightfinder",
            "lightfinder_core",
            "lightfinder_discovery",
            "lightfinder_api",
            "tower_http",
        ]
        .map(|target| format!("{target}={level}"))
        .join(",");
        EnvFilter::new(directives)
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config =
        AppConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_tracing(&config);

    info!(
        config = ?args.config,
        http = %config.http.bind_address(),
        broadcast = %config.discovery.wiz.broadcast_address,
        interval_secs = config.discovery.polling_interval_secs,
        "Starting lightfinder"
    );

    let bind_addr: SocketAddr = config
        .http
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid HTTP bind address: {}", config.http.bind_address()))?;

    let registry = Registry::new();
    let enumerators = build_enumerators(&config.discovery, &registry)
        .await
        .context("Failed to start device enumerators")?;

    let shutdown = CancellationToken::new();
    let interval = config.discovery.polling_interval();
    let (scheduler, scheduler_task) = Scheduler::new(enumerators, interval)
        .with_cancellation(shutdown.child_token())
        .spawn();

    let service = QueryService::new(registry, scheduler, shutdown.clone());
    let server = Server::new(ServerConfig { bind_addr }, service);

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_token.cancel();
    });

    let result = server.run(shutdown.clone()).await;

    shutdown.cancel();
    if let Err(e) = scheduler_task.await {
        error!(error = %e, "Scheduler task failed");
    }

    if let Err(ref e) = result {
        error!(error = %e, "Server error");
    }
    result
}
