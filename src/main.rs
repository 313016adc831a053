use std::{net::SocketAddr, path::Path, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use rotor::{
    EndpointPool, EndpointSelector, Forwarder, GracefulShutdown, HttpClientAdapter, HttpServer,
    ProxyServer,
    config::{ConfigValidator, ProxyConfig, load_config},
    metrics, tracing_setup,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    /// Configuration file to use
    #[clap(short, long, global = true, default_value = "config.json")]
    config: String,

    /// Override the port of `listen_addr`
    #[clap(short, long, global = true)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate configuration file
    Validate,
    /// Start the proxy (default)
    Serve,
}

/// Load, apply CLI overrides and validate. Any failure is fatal.
async fn load_validated_config(config_path: &str, port: Option<u16>) -> Result<ProxyConfig> {
    if !Path::new(config_path).exists() {
        return Err(eyre!("Configuration file '{config_path}' not found"));
    }

    let mut config = load_config(config_path)
        .await
        .with_context(|| format!("Failed to load config from {config_path}"))?;
    if let Some(port) = port {
        config.override_port(port);
    }

    ConfigValidator::validate(&config)
        .with_context(|| format!("Invalid configuration in {config_path}"))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    match args.command {
        Some(Commands::Validate) => validate_config_command(&args.config, args.port).await,
        Some(Commands::Serve) | None => serve(&args.config, args.port).await,
    }
}

async fn serve(config_path: &str, port: Option<u16>) -> Result<()> {
    let config = load_validated_config(config_path, port).await?;

    tracing_setup::init_tracing(&config.log)
        .map_err(|e| eyre!("Failed to initialize tracing: {}", e))?;
    metrics::describe_metrics();

    let pool = EndpointPool::from_configs(&config.api_configs)
        .context("Failed to build endpoint pool")?;
    for (i, endpoint) in pool.iter().enumerate() {
        tracing::info!(
            "Endpoint {}: {} -> {}",
            i,
            endpoint.name(),
            endpoint.base_url()
        );
    }
    tracing::info!("Load balancing across {} API services.", pool.len());

    let upstream_timeout = config.upstream_timeout_secs.map(Duration::from_secs);
    if let Some(limit) = upstream_timeout {
        tracing::info!("Upstream timeout set to {:?}", limit);
    }
    let http_client = Arc::new(
        HttpClientAdapter::with_timeout(upstream_timeout)
            .context("Failed to create HTTP client adapter")?,
    );

    let selector = Arc::new(EndpointSelector::new(pool));
    let forwarder = Arc::new(Forwarder::new(selector, http_client));

    let graceful_shutdown = Arc::new(GracefulShutdown::new());
    let signal_handler_shutdown = graceful_shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = signal_handler_shutdown.run_signal_handler().await {
            tracing::error!("Signal handler error: {}", e);
        }
    });

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .context("Failed to parse listen address")?;
    tracing::info!("Starting proxy server on {}...", addr);

    ProxyServer::new(addr, forwarder, graceful_shutdown)
        .run()
        .await?;

    tracing::info!("Graceful shutdown completed");
    Ok(())
}

/// Validate configuration file and exit
async fn validate_config_command(config_path: &str, port: Option<u16>) -> Result<()> {
    println!("🔍 Validating configuration file: {config_path}");

    let config = load_validated_config(config_path, port).await?;
    let pool = EndpointPool::from_configs(&config.api_configs)?;

    println!("✅ Configuration validation: OK");
    println!();
    println!("📋 Configuration Summary:");
    println!("   • Listen Address: {}", config.listen_addr);
    println!("   • Endpoints: {}", pool.len());
    for endpoint in pool.iter() {
        println!("     - {} ({})", endpoint.name(), endpoint.base_url());
    }
    match config.upstream_timeout_secs {
        Some(secs) => println!("   • Upstream Timeout: {secs}s"),
        None => println!("   • Upstream Timeout: none"),
    }
    Ok(())
}
