use anyhow::{Context, Result};
use clap::Parser;
use lime_config::{ConfigLoader, LimeConfig};
use lime_service::cli::{Cli, Command};
use lime_service::server;
use lime_service::service::Gateway;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let config = load_config(&cli).await;
	let log_level = cli
		.log_level
		.clone()
		.or_else(|| config.as_ref().ok().map(|c| c.server.log_level.clone()))
		.unwrap_or_else(|| "info".to_string());
	setup_tracing(&log_level)?;

	let config = config?;
	match cli.command.unwrap_or(Command::Start) {
		Command::Start => start_service(config).await,
		Command::Validate => {
			info!(config = ?cli.config, "Configuration is valid");
			Ok(())
		}
	}
}

async fn load_config(cli: &Cli) -> Result<LimeConfig> {
	ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.with_context(|| format!("Failed to load configuration from {:?}", cli.config))
}

async fn start_service(config: LimeConfig) -> Result<()> {
	info!("Starting Lime gateway");

	let gateway = Gateway::from_config(&config).context("Failed to build gateway")?;

	let address = format!("{}:{}", config.server.host, config.server.port);
	let listener = TcpListener::bind(&address)
		.await
		.with_context(|| format!("Failed to bind {}", address))?;

	server::serve(
		listener,
		server::router(gateway.dispatcher.clone()),
		setup_shutdown_signal(),
	)
	.await
	.context("HTTP server failed")?;

	info!("Shutdown signal received, draining cache writes");
	gateway.writer.drain().await;

	info!("Lime gateway stopped");
	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.try_init()
		.context("Failed to initialize tracing")?;

	Ok(())
}

async fn setup_shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to listen for Ctrl+C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut sigterm) => {
				sigterm.recv().await;
			}
			Err(e) => {
				tracing::error!(error = %e, "Failed to install SIGTERM handler");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
