use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use ollama_bridge::backend::provider_from_config;
use ollama_bridge::config::{Cli, Config};
use ollama_bridge::server::AppState;
use ollama_bridge::service::{BridgeService, ControlCommand, ServiceStatus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments.
    let cli = Cli::parse();

    // Initialize tracing/logging.
    let filter = if cli.verbose {
        "ollama_bridge=debug,tower_http=debug"
    } else {
        "ollama_bridge=info,tower_http=info"
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with_target(true);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    info!("ollama-bridge v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration.
    let mut config = Config::load(&cli.config)?;
    config.apply_cli(&cli);

    info!(
        host = config.server.host,
        port = config.server.port,
        provider = ?config.backend.provider,
        default_family = config.backend.default_family,
        "Configuration loaded"
    );

    let provider = provider_from_config(&config.backend)?;
    let state = Arc::new(AppState::new(provider, &config));
    let mut service = BridgeService::new(config.server.listen_addr()?, state);

    if config.server.auto_start {
        if let Err(e) = service.start().await {
            error!("Failed to start: {e}");
        }
    } else {
        info!("Auto-start disabled; type `start` to begin serving");
    }

    // Control console: one command per stdin line until quit or Ctrl-C.
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) if line.trim().is_empty() => continue,
                Some(line) => match line.parse::<ControlCommand>() {
                    Ok(command) => match service.execute(command).await {
                        Ok(true) => {}
                        Ok(false) => break,
                        Err(e) => warn!("{e}"),
                    },
                    Err(e) => warn!("{e}"),
                },
                None => {
                    // No console attached; serve until interrupted.
                    tokio::signal::ctrl_c().await?;
                    break;
                }
            },
        }
    }

    if matches!(service.status(), ServiceStatus::Running(_)) {
        service.stop().await?;
    }

    Ok(())
}
