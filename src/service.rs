//! Listener lifecycle.
//!
//! [`BridgeService`] owns at most one running server. Starting binds the
//! listener and spawns the axum server; stopping signals graceful shutdown and
//! waits for it to finish. Dropping a running service also shuts the server
//! down, since the shutdown sender goes with it.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::info;

use crate::server::{build_router, AppState};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Bridge is already running on {0}")]
    AlreadyRunning(SocketAddr),

    #[error("Bridge is not running")]
    NotRunning,

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Server(#[from] std::io::Error),

    #[error("Server task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Running(SocketAddr),
    Stopped,
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceStatus::Running(addr) => write!(f, "running on http://{addr}"),
            ServiceStatus::Stopped => write!(f, "stopped"),
        }
    }
}

/// A line typed on the control console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Restart,
    Status,
    Quit,
}

impl FromStr for ControlCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(ControlCommand::Start),
            "stop" => Ok(ControlCommand::Stop),
            "restart" => Ok(ControlCommand::Restart),
            "status" => Ok(ControlCommand::Status),
            "quit" | "exit" => Ok(ControlCommand::Quit),
            other => Err(format!(
                "unknown command {other:?} (expected start, stop, restart, status or quit)"
            )),
        }
    }
}

struct RunningServer {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

pub struct BridgeService {
    addr: SocketAddr,
    state: Arc<AppState>,
    running: Option<RunningServer>,
}

impl BridgeService {
    pub fn new(addr: SocketAddr, state: Arc<AppState>) -> Self {
        Self {
            addr,
            state,
            running: None,
        }
    }

    pub fn status(&self) -> ServiceStatus {
        match &self.running {
            Some(running) => ServiceStatus::Running(running.local_addr),
            None => ServiceStatus::Stopped,
        }
    }

    /// Bind the listener and start serving. Returns the bound address.
    pub async fn start(&mut self) -> Result<SocketAddr, ServiceError> {
        if let Some(running) = &self.running {
            return Err(ServiceError::AlreadyRunning(running.local_addr));
        }

        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|source| ServiceError::Bind {
                addr: self.addr,
                source,
            })?;
        let local_addr = listener.local_addr()?;

        let app = build_router(self.state.clone());
        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        log_banner(local_addr);
        self.running = Some(RunningServer {
            local_addr,
            shutdown,
            task,
        });
        Ok(local_addr)
    }

    /// Stop serving and wait for in-flight requests to finish.
    pub async fn stop(&mut self) -> Result<(), ServiceError> {
        let running = self.running.take().ok_or(ServiceError::NotRunning)?;
        let _ = running.shutdown.send(());
        running.task.await??;
        info!(addr = %running.local_addr, "Bridge stopped");
        Ok(())
    }

    /// Stop if running, then start again.
    pub async fn restart(&mut self) -> Result<SocketAddr, ServiceError> {
        if self.running.is_some() {
            self.stop().await?;
        }
        self.start().await
    }

    /// Run one console command. Returns `false` when the console should exit.
    pub async fn execute(&mut self, command: ControlCommand) -> Result<bool, ServiceError> {
        match command {
            ControlCommand::Start => {
                self.start().await?;
            }
            ControlCommand::Stop => self.stop().await?,
            ControlCommand::Restart => {
                self.restart().await?;
            }
            ControlCommand::Status => info!("Bridge {}", self.status()),
            ControlCommand::Quit => return Ok(false),
        }
        Ok(true)
    }
}

fn log_banner(addr: SocketAddr) {
    info!("Bridge started, listening on http://{addr}");
    info!("Ollama-compatible endpoints:");
    info!("  GET  /api/tags     - List models");
    info!("  POST /api/generate - Generate completion");
    info!("  POST /api/chat     - Chat completion");
    info!("OpenAI-compatible endpoints:");
    info!("  POST /v1/chat/completions - OpenAI chat completions");
    info!("Client setup: Ollama URL http://{addr}, model copilot:latest");
}
