mod config;
mod error;
mod handlers;
mod lifecycle;
mod runner;
mod simulator;
mod state;

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::ManagerConfig;
use crate::lifecycle::JobManager;
use crate::runner::ProcessRunner;
use crate::simulator::SimulatorCommand;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("manager=debug,tower_http=info")),
        )
        .init();

    let config = ManagerConfig::from_env();

    let simulator =
        SimulatorCommand::resolve(&config.work_dir, config.simulator_command.as_deref());
    info!(
        platform = std::env::consts::OS,
        command = %simulator.command,
        args = ?simulator.args,
        script = %simulator.script_path.display(),
        work_dir = %config.work_dir.display(),
        "simulador resuelto"
    );
    if !simulator.script_path.exists() {
        warn!(
            "no se encontró {}; los jobs van a quedar como crashed",
            simulator.script_path.display()
        );
    }

    let runner = ProcessRunner::new(simulator, config.work_dir.clone());
    let manager = JobManager::new(runner, config.retry_delay);
    info!(command = %manager.runner().simulator().command, "job manager listo");

    let app = handlers::build_router(AppState::new(manager));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", addr))?;
    info!("job manager escuchando en {}", listener.local_addr()?);
    for endpoint in handlers::AVAILABLE_ENDPOINTS {
        info!("  {}", endpoint);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("el servidor HTTP terminó con error")?;

    info!("job manager detenido");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("no se pudo instalar el handler de Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Ctrl-C recibido, cerrando");
}
