// manager/src/runner.rs

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::debug;

use crate::error::{JobError, Result};
use crate::simulator::SimulatorCommand;

/// Resultado de un proceso que sí llegó a ejecutarse.
/// Un exit code distinto de 0 es un resultado normal, no un error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// None si el proceso terminó por una señal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Lanza el simulador para un job y junta stdout/stderr.
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    simulator: SimulatorCommand,
    work_dir: PathBuf,
}

impl ProcessRunner {
    pub fn new(simulator: SimulatorCommand, work_dir: PathBuf) -> Self {
        Self {
            simulator,
            work_dir,
        }
    }

    pub fn simulator(&self) -> &SimulatorCommand {
        &self.simulator
    }

    /// Arranca el proceso. Falla sólo si no se pudo lanzar (no existe, permisos, ...).
    pub fn launch(&self, job_name: &str, job_args: &[String]) -> Result<Child> {
        let argv = self.simulator.argv(job_name, job_args);
        debug!(command = %self.simulator.command, ?argv, "lanzando proceso");

        Command::new(&self.simulator.command)
            .args(&argv)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| JobError::Launch {
                command: self.simulator.command.clone(),
                source,
            })
    }

    /// Espera a que el proceso termine, acumulando stdout y stderr por separado.
    pub async fn wait(child: Child) -> Result<ProcessOutput> {
        let output = child.wait_with_output().await.map_err(JobError::Wait)?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
