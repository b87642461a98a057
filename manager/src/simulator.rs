// manager/src/simulator.rs

use std::path::{Path, PathBuf};

/// Comando a lanzar para cada job; los argumentos del job se agregan después de `args`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorCommand {
    pub command: String,
    pub args: Vec<String>,
    pub script_path: PathBuf,
}

impl SimulatorCommand {
    /// Resuelve el script del simulador según el sistema operativo.
    /// - windows: `cmd /c cpp-simulator.bat`
    /// - resto: `<base_dir>/cpp-simulator.sh` directamente
    pub fn for_platform(os: &str, base_dir: &Path) -> Self {
        if os == "windows" {
            Self {
                command: "cmd".to_string(),
                args: vec!["/c".to_string(), "cpp-simulator.bat".to_string()],
                script_path: base_dir.join("cpp-simulator.bat"),
            }
        } else {
            let script_path = base_dir.join("cpp-simulator.sh");
            Self {
                command: script_path.to_string_lossy().to_string(),
                args: Vec::new(),
                script_path,
            }
        }
    }

    /// Plataforma actual, con override opcional del comando (SIMULATOR_COMMAND).
    pub fn resolve(base_dir: &Path, override_command: Option<&str>) -> Self {
        match override_command {
            Some(command) => Self {
                command: command.to_string(),
                args: Vec::new(),
                script_path: PathBuf::from(command),
            },
            None => Self::for_platform(std::env::consts::OS, base_dir),
        }
    }

    /// Vector de argumentos completo: `[args fijos] + [nombre] + [argumentos del job]`.
    pub fn argv(&self, job_name: &str, job_args: &[String]) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.args.len() + 1 + job_args.len());
        argv.extend(self.args.iter().cloned());
        argv.push(job_name.to_string());
        argv.extend(job_args.iter().cloned());
        argv
    }
}
