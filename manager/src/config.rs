// manager/src/config.rs

use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Configuración del servicio, leída de variables de entorno:
/// - PORT: puerto HTTP (default 3000)
/// - SIMULATOR_WORKDIR: directorio de trabajo de los procesos (default: cwd)
/// - SIMULATOR_COMMAND: reemplaza el comando resuelto por plataforma
/// - RETRY_DELAY_MS: espera antes de lanzar un reintento (default 1000)
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub port: u16,
    pub work_dir: PathBuf,
    pub simulator_command: Option<String>,
    pub retry_delay: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            work_dir: PathBuf::from("."),
            simulator_command: None,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl ManagerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(defaults.port);

        let work_dir = lookup("SIMULATOR_WORKDIR")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok())
            .unwrap_or(defaults.work_dir);

        let simulator_command = lookup("SIMULATOR_COMMAND").filter(|s| !s.trim().is_empty());

        let retry_delay = lookup("RETRY_DELAY_MS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry_delay);

        Self {
            port,
            work_dir,
            simulator_command,
            retry_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(vars: &[(&str, &str)]) -> ManagerConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ManagerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_sin_variables() {
        let cfg = from_map(&[]);

        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.retry_delay, Duration::from_millis(1000));
        assert!(cfg.simulator_command.is_none());
        assert_eq!(cfg.work_dir, env::current_dir().unwrap());
    }

    #[test]
    fn lee_las_variables_de_entorno() {
        let cfg = from_map(&[
            ("PORT", "8081"),
            ("SIMULATOR_WORKDIR", "/srv/sim"),
            ("SIMULATOR_COMMAND", "/usr/bin/true"),
            ("RETRY_DELAY_MS", "50"),
        ]);

        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.work_dir, PathBuf::from("/srv/sim"));
        assert_eq!(cfg.simulator_command.as_deref(), Some("/usr/bin/true"));
        assert_eq!(cfg.retry_delay, Duration::from_millis(50));
    }

    #[test]
    fn valores_invalidos_vuelven_al_default() {
        let cfg = from_map(&[("PORT", "no-es-numero"), ("RETRY_DELAY_MS", "-3"), ("SIMULATOR_COMMAND", "  ")]);

        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.retry_delay, Duration::from_millis(1000));
        assert!(cfg.simulator_command.is_none());
    }
}
