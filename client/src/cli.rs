use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para hablar con el job manager")]
pub struct Cli {
    /// URL base del servicio (default: MANAGER_URL o http://localhost:3000)
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Envía un job nuevo con nombre y argumentos
    Submit {
        #[arg(value_name = "NOMBRE")]
        name: String,
        #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Lista todos los jobs
    Jobs,
    /// Consulta un job por id
    Job {
        #[arg(value_name = "JOB_ID")]
        id: String,
    },
    /// Estadísticas y patrones
    Stats,
    /// Estado del servicio
    Health,
    /// Lanza un lote de jobs de prueba en paralelo, espera y muestra jobs + stats
    Smoke {
        /// Segundos a esperar antes de consultar resultados
        #[arg(long, default_value = "8")]
        wait_secs: u64,
    },
}

/// Lote fijo de jobs que usa `smoke`: (nombre, argumentos)
pub const SMOKE_JOBS: &[(&str, &[&str])] = &[
    ("data-processor-1", &["input.csv", "output.json"]),
    ("test-batch-job", &["--verbose", "--debug", "--output=/tmp"]),
    ("short", &[]),
    ("very-long-job-name-with-many-characters", &["arg1"]),
    ("process42", &["data1", "data2"]),
    ("test-validation", &["--strict"]),
    ("x-factor", &["input"]),
    ("background-task", &["--async", "--timeout=30", "--retry=3"]),
];
