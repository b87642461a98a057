use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type JobId = String;

/// Presupuesto de reintentos por linaje: exactamente un reintento por job original.
pub const MAX_RETRIES: u32 = 1;

/// Genera un id de job nuevo (UUID v4, 128 bits aleatorios).
pub fn new_job_id() -> JobId {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
    Crashed,
    Retrying,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Crashed => write!(f, "crashed"),
            JobStatus::Retrying => write!(f, "retrying"),
        }
    }
}

/// Registro completo de un intento de ejecución.
///
/// Un reintento es un registro nuevo (id nuevo) enlazado al original con
/// `original_job_id`; el registro original nunca se reescribe.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: JobId,
    pub name: String,
    pub arguments: Vec<String>,
    pub status: JobStatus,

    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    /// Milisegundos entre start_time y end_time
    pub duration: Option<i64>,

    pub retry_count: u32,
    pub max_retries: u32,
    pub original_job_id: Option<JobId>,

    /// -------- Datos de salida (sólo al terminar) --------
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub error: Option<String>,
}

impl JobRecord {
    pub fn new(name: String, arguments: Vec<String>) -> Self {
        Self {
            id: new_job_id(),
            name,
            arguments,
            status: JobStatus::Running,
            start_time: Utc::now(),
            end_time: None,
            exit_code: None,
            duration: None,
            retry_count: 0,
            max_retries: MAX_RETRIES,
            original_job_id: None,
            stdout: None,
            stderr: None,
            error: None,
        }
    }

    /// Construye el registro hijo que reintenta `original`.
    pub fn retry_of(original: &JobRecord) -> Self {
        Self {
            id: new_job_id(),
            name: original.name.clone(),
            arguments: original.arguments.clone(),
            status: JobStatus::Retrying,
            start_time: Utc::now(),
            end_time: None,
            exit_code: None,
            duration: None,
            retry_count: original.retry_count + 1,
            max_retries: original.max_retries,
            original_job_id: Some(original.id.clone()),
            stdout: None,
            stderr: None,
            error: None,
        }
    }

    /// Queda presupuesto para crear un reintento desde este registro.
    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Marca el estado final y sella end_time/duration.
    pub fn finish(&mut self, status: JobStatus, ended_at: DateTime<Utc>) {
        self.status = status;
        self.end_time = Some(ended_at);
        self.duration = Some((ended_at - self.start_time).num_milliseconds());
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    /// Vista pública del registro (sin stdout/stderr/error).
    pub fn to_response(&self) -> JobResponse {
        JobResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            arguments: self.arguments.clone(),
            status: self.status,
            start_time: self.start_time,
            end_time: self.end_time,
            duration: self.duration,
            retry_count: self.retry_count,
            original_job_id: self.original_job_id.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: JobId,
    pub name: String,
    pub arguments: Vec<String>,
    pub status: JobStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
    pub retry_count: u32,
    pub original_job_id: Option<JobId>,
}
