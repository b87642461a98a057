// manager/src/lifecycle.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::{compute_stats, JobId, JobRecord, JobStats, JobStatus};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::error::{JobError, Result};
use crate::runner::{ProcessOutput, ProcessRunner};
use crate::state::JobRegistry;

/// Qué camino lanzó la ejecución. Un crash sólo agenda reintento
/// cuando viene del job original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Original,
    Retry,
}

/// Controlador del ciclo de vida de los jobs:
/// crea registros, lanza procesos, clasifica resultados y agenda reintentos.
#[derive(Clone)]
pub struct JobManager {
    registry: Arc<JobRegistry>,
    runner: Arc<ProcessRunner>,
    retry_delay: Duration,
}

impl JobManager {
    pub fn new(runner: ProcessRunner, retry_delay: Duration) -> Self {
        Self {
            registry: Arc::new(JobRegistry::new()),
            runner: Arc::new(runner),
            retry_delay,
        }
    }

    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /* ---------------- operaciones públicas ---------------- */

    /// Registra un job nuevo en `running` y dispara su proceso.
    /// Devuelve el id sin esperar a que el proceso termine.
    pub fn start_job(&self, name: String, arguments: Vec<String>) -> Result<JobId> {
        let job = JobRecord::new(name, arguments);
        let job_id = job.id.clone();
        let job_name = job.name.clone();

        self.registry.insert(job)?;
        let total_jobs = self.registry.len()?;
        info!(job_id = %job_id, name = %job_name, total_jobs, "job creado");

        let manager = self.clone();
        let id = job_id.clone();
        tokio::spawn(async move {
            manager.execute(id, Attempt::Original).await;
        });

        Ok(job_id)
    }

    pub fn get_job(&self, id: &str) -> Result<Option<JobRecord>> {
        self.registry.get(id)
    }

    pub fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        self.registry.list()
    }

    pub fn history(&self) -> Result<Vec<JobRecord>> {
        self.registry.history()
    }

    pub fn stats(&self) -> Result<JobStats> {
        let history = self.history()?;
        Ok(compute_stats(&history))
    }

    /* ---------------- ejecución ---------------- */

    async fn execute(&self, job_id: JobId, attempt: Attempt) {
        let job = match self.registry.get(&job_id) {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!(job_id = %job_id, "job desapareció antes de ejecutarse");
                return;
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "no se pudo leer el registro");
                return;
            }
        };

        let child = match self.runner.launch(&job.name, &job.arguments) {
            Ok(child) => child,
            Err(e) => {
                self.on_crash(&job_id, attempt, e);
                return;
            }
        };

        // un reintento pasa de `retrying` a `running` al arrancar su proceso
        if let Err(e) = self.registry.update(&job_id, |job| job.status = JobStatus::Running) {
            error!(job_id = %job_id, error = %e, "no se pudo marcar el job como running");
        }
        debug!(job_id = %job_id, ?attempt, "proceso lanzado");

        match ProcessRunner::wait(child).await {
            Ok(output) => self.on_exit(&job_id, output),
            Err(e) => self.on_crash(&job_id, attempt, e),
        }
    }

    fn on_exit(&self, job_id: &str, output: ProcessOutput) {
        let status = if output.success() {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };

        let updated = self.registry.update(job_id, |job| {
            job.finish(status, Utc::now());
            job.exit_code = output.exit_code;
            job.stdout = Some(output.stdout);
            job.stderr = Some(output.stderr);
            (job.duration, job.can_retry())
        });

        match updated {
            Ok(Some((duration_ms, can_retry))) => {
                info!(
                    job_id = %job_id,
                    status = %status,
                    exit_code = ?output.exit_code,
                    duration_ms = ?duration_ms,
                    "proceso terminado"
                );
                if status == JobStatus::Failed && can_retry {
                    self.schedule_retry(job_id.to_string());
                }
            }
            Ok(None) => warn!(job_id = %job_id, "job terminado pero no está en el registro"),
            Err(e) => error!(job_id = %job_id, error = %e, "no se pudo guardar el resultado"),
        }
    }

    fn on_crash(&self, job_id: &str, attempt: Attempt, err: JobError) {
        let message = err.to_string();
        warn!(job_id = %job_id, ?attempt, error = %message, "el proceso no pudo ejecutarse");

        let updated = self.registry.update(job_id, |job| {
            job.finish(JobStatus::Crashed, Utc::now());
            job.error = Some(message);
            job.can_retry()
        });

        match updated {
            // un crash durante un reintento se absorbe: no hay tercer intento
            Ok(Some(can_retry)) if attempt == Attempt::Original && can_retry => {
                self.schedule_retry(job_id.to_string());
            }
            Ok(_) => {}
            Err(e) => error!(job_id = %job_id, error = %e, "no se pudo guardar el crash"),
        }
    }

    /* ---------------- reintentos ---------------- */

    /// Timer de una sola vez, sin handle de cancelación.
    fn schedule_retry(&self, original_id: JobId) {
        info!(
            job_id = %original_id,
            delay_ms = self.retry_delay.as_millis() as u64,
            "reintento agendado"
        );

        let manager = self.clone();
        tokio::spawn(async move {
            sleep(manager.retry_delay).await;
            manager.retry_job(original_id).await;
        });
    }

    async fn retry_job(&self, original_id: JobId) {
        let original = match self.registry.get(&original_id) {
            Ok(Some(job)) => job,
            Ok(None) => {
                warn!(job_id = %original_id, "job original no encontrado, no se reintenta");
                return;
            }
            Err(e) => {
                error!(job_id = %original_id, error = %e, "no se pudo leer el job original");
                return;
            }
        };

        if !original.can_retry() {
            debug!(
                job_id = %original_id,
                retry_count = original.retry_count,
                max_retries = original.max_retries,
                "sin presupuesto de reintentos"
            );
            return;
        }

        let retry = JobRecord::retry_of(&original);
        let retry_id = retry.id.clone();

        if let Err(e) = self.registry.insert(retry) {
            error!(job_id = %original_id, error = %e, "no se pudo registrar el reintento");
            return;
        }

        info!(
            job_id = %retry_id,
            original_job_id = %original_id,
            name = %original.name,
            "reintento creado"
        );

        self.execute(retry_id, Attempt::Retry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::SimulatorCommand;
    use std::collections::HashSet;
    use std::path::PathBuf;
    use std::time::Instant;

    const RETRY_DELAY: Duration = Duration::from_millis(20);

    fn manager_with(command: &str, args: &[&str], work_dir: PathBuf) -> JobManager {
        let sim = SimulatorCommand {
            command: command.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            script_path: PathBuf::from(command),
        };
        JobManager::new(ProcessRunner::new(sim, work_dir), RETRY_DELAY)
    }

    fn sh_manager(script: &str) -> JobManager {
        manager_with("sh", &["-c", script], std::env::temp_dir())
    }

    /// Espera hasta que el historial cumpla `done` (máx. 10s).
    async fn wait_for<F>(manager: &JobManager, done: F) -> Vec<JobRecord>
    where
        F: Fn(&[JobRecord]) -> bool,
    {
        let deadline = Instant::now() + Duration::from_secs(10);
        loop {
            let history = manager.history().unwrap();
            if done(&history) {
                return history;
            }
            assert!(Instant::now() < deadline, "timeout esperando: {:?}", history);
            sleep(Duration::from_millis(10)).await;
        }
    }

    fn all_finished(history: &[JobRecord]) -> bool {
        !history.is_empty() && history.iter().all(|j| j.is_finished())
    }

    #[tokio::test]
    async fn start_job_devuelve_el_id_sin_esperar_al_proceso() {
        let manager = sh_manager("sleep 1");

        let id = manager.start_job("lento".to_string(), vec![]).unwrap();

        let job = manager.get_job(&id).unwrap().unwrap();
        assert_eq!(job.status, JobStatus::Running);
        assert!(job.end_time.is_none());
        assert!(job.duration.is_none());
        assert!(job.exit_code.is_none());
    }

    #[tokio::test]
    async fn exit_cero_queda_completed_sin_reintento() {
        let manager = sh_manager("echo ok");

        let id = manager.start_job("exito".to_string(), vec!["a".to_string()]).unwrap();
        wait_for(&manager, all_finished).await;
        // margen para que un reintento (si lo hubiera) apareciera
        sleep(RETRY_DELAY * 5).await;

        let history = manager.history().unwrap();
        assert_eq!(history.len(), 1);

        let job = &history[0];
        assert_eq!(job.id, id);
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.exit_code, Some(0));
        assert_eq!(job.stdout.as_deref(), Some("ok\n"));
        assert_eq!(job.retry_count, 0);

        let end = job.end_time.unwrap();
        assert_eq!(job.duration, Some((end - job.start_time).num_milliseconds()));
    }

    #[tokio::test]
    async fn fallo_genera_exactamente_un_reintento() {
        let manager = sh_manager("echo fallo >&2; exit 2");

        let id = manager.start_job("falla".to_string(), vec!["x".to_string()]).unwrap();
        let history = wait_for(&manager, |h| h.len() == 2 && all_finished(h)).await;
        sleep(RETRY_DELAY * 5).await;

        assert_eq!(manager.history().unwrap().len(), 2);

        let original = &history[0];
        assert_eq!(original.id, id);
        assert_eq!(original.status, JobStatus::Failed);
        assert_eq!(original.exit_code, Some(2));
        assert_eq!(original.stderr.as_deref(), Some("fallo\n"));
        assert_eq!(original.retry_count, 0);
        assert!(original.original_job_id.is_none());

        let retry = &history[1];
        assert_ne!(retry.id, id);
        assert_eq!(retry.status, JobStatus::Failed);
        assert_eq!(retry.retry_count, 1);
        assert_eq!(retry.max_retries, 1);
        assert_eq!(retry.original_job_id.as_deref(), Some(id.as_str()));
        assert_eq!(retry.name, "falla");
        assert_eq!(retry.arguments, vec!["x"]);
        assert!(retry.start_time >= original.end_time.unwrap());
    }

    #[tokio::test]
    async fn reintento_exitoso_deja_el_original_en_failed() {
        let dir = std::env::temp_dir().join(format!("lifecycle-{}", common::new_job_id()));
        std::fs::create_dir_all(&dir).unwrap();
        let manager = manager_with(
            "sh",
            &["-c", "if [ -f marca ]; then exit 0; else touch marca; exit 1; fi"],
            dir.clone(),
        );

        manager.start_job("flaky".to_string(), vec![]).unwrap();
        let history = wait_for(&manager, |h| h.len() == 2 && all_finished(h)).await;

        assert_eq!(history[0].status, JobStatus::Failed);
        assert_eq!(history[0].exit_code, Some(1));
        assert_eq!(history[1].status, JobStatus::Completed);
        assert_eq!(history[1].exit_code, Some(0));
        assert_eq!(history[1].original_job_id.as_ref(), Some(&history[0].id));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn error_de_lanzamiento_queda_crashed_y_se_reintenta_una_vez() {
        let manager = manager_with("/no/existe/cpp-simulator.sh", &[], std::env::temp_dir());

        let id = manager.start_job("crash".to_string(), vec![]).unwrap();
        let history = wait_for(&manager, |h| h.len() == 2 && all_finished(h)).await;
        sleep(RETRY_DELAY * 5).await;

        assert_eq!(manager.history().unwrap().len(), 2);

        let original = &history[0];
        assert_eq!(original.id, id);
        assert_eq!(original.status, JobStatus::Crashed);
        assert!(original.exit_code.is_none());
        assert!(original.duration.is_some());
        assert!(original.error.as_deref().unwrap().contains("/no/existe/cpp-simulator.sh"));

        let retry = &history[1];
        assert_eq!(retry.status, JobStatus::Crashed);
        assert_eq!(retry.retry_count, 1);
        assert_eq!(retry.original_job_id.as_deref(), Some(id.as_str()));
        assert!(retry.error.is_some());
    }

    #[tokio::test]
    async fn creaciones_concurrentes_dan_ids_distintos() {
        let manager = sh_manager("exit 0");

        let mut handles = Vec::new();
        for i in 0..20 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager.start_job(format!("job-{}", i), vec![]).unwrap()
            }));
        }
        let mut ids = HashSet::new();
        for h in handles {
            ids.insert(h.await.unwrap());
        }

        let history = wait_for(&manager, |h| h.len() == 20 && all_finished(h)).await;

        assert_eq!(ids.len(), 20);
        assert!(history.iter().all(|j| j.status == JobStatus::Completed));
        let listed: HashSet<JobId> = manager.list_jobs().unwrap().into_iter().map(|j| j.id).collect();
        assert_eq!(listed, ids);
    }

    #[tokio::test]
    async fn stats_escenario_short_y_test_batch() {
        let manager = sh_manager("exit 0");

        manager.start_job("short".to_string(), vec![]).unwrap();
        manager.start_job("test-batch-job-99".to_string(), vec![]).unwrap();
        wait_for(&manager, |h| h.len() == 2 && all_finished(h)).await;

        let stats = manager.stats().unwrap();

        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.overall_success_rate, 1.0);
        assert_eq!(stats.patterns.len(), 3);
        assert!(stats.patterns.iter().all(|p| p.match_count == 1
            && p.success_rate == 1.0
            && p.difference_from_average == "+0%"));
        assert!(!stats.patterns.iter().any(|p| p.pattern == "Jobs with 3+ arguments"));
    }

    #[tokio::test]
    async fn stats_cuenta_reintentos_en_el_historial() {
        let manager = sh_manager("exit 1");

        manager.start_job("siempre-falla".to_string(), vec![]).unwrap();
        wait_for(&manager, |h| h.len() == 2 && all_finished(h)).await;

        let stats = manager.stats().unwrap();

        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.overall_success_rate, 0.0);
        let long = stats.patterns.iter().find(|p| p.pattern == "Job name length > 10").unwrap();
        assert_eq!(long.match_count, 2);
        assert_eq!(long.success_rate, 0.0);
        assert_eq!(long.difference_from_average, "+0%");
    }
}
