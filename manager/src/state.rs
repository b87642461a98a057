// manager/src/state.rs

use common::{JobId, JobRecord};
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Instant,
};

use crate::error::{JobError, Result};
use crate::lifecycle::JobManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: JobManager,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(manager: JobManager) -> Self {
        Self {
            manager,
            started_at: Instant::now(),
        }
    }
}

/// Registro en memoria de todos los jobs.
///
/// `jobs` guarda el registro vigente de cada id (se muta en el lugar);
/// `history` es el orden de creación, sólo se agrega. No hay borrado.
#[derive(Debug, Default)]
pub struct JobRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    jobs: HashMap<JobId, JobRecord>,
    history: Vec<JobId>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, RegistryInner>> {
        self.inner.lock().map_err(|_| JobError::RegistryPoisoned)
    }

    /// Agrega un registro nuevo al mapa y al historial.
    pub fn insert(&self, job: JobRecord) -> Result<()> {
        let mut inner = self.lock()?;
        if inner.jobs.contains_key(&job.id) {
            return Err(JobError::DuplicateJobId(job.id));
        }
        inner.history.push(job.id.clone());
        inner.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<JobRecord>> {
        let inner = self.lock()?;
        Ok(inner.jobs.get(id).cloned())
    }

    /// Aplica `f` al registro vigente; None si el id no existe.
    pub fn update<F, R>(&self, id: &str, f: F) -> Result<Option<R>>
    where
        F: FnOnce(&mut JobRecord) -> R,
    {
        let mut inner = self.lock()?;
        Ok(inner.jobs.get_mut(id).map(f))
    }

    /// Foto de los registros vigentes, en orden de creación.
    pub fn list(&self) -> Result<Vec<JobRecord>> {
        let inner = self.lock()?;
        Ok(inner
            .history
            .iter()
            .filter_map(|id| inner.jobs.get(id))
            .cloned()
            .collect())
    }

    /// Foto del historial completo (originales y reintentos), en orden de creación.
    pub fn history(&self) -> Result<Vec<JobRecord>> {
        let inner = self.lock()?;
        let mut out = Vec::with_capacity(inner.history.len());
        for id in &inner.history {
            if let Some(job) = inner.jobs.get(id) {
                out.push(job.clone());
            }
        }
        Ok(out)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.history.len())
    }
}
