use common::JobId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job id already registered: {0}")]
    DuplicateJobId(JobId),

    #[error("Failed to launch {command}: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to collect process output: {0}")]
    Wait(#[source] std::io::Error),

    #[error("Job registry lock poisoned")]
    RegistryPoisoned,
}

pub type Result<T> = std::result::Result<T, JobError>;
