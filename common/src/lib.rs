pub mod api;
pub mod job;
pub mod stats;

pub use api::{ErrorResponse, HealthResponse, JobCreateRequest, JobCreateResponse, JobsListResponse};
pub use job::{new_job_id, JobId, JobRecord, JobResponse, JobStatus, MAX_RETRIES};
pub use stats::{compute_stats, JobPattern, JobStats};
