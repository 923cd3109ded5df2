use serde::Serialize;
use utoipa::ToSchema;

/// Result of a maintenance job run.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobReport {
    /// Job name, e.g. `unlock_expired_seats`.
    pub job: String,
    /// Number of records the run changed.
    pub changed: u64,
}

impl JobReport {
    pub fn new(job: &str, changed: u64) -> Self {
        Self {
            job: job.to_owned(),
            changed,
        }
    }
}
