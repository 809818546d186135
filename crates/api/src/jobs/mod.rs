//! Background job scheduler and job implementations.

mod pool_metrics;
mod scheduler;
mod session_cleanup;

pub use pool_metrics::PoolMetricsJob;
pub use scheduler::{run_once, Job, JobFrequency, JobScheduler};
pub use session_cleanup::SessionCleanupJob;
