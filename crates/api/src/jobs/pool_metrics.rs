//! Connection pool gauges.

use sqlx::PgPool;
use tracing::warn;

use super::scheduler::{Job, JobFrequency};

/// Saturation above which each sample is logged.
const SATURATION_WARNING: f64 = 0.9;

pub struct PoolMetricsJob {
    pool: PgPool,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(15)
    }

    async fn execute(&self) -> Result<(), String> {
        let snapshot = persistence::metrics::record_pool_metrics(&self.pool);
        if snapshot.saturation() >= SATURATION_WARNING {
            warn!(
                active = snapshot.active(),
                max = snapshot.max,
                "Database pool nearly exhausted"
            );
        }
        Ok(())
    }
}
