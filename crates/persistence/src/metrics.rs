//! Database metrics collection.
//!
//! Query durations and connection pool gauges.

use metrics::{gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record database query duration.
///
/// Call this function after executing a query to record its duration.
pub fn record_query_duration(query_name: &str, duration_secs: f64) {
    histogram!(
        "portal_db_query_duration_seconds",
        "query" => query_name.to_string()
    )
    .record(duration_secs);
}

/// Point-in-time view of the connection pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolSnapshot {
    pub size: u32,
    pub idle: usize,
    pub max: u32,
}

impl PoolSnapshot {
    pub fn of(pool: &PgPool) -> Self {
        Self {
            size: pool.size(),
            idle: pool.num_idle(),
            max: pool.options().get_max_connections(),
        }
    }

    pub fn active(&self) -> usize {
        (self.size as usize).saturating_sub(self.idle)
    }

    /// Share of the pool ceiling currently checked out, 0.0 to 1.0.
    pub fn saturation(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.active() as f64 / f64::from(self.max)).min(1.0)
    }
}

/// Publishes pool gauges. Called from the readiness probe and a periodic job.
pub fn record_pool_metrics(pool: &PgPool) -> PoolSnapshot {
    let snapshot = PoolSnapshot::of(pool);

    gauge!("portal_db_connections_active").set(snapshot.active() as f64);
    gauge!("portal_db_connections_idle").set(snapshot.idle as f64);
    gauge!("portal_db_connections_total").set(f64::from(snapshot.size));
    gauge!("portal_db_pool_saturation").set(snapshot.saturation());

    snapshot
}

/// A helper to time database operations and record metrics.
///
/// Usage:
/// ```ignore
/// let timer = QueryTimer::new("find_application_by_id");
/// let result = sqlx::query_as::<_, ApplicationEntity>(...).fetch_optional(&pool).await;
/// timer.record();
/// result
/// ```
pub struct QueryTimer {
    query_name: String,
    start: Instant,
}

impl QueryTimer {
    /// Create a new timer for the given query name.
    pub fn new(query_name: impl Into<String>) -> Self {
        Self {
            query_name: query_name.into(),
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration to metrics.
    pub fn record(self) {
        let duration = self.start.elapsed().as_secs_f64();
        record_query_duration(&self.query_name, duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_creation() {
        let timer = QueryTimer::new("test_query");
        assert_eq!(timer.query_name, "test_query");
    }

    #[test]
    fn test_pool_snapshot_saturation() {
        let snapshot = PoolSnapshot {
            size: 8,
            idle: 3,
            max: 10,
        };
        assert_eq!(snapshot.active(), 5);
        assert!((snapshot.saturation() - 0.5).abs() < f64::EPSILON);

        let idle_heavy = PoolSnapshot {
            size: 2,
            idle: 5,
            max: 10,
        };
        assert_eq!(idle_heavy.active(), 0);

        let unbounded = PoolSnapshot {
            size: 1,
            idle: 0,
            max: 0,
        };
        assert_eq!(unbounded.saturation(), 0.0);
    }

    #[test]
    fn test_query_timer_record_without_recorder() {
        // With no global recorder installed, recording is a no-op.
        QueryTimer::new("save_session").record();
        record_query_duration("delete_session", 0.001);
    }
}
