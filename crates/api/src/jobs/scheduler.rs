//! Interval scheduler for background jobs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// How often a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobFrequency {
    Seconds(u64),
    Minutes(u64),
}

impl JobFrequency {
    pub fn duration(&self) -> Duration {
        match self {
            JobFrequency::Seconds(secs) => Duration::from_secs(*secs),
            JobFrequency::Minutes(mins) => Duration::from_secs(*mins * 60),
        }
    }
}

/// A periodic background task.
#[async_trait::async_trait]
pub trait Job: Send + Sync {
    /// Name used in logs and metrics.
    fn name(&self) -> &'static str;

    fn frequency(&self) -> JobFrequency;

    async fn execute(&self) -> Result<(), String>;
}

/// Runs registered jobs on their intervals until shutdown is signalled.
pub struct JobScheduler {
    jobs: Vec<Arc<dyn Job>>,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl JobScheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            jobs: Vec::new(),
            shutdown_tx,
            handles: Vec::new(),
        }
    }

    pub fn register<J: Job + 'static>(&mut self, job: J) {
        self.jobs.push(Arc::new(job));
    }

    pub fn start(&mut self) {
        info!(jobs = self.jobs.len(), "Starting job scheduler");

        for job in &self.jobs {
            let job = Arc::clone(job);
            let mut shutdown_rx = self.shutdown_tx.subscribe();

            self.handles.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(job.frequency().duration());
                interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                // The first tick completes immediately.
                interval.tick().await;
                debug!(job = job.name(), frequency = ?job.frequency(), "Job scheduled");

                loop {
                    tokio::select! {
                        _ = interval.tick() => run_once(job.as_ref()).await,
                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                debug!(job = job.name(), "Job stopping");
                                break;
                            }
                        }
                    }
                }
            }));
        }
    }

    /// Signals every job to stop after its current run.
    pub fn shutdown(&self) {
        info!("Stopping job scheduler");
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn wait_for_shutdown(self, timeout: Duration) {
        let handles = self.handles;
        let all = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "Job task panicked");
                }
            }
        };

        match tokio::time::timeout(timeout, all).await {
            Ok(()) => info!("All jobs stopped"),
            Err(_) => warn!(timeout = ?timeout, "Job shutdown timed out"),
        }
    }
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Executes a job once, logging and counting the outcome.
pub async fn run_once(job: &dyn Job) {
    let name = job.name();
    let start = Instant::now();

    let outcome = match job.execute().await {
        Ok(()) => {
            debug!(job = name, elapsed_ms = start.elapsed().as_millis() as u64, "Job completed");
            "success"
        }
        Err(e) => {
            error!(job = name, elapsed_ms = start.elapsed().as_millis() as u64, error = %e, "Job failed");
            "failure"
        }
    };

    metrics::counter!("background_job_runs_total", "job" => name, "outcome" => outcome).increment(1);
}
