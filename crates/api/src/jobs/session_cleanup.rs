//! Purges expired sessions, the photos of drafts they held, and idle
//! rate-limiter entries.

use std::sync::Arc;

use tracing::info;

use super::scheduler::{Job, JobFrequency};
use crate::middleware::rate_limit::RateLimiterState;
use crate::services::{ArtifactStore, SessionStore};

pub struct SessionCleanupJob {
    sessions: SessionStore,
    artifacts: ArtifactStore,
    rate_limiter: Option<Arc<RateLimiterState>>,
}

impl SessionCleanupJob {
    pub fn new(
        sessions: SessionStore,
        artifacts: ArtifactStore,
        rate_limiter: Option<Arc<RateLimiterState>>,
    ) -> Self {
        Self {
            sessions,
            artifacts,
            rate_limiter,
        }
    }
}

#[async_trait::async_trait]
impl Job for SessionCleanupJob {
    fn name(&self) -> &'static str {
        "session_cleanup"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(15)
    }

    async fn execute(&self) -> Result<(), String> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.prune();
        }

        let purged = self
            .sessions
            .purge_expired()
            .await
            .map_err(|e| e.to_string())?;
        let mut drafts = 0;
        for draft in purged.iter().filter_map(|data| data.draft.as_ref()) {
            self.artifacts.discard_draft_photo(draft, None).await;
            drafts += 1;
        }
        if !purged.is_empty() {
            info!(purged = purged.len(), drafts, "Expired sessions purged");
        }
        Ok(())
    }
}
