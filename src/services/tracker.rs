//! Concurrent location tracking pipeline
//!
//! `track` is a two-stage chain per user: a fetch stage scheduled on a
//! bounded worker pool, then a continuation that appends the observation to
//! the user's history and gates completion on reward computation. The pool is
//! a semaphore sized at service start; when every slot is busy, new track
//! calls queue on the semaphore instead of spawning extra work.

use crate::domain::types::{User, UserId, VisitedLocation};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use crate::io::geo::LocationSource;
use crate::services::rewards::RewardEngine;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Failure of a single track operation. The first stage to fail
/// short-circuits the chain; the error says which stage it was.
#[derive(Debug, Error)]
pub enum TrackError {
    /// The location source failed; the user's history is unchanged
    #[error("location fetch failed for user {user_id}")]
    Fetch {
        user_id: UserId,
        #[source]
        source: anyhow::Error,
    },
    /// Reward computation failed after a successful fetch; the fetched
    /// location was still appended to the history
    #[error("reward computation failed for user {user_id}")]
    Reward {
        user_id: UserId,
        #[source]
        source: anyhow::Error,
    },
    /// History was empty and the synchronous fallback track also failed
    #[error("could not resolve a location for user {user_id}")]
    Resolution {
        user_id: UserId,
        #[source]
        source: Box<TrackError>,
    },
    /// The worker pool was closed before the fetch stage was admitted
    #[error("tracker is shut down")]
    Shutdown,
}

/// Bounded-concurrency tracking pipeline over shared per-user state
pub struct ConcurrentTracker {
    /// External location provider (may block, may fail)
    source: Arc<dyn LocationSource>,
    /// Reward computation invoked as the continuation stage
    rewards: Arc<dyn RewardEngine>,
    /// Worker-pool slots; the admission-control knob
    slots: Arc<Semaphore>,
    pool_size: usize,
    metrics: Arc<Metrics>,
}

impl ConcurrentTracker {
    pub fn new(
        config: &Config,
        source: Arc<dyn LocationSource>,
        rewards: Arc<dyn RewardEngine>,
        metrics: Arc<Metrics>,
    ) -> Self {
        let pool_size = config.pool_size();
        Self { source, rewards, slots: Arc::new(Semaphore::new(pool_size)), pool_size, metrics }
    }

    /// Configured worker-pool size
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Current slot occupancy: fetches admitted and not yet finished.
    /// A source that hangs holds its slot indefinitely; this gauge is how
    /// that shows up.
    pub fn in_flight(&self) -> usize {
        self.pool_size.saturating_sub(self.slots.available_permits())
    }

    /// Close the worker pool. In-flight operations drain; new `track` calls
    /// fail with `TrackError::Shutdown`.
    pub fn shutdown(&self) {
        self.slots.close();
    }

    /// Track one user: fetch the current location, append it to the user's
    /// history, then await reward computation before resolving.
    ///
    /// Resolves with the fetched location; reward computation is a side
    /// effect gating completion, not part of the resolved value. A fetch
    /// failure leaves the history unchanged. A reward failure does not undo
    /// the append - location recording and reward computation are not
    /// transactional with each other.
    ///
    /// Concurrent calls for the same user append in fetch-completion order.
    /// Callers needing deterministic ordering must serialize per user.
    pub async fn track(&self, user: Arc<User>) -> Result<VisitedLocation, TrackError> {
        // Fetch stage: the unit admitted to the worker pool. The permit
        // covers only the fetch; the continuation runs outside admission
        // control. An error path drops the permit like any other.
        let permit = match Arc::clone(&self.slots).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return Err(TrackError::Shutdown),
        };

        let fetch_start = Instant::now();
        let fetched = self.source.fetch(user.id()).await;
        let fetch_latency_us = fetch_start.elapsed().as_micros() as u64;
        drop(permit);

        let visit = match fetched {
            Ok(visit) => visit,
            Err(e) => {
                self.metrics.record_track_failure();
                warn!(user_id = %user.id(), error = %e, "location_fetch_failed");
                return Err(TrackError::Fetch { user_id: user.id(), source: e });
            }
        };

        // Continuation stage: append under the user's history lock, then
        // gate completion on reward computation.
        user.append_location(visit.clone());
        self.metrics.record_location();

        if let Err(e) = self.rewards.compute_rewards(&user).await {
            self.metrics.record_track_failure();
            warn!(user_id = %user.id(), error = %e, "reward_computation_failed");
            return Err(TrackError::Reward { user_id: user.id(), source: e });
        }

        self.metrics.record_track(fetch_latency_us);
        debug!(user_id = %user.id(), fetch_latency_us = %fetch_latency_us, "user_tracked");
        Ok(visit)
    }

    /// Last recorded location for the user, without fetching when the
    /// history is non-empty. An empty history drives one `track` call to
    /// completion instead; if that fails, the error is surfaced as
    /// `TrackError::Resolution`.
    pub async fn user_location(&self, user: &Arc<User>) -> Result<VisitedLocation, TrackError> {
        if let Some(visit) = user.last_visited_location() {
            return Ok(visit);
        }
        self.track(Arc::clone(user)).await.map_err(|e| TrackError::Resolution {
            user_id: user.id(),
            source: Box::new(e),
        })
    }
}
