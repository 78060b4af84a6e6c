//! Location source interface
//!
//! The GPS provider is an external collaborator: lookups may block on network
//! I/O and may fail with transport errors. Retries, if any, are the caller's
//! responsibility - the tracker does not retry a failed fetch.

use crate::domain::types::{UserId, VisitedLocation};
use async_trait::async_trait;

/// Source of current-location observations, keyed by user ID
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Fetch the current location for a user.
    ///
    /// May suspend for a long time; the tracker schedules this call on its
    /// bounded worker pool so slow lookups cannot exhaust the runtime.
    async fn fetch(&self, user_id: UserId) -> anyhow::Result<VisitedLocation>;
}
