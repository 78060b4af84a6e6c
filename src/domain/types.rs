//! Shared types for the tracking and reward pipeline

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

/// Newtype wrapper for user IDs to provide type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(transparent)]
pub struct UserId(pub Uuid);

impl UserId {
    /// Generate a new UUIDv7 (time-sortable) user ID
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Geographic coordinate (degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// A single timestamped location observation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitedLocation {
    pub user_id: UserId,
    pub location: GeoPoint,
    pub timestamp: DateTime<Utc>,
}

impl VisitedLocation {
    pub fn new(user_id: UserId, location: GeoPoint, timestamp: DateTime<Utc>) -> Self {
        Self { user_id, location, timestamp }
    }

    /// Observation at the current wall-clock time
    pub fn now(user_id: UserId, location: GeoPoint) -> Self {
        Self::new(user_id, location, Utc::now())
    }
}

/// Catalog entry for a point of interest. Immutable reference data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attraction {
    pub name: String,
    pub location: GeoPoint,
}

impl Attraction {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self { name: name.into(), location: GeoPoint::new(latitude, longitude) }
    }
}

/// A recorded reward fact produced by reward computation
#[derive(Debug, Clone, Serialize)]
pub struct UserReward {
    pub visit: VisitedLocation,
    pub attraction: Attraction,
    pub points: i32,
}

impl UserReward {
    pub fn new(visit: VisitedLocation, attraction: Attraction, points: i32) -> Self {
        Self { visit, attraction, points }
    }
}

/// Ranking output row: one attraction enriched with the queried user's
/// position, the computed distance and the reward points on offer.
/// Constructed fresh per query, never mutated after construction.
#[derive(Debug, Clone, Serialize)]
pub struct AttractionDatum {
    pub attraction_name: String,
    pub attraction_location: GeoPoint,
    pub user_location: GeoPoint,
    pub distance_miles: f64,
    pub reward_points: i32,
}

/// Tracked user state
///
/// The visited-location history and reward set are mutated by potentially
/// concurrent track continuations, so both collections sit behind their own
/// mutex. Appends hold the lock only for the push; neither lock is ever held
/// across an await point.
///
/// History invariant: the last element is always the most recently appended
/// observation. Append order is fetch-completion order, not event time.
#[derive(Debug)]
pub struct User {
    id: UserId,
    name: String,
    visited: Mutex<Vec<VisitedLocation>>,
    rewards: Mutex<Vec<UserReward>>,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            visited: Mutex::new(Vec::new()),
            rewards: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append an observation to the history
    pub fn append_location(&self, visit: VisitedLocation) {
        self.visited.lock().push(visit);
    }

    /// Last appended observation, if any
    pub fn last_visited_location(&self) -> Option<VisitedLocation> {
        self.visited.lock().last().cloned()
    }

    /// Snapshot of the full history in append order
    pub fn visited_locations(&self) -> Vec<VisitedLocation> {
        self.visited.lock().clone()
    }

    pub fn location_count(&self) -> usize {
        self.visited.lock().len()
    }

    /// Record a granted reward
    pub fn add_reward(&self, reward: UserReward) {
        self.rewards.lock().push(reward);
    }

    /// Record a reward unless one already exists for the same attraction.
    /// Check and insert happen under one lock acquisition, so concurrent
    /// reward passes cannot both grant the same attraction. Returns whether
    /// the reward was recorded.
    pub fn add_reward_if_absent(&self, reward: UserReward) -> bool {
        let mut rewards = self.rewards.lock();
        if rewards.iter().any(|r| r.attraction.name == reward.attraction.name) {
            return false;
        }
        rewards.push(reward);
        true
    }

    /// Snapshot of all granted rewards
    pub fn rewards(&self) -> Vec<UserReward> {
        self.rewards.lock().clone()
    }

    pub fn reward_count(&self) -> usize {
        self.rewards.lock().len()
    }

    /// Whether a reward has already been granted for the named attraction
    pub fn has_reward_for(&self, attraction_name: &str) -> bool {
        self.rewards.lock().iter().any(|r| r.attraction.name == attraction_name)
    }
}
