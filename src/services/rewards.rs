//! Reward computation against the attraction catalog
//!
//! `RewardEngine` is the seam the tracker and ranker depend on; the
//! production implementation grants one reward per (user, attraction) when
//! any visited location lies within the configured proximity buffer.
//! Re-invocation never duplicates a grant - idempotence is enforced here,
//! not by the tracker.

use crate::domain::types::{Attraction, GeoPoint, User, UserId, UserReward};
use crate::infra::config::Config;
use crate::infra::metrics::Metrics;
use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use tracing::debug;

/// Nautical miles per degree of great-circle arc
const NAUTICAL_MILES_PER_DEGREE: f64 = 60.0;
/// Statute miles per nautical mile
const STATUTE_MILES_PER_NAUTICAL_MILE: f64 = 1.15077945;

/// Great-circle distance between two coordinates in statute miles.
///
/// Pure, symmetric, non-negative, zero iff the points are equal.
pub fn statute_miles(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lon1 = a.longitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let lon2 = b.longitude.to_radians();

    // acos can drift just above 1.0 for identical points; clamp keeps it total
    let cos_angle =
        (lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * (lon1 - lon2).cos()).clamp(-1.0, 1.0);
    let degrees = cos_angle.acos().to_degrees();

    STATUTE_MILES_PER_NAUTICAL_MILE * NAUTICAL_MILES_PER_DEGREE * degrees
}

/// Reward computation and the numeric utilities it exposes
#[async_trait]
pub trait RewardEngine: Send + Sync {
    /// Inspect the user's visited-location history against the catalog and
    /// append any newly earned rewards. Idempotent per (user, attraction).
    async fn compute_rewards(&self, user: &User) -> anyhow::Result<()>;

    /// Distance between two coordinates in statute miles
    fn distance(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        statute_miles(a, b)
    }

    /// Points the user would earn for visiting the attraction
    fn reward_points(&self, attraction: &Attraction, user: &User) -> i32;
}

/// Source of per-attraction point values
pub trait PointSource: Send + Sync {
    fn points(&self, attraction: &Attraction, user_id: UserId) -> i32;
}

/// Production point source: 1..=1000 points per attraction visit
pub struct RandomPoints;

impl PointSource for RandomPoints {
    fn points(&self, _attraction: &Attraction, _user_id: UserId) -> i32 {
        rand::rng().random_range(1..=1000)
    }
}

/// Deterministic point source for tests and fixed-tariff deployments
pub struct FixedPoints(pub i32);

impl PointSource for FixedPoints {
    fn points(&self, _attraction: &Attraction, _user_id: UserId) -> i32 {
        self.0
    }
}

/// Proximity-based reward engine over a fixed attraction catalog
pub struct RewardService {
    catalog: Vec<Attraction>,
    proximity_buffer_miles: f64,
    points: Arc<dyn PointSource>,
    metrics: Arc<Metrics>,
}

impl RewardService {
    pub fn new(config: &Config, points: Arc<dyn PointSource>, metrics: Arc<Metrics>) -> Self {
        Self {
            catalog: config.attractions().to_vec(),
            proximity_buffer_miles: config.proximity_buffer_miles(),
            points,
            metrics,
        }
    }

    /// Whether a visit counts as being at the attraction
    fn near_attraction(&self, visit_location: GeoPoint, attraction: &Attraction) -> bool {
        statute_miles(attraction.location, visit_location) <= self.proximity_buffer_miles
    }
}

#[async_trait]
impl RewardEngine for RewardService {
    async fn compute_rewards(&self, user: &User) -> anyhow::Result<()> {
        // Snapshot the history once; continuations appending concurrently are
        // picked up by their own compute_rewards pass.
        let visits = user.visited_locations();
        let mut granted = 0u64;

        for attraction in &self.catalog {
            if user.has_reward_for(&attraction.name) {
                continue;
            }
            if let Some(visit) =
                visits.iter().find(|v| self.near_attraction(v.location, attraction))
            {
                let points = self.points.points(attraction, user.id());
                // Re-checked under the rewards lock: a concurrent pass that
                // passed the skip above must not grant a second reward.
                let reward = UserReward::new(visit.clone(), attraction.clone(), points);
                if user.add_reward_if_absent(reward) {
                    granted += 1;
                    debug!(
                        user_id = %user.id(),
                        attraction = %attraction.name,
                        points = %points,
                        "reward_granted"
                    );
                }
            }
        }

        self.metrics.record_rewards_granted(granted);
        Ok(())
    }

    fn reward_points(&self, attraction: &Attraction, user: &User) -> i32 {
        self.points.points(attraction, user.id())
    }
}
