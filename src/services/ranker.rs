//! Nearest-attraction ranking
//!
//! One sort-and-truncate algorithm serving two call sites: a plain attraction
//! list ranked from an arbitrary coordinate, and an enriched per-user list
//! that resolves the user's location through the tracker and quotes reward
//! points per attraction.

use crate::domain::types::{Attraction, AttractionDatum, GeoPoint, User};
use crate::infra::config::Config;
use crate::services::rewards::RewardEngine;
use crate::services::tracker::{ConcurrentTracker, TrackError};
use std::sync::Arc;

pub struct AttractionRanker {
    tracker: Arc<ConcurrentTracker>,
    rewards: Arc<dyn RewardEngine>,
    top_k: usize,
}

impl AttractionRanker {
    pub fn new(
        config: &Config,
        tracker: Arc<ConcurrentTracker>,
        rewards: Arc<dyn RewardEngine>,
    ) -> Self {
        Self { tracker, rewards, top_k: config.top_k() }
    }

    /// The `top_k` attractions nearest to `location`, ascending by distance.
    /// Ties keep catalog order (the sort is stable). No side effects.
    pub fn nearest_attractions(&self, location: GeoPoint, catalog: &[Attraction]) -> Vec<Attraction> {
        let mut by_distance: Vec<(f64, &Attraction)> = catalog
            .iter()
            .map(|attraction| (self.rewards.distance(attraction.location, location), attraction))
            .collect();
        by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));
        by_distance.into_iter().take(self.top_k).map(|(_, a)| a.clone()).collect()
    }

    /// The `top_k` attractions nearest to the user, each enriched with the
    /// user's coordinate, the computed distance and the reward points on
    /// offer. The whole catalog is considered - attractions the user already
    /// holds rewards for are not filtered out.
    ///
    /// Resolving the user's location may drive a track call when the history
    /// is empty; if resolution fails the query fails as a whole, never with
    /// partial results.
    pub async fn nearest_attraction_data(
        &self,
        user: &Arc<User>,
        catalog: &[Attraction],
    ) -> Result<Vec<AttractionDatum>, TrackError> {
        let user_location = self.tracker.user_location(user).await?.location;

        let mut data: Vec<AttractionDatum> = catalog
            .iter()
            .map(|attraction| AttractionDatum {
                attraction_name: attraction.name.clone(),
                attraction_location: attraction.location,
                user_location,
                distance_miles: self.rewards.distance(attraction.location, user_location),
                reward_points: self.rewards.reward_points(attraction, user),
            })
            .collect();
        data.sort_by(|a, b| a.distance_miles.total_cmp(&b.distance_miles));
        data.truncate(self.top_k);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{UserId, UserReward, VisitedLocation};
    use crate::infra::metrics::Metrics;
    use crate::io::geo::LocationSource;
    use async_trait::async_trait;

    /// Source pinned to one coordinate, or failing outright
    struct StaticGps {
        point: GeoPoint,
        fail: bool,
    }

    #[async_trait]
    impl LocationSource for StaticGps {
        async fn fetch(&self, user_id: UserId) -> anyhow::Result<VisitedLocation> {
            if self.fail {
                anyhow::bail!("gps lookup failed");
            }
            Ok(VisitedLocation::now(user_id, self.point))
        }
    }

    /// Engine with the default distance and a fixed point quote
    struct QuoteEngine {
        points: i32,
    }

    #[async_trait]
    impl RewardEngine for QuoteEngine {
        async fn compute_rewards(&self, _user: &User) -> anyhow::Result<()> {
            Ok(())
        }

        fn reward_points(&self, _attraction: &Attraction, _user: &User) -> i32 {
            self.points
        }
    }

    fn ranker_with(source: StaticGps, points: i32) -> AttractionRanker {
        let config = Config::default();
        let rewards: Arc<dyn RewardEngine> = Arc::new(QuoteEngine { points });
        let tracker = Arc::new(ConcurrentTracker::new(
            &config,
            Arc::new(source),
            rewards.clone(),
            Arc::new(Metrics::new()),
        ));
        AttractionRanker::new(&config, tracker, rewards)
    }

    fn abc_catalog() -> Vec<Attraction> {
        vec![
            Attraction::new("A", 0.0, 0.0),
            Attraction::new("B", 1.0, 0.0),
            Attraction::new("C", 10.0, 0.0),
        ]
    }

    #[test]
    fn test_nearest_attractions_sorted_by_distance() {
        let ranker = ranker_with(StaticGps { point: GeoPoint::new(0.0, 0.0), fail: false }, 0);
        // Catalog deliberately out of distance order
        let catalog = vec![
            Attraction::new("C", 10.0, 0.0),
            Attraction::new("A", 0.0, 0.0),
            Attraction::new("B", 1.0, 0.0),
        ];

        let ranked = ranker.nearest_attractions(GeoPoint::new(0.0, 0.0), &catalog);

        let names: Vec<_> = ranked.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn test_nearest_attractions_truncates_to_k() {
        let ranker = ranker_with(StaticGps { point: GeoPoint::new(0.0, 0.0), fail: false }, 0);
        let catalog: Vec<_> =
            (0..8).map(|i| Attraction::new(format!("P{i}"), i as f64, 0.0)).collect();

        let ranked = ranker.nearest_attractions(GeoPoint::new(0.0, 0.0), &catalog);

        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].name, "P0");
        assert_eq!(ranked[4].name, "P4");
    }

    #[test]
    fn test_small_catalog_returns_all_sorted() {
        let ranker = ranker_with(StaticGps { point: GeoPoint::new(0.0, 0.0), fail: false }, 0);
        let ranked = ranker.nearest_attractions(GeoPoint::new(0.0, 0.0), &abc_catalog());

        assert_eq!(ranked.len(), 3);
        let names: Vec<_> = ranked.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let ranker = ranker_with(StaticGps { point: GeoPoint::new(0.0, 0.0), fail: false }, 0);
        let catalog = vec![
            Attraction::new("first", 2.0, 0.0),
            Attraction::new("second", 2.0, 0.0),
            Attraction::new("third", 2.0, 0.0),
        ];

        let ranked = ranker.nearest_attractions(GeoPoint::new(0.0, 0.0), &catalog);

        let names: Vec<_> = ranked.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["first", "second", "third"]);
    }

    #[test]
    fn test_ranking_is_idempotent() {
        let ranker = ranker_with(StaticGps { point: GeoPoint::new(0.0, 0.0), fail: false }, 0);
        let catalog = abc_catalog();
        let origin = GeoPoint::new(0.5, 0.5);

        let first = ranker.nearest_attractions(origin, &catalog);
        let second = ranker.nearest_attractions(origin, &catalog);

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_attraction_data_enriched_and_sorted() {
        let ranker = ranker_with(StaticGps { point: GeoPoint::new(0.0, 0.0), fail: false }, 42);
        let user = Arc::new(User::new(UserId::new(), "alice"));
        user.append_location(VisitedLocation::now(user.id(), GeoPoint::new(0.0, 0.0)));

        let data = ranker.nearest_attraction_data(&user, &abc_catalog()).await.unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data[0].attraction_name, "A");
        assert_eq!(data[0].distance_miles, 0.0);
        assert!(data[1].distance_miles < data[2].distance_miles);
        for datum in &data {
            assert_eq!(datum.user_location, GeoPoint::new(0.0, 0.0));
            assert_eq!(datum.reward_points, 42);
        }
    }

    #[tokio::test]
    async fn test_attraction_data_does_not_filter_rewarded_attractions() {
        let ranker = ranker_with(StaticGps { point: GeoPoint::new(0.0, 0.0), fail: false }, 7);
        let user = Arc::new(User::new(UserId::new(), "bob"));
        let visit = VisitedLocation::now(user.id(), GeoPoint::new(0.0, 0.0));
        user.append_location(visit.clone());
        // A prior reward for the nearest attraction must not hide it
        user.add_reward(UserReward::new(visit, Attraction::new("A", 0.0, 0.0), 7));

        let data = ranker.nearest_attraction_data(&user, &abc_catalog()).await.unwrap();

        assert_eq!(data.len(), 3);
        assert_eq!(data[0].attraction_name, "A");
    }

    #[tokio::test]
    async fn test_attraction_data_tracks_when_history_empty() {
        let ranker = ranker_with(StaticGps { point: GeoPoint::new(1.0, 0.0), fail: false }, 0);
        let user = Arc::new(User::new(UserId::new(), "carol"));

        let data = ranker.nearest_attraction_data(&user, &abc_catalog()).await.unwrap();

        // The fallback track recorded the fetched location
        assert_eq!(user.location_count(), 1);
        assert_eq!(data[0].attraction_name, "B");
    }

    #[tokio::test]
    async fn test_attraction_data_fails_whole_when_unresolvable() {
        let ranker = ranker_with(StaticGps { point: GeoPoint::new(0.0, 0.0), fail: true }, 0);
        let user = Arc::new(User::new(UserId::new(), "dave"));

        let err = ranker.nearest_attraction_data(&user, &abc_catalog()).await.unwrap_err();

        assert!(matches!(err, TrackError::Resolution { .. }));
    }
}
