//! Tourtrack - concurrent user location tracking and attraction rewards
//!
//! Module structure:
//! - `domain/` - Core business types (User, VisitedLocation, Attraction)
//! - `io/` - External interfaces (location source)
//! - `services/` - Business logic (ConcurrentTracker, AttractionRanker, RewardService)
//! - `infra/` - Infrastructure (Config, Metrics)

use async_trait::async_trait;
use clap::Parser;
use rand::Rng;
use std::sync::Arc;
use tokio::time::Duration;
use tourtrack::domain::types::{GeoPoint, User, UserId, VisitedLocation};
use tourtrack::infra::{Config, Metrics};
use tourtrack::io::geo::LocationSource;
use tourtrack::services::{
    AttractionRanker, ConcurrentTracker, RandomPoints, RewardEngine, RewardService,
};
use tracing::{info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::EnvFilter;

/// Tourtrack - user location tracking and attraction reward service
#[derive(Parser, Debug)]
#[command(name = "tourtrack", version, about)]
struct Args {
    /// Path to TOML configuration file (overrides CONFIG_FILE, default config/dev.toml)
    #[arg(short, long)]
    config: Option<String>,

    /// Number of users to track in the demo run
    #[arg(short, long, default_value_t = 10)]
    users: usize,
}

/// Stand-in for the external GPS provider: a jittering lookup with a small
/// simulated transport delay. Lives in the binary because the library only
/// sees the `LocationSource` seam.
struct JitterGps;

#[async_trait]
impl LocationSource for JitterGps {
    async fn fetch(&self, user_id: UserId) -> anyhow::Result<VisitedLocation> {
        let (latitude, longitude) = {
            let mut rng = rand::rng();
            (rng.random_range(-85.05112878..85.05112878), rng.random_range(-180.0..180.0))
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(VisitedLocation::now(user_id, GeoPoint::new(latitude, longitude)))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured logging with configurable level via RUST_LOG env var
    // Default: INFO, use RUST_LOG=debug for full event visibility
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .init();

    info!("tourtrack starting");

    let args = Args::parse();
    let config = Config::load(args.config.as_deref());

    info!(
        config_file = %config.config_file(),
        site_id = %config.site_id(),
        pool_size = %config.pool_size(),
        top_k = %config.top_k(),
        proximity_buffer_miles = %config.proximity_buffer_miles(),
        attractions = %config.attractions().len(),
        "config_loaded"
    );

    // Shared components
    let metrics = Arc::new(Metrics::new());
    let rewards: Arc<dyn RewardEngine> =
        Arc::new(RewardService::new(&config, Arc::new(RandomPoints), metrics.clone()));
    let source = Arc::new(JitterGps);
    let tracker = Arc::new(ConcurrentTracker::new(&config, source, rewards.clone(), metrics.clone()));
    let ranker = AttractionRanker::new(&config, tracker.clone(), rewards);

    // Periodic metrics reporter
    let reporter_metrics = metrics.clone();
    let reporter_tracker = tracker.clone();
    let metrics_interval = config.metrics_interval_secs();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(metrics_interval));
        loop {
            interval.tick().await;
            reporter_metrics.report(reporter_tracker.in_flight()).log();
        }
    });

    // Track a batch of users concurrently through the bounded pool
    let users: Vec<Arc<User>> = (0..args.users)
        .map(|i| Arc::new(User::new(UserId::new(), format!("user{i}"))))
        .collect();

    let mut handles = vec![];
    for user in &users {
        let t = tracker.clone();
        let u = user.clone();
        handles.push(tokio::spawn(async move { (u.id(), t.track(u.clone()).await) }));
    }
    for handle in handles {
        let (user_id, result) = handle.await?;
        match result {
            Ok(visit) => info!(
                user_id = %user_id,
                latitude = %visit.location.latitude,
                longitude = %visit.location.longitude,
                "user_tracked"
            ),
            Err(e) => warn!(user_id = %user_id, error = %e, "track_failed"),
        }
    }

    // Ranked nearest-attraction query for the first user
    if let Some(user) = users.first() {
        let data = ranker.nearest_attraction_data(user, config.attractions()).await?;
        info!(user = %user.name(), "nearest_attractions");
        println!("{}", serde_json::to_string_pretty(&data)?);
    }

    // Drain and report
    tracker.shutdown();
    metrics.report(tracker.in_flight()).log();
    info!("tourtrack shutdown complete");
    Ok(())
}
