//! Services - business logic
//!
//! This module contains the core business logic services:
//! - `tracker` - bounded-concurrency location tracking pipeline
//! - `ranker` - nearest-attraction ranking (top-K by distance)
//! - `rewards` - reward computation against the attraction catalog

pub mod ranker;
pub mod rewards;
pub mod tracker;

// Re-export commonly used types
pub use ranker::AttractionRanker;
pub use rewards::{FixedPoints, PointSource, RandomPoints, RewardEngine, RewardService};
pub use tracker::{ConcurrentTracker, TrackError};
