//! Domain models - core business types
//!
//! This module contains the canonical data types used throughout the system:
//! - `User` - tracked individual with visited-location history and rewards
//! - `VisitedLocation` - a single timestamped location observation
//! - `Attraction` - catalog entry for a point of interest
//! - `UserReward` - a recorded (visit, attraction, points) fact
//! - `AttractionDatum` - per-query ranking output row

pub mod types;

// Re-export commonly used types at module level
pub use types::{Attraction, AttractionDatum, GeoPoint, User, UserId, UserReward, VisitedLocation};
