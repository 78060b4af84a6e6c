//! IO modules - external system interfaces
//!
//! This module contains the seams to external collaborators:
//! - `geo` - location source interface (GPS provider)

pub mod geo;

// Re-export commonly used types
pub use geo::LocationSource;
