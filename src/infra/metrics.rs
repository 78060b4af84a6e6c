//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counter updates are lock-free; reporting is the only operation
//! that needs synchronization (via atomic swap).
//!
//! NOTE: All atomics use Relaxed ordering intentionally—these are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Prometheus-style exponential bucket boundaries (microseconds)
/// Buckets: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200
const BUCKET_BOUNDS: [u64; 10] = [100, 200, 400, 800, 1600, 3200, 6400, 12800, 25600, 51200];
const NUM_BUCKETS: usize = 11;

/// Compute bucket index for a latency value using binary search
#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Update an atomic max value using compare-and-swap loop
#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let mut current_max = atomic_max.load(Ordering::Relaxed);
    while new_value > current_max {
        match atomic_max.compare_exchange_weak(
            current_max,
            new_value,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => break,
            Err(actual) => current_max = actual,
        }
    }
}

/// Swap all buckets to zero and return their values
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    let mut result = [0u64; NUM_BUCKETS];
    for (i, bucket) in buckets.iter().enumerate() {
        result[i] = bucket.swap(0, Ordering::Relaxed);
    }
    result
}

/// Compute percentile from histogram buckets
/// Returns the upper bound of the bucket containing the percentile, or `None`
/// when the percentile falls in the open-ended overflow bucket and has no
/// finite bound.
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> Option<u64> {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return Some(0);
    }

    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;

    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return BUCKET_BOUNDS.get(i).copied();
        }
    }
    None
}

/// Log label for a bucket-derived latency value. The overflow bucket is
/// open-ended, so a percentile landing there reports the top finite bound
/// as a lower limit rather than a synthetic value.
fn latency_label(value: Option<u64>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => format!(">{}", BUCKET_BOUNDS[BUCKET_BOUNDS.len() - 1]),
    }
}

/// Lock-free metrics collector
///
/// All recording operations are lock-free using atomics.
/// The `report()` method atomically swaps counters to get a consistent snapshot.
pub struct Metrics {
    /// Total track operations ever completed, success or failure (monotonic)
    tracks_total: AtomicU64,
    /// Track operations since last report (reset on report)
    tracks_since_report: AtomicU64,
    /// Total failed track operations (monotonic)
    track_failures_total: AtomicU64,
    /// Sum of fetch latencies in microseconds (reset on report)
    fetch_latency_sum_us: AtomicU64,
    /// Max fetch latency in microseconds (reset on report)
    fetch_latency_max_us: AtomicU64,
    /// Fetch latency histogram buckets (reset on report)
    fetch_latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Total locations appended to user histories (monotonic)
    locations_recorded: AtomicU64,
    /// Total rewards granted across all users (monotonic)
    rewards_granted: AtomicU64,
    /// Last report time (only accessed from reporter, not atomic)
    last_report_time: Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            tracks_total: AtomicU64::new(0),
            tracks_since_report: AtomicU64::new(0),
            track_failures_total: AtomicU64::new(0),
            fetch_latency_sum_us: AtomicU64::new(0),
            fetch_latency_max_us: AtomicU64::new(0),
            fetch_latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            locations_recorded: AtomicU64::new(0),
            rewards_granted: AtomicU64::new(0),
            last_report_time: Mutex::new(Instant::now()),
        }
    }

    /// Record a completed track with the fetch-stage latency (lock-free)
    #[inline]
    pub fn record_track(&self, fetch_latency_us: u64) {
        self.tracks_total.fetch_add(1, Ordering::Relaxed);
        self.tracks_since_report.fetch_add(1, Ordering::Relaxed);
        self.fetch_latency_sum_us.fetch_add(fetch_latency_us, Ordering::Relaxed);

        // Update histogram bucket
        let bucket = bucket_index(fetch_latency_us);
        self.fetch_latency_buckets[bucket].fetch_add(1, Ordering::Relaxed);

        // Update max
        update_atomic_max(&self.fetch_latency_max_us, fetch_latency_us);
    }

    /// Record a failed track operation (lock-free)
    #[inline]
    pub fn record_track_failure(&self) {
        self.tracks_total.fetch_add(1, Ordering::Relaxed);
        self.tracks_since_report.fetch_add(1, Ordering::Relaxed);
        self.track_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a location appended to a user's history (lock-free)
    #[inline]
    pub fn record_location(&self) {
        self.locations_recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record rewards granted during a computation pass (lock-free)
    #[inline]
    pub fn record_rewards_granted(&self, count: u64) {
        if count > 0 {
            self.rewards_granted.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Get total track operations
    #[inline]
    pub fn tracks_total(&self) -> u64 {
        self.tracks_total.load(Ordering::Relaxed)
    }

    /// Get total failed track operations
    #[inline]
    pub fn track_failures_total(&self) -> u64 {
        self.track_failures_total.load(Ordering::Relaxed)
    }

    /// Get total locations recorded
    #[inline]
    pub fn locations_recorded(&self) -> u64 {
        self.locations_recorded.load(Ordering::Relaxed)
    }

    /// Get total rewards granted
    #[inline]
    pub fn rewards_granted(&self) -> u64 {
        self.rewards_granted.load(Ordering::Relaxed)
    }

    /// Calculate and return metrics summary, then reset periodic counters
    ///
    /// This is the only method that resets counters. It uses atomic swap
    /// to get a consistent snapshot while allowing concurrent updates.
    /// `in_flight` is the tracker's current slot occupancy, sampled by the
    /// caller.
    pub fn report(&self, in_flight: usize) -> MetricsSummary {
        // Swap periodic counters to zero and get their values
        let tracks_count = self.tracks_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.fetch_latency_sum_us.swap(0, Ordering::Relaxed);
        let max_latency = self.fetch_latency_max_us.swap(0, Ordering::Relaxed);

        // Swap histogram buckets and collect values
        let lat_buckets = swap_buckets(&self.fetch_latency_buckets);

        // Get monotonic counters (don't reset)
        let tracks_total = self.tracks_total.load(Ordering::Relaxed);
        let track_failures_total = self.track_failures_total.load(Ordering::Relaxed);
        let locations_recorded = self.locations_recorded.load(Ordering::Relaxed);
        let rewards_granted = self.rewards_granted.load(Ordering::Relaxed);

        // Calculate elapsed time and reset
        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        // Calculate derived metrics
        let tracks_per_sec = if elapsed.as_secs_f64() > 0.0 {
            tracks_count as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let successes = lat_buckets.iter().sum::<u64>();
        let avg_latency = if successes > 0 { latency_sum / successes } else { 0 };

        // Compute percentiles from histogram
        let lat_p50 = percentile_from_buckets(&lat_buckets, 0.50);
        let lat_p95 = percentile_from_buckets(&lat_buckets, 0.95);
        let lat_p99 = percentile_from_buckets(&lat_buckets, 0.99);

        MetricsSummary {
            tracks_total,
            tracks_per_sec,
            track_failures_total,
            avg_fetch_latency_us: avg_latency,
            max_fetch_latency_us: max_latency,
            lat_buckets,
            lat_p50_us: lat_p50,
            lat_p95_us: lat_p95,
            lat_p99_us: lat_p99,
            locations_recorded,
            rewards_granted,
            in_flight,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MetricsSummary {
    pub tracks_total: u64,
    pub tracks_per_sec: f64,
    pub track_failures_total: u64,
    pub avg_fetch_latency_us: u64,
    pub max_fetch_latency_us: u64,
    /// Fetch latency histogram buckets
    /// Bounds: ≤100, ≤200, ≤400, ≤800, ≤1600, ≤3200, ≤6400, ≤12800, ≤25600, ≤51200, >51200 µs
    pub lat_buckets: [u64; NUM_BUCKETS],
    /// 50th percentile fetch latency (µs); `None` beyond the top finite bucket
    pub lat_p50_us: Option<u64>,
    /// 95th percentile fetch latency (µs); `None` beyond the top finite bucket
    pub lat_p95_us: Option<u64>,
    /// 99th percentile fetch latency (µs); `None` beyond the top finite bucket
    pub lat_p99_us: Option<u64>,
    /// Total locations appended to user histories
    pub locations_recorded: u64,
    /// Total rewards granted
    pub rewards_granted: u64,
    /// Current worker-pool slot occupancy (snapshot)
    pub in_flight: usize,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            tracks_total = %self.tracks_total,
            tracks_per_sec = format!("{:.1}", self.tracks_per_sec),
            track_failures = %self.track_failures_total,
            avg_fetch_us = %self.avg_fetch_latency_us,
            max_fetch_us = %self.max_fetch_latency_us,
            p50_us = %latency_label(self.lat_p50_us),
            p95_us = %latency_label(self.lat_p95_us),
            p99_us = %latency_label(self.lat_p99_us),
            locations = %self.locations_recorded,
            rewards = %self.rewards_granted,
            in_flight = %self.in_flight,
            "metrics"
        );
    }
}
