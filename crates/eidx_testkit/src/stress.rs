//! Stress tests for the shared registry.
//!
//! These helpers drive a [`SharedRegistry`] from several threads at once
//! and report throughput.

use eidx_core::{SearchOptions, SharedRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Operations that found what they looked for.
    pub hits: usize,
    /// Operations that found nothing.
    pub misses: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(hits: usize, misses: usize, duration: Duration) -> Self {
        let total = hits + misses;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            hits,
            misses,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Hits: {}", self.hits);
        println!("Misses: {}", self.misses);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of searching threads.
    pub readers: usize,
    /// Number of usage-recording threads.
    pub writers: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 500,
            readers: 4,
            writers: 2,
        }
    }
}

/// Runs concurrent searches and usage updates over `eids`.
///
/// Readers search for the first segment of each EID; writers record usage
/// round-robin. A hit is a non-empty search or a recorded use.
pub fn concurrent_search_and_usage(
    registry: &SharedRegistry,
    eids: &[String],
    config: &StressConfig,
) -> StressTestResult {
    let eids: Arc<Vec<String>> = Arc::new(eids.to_vec());
    let hits = Arc::new(AtomicUsize::new(0));
    let misses = Arc::new(AtomicUsize::new(0));
    let start = Instant::now();

    let mut handles = Vec::with_capacity(config.readers + config.writers);
    for worker in 0..config.readers + config.writers {
        let registry = registry.clone();
        let eids = Arc::clone(&eids);
        let hits = Arc::clone(&hits);
        let misses = Arc::clone(&misses);
        let operations = config.operations;
        let is_writer = worker >= config.readers;

        handles.push(thread::spawn(move || {
            if eids.is_empty() {
                return;
            }
            for i in 0..operations {
                let eid = &eids[(worker + i) % eids.len()];
                let found = if is_writer {
                    registry.record_usage(eid)
                } else {
                    let query = eid.split('.').next().unwrap_or(eid);
                    !registry.search(query, &SearchOptions::default()).is_empty()
                };
                if found {
                    hits.fetch_add(1, Ordering::Relaxed);
                } else {
                    misses.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("Stress worker panicked");
    }

    StressTestResult::new(
        hits.load(Ordering::Relaxed),
        misses.load(Ordering::Relaxed),
        start.elapsed(),
    )
}
