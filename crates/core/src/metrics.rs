//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Task outcomes and failures by stage
//! - Fragment merging (fragments, malformed names, bytes)
//! - Transcoding duration

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Task Metrics
// =============================================================================

/// Tasks handled total by outcome.
pub static TASKS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("chunkcast_tasks_total", "Total tasks handled"),
        &["outcome"], // "completed", "already_processed", "failed"
    )
    .unwrap()
});

/// Task failures total by stage.
pub static TASK_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "chunkcast_task_failures_total",
            "Total task failures by pipeline stage",
        ),
        &["stage"],
    )
    .unwrap()
});

/// End-to-end task duration in seconds.
pub static TASK_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "chunkcast_task_duration_seconds",
            "Duration of a task from decode to completion",
        )
        .buckets(vec![
            0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0,
        ]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Merge Metrics
// =============================================================================

/// Fragments concatenated total.
pub static FRAGMENTS_MERGED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "chunkcast_fragments_merged_total",
        "Total fragments concatenated into merged files",
    )
    .unwrap()
});

/// Fragments whose names had no ordering number.
pub static MALFORMED_FRAGMENTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "chunkcast_malformed_fragments_total",
        "Total fragments merged without an ordering number in their name",
    )
    .unwrap()
});

/// Bytes written to merged files total.
pub static MERGED_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "chunkcast_merged_bytes_total",
        "Total bytes written to merged files",
    )
    .unwrap()
});

// =============================================================================
// Transcode Metrics
// =============================================================================

/// Successful transcode duration in seconds.
pub static TRANSCODE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "chunkcast_transcode_duration_seconds",
            "Duration of successful ffmpeg runs",
        )
        .buckets(vec![1.0, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]),
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Tasks
        Box::new(TASKS_TOTAL.clone()),
        Box::new(TASK_FAILURES.clone()),
        Box::new(TASK_DURATION.clone()),
        // Merge
        Box::new(FRAGMENTS_MERGED.clone()),
        Box::new(MALFORMED_FRAGMENTS.clone()),
        Box::new(MERGED_BYTES.clone()),
        // Transcode
        Box::new(TRANSCODE_DURATION.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    #[test]
    fn test_all_metrics_register_without_conflicts() {
        let registry = Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }

        TASKS_TOTAL.with_label_values(&["completed"]).inc();
        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.contains(&"chunkcast_tasks_total".to_string()));
    }
}
