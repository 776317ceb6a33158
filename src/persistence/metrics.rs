// Copyright 2025 Cowboy AI, LLC.

//! Metrics collection for persistence operations

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const MAX_SAMPLES: usize = 1000;

/// Counters, error counts and duration samples keyed by operation name
#[derive(Debug, Clone, Default)]
pub struct PersistenceMetrics {
    counters: Arc<RwLock<HashMap<String, u64>>>,
    durations: Arc<RwLock<HashMap<String, Vec<Duration>>>>,
    errors: Arc<RwLock<HashMap<String, u64>>>,
}

impl PersistenceMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter
    pub async fn increment(&self, name: &str) {
        let mut counters = self.counters.write().await;
        *counters.entry(name.to_string()).or_insert(0) += 1;
    }

    /// Record an error
    pub async fn record_error(&self, operation: &str) {
        let mut errors = self.errors.write().await;
        *errors.entry(operation.to_string()).or_insert(0) += 1;
    }

    /// Record operation duration; only the latest samples are kept
    pub async fn record_duration(&self, operation: &str, duration: Duration) {
        let mut durations = self.durations.write().await;
        let samples = durations.entry(operation.to_string()).or_default();
        samples.push(duration);
        if samples.len() > MAX_SAMPLES {
            let excess = samples.len() - MAX_SAMPLES;
            samples.drain(..excess);
        }
    }

    /// Get counter value
    pub async fn get_counter(&self, name: &str) -> u64 {
        self.counters.read().await.get(name).copied().unwrap_or(0)
    }

    /// Get error count
    pub async fn get_error_count(&self, operation: &str) -> u64 {
        self.errors.read().await.get(operation).copied().unwrap_or(0)
    }

    /// Statistics for one operation
    pub async fn duration_stats(&self, operation: &str) -> Option<DurationStats> {
        self.durations
            .read()
            .await
            .get(operation)
            .and_then(|samples| DurationStats::from_samples(samples))
    }

    /// Get all metrics as a summary
    pub async fn summary(&self) -> MetricsSummary {
        let counters = self.counters.read().await.clone();
        let errors = self.errors.read().await.clone();
        let durations = self
            .durations
            .read()
            .await
            .iter()
            .filter_map(|(op, samples)| {
                DurationStats::from_samples(samples).map(|s| (op.clone(), s))
            })
            .collect();

        MetricsSummary {
            counters,
            errors,
            durations,
        }
    }

    /// Reset all metrics
    pub async fn reset(&self) {
        self.counters.write().await.clear();
        self.durations.write().await.clear();
        self.errors.write().await.clear();
    }
}

/// Summary of all metrics
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    /// Counter values
    pub counters: HashMap<String, u64>,
    /// Error counts
    pub errors: HashMap<String, u64>,
    /// Duration statistics
    pub durations: HashMap<String, DurationStats>,
}

/// Duration statistics for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationStats {
    /// Number of measurements
    pub count: usize,
    /// Average duration
    pub avg: Duration,
    /// 50th percentile
    pub p50: Duration,
    /// 95th percentile
    pub p95: Duration,
    /// Minimum duration
    pub min: Duration,
    /// Maximum duration
    pub max: Duration,
}

impl DurationStats {
    fn from_samples(samples: &[Duration]) -> Option<Self> {
        let mut sorted = samples.to_vec();
        sorted.sort();
        let min = *sorted.first()?;
        let max = *sorted.last()?;
        let count = sorted.len();
        let total: Duration = sorted.iter().sum();
        let at = |pct: f64| sorted[((count as f64 - 1.0) * pct) as usize];

        Some(Self {
            count,
            avg: total / count as u32,
            p50: at(0.50),
            p95: at(0.95),
            min,
            max,
        })
    }
}

/// Timer for measuring operation duration
pub struct MetricsTimer<'a> {
    metrics: &'a PersistenceMetrics,
    operation: String,
    start: Instant,
}

impl<'a> MetricsTimer<'a> {
    /// Start timing `operation`
    pub fn new(metrics: &'a PersistenceMetrics, operation: impl Into<String>) -> Self {
        Self {
            metrics,
            operation: operation.into(),
            start: Instant::now(),
        }
    }

    /// Record the duration and count a success
    pub async fn record(self) {
        self.metrics
            .record_duration(&self.operation, self.start.elapsed())
            .await;
        self.metrics
            .increment(&format!("{}.count", self.operation))
            .await;
    }

    /// Record the duration and count an error
    pub async fn record_error(self) {
        self.metrics
            .record_duration(&self.operation, self.start.elapsed())
            .await;
        self.metrics.record_error(&self.operation).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counters_and_errors() {
        let metrics = PersistenceMetrics::new();
        metrics.increment("materials.insert.count").await;
        metrics.increment("materials.insert.count").await;
        metrics.record_error("materials.replace").await;

        assert_eq!(metrics.get_counter("materials.insert.count").await, 2);
        assert_eq!(metrics.get_counter("nonexistent").await, 0);
        assert_eq!(metrics.get_error_count("materials.replace").await, 1);
    }

    #[tokio::test]
    async fn test_duration_stats() {
        let metrics = PersistenceMetrics::new();
        for ms in [10, 20, 30] {
            metrics.record_duration("op", Duration::from_millis(ms)).await;
        }

        let stats = metrics.duration_stats("op").await.unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.avg, Duration::from_millis(20));
        assert_eq!(stats.p50, Duration::from_millis(20));
        assert_eq!(stats.min, Duration::from_millis(10));
        assert_eq!(stats.max, Duration::from_millis(30));
        assert!(metrics.duration_stats("missing").await.is_none());
    }

    #[tokio::test]
    async fn test_sample_window_is_bounded() {
        let metrics = PersistenceMetrics::new();
        for _ in 0..(MAX_SAMPLES + 5) {
            metrics.record_duration("op", Duration::from_micros(1)).await;
        }
        assert_eq!(metrics.summary().await.durations["op"].count, MAX_SAMPLES);

        metrics.reset().await;
        assert!(metrics.summary().await.durations.is_empty());
    }
}
