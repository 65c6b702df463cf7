//! Logging and metrics for notepix
//!
//! This crate provides:
//! - Subscriber setup for `tracing` with compact or JSON output
//! - A small in-process metrics registry
//! - Shrink outcome accounting for batch runs
//! - Timers for measuring per-upload latency

use notepix_core::config::LoggingConfig;
use notepix_image::ShrinkOutcome;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize logging with defaults
pub fn init() -> anyhow::Result<()> {
    init_with_config(TelemetryConfig::default())
}

/// Initialize logging with custom configuration
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let (json, compact) = if config.json {
        let layer = fmt::layer()
            .json()
            .with_target(config.show_target)
            .with_writer(std::io::stderr);
        (Some(layer), None)
    } else {
        let layer = fmt::layer()
            .compact()
            .with_target(config.show_target)
            .with_writer(std::io::stderr);
        (None, Some(layer))
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(json).with(compact);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit one JSON object per event
    pub json: bool,
    /// Include the event target (module path)
    pub show_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
            show_target: false,
        }
    }
}

impl From<&LoggingConfig> for TelemetryConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            log_level: config.level.clone(),
            json: config.json,
            ..Self::default()
        }
    }
}

/// Metrics registry for counters and histograms
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    counters: RwLock<HashMap<String, AtomicU64>>,
    histograms: RwLock<HashMap<String, Vec<f64>>>,
}

impl MetricsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter
    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    /// Increment a counter by a specific amount
    pub fn increment_by(&self, name: &str, value: u64) {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(counter) = counters.get(name) {
            counter.fetch_add(value, Ordering::Relaxed);
        } else {
            drop(counters);
            let mut counters = self.counters.write().unwrap_or_else(PoisonError::into_inner);
            counters
                .entry(name.to_string())
                .or_insert_with(|| AtomicU64::new(0))
                .fetch_add(value, Ordering::Relaxed);
        }
    }

    /// Current value of a counter, zero if never incremented
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Record a histogram value
    pub fn histogram(&self, name: &str, value: f64) {
        let mut histograms = self.histograms.write().unwrap_or_else(PoisonError::into_inner);
        histograms.entry(name.to_string()).or_default().push(value);
    }

    /// Statistics for a histogram
    pub fn histogram_stats(&self, name: &str) -> HistogramStats {
        let histograms = self.histograms.read().unwrap_or_else(PoisonError::into_inner);
        HistogramStats::from_values(histograms.get(name).map_or(&[][..], Vec::as_slice))
    }

    /// Export metrics as JSON
    pub fn export_json(&self) -> serde_json::Value {
        let counters = self.counters.read().unwrap_or_else(PoisonError::into_inner);
        let histograms = self.histograms.read().unwrap_or_else(PoisonError::into_inner);

        let counter_values: HashMap<&str, u64> = counters
            .iter()
            .map(|(k, v)| (k.as_str(), v.load(Ordering::Relaxed)))
            .collect();

        let histogram_stats: HashMap<&str, HistogramStats> = histograms
            .iter()
            .map(|(k, v)| (k.as_str(), HistogramStats::from_values(v)))
            .collect();

        serde_json::json!({
            "session_id": session_id(),
            "counters": counter_values,
            "histograms": histogram_stats,
        })
    }
}

/// Histogram statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramStats {
    /// Number of samples
    pub count: usize,
    /// Smallest sample
    pub min: f64,
    /// Largest sample
    pub max: f64,
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub p50: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
}

impl HistogramStats {
    fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                count: 0,
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                p50: 0.0,
                p95: 0.0,
                p99: 0.0,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let sum: f64 = sorted.iter().sum();

        Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sum / count as f64,
            p50: percentile(&sorted, 50.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
        }
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((p / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

const PROCESSED: &str = "images.processed";
const FAILED: &str = "images.failed";
const SKIPPED: &str = "images.shrink.skipped";
const BYTES_IN: &str = "images.bytes_in";
const BYTES_OUT: &str = "images.bytes_out";
const DURATION_MS: &str = "images.duration_ms";

fn outcome_counter(outcome: ShrinkOutcome) -> &'static str {
    match outcome {
        ShrinkOutcome::Optimized => "images.shrink.optimized",
        ShrinkOutcome::Resized => "images.shrink.resized",
        ShrinkOutcome::Original => "images.shrink.original",
    }
}

/// Per-run accounting of shrink outcomes and byte savings.
///
/// Safe to share between worker threads.
#[derive(Debug, Default)]
pub struct ShrinkMetrics {
    registry: MetricsRegistry,
}

impl ShrinkMetrics {
    /// Create empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one processed upload.
    ///
    /// `outcome` is `None` when shrinking was skipped.
    pub fn record(&self, outcome: Option<ShrinkOutcome>, bytes_in: usize, bytes_out: usize, duration: Duration) {
        self.registry.increment(PROCESSED);
        self.registry.increment(outcome.map_or(SKIPPED, outcome_counter));
        self.registry.increment_by(BYTES_IN, bytes_in as u64);
        self.registry.increment_by(BYTES_OUT, bytes_out as u64);
        self.registry.histogram(DURATION_MS, duration.as_secs_f64() * 1000.0);
    }

    /// Record an upload that could not be processed.
    pub fn record_failure(&self) {
        self.registry.increment(FAILED);
    }

    /// Snapshot of everything recorded so far.
    pub fn summary(&self) -> ShrinkSummary {
        let bytes_in = self.registry.counter(BYTES_IN);
        let bytes_out = self.registry.counter(BYTES_OUT);
        ShrinkSummary {
            processed: self.registry.counter(PROCESSED),
            failed: self.registry.counter(FAILED),
            optimized: self.registry.counter(outcome_counter(ShrinkOutcome::Optimized)),
            resized: self.registry.counter(outcome_counter(ShrinkOutcome::Resized)),
            original: self.registry.counter(outcome_counter(ShrinkOutcome::Original)),
            skipped: self.registry.counter(SKIPPED),
            bytes_in,
            bytes_out,
            bytes_saved: bytes_in.saturating_sub(bytes_out),
            duration_ms: self.registry.histogram_stats(DURATION_MS),
        }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }
}

/// Totals reported at the end of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ShrinkSummary {
    /// Uploads processed successfully
    pub processed: u64,
    /// Uploads that failed
    pub failed: u64,
    /// Resized and optimized
    pub optimized: u64,
    /// Resized only, optimizer failed
    pub resized: u64,
    /// Kept verbatim after a size regression
    pub original: u64,
    /// Shrinking not requested or not possible
    pub skipped: u64,
    /// Total upload bytes
    pub bytes_in: u64,
    /// Total stored bytes
    pub bytes_out: u64,
    /// `bytes_in - bytes_out`
    pub bytes_saved: u64,
    /// Per-upload processing time
    pub duration_ms: HistogramStats,
}

impl ShrinkSummary {
    /// Saved bytes as a percentage of the input, 0 when nothing was read.
    pub fn savings_percent(&self) -> f64 {
        if self.bytes_in == 0 {
            0.0
        } else {
            self.bytes_saved as f64 * 100.0 / self.bytes_in as f64
        }
    }
}

/// Timer for measuring operation duration
#[derive(Debug)]
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
        }
    }

    /// Time since the timer started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.name,
            duration_ms = duration.as_millis() as u64,
            "Timer completed"
        );
        duration
    }
}
