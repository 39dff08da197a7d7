//! Telemetry facade for phicore services. Counters, latency samples and
//! last-value gauges are kept in process so tests can assert on what a
//! scoring run recorded; shipping them anywhere is left to the host.
//!
//! Nothing here runs on a timer. The host calls [`TelemetryHandle::flush`]
//! every [`TelemetryHandle::flush_interval`] milliseconds; between flushes each
//! latency metric keeps at most `max-latency-samples` of its newest readings.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, VecDeque},
    sync::Arc,
    time::SystemTime,
};
use thiserror::Error;

#[cfg(any(
    all(feature = "dev", feature = "test"),
    all(feature = "dev", feature = "prod"),
    all(feature = "test", feature = "prod")
))]
compile_error!(
    "Only one of the `dev`, `test`, or `prod` features may be enabled for phicore-telemetry."
);

#[cfg(feature = "dev")]
const DEFAULT_FLUSH_MS: u64 = 1_000;
#[cfg(feature = "test")]
const DEFAULT_FLUSH_MS: u64 = 250;
#[cfg(any(feature = "prod", not(any(feature = "dev", feature = "test"))))]
const DEFAULT_FLUSH_MS: u64 = 10_000;

fn default_flush_interval_ms() -> u64 {
    DEFAULT_FLUSH_MS
}

pub const DEFAULT_MAX_LATENCY_SAMPLES: usize = 4_096;

const fn default_max_latency_samples() -> usize {
    DEFAULT_MAX_LATENCY_SAMPLES
}

/// # TOML
/// ```text
/// [telemetry]
/// endpoint = "http://localhost:4318"
/// flush-interval-ms = 10000
/// max-latency-samples = 4096
/// labels = { component = "phicore-node" }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct TelemetryConfig {
    /// Collector endpoint; recorded for the host, not dialled by this crate.
    pub endpoint: String,
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Per-metric bound on buffered latency readings; the oldest are dropped.
    #[serde(default = "default_max_latency_samples")]
    pub max_latency_samples: usize,
    /// Labels attached to every snapshot.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

impl TelemetryConfig {
    pub fn sample(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_owned(),
            flush_interval_ms: default_flush_interval_ms(),
            max_latency_samples: default_max_latency_samples(),
            labels: BTreeMap::from([("component".into(), "phicore-node".into())]),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TelemetryError {
    #[error("counter overflow for metric {0}")]
    CounterOverflow(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TelemetrySnapshot {
    pub timestamp: SystemTime,
    pub labels: BTreeMap<String, String>,
    pub counters: BTreeMap<String, u64>,
    pub latencies_us: BTreeMap<String, Vec<u64>>,
    pub gauges: BTreeMap<String, f64>,
}

impl TelemetrySnapshot {
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or_default()
    }
}

#[derive(Default)]
struct TelemetryState {
    counters: BTreeMap<String, u64>,
    latencies_us: BTreeMap<String, VecDeque<u64>>,
    gauges: BTreeMap<String, f64>,
}

/// Cloneable handle; every clone records into the same state.
#[derive(Clone)]
pub struct TelemetryHandle {
    config: TelemetryConfig,
    state: Arc<Mutex<TelemetryState>>,
}

impl TelemetryHandle {
    pub fn from_config(config: TelemetryConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(TelemetryState::default())),
        }
    }

    pub fn record_counter(&self, name: &str, delta: u64) -> Result<(), TelemetryError> {
        let mut guard = self.state.lock();
        let entry = guard.counters.entry(name.to_owned()).or_default();
        *entry = entry
            .checked_add(delta)
            .ok_or_else(|| TelemetryError::CounterOverflow(name.to_owned()))?;
        Ok(())
    }

    pub fn record_latency_us(&self, name: &str, value: u64) {
        let cap = self.config.max_latency_samples.max(1);
        let mut guard = self.state.lock();
        let samples = guard.latencies_us.entry(name.to_owned()).or_default();
        if samples.len() >= cap {
            samples.pop_front();
        }
        samples.push_back(value);
    }

    /// Overwrites the previous value; non-finite readings are dropped.
    pub fn record_gauge(&self, name: &str, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.state.lock().gauges.insert(name.to_owned(), value);
    }

    /// Drain counters and latencies. Gauges keep their last value.
    pub fn flush(&self) -> TelemetrySnapshot {
        let mut guard = self.state.lock();
        TelemetrySnapshot {
            timestamp: SystemTime::now(),
            labels: self.config.labels.clone(),
            counters: std::mem::take(&mut guard.counters),
            latencies_us: std::mem::take(&mut guard.latencies_us)
                .into_iter()
                .map(|(name, samples)| (name, Vec::from(samples)))
                .collect(),
            gauges: guard.gauges.clone(),
        }
    }

    pub fn flush_interval(&self) -> u64 {
        self.config.flush_interval_ms
    }
}
