/// Core data types for the air-quality monitoring service.
///
/// This module defines the shared domain model imported by all other modules:
/// the canonical records produced by the normalizer, the composite records
/// returned by the aggregator, and the error types. It contains no I/O.

use serde::Serialize;
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Canonical records
// ---------------------------------------------------------------------------

/// A physical air-quality monitoring location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Station {
    /// Stable upstream identifier.
    pub id: i64,
    pub name: String,
    pub city: Option<String>,
    pub province: Option<String>,
}

/// A single-parameter measuring device attached to a station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sensor {
    pub id: i64,
    pub station_id: i64,
    /// Canonical parameter label, e.g. "PM10", "PM2.5", "NO2".
    pub param_name: String,
}

/// The current value of a sensor.
///
/// `value` is `None` when the upstream reports the sensor but has no
/// measurement for the latest slot (sensor offline). Such readings are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub sensor_id: i64,
    pub value: Option<f64>,
    pub timestamp: Option<String>, // e.g. "2024-01-01 13:00:00"
}

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

impl Reading {
    /// Parses `timestamp` in any of the formats the upstream has been seen
    /// to use. Returns `None` for absent or unrecognised timestamps.
    pub fn observed_at(&self) -> Option<chrono::NaiveDateTime> {
        let raw = self.timestamp.as_deref()?.trim();
        TIMESTAMP_FORMATS
            .iter()
            .find_map(|fmt| chrono::NaiveDateTime::parse_from_str(raw, fmt).ok())
    }
}

/// Parameter keys reported by the upstream index endpoint, in display order.
pub const INDEX_PARAMETERS: &[&str] = &["so2", "no2", "pm10", "pm25", "o3"];

/// Categorical air-quality rating computed upstream for a station.
///
/// `per_parameter_level` always carries every key in `INDEX_PARAMETERS`;
/// a parameter the upstream did not rate maps to `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirQualityIndex {
    pub station_id: i64,
    pub overall_level: Option<String>,
    pub per_parameter_level: BTreeMap<String, Option<String>>,
}

// ---------------------------------------------------------------------------
// Aggregated records
// ---------------------------------------------------------------------------

/// A sensor paired with its current reading, if one could be obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub sensor: Sensor,
    pub reading: Option<Reading>,
}

impl SensorReading {
    /// Current value, flattening "no reading" and "reading without value".
    pub fn value(&self) -> Option<f64> {
        self.reading.as_ref().and_then(|r| r.value)
    }
}

/// Which part of an aggregated answer a diagnostic refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DiagnosticScope {
    Sensors,
    Reading(i64),
    Index,
    Deadline,
}

/// Non-fatal note attached to a degraded answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub scope: DiagnosticScope,
    pub message: String,
}

impl Diagnostic {
    pub fn new(scope: DiagnosticScope, message: impl Into<String>) -> Self {
        Self {
            scope,
            message: message.into(),
        }
    }
}

/// Sensors of one station with their current readings, in sensor-list order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationReadings {
    pub station_id: i64,
    pub sensors: Vec<SensorReading>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Everything known about one station right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationDetail {
    pub station: Station,
    pub sensors: Vec<SensorReading>,
    pub index: Option<AirQualityIndex>,
    pub diagnostics: Vec<Diagnostic>,
}

/// A present measurement, as listed on the overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub param_name: String,
    pub value: f64,
    pub timestamp: Option<String>,
}

/// One row of the all-stations overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationSummary {
    pub station: Station,
    pub measurements: Vec<Measurement>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Why a fetch against the upstream API failed.
///
/// When every candidate base URL fails, the fetcher reports the error of the
/// last candidate tried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// Connection failure, timeout, or an unreadable body.
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },
    /// Non-success HTTP status. `body` is truncated.
    #[error("HTTP {status} from {url}: {body}")]
    UpstreamHttp { url: String, status: u16, body: String },
    /// The body was not JSON, or not parseable JSON.
    #[error("malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },
    /// No base URL was configured.
    #[error("no candidate base URLs configured")]
    NoCandidates,
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures surfaced by the aggregator. Everything else degrades to
/// `None`/empty with a `Diagnostic`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AirQualityError {
    #[error("station {0} not found")]
    NotFound(i64),
    #[error("air-quality data unavailable: {0}")]
    UpstreamUnavailable(#[from] FetchError),
}
