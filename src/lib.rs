/// aqmon_service: resilient access to Polish air-quality monitoring data.
///
/// # Module structure
///
/// ```text
/// aqmon_service
/// ├── model       — shared data types (Station, Sensor, Reading, AirQualityIndex, FetchError, …)
/// ├── config      — service configuration loader (aqmon.toml + env overrides)
/// ├── logging     — tracing subscriber setup and fetch-failure classification
/// ├── cache       — bounded TTL cache with an injectable clock
/// ├── ingest
/// │   ├── fetcher   — multi-candidate HTTP JSON fetcher (API migration fallback)
/// │   ├── normalize — schema-tolerant conversion of upstream payloads into records
/// │   └── fixtures (test only) — representative API response payloads
/// ├── aggregator  — station list, readings, index, detail and overview operations
/// └── endpoint    — read-only JSON HTTP API over the aggregator
/// ```

/// Public modules
pub mod aggregator;
pub mod cache;
pub mod config;
pub mod endpoint;
pub mod ingest;
pub mod logging;
pub mod model;
