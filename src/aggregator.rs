/// Aggregator: answers the questions the presentation layer asks.
///
/// Every public operation is a stateless pipeline:
///
///   cache → fetcher → upstream
///        ↓
///   normalize → sort / assemble → return
///
/// Only mandatory data escalates to an error: the station list for
/// `list_stations` / `station_overview`, and the station's own metadata for
/// `station_detail`. Sensors, readings and the index degrade to empty/`None`
/// with a `Diagnostic` attached.
///
/// Per-sensor reading fetches fan out over a thread pool. Results are
/// recombined in sensor-list order, not completion order. An optional
/// deadline is fixed once per public call and shared by every fan-out in
/// it, so `station_overview` is bounded as a whole; readings that miss it
/// are `None`.

use crate::cache::{CacheKey, TtlCache};
use crate::config::ServiceConfig;
use crate::ingest::fetcher::{HttpFetcher, JsonSource};
use crate::ingest::normalize::{
    normalize_index, normalize_reading, normalize_sensors, normalize_station, normalize_stations,
};
use crate::logging::log_fetch_failure;
use crate::model::{
    AirQualityError, AirQualityIndex, Diagnostic, DiagnosticScope, FetchError, Measurement, Reading,
    Sensor, SensorReading, Station, StationDetail, StationReadings, StationSummary,
};
use serde_json::Value;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use threadpool::ThreadPool;
use tracing::{debug, error, warn};

/// Cache of raw upstream documents, shared by all operations.
pub type ResponseCache = TtlCache<Arc<Value>>;

// ---------------------------------------------------------------------------
// Cached upstream resources
// ---------------------------------------------------------------------------

struct Upstream<S> {
    source: S,
    cache: ResponseCache,
}

impl<S: JsonSource> Upstream<S> {
    fn cached(&self, key: CacheKey, path: &str, query: &[(&str, String)]) -> Result<Arc<Value>, FetchError> {
        self.cache
            .get_or_try_insert_with(key, || self.source.fetch_with_query(path, query).map(Arc::new))
    }

    fn station_list(&self, page_size: u32) -> Result<Arc<Value>, FetchError> {
        self.cached(
            CacheKey::new("station_list", &[i64::from(page_size)]),
            "station/findAll",
            &[("page", "0".to_string()), ("size", page_size.to_string())],
        )
    }

    fn station(&self, station_id: i64) -> Result<Arc<Value>, FetchError> {
        self.cached(
            CacheKey::new("station", &[station_id]),
            &format!("station/{}", station_id),
            &[],
        )
    }

    fn sensors(&self, station_id: i64) -> Result<Arc<Value>, FetchError> {
        self.cached(
            CacheKey::new("station_sensors", &[station_id]),
            &format!("station/sensors/{}", station_id),
            &[],
        )
    }

    fn sensor_data(&self, sensor_id: i64) -> Result<Arc<Value>, FetchError> {
        self.cached(
            CacheKey::new("sensor_data", &[sensor_id]),
            &format!("data/getData/{}", sensor_id),
            &[],
        )
    }

    fn index(&self, station_id: i64) -> Result<Arc<Value>, FetchError> {
        self.cached(
            CacheKey::new("station_index", &[station_id]),
            &format!("aqindex/getIndex/{}", station_id),
            &[],
        )
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Sorts stations by `(city, name)` ascending, a missing city sorting as
/// the empty string. The sort is stable, so ties keep upstream order.
pub fn sort_stations(stations: &mut [Station]) {
    stations.sort_by(|a, b| {
        let key_a = (a.city.as_deref().unwrap_or(""), a.name.as_str());
        let key_b = (b.city.as_deref().unwrap_or(""), b.name.as_str());
        key_a.cmp(&key_b)
    });
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct AirQualityService<S: JsonSource + 'static = HttpFetcher> {
    upstream: Arc<Upstream<S>>,
    pool: ThreadPool,
    station_page_size: u32,
    deadline: Option<Duration>,
}

impl AirQualityService<HttpFetcher> {
    /// Builds the production service: HTTP fetcher over the configured
    /// candidates and a wall-clock cache.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(config.upstream.base_urls.clone(), config.timeout())?;
        let cache = ResponseCache::new(config.cache.capacity, config.cache_ttl());
        Ok(Self::new(fetcher, cache, config))
    }
}

impl<S: JsonSource + 'static> AirQualityService<S> {
    /// Builds a service over any JSON source and an explicitly constructed
    /// cache.
    pub fn new(source: S, cache: ResponseCache, config: &ServiceConfig) -> Self {
        Self {
            upstream: Arc::new(Upstream { source, cache }),
            pool: ThreadPool::with_name("aqmon-readings".into(), config.aggregator.worker_threads.max(1)),
            station_page_size: config.upstream.station_page_size,
            deadline: config.request_deadline(),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.upstream.cache
    }

    /// All stations, sorted by `(city, name)`.
    ///
    /// # Errors
    /// `UpstreamUnavailable` when the list could not be fetched from any
    /// candidate. An unavailable list is never reported as zero stations.
    pub fn list_stations(&self) -> Result<Vec<Station>, AirQualityError> {
        let raw = self.upstream.station_list(self.station_page_size).map_err(|e| {
            log_fetch_failure("station_list", None, &e);
            e
        })?;

        // The normalizer only emits stations with an id.
        let mut stations = normalize_stations(&raw);
        sort_stations(&mut stations);
        debug!(count = stations.len(), "station list normalized");
        Ok(stations)
    }

    /// Sensors of a station with their current readings. Never fails.
    pub fn station_readings(&self, station_id: i64) -> StationReadings {
        self.readings_until(station_id, self.request_deadline())
    }

    fn readings_until(&self, station_id: i64, deadline: Option<Instant>) -> StationReadings {
        let mut diagnostics = Vec::new();

        if deadline.is_some_and(|at| Instant::now() >= at) {
            diagnostics.push(Diagnostic::new(
                DiagnosticScope::Deadline,
                "deadline passed before the station's sensors were fetched",
            ));
            return StationReadings {
                station_id,
                sensors: Vec::new(),
                diagnostics,
            };
        }

        let sensors = match self.upstream.sensors(station_id) {
            Ok(raw) => normalize_sensors(&raw, station_id),
            Err(e) => {
                log_fetch_failure("station_sensors", Some(station_id), &e);
                diagnostics.push(Diagnostic::new(DiagnosticScope::Sensors, e.to_string()));
                Vec::new()
            }
        };

        let sensors = self.collect_readings(sensors, deadline, &mut diagnostics);

        StationReadings {
            station_id,
            sensors,
            diagnostics,
        }
    }

    /// The station's current index, or `None` when it is not published,
    /// malformed, or could not be fetched.
    pub fn station_index(&self, station_id: i64) -> Option<AirQualityIndex> {
        self.index_with_diagnostic(station_id).unwrap_or_default()
    }

    /// Metadata, readings and index of one station.
    ///
    /// # Errors
    /// - `NotFound` when the station list was fetched and does not contain
    ///   the station.
    /// - `UpstreamUnavailable` when neither the single-station resource nor
    ///   the station list could be fetched.
    pub fn station_detail(&self, station_id: i64) -> Result<StationDetail, AirQualityError> {
        let deadline = self.request_deadline();
        let station = self.station_metadata(station_id)?;

        let readings = self.readings_until(station_id, deadline);
        let mut diagnostics = readings.diagnostics;

        let index = match self.index_with_diagnostic(station_id) {
            Ok(index) => index,
            Err(diagnostic) => {
                diagnostics.push(diagnostic);
                None
            }
        };

        Ok(StationDetail {
            station,
            sensors: readings.sensors,
            index,
            diagnostics,
        })
    }

    /// Every station with its present measurements.
    ///
    /// Sensors whose current value is absent are left out of the summary.
    ///
    /// # Errors
    /// `UpstreamUnavailable` when the station list is unavailable.
    pub fn station_overview(&self) -> Result<Vec<StationSummary>, AirQualityError> {
        let deadline = self.request_deadline();
        let stations = self.list_stations()?;

        Ok(stations
            .into_iter()
            .map(|station| {
                let readings = self.readings_until(station.id, deadline);
                let measurements = readings
                    .sensors
                    .into_iter()
                    .filter_map(|entry| {
                        let value = entry.value()?;
                        Some(Measurement {
                            param_name: entry.sensor.param_name,
                            value,
                            timestamp: entry.reading.and_then(|r| r.timestamp),
                        })
                    })
                    .collect();
                StationSummary {
                    station,
                    measurements,
                }
            })
            .collect())
    }

    // --- internals ----------------------------------------------------------

    /// Wall-clock cut-off for one public call. A budget too large to add to
    /// the current instant means no deadline.
    fn request_deadline(&self) -> Option<Instant> {
        self.deadline.and_then(|budget| Instant::now().checked_add(budget))
    }

    /// Tries the single-station resource first, then the station list.
    fn station_metadata(&self, station_id: i64) -> Result<Station, AirQualityError> {
        match self.upstream.station(station_id) {
            Ok(raw) => match normalize_station(&raw) {
                Some(station) if station.id == station_id => return Ok(station),
                _ => debug!(station_id, "single-station resource unusable, using station list"),
            },
            Err(e) => log_fetch_failure("station", Some(station_id), &e),
        }

        let raw = self.upstream.station_list(self.station_page_size).map_err(|e| {
            log_fetch_failure("station_list", Some(station_id), &e);
            e
        })?;

        normalize_stations(&raw)
            .into_iter()
            .find(|s| s.id == station_id)
            .ok_or(AirQualityError::NotFound(station_id))
    }

    fn index_with_diagnostic(&self, station_id: i64) -> Result<Option<AirQualityIndex>, Diagnostic> {
        match self.upstream.index(station_id) {
            Ok(raw) => Ok(normalize_index(&raw, station_id)),
            Err(e) => {
                log_fetch_failure("station_index", Some(station_id), &e);
                Err(Diagnostic::new(DiagnosticScope::Index, e.to_string()))
            }
        }
    }

    /// Fetches the current reading of every sensor on the pool and pairs
    /// them back up in sensor order.
    fn collect_readings(
        &self,
        sensors: Vec<Sensor>,
        deadline: Option<Instant>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Vec<SensorReading> {
        type Outcome = Result<Option<Reading>, FetchError>;

        let (tx, rx) = mpsc::channel::<(usize, Outcome)>();

        for (slot, sensor) in sensors.iter().enumerate() {
            let tx = tx.clone();
            let upstream = Arc::clone(&self.upstream);
            let sensor_id = sensor.id;
            self.pool.execute(move || {
                let outcome = upstream
                    .sensor_data(sensor_id)
                    .map(|raw| normalize_reading(&raw, sensor_id));
                // The collector may have stopped listening at the deadline.
                let _ = tx.send((slot, outcome));
            });
        }
        drop(tx);

        let mut outcomes: Vec<Option<Outcome>> = sensors.iter().map(|_| None).collect();
        let mut pending = sensors.len();
        let mut timed_out = false;

        while pending > 0 {
            let received = match deadline {
                Some(at) => match rx.recv_timeout(at.saturating_duration_since(Instant::now())) {
                    Ok(message) => message,
                    Err(RecvTimeoutError::Timeout) => {
                        timed_out = true;
                        break;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                },
                None => match rx.recv() {
                    Ok(message) => message,
                    Err(_) => break,
                },
            };
            let (slot, outcome) = received;
            outcomes[slot] = Some(outcome);
            pending -= 1;
        }

        // Without a timeout, a closed channel with results still missing
        // means those workers died before sending.
        if timed_out {
            warn!(pending, "reading fan-out did not finish in time");
            diagnostics.push(Diagnostic::new(
                DiagnosticScope::Deadline,
                format!("{} of {} readings not received before the deadline", pending, sensors.len()),
            ));
        } else if pending > 0 {
            error!(pending, "reading workers stopped without reporting a result");
        }

        sensors
            .into_iter()
            .zip(outcomes)
            .map(|(sensor, outcome)| {
                let reading = match outcome {
                    Some(Ok(reading)) => reading,
                    Some(Err(e)) => {
                        log_fetch_failure("sensor_data", Some(sensor.id), &e);
                        diagnostics.push(Diagnostic::new(DiagnosticScope::Reading(sensor.id), e.to_string()));
                        None
                    }
                    None if !timed_out => {
                        diagnostics.push(Diagnostic::new(
                            DiagnosticScope::Reading(sensor.id),
                            "reading worker stopped without reporting a result",
                        ));
                        None
                    }
                    None => None,
                };
                SensorReading { sensor, reading }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
