/// Normalizer: heterogeneous upstream JSON → canonical records.
///
/// The two API generations disagree on envelope shape (bare arrays vs.
/// objects wrapping the array under one of several keys) and on field names
/// (English camelCase vs. localized Polish labels). Each canonical field is
/// resolved through a priority-ordered alias table: the first alias that is
/// present, non-null and of a usable type wins.
///
/// Nothing in this module fails. Malformed individual records are skipped;
/// an unrecognised envelope yields an empty sequence or `None`.

use crate::model::{AirQualityIndex, Reading, Sensor, Station, INDEX_PARAMETERS};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Envelope keys, in priority order
// ---------------------------------------------------------------------------

const STATION_LIST_KEYS: &[&str] = &["data", "results", "stations", "Lista stacji pomiarowych"];
const SINGLE_STATION_KEYS: &[&str] = &["data", "result", "station"];
const SENSOR_LIST_KEYS: &[&str] = &[
    "data",
    "results",
    "sensors",
    "Lista stanowisk pomiarowych dla podanej stacji",
];
const READING_LIST_KEYS: &[&str] = &["values", "Lista danych pomiarowych"];
const INDEX_WRAPPER_KEY: &str = "AqIndex";

// ---------------------------------------------------------------------------
// Field aliases, in priority order. Dotted entries address nested objects.
// ---------------------------------------------------------------------------

const STATION_ID: &[&str] = &["id", "stationId", "stId", "Identyfikator stacji"];
const STATION_NAME: &[&str] = &["stationName", "name", "station", "Nazwa stacji"];
const STATION_CITY: &[&str] = &["city.name", "city", "cityName", "Nazwa miasta"];
const STATION_PROVINCE: &[&str] = &[
    "city.commune.provinceName",
    "province",
    "provinceName",
    "Województwo",
];

const SENSOR_ID: &[&str] = &["id", "sensorId", "Identyfikator stanowiska"];
const SENSOR_STATION_ID: &[&str] = &["stationId", "Identyfikator stacji"];
const SENSOR_PARAM: &[&str] = &[
    "param.paramCode",
    "param.paramFormula",
    "paramCode",
    "Wskaźnik - kod",
    "param.paramName",
    "paramName",
    "Wskaźnik",
];

const READING_VALUE: &[&str] = &["value", "Wartość"];
const READING_DATE: &[&str] = &["date", "Data"];

const INDEX_STATION_ID: &[&str] = &[
    "id",
    "stationId",
    "Identyfikator stacji",
    "Identyfikator stacji pomiarowej",
];
/// Overall level: a legacy `{ "indexLevelName" }` object or a flat v1 string.
const INDEX_OVERALL_KEYS: &[&str] = &["stIndexLevel", "Nazwa kategorii indeksu"];
/// Flat v1 per-parameter level keys are this prefix plus the parameter
/// code. The upstream spells "wskaźnika" both ways.
const INDEX_PARAMETER_PREFIXES: &[&str] = &[
    "Nazwa kategorii indeksu dla wskażnika ",
    "Nazwa kategorii indeksu dla wskaźnika ",
];
const INDEX_LEVEL_NAME: &[&str] = &["indexLevelName", "Nazwa kategorii indeksu"];

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// Resolves a dotted alias path against a record.
fn lookup<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(record, |value, key| value.get(key))
}

/// Scans `aliases` in order and returns the first value `convert` accepts.
fn first_alias<T>(record: &Value, aliases: &[&str], convert: impl Fn(&Value) -> Option<T>) -> Option<T> {
    aliases
        .iter()
        .filter_map(|alias| lookup(record, alias))
        .filter(|value| !value.is_null())
        .find_map(convert)
}

fn as_text(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Integer ids arrive as numbers, integral floats, or numeric strings.
fn as_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Measurement values arrive as numbers or numeric strings, the latter
/// sometimes with a decimal comma.
fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

/// Finds the record array: bare array first, then each wrapper key.
fn unwrap_list<'a>(raw: &'a Value, keys: &[&str]) -> &'a [Value] {
    if let Some(items) = raw.as_array() {
        return items;
    }
    keys.iter()
        .filter_map(|key| raw.get(key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .next()
        .unwrap_or(&[])
}

// ---------------------------------------------------------------------------
// Stations
// ---------------------------------------------------------------------------

fn station_from_record(record: &Value) -> Option<Station> {
    if !record.is_object() {
        return None;
    }
    Some(Station {
        id: first_alias(record, STATION_ID, as_id)?,
        name: first_alias(record, STATION_NAME, as_text)?,
        city: first_alias(record, STATION_CITY, as_text),
        province: first_alias(record, STATION_PROVINCE, as_text),
    })
}

/// Normalizes a station-list response, in upstream order.
///
/// Records without an id or a name are skipped; a missing city or province
/// is kept as `None`.
pub fn normalize_stations(raw: &Value) -> Vec<Station> {
    unwrap_list(raw, STATION_LIST_KEYS)
        .iter()
        .filter_map(station_from_record)
        .collect()
}

/// Normalizes a single-station response: a bare record, a record under a
/// wrapper key, or the first record of a list.
pub fn normalize_station(raw: &Value) -> Option<Station> {
    station_from_record(raw)
        .or_else(|| {
            SINGLE_STATION_KEYS
                .iter()
                .filter_map(|key| raw.get(key))
                .find_map(station_from_record)
        })
        .or_else(|| normalize_stations(raw).into_iter().next())
}

// ---------------------------------------------------------------------------
// Sensors
// ---------------------------------------------------------------------------

/// Normalizes a sensor-list response for `station_id`.
///
/// Records without an id or a parameter label are skipped. A record that
/// does not name its station is attributed to `station_id`.
pub fn normalize_sensors(raw: &Value, station_id: i64) -> Vec<Sensor> {
    unwrap_list(raw, SENSOR_LIST_KEYS)
        .iter()
        .filter(|record| record.is_object())
        .filter_map(|record| {
            Some(Sensor {
                id: first_alias(record, SENSOR_ID, as_id)?,
                station_id: first_alias(record, SENSOR_STATION_ID, as_id).unwrap_or(station_id),
                param_name: first_alias(record, SENSOR_PARAM, as_text)?,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// Takes the first measurement point as the current reading.
///
/// The upstream orders points newest first and that order is trusted; no
/// re-sorting by timestamp happens here. An empty or absent series is
/// `None`. A first point with a null value is kept as a reading with
/// `value = None`.
pub fn normalize_reading(raw: &Value, sensor_id: i64) -> Option<Reading> {
    let first = unwrap_list(raw, READING_LIST_KEYS).first()?;
    if !first.is_object() {
        return None;
    }
    Some(Reading {
        sensor_id,
        value: first_alias(first, READING_VALUE, as_number),
        timestamp: first_alias(first, READING_DATE, as_text),
    })
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

fn parameter_codes(param: &str) -> &'static [&'static str] {
    match param {
        "so2" => &["SO2"],
        "no2" => &["NO2"],
        "pm10" => &["PM10"],
        "pm25" => &["PM2.5", "PM25"],
        "o3" => &["O3"],
        _ => &[],
    }
}

fn parameter_level_keys(param: &str) -> Vec<String> {
    let mut keys = vec![format!("{}IndexLevel", param)];
    for prefix in INDEX_PARAMETER_PREFIXES {
        keys.extend(parameter_codes(param).iter().map(|code| format!("{}{}", prefix, code)));
    }
    keys
}

/// First non-null value among `keys`, else the first present one (so an
/// explicit null still counts as a published key).
fn index_entry<'a, K: AsRef<str>>(object: &'a Map<String, Value>, keys: &[K]) -> Option<&'a Value> {
    let present: Vec<&Value> = keys.iter().filter_map(|k| object.get(k.as_ref())).collect();
    present.iter().find(|v| !v.is_null()).or(present.first()).copied()
}

fn level_name(sub: Option<&Value>) -> Option<String> {
    let sub = sub?;
    as_text(sub).or_else(|| first_alias(sub, INDEX_LEVEL_NAME, as_text))
}

/// Normalizes an index response for `station_id`.
///
/// Returns `None` when the payload is not an object or carries none of the
/// index keys. Otherwise every parameter in `INDEX_PARAMETERS` is present in
/// `per_parameter_level`, with `None` where the upstream did not rate it.
pub fn normalize_index(raw: &Value, station_id: i64) -> Option<AirQualityIndex> {
    let body = raw.get(INDEX_WRAPPER_KEY).filter(|v| v.is_object()).unwrap_or(raw);
    let object = body.as_object()?;

    let overall = index_entry(object, INDEX_OVERALL_KEYS);
    let per_parameter: Vec<(&str, Option<&Value>)> = INDEX_PARAMETERS
        .iter()
        .map(|p| (*p, index_entry(object, &parameter_level_keys(p))))
        .collect();

    if overall.is_none() && per_parameter.iter().all(|(_, entry)| entry.is_none()) {
        return None;
    }

    let per_parameter_level: BTreeMap<String, Option<String>> = per_parameter
        .into_iter()
        .map(|(p, entry)| (p.to_string(), level_name(entry)))
        .collect();

    Some(AirQualityIndex {
        station_id: first_alias(body, INDEX_STATION_ID, as_id).unwrap_or(station_id),
        overall_level: level_name(overall),
        per_parameter_level,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
