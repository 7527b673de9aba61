/// Test fixtures: representative JSON payloads from the GIOS PJP API.
///
/// Trimmed to the minimum needed to exercise the normalizer, but shaped like
/// the real responses of both API generations:
///
///   legacy  /pjp-api/rest/station/findAll
///     [ { "id", "stationName", "city": { "name", "commune": { "provinceName" } } } ]
///   v1      /pjp-api/v1/rest/station/findAll
///     { "Lista stacji pomiarowych": [ { "Identyfikator stacji", "Nazwa stacji",
///                                       "Nazwa miasta", "Województwo" } ] }
///
/// Measurement values are numbers in the legacy API and occasionally
/// numeric strings in the v1 API. Both must be handled.

/// Three well-formed stations as a bare array (legacy shape). Deliberately
/// not in (city, name) order.
#[cfg(test)]
pub(crate) fn fixture_stations_bare_json() -> &'static str {
    r#"[
      {
        "id": 114,
        "stationName": "Wrocław - Bartnicza",
        "gegrLat": "51.115933",
        "gegrLon": "17.141125",
        "city": {
          "id": 1064,
          "name": "Wrocław",
          "commune": { "communeName": "Wrocław", "districtName": "Wrocław", "provinceName": "DOLNOŚLĄSKIE" }
        },
        "addressStreet": "ul. Bartnicza"
      },
      {
        "id": 400,
        "stationName": "Kraków, Aleja Krasińskiego",
        "city": {
          "id": 415,
          "name": "Kraków",
          "commune": { "communeName": "Kraków", "districtName": "Kraków", "provinceName": "MAŁOPOLSKIE" }
        }
      },
      {
        "id": 117,
        "stationName": "Wrocław - Korzeniowskiego",
        "city": {
          "id": 1064,
          "name": "Wrocław",
          "commune": { "communeName": "Wrocław", "districtName": "Wrocław", "provinceName": "DOLNOŚLĄSKIE" }
        }
      }
    ]"#
}

/// Wraps the bare station array under `key`.
#[cfg(test)]
pub(crate) fn fixture_stations_wrapped_json(key: &str) -> String {
    format!(r#"{{ "{}": {}, "totalPages": 1 }}"#, key, fixture_stations_bare_json())
}

/// Station list in the v1 shape with localized keys and a string id.
#[cfg(test)]
pub(crate) fn fixture_stations_localized_json() -> &'static str {
    r#"{
      "Lista stacji pomiarowych": [
        {
          "Identyfikator stacji": 52,
          "Kod stacji": "DsJelGorOgin",
          "Nazwa stacji": "Jelenia Góra - Ogińskiego",
          "Nazwa miasta": "Jelenia Góra",
          "Województwo": "DOLNOŚLĄSKIE"
        },
        {
          "Identyfikator stacji": "16",
          "Nazwa stacji": "Bielawa - ul. Parkowa",
          "Nazwa miasta": "Bielawa",
          "Województwo": "DOLNOŚLĄSKIE"
        }
      ],
      "links": { "first": "?page=0" }
    }"#
}

/// Mixed quality station records: one good, one without id, one without
/// name, one without city, one that is not an object at all.
#[cfg(test)]
pub(crate) fn fixture_stations_mixed_quality_json() -> &'static str {
    r#"[
      { "id": 1, "stationName": "Good", "city": { "name": "Gdańsk" } },
      { "stationName": "No id", "city": { "name": "Gdynia" } },
      { "id": 3, "city": { "name": "Sopot" } },
      { "id": 4, "stationName": "No city", "city": null },
      "garbage",
      { "id": null, "stationId": 5, "name": "Alias id", "cityName": "Łódź" }
    ]"#
}

/// Sensor list for station 114 (legacy shape). The third entry carries the
/// parameter only in the v1 localized form.
#[cfg(test)]
pub(crate) fn fixture_sensors_json() -> &'static str {
    r#"[
      {
        "id": 642,
        "stationId": 114,
        "param": { "paramName": "pył zawieszony PM10", "paramFormula": "PM10", "paramCode": "PM10", "idParam": 3 }
      },
      {
        "id": 644,
        "stationId": 114,
        "param": { "paramName": "pył zawieszony PM2.5", "paramFormula": "PM2.5", "paramCode": "PM2.5", "idParam": 69 }
      },
      {
        "Identyfikator stanowiska": 650,
        "Identyfikator stacji": 114,
        "Wskaźnik": "dwutlenek azotu",
        "Wskaźnik - kod": "NO2"
      },
      { "stationId": 114, "param": { "paramCode": "O3" } },
      { "id": 660, "stationId": 114, "param": {} }
    ]"#
}

/// Measurement series, newest first, with a leading null slot.
#[cfg(test)]
pub(crate) fn fixture_data_leading_null_json() -> &'static str {
    r#"{
      "key": "PM10",
      "values": [
        { "date": "2024-01-01 13:00:00", "value": null },
        { "date": "2024-01-01 12:00:00", "value": 31.2 }
      ]
    }"#
}

/// Measurement series in the v1 shape with a numeric string value.
#[cfg(test)]
pub(crate) fn fixture_data_localized_json() -> &'static str {
    r#"{
      "Lista danych pomiarowych": [
        { "Kod stanowiska": "DsWrocWybCon-PM10-1g", "Data": "2024-01-01 13:00:00", "Wartość": "17.5" },
        { "Kod stanowiska": "DsWrocWybCon-PM10-1g", "Data": "2024-01-01 12:00:00", "Wartość": 18.1 }
      ]
    }"#
}

/// Full index for station 114.
#[cfg(test)]
pub(crate) fn fixture_index_json() -> &'static str {
    r#"{
      "id": 114,
      "stCalcDate": "2024-01-01 13:20:00",
      "stIndexLevel": { "id": 1, "indexLevelName": "Dobry" },
      "so2IndexLevel": { "id": 0, "indexLevelName": "Bardzo dobry" },
      "no2IndexLevel": { "id": 0, "indexLevelName": "Bardzo dobry" },
      "pm10IndexLevel": { "id": 1, "indexLevelName": "Dobry" },
      "pm25IndexLevel": { "id": 2, "indexLevelName": "Umiarkowany" },
      "o3IndexLevel": { "id": 0, "indexLevelName": "Bardzo dobry" },
      "stIndexStatus": true
    }"#
}

/// Index with only the overall level and PM10 published; PM2.5 explicitly
/// null, the rest absent.
#[cfg(test)]
pub(crate) fn fixture_index_partial_json() -> &'static str {
    r#"{
      "id": 117,
      "stIndexLevel": { "id": 2, "indexLevelName": "Umiarkowany" },
      "pm10IndexLevel": { "id": 2, "indexLevelName": "Umiarkowany" },
      "pm25IndexLevel": null
    }"#
}

/// Index in the v1 shape: flat localized keys under `AqIndex`. SO2 is
/// explicitly null, O3 is not published.
#[cfg(test)]
pub(crate) fn fixture_index_localized_json() -> &'static str {
    r#"{
      "AqIndex": {
        "Identyfikator stacji pomiarowej": 52,
        "Data wykonania obliczeń indeksu": "2024-01-01 13:20:00",
        "Wartość indeksu": 1,
        "Nazwa kategorii indeksu": "Dobry",
        "Data danych źródłowych, z których policzono wartość indeksu dla wskaźnika st": "2024-01-01 13:00:00",
        "Wartość indeksu dla wskaźnika SO2": null,
        "Nazwa kategorii indeksu dla wskażnika SO2": null,
        "Wartość indeksu dla wskaźnika NO2": 0,
        "Nazwa kategorii indeksu dla wskażnika NO2": "Bardzo dobry",
        "Wartość indeksu dla wskaźnika PM10": 1,
        "Nazwa kategorii indeksu dla wskażnika PM10": "Dobry",
        "Wartość indeksu dla wskaźnika PM2.5": 2,
        "Nazwa kategorii indeksu dla wskażnika PM2.5": "Umiarkowany",
        "Status indeksu ogólnego dla stacji pomiarowej": true
      }
    }"#
}

/// The HTML page the retired endpoint serves with a 200 status.
#[cfg(test)]
pub(crate) fn fixture_moved_html() -> &'static str {
    r#"<!DOCTYPE html>
<html><head><title>Usługa przeniesiona</title></head>
<body><p>This service has moved to /pjp-api/v1/rest.</p></body></html>"#
}
