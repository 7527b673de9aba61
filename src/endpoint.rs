/// HTTP endpoint for querying air-quality data
///
/// Provides a small read-only JSON API over `AirQualityService` for
/// dashboards and scripts.
///
/// Endpoints:
/// - GET /health - Service health check
/// - GET /stations - All stations, sorted by city then name
/// - GET /stations/{id} - Station metadata, sensor readings and index
/// - GET /stations/{id}/readings - Sensor readings only
/// - GET /stations/{id}/index - Air-quality index only
/// - GET /overview - Every station with its present measurements

use crate::aggregator::AirQualityService;
use crate::ingest::fetcher::JsonSource;
use crate::model::AirQualityError;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

const AVAILABLE_ENDPOINTS: &[&str] = &[
    "/health",
    "/stations",
    "/stations/{id}",
    "/stations/{id}/readings",
    "/stations/{id}/index",
    "/overview",
];

/// Status code and JSON body of a routed request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok<T: Serialize>(data: &T) -> Self {
        match serde_json::to_value(data) {
            Ok(body) => Self { status: 200, body },
            Err(e) => Self::error(500, format!("failed to serialize response: {}", e)),
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    fn from_service_error(err: &AirQualityError) -> Self {
        let status = match err {
            AirQualityError::NotFound(_) => 404,
            AirQualityError::UpstreamUnavailable(_) => 503,
        };
        Self::error(status, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Routes one request. Pure apart from the upstream calls the service makes,
/// so it is tested without a socket.
pub fn route<S: JsonSource + 'static>(service: &AirQualityService<S>, method: &str, url: &str) -> ApiResponse {
    if method != "GET" {
        return ApiResponse::error(405, format!("method {} not allowed", method));
    }

    let path = url.split('?').next().unwrap_or_default().trim_end_matches('/');
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["health"] => ApiResponse {
            status: 200,
            body: json!({
                "status": "ok",
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            }),
        },
        ["stations"] => match service.list_stations() {
            Ok(stations) => ApiResponse::ok(&stations),
            Err(e) => ApiResponse::from_service_error(&e),
        },
        ["overview"] => match service.station_overview() {
            Ok(overview) => ApiResponse::ok(&overview),
            Err(e) => ApiResponse::from_service_error(&e),
        },
        ["stations", id, rest @ ..] => {
            let Ok(station_id) = id.parse::<i64>() else {
                return ApiResponse::error(400, format!("invalid station id: {}", id));
            };
            match rest {
                [] => match service.station_detail(station_id) {
                    Ok(detail) => ApiResponse::ok(&detail),
                    Err(e) => ApiResponse::from_service_error(&e),
                },
                ["readings"] => ApiResponse::ok(&service.station_readings(station_id)),
                ["index"] => ApiResponse::ok(&json!({
                    "station_id": station_id,
                    "index": service.station_index(station_id),
                })),
                _ => not_found(),
            }
        }
        _ => not_found(),
    }
}

fn not_found() -> ApiResponse {
    ApiResponse {
        status: 404,
        body: json!({
            "error": "Not found",
            "available_endpoints": AVAILABLE_ENDPOINTS,
        }),
    }
}

// ---------------------------------------------------------------------------
// HTTP Server
// ---------------------------------------------------------------------------

/// Binds `0.0.0.0:{port}` and serves requests until the process exits.
pub fn start_endpoint_server<S: JsonSource + 'static>(port: u16, service: AirQualityService<S>) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;

    info!(port, "HTTP endpoint listening");
    serve(&server, &service);
    Ok(())
}

/// Serves requests from an already bound server, one at a time.
pub fn serve<S: JsonSource + 'static>(server: &tiny_http::Server, service: &AirQualityService<S>) {
    for request in server.incoming_requests() {
        let method = request.method().as_str().to_string();
        let url = request.url().to_string();

        let response = route(service, &method, &url);
        if response.status >= 500 {
            warn!(%method, %url, status = response.status, "request failed");
        }

        if let Err(e) = request.respond(create_response(&response)) {
            error!(error = %e, "failed to send response");
        }
    }
}

/// Create HTTP response with JSON body
fn create_response(response: &ApiResponse) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let body = serde_json::to_string_pretty(&response.body).unwrap_or_else(|_| "{}".to_string());

    let mut http = tiny_http::Response::from_data(body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(response.status));
    if let Ok(header) = tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        http.add_header(header);
    }
    http
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
