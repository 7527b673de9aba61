/// Resilient fetcher for the GIOS PJP air-quality API.
///
/// The upstream is mid-migration: several base URLs serve overlapping
/// versions of the same resources, some of them answer with an HTML
/// "service moved" page, and content types are unreliable. The fetcher walks
/// an ordered list of candidate base URLs and returns the first response
/// that is a success and parses as JSON.
///
///   GET {base}/station/findAll?page=0&size=500
///   GET {base}/station/{id}
///   GET {base}/station/sensors/{id}
///   GET {base}/data/getData/{sensorId}
///   GET {base}/aqindex/getIndex/{stationId}

use crate::model::FetchError;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Maximum number of characters of an error body kept in `UpstreamHttp`.
pub const ERROR_BODY_LIMIT: usize = 200;

// ---------------------------------------------------------------------------
// JSON source abstraction
// ---------------------------------------------------------------------------

/// Something that can resolve a relative API path to a JSON document.
///
/// Implemented by `HttpFetcher` for the real upstream and by in-memory
/// fakes in tests.
pub trait JsonSource: Send + Sync {
    fn fetch_with_query(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError>;

    fn fetch(&self, path: &str) -> Result<Value, FetchError> {
        self.fetch_with_query(path, &[])
    }
}

// ---------------------------------------------------------------------------
// URL and body helpers
// ---------------------------------------------------------------------------

/// Joins a base URL and a relative path with exactly one `/`.
pub fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_matches('/'))
}

/// True when the declared content type says JSON, or when the body looks
/// like a JSON object or array regardless of what the header claims.
pub fn looks_like_json(content_type: Option<&str>, body: &str) -> bool {
    let declared = content_type
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);
    let trimmed = body.trim_start();
    declared || trimmed.starts_with('{') || trimmed.starts_with('[')
}

/// Truncates `body` to `limit` characters, respecting char boundaries.
pub fn truncate_body(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

/// Classifies one candidate's response. Split out from the network call so
/// the decision table is testable without a server.
pub fn interpret_response(
    url: &str,
    status: u16,
    content_type: Option<&str>,
    body: &str,
) -> Result<Value, FetchError> {
    if !(200..300).contains(&status) {
        return Err(FetchError::UpstreamHttp {
            url: url.to_string(),
            status,
            body: truncate_body(body.trim(), ERROR_BODY_LIMIT),
        });
    }

    if !looks_like_json(content_type, body) {
        return Err(FetchError::MalformedResponse {
            url: url.to_string(),
            message: format!(
                "expected JSON, got {} body starting with {:?}",
                content_type.unwrap_or("untyped"),
                truncate_body(body.trim(), 40)
            ),
        });
    }

    serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse {
        url: url.to_string(),
        message: format!("JSON deserialization failed: {}", e),
    })
}

// ---------------------------------------------------------------------------
// HTTP fetcher
// ---------------------------------------------------------------------------

/// Blocking HTTP fetcher over an ordered list of candidate base URLs.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    base_urls: Vec<String>,
}

impl HttpFetcher {
    /// Builds a fetcher with a fixed per-request timeout.
    pub fn new(base_urls: Vec<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client, base_urls })
    }

    pub fn base_urls(&self) -> &[String] {
        &self.base_urls
    }

    /// One attempt against one candidate. No retries.
    fn try_candidate(&self, url: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(query)
            .send()
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: if e.is_timeout() {
                    format!("timed out: {}", e)
                } else {
                    e.to_string()
                },
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response.text().map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: format!("failed to read body: {}", e),
        })?;

        interpret_response(url, status, content_type.as_deref(), &body)
    }
}

impl JsonSource for HttpFetcher {
    /// Tries each candidate in declared order and returns the first JSON
    /// success. When all fail, the last candidate's error is returned.
    fn fetch_with_query(&self, path: &str, query: &[(&str, String)]) -> Result<Value, FetchError> {
        let mut last_error = FetchError::NoCandidates;

        for base in &self.base_urls {
            let url = join_url(base, path);
            match self.try_candidate(&url, query) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    debug!(candidate = %base, error = %e, "candidate failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
