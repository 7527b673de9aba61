//! Mock upstream for integration tests: a `tiny_http` server on an
//! ephemeral port that answers canned responses by path and records every
//! request URL it sees.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;

#[derive(Clone)]
pub struct Canned {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: String,
}

impl Canned {
    pub fn json(body: &str) -> Self {
        Self { status: 200, content_type: Some("application/json"), body: body.to_string() }
    }

    pub fn untyped(body: &str) -> Self {
        Self { status: 200, content_type: None, body: body.to_string() }
    }

    pub fn html(body: &str) -> Self {
        Self { status: 200, content_type: Some("text/html; charset=utf-8"), body: body.to_string() }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self { status, content_type: Some("application/json"), body: body.to_string() }
    }
}

pub struct MockUpstream {
    server: Arc<tiny_http::Server>,
    addr: SocketAddr,
    hits: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    /// Starts serving `routes` (path without query → response). Unknown
    /// paths answer 404.
    pub fn start(routes: Vec<(&str, Canned)>) -> Self {
        let server = Arc::new(tiny_http::Server::http("127.0.0.1:0").expect("bind mock upstream"));
        let addr = server.server_addr().to_ip().expect("mock upstream listens on TCP");
        let routes: HashMap<String, Canned> = routes.into_iter().map(|(p, c)| (p.to_string(), c)).collect();
        let hits = Arc::new(Mutex::new(Vec::new()));

        let worker_server = Arc::clone(&server);
        let worker_hits = Arc::clone(&hits);
        thread::spawn(move || {
            for request in worker_server.incoming_requests() {
                let url = request.url().to_string();
                worker_hits.lock().unwrap().push(url.clone());

                let path = url.split('?').next().unwrap_or_default();
                let canned = routes
                    .get(path)
                    .cloned()
                    .unwrap_or_else(|| Canned::status(404, r#"{"error":"not found"}"#));

                let mut response = tiny_http::Response::from_string(canned.body).with_status_code(canned.status);
                if let Some(content_type) = canned.content_type {
                    response.add_header(
                        tiny_http::Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()).unwrap(),
                    );
                }
                let _ = request.respond(response);
            }
        });

        Self { server, addr, hits }
    }

    /// Base URL for an API generation mounted under `prefix`.
    pub fn base_url(&self, prefix: &str) -> String {
        format!("http://{}{}", self.addr, prefix)
    }

    /// Number of requests whose path (query stripped) equals `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.hits
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.split('?').next() == Some(path))
            .count()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.hits.lock().unwrap().clone()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.server.unblock();
    }
}
