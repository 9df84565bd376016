//! Throwaway HTTP server for exercising the HTTP collaborators in tests.
//!
//! An axum `Router` whose fallback serves canned responses keyed by request
//! path (query ignored) and records every request it sees.

use axum::body::Body;
use axum::extract::{OriginalUri, State};
use axum::http::{HeaderMap, Method, Response, StatusCode};
use axum::Router;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub delay: Duration,
}

impl CannedResponse {
    pub fn html(body: impl Into<String>) -> Self {
        Self::with_type(200, "text/html; charset=utf-8", body)
    }

    pub fn json(body: impl Into<String>) -> Self {
        Self::with_type(200, "application/json", body)
    }

    pub fn with_type(status: u16, content_type: &str, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: vec![("content-type".into(), content_type.into())],
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: u16) -> Self {
        Self::with_type(status, "text/plain", "")
    }

    pub fn redirect(location: &str) -> Self {
        Self {
            status: 302,
            headers: vec![("location".into(), location.into())],
            body: String::new(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string.
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct TestServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[derive(Clone)]
struct Canned {
    routes: Arc<HashMap<String, CannedResponse>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn respond(
    State(canned): State<Canned>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: String,
) -> Response<Body> {
    canned.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        target: uri
            .path_and_query()
            .map(|pq| pq.to_string())
            .unwrap_or_else(|| uri.path().to_string()),
        headers: headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
            .collect(),
        body,
    });

    let canned_response = canned
        .routes
        .get(uri.path())
        .cloned()
        .unwrap_or_else(|| CannedResponse::status(404));
    if !canned_response.delay.is_zero() {
        tokio::time::sleep(canned_response.delay).await;
    }

    let mut builder = Response::builder()
        .status(StatusCode::from_u16(canned_response.status).unwrap());
    for (name, value) in &canned_response.headers {
        builder = builder.header(name, value);
    }
    builder.body(Body::from(canned_response.body)).unwrap()
}

/// Start a server on an ephemeral localhost port.
pub async fn serve<P: Into<String>>(routes: Vec<(P, CannedResponse)>) -> TestServer {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let canned = Canned {
        routes: Arc::new(
            routes
                .into_iter()
                .map(|(path, resp)| (path.into(), resp))
                .collect(),
        ),
        requests: Arc::clone(&requests),
    };
    let app = Router::new().fallback(respond).with_state(canned);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("axum serve");
    });

    TestServer {
        base_url: format!("http://{addr}"),
        requests,
    }
}
