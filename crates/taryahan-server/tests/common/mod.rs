// crates/taryahan-server/tests/common/mod.rs
// ============================================================================
// Module: HTTP Test Harness
// Description: Spawns a live server on loopback and drives it over HTTP/1.
// Purpose: Share server and client plumbing across HTTP integration tests.
// ============================================================================

//! ## Overview
//! [`TestServer`] binds `127.0.0.1:0`, serves a [`TaryahanServer`] in the
//! background, and exposes a small JSON client. Audit events are captured in
//! memory for assertions.

#![allow(
    dead_code,
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Shared test harness; not every test uses every helper."
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use bytes::Bytes;
use http_body_util::BodyExt;
use http_body_util::Full;
use hyper::Method;
use hyper::Request;
use hyper::StatusCode;
use hyper::header::AUTHORIZATION;
use hyper::header::CONTENT_TYPE;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde_json::Value;
use taryahan_config::TaryahanConfig;
use taryahan_server::AuditSink;
use taryahan_server::HttpAuditEvent;
use taryahan_server::LoggingAdminSeedHook;
use taryahan_server::ServerComponents;
use taryahan_server::StaticStreamerSource;
use taryahan_server::TaryahanServer;
use tokio::net::TcpListener;

/// Audit sink that keeps every event.
#[derive(Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<HttpAuditEvent>>,
}

impl RecordingAuditSink {
    pub fn events(&self) -> Vec<HttpAuditEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &HttpAuditEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Response status plus decoded JSON body.
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Live server bound to loopback.
pub struct TestServer {
    addr: SocketAddr,
    client: Client<HttpConnector, Full<Bytes>>,
    pub audit: Arc<RecordingAuditSink>,
}

impl TestServer {
    /// Starts a server with the default in-memory configuration.
    pub async fn start() -> Self {
        Self::start_with(TaryahanConfig::default()).await
    }

    /// Starts a server with the given configuration.
    pub async fn start_with(config: TaryahanConfig) -> Self {
        let audit = Arc::new(RecordingAuditSink::default());
        let components = ServerComponents {
            audit: Arc::clone(&audit) as Arc<dyn AuditSink>,
            seed: Arc::new(LoggingAdminSeedHook),
            streamers: Arc::new(StaticStreamerSource::new(config.streamers.clone())),
        };
        let server = TaryahanServer::with_components(config, components).expect("server init");
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(server.serve_listener(listener, std::future::pending()));
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self { addr, client, audit }
    }

    /// Sends a request and decodes the JSON response.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("http://{}{path}", self.addr))
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let request =
            builder.body(Full::new(Bytes::from(body.unwrap_or_default()))).expect("request");
        let response = self.client.request(request).await.expect("http round trip");
        let status = response.status();
        let bytes = response.into_body().collect().await.expect("response body").to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        self.send(Method::POST, path, Some(body.to_string().into_bytes()), None).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> TestResponse {
        self.send(Method::PUT, path, Some(body.to_string().into_bytes()), None).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.send(Method::DELETE, path, None, None).await
    }
}
