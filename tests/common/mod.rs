//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use honeycomb_middleware::telemetry::{Client, ClientOptions, MemoryTransmission};
use honeycomb_middleware::{FieldValue, HoneycombLayer, InstrumentorConfig};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A layer whose clients record events in memory.
#[allow(dead_code)]
pub struct Harness {
    pub layer: HoneycombLayer,
    pub sink: Arc<MemoryTransmission>,
    /// Number of clients created so far.
    pub builds: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(config: InstrumentorConfig) -> Self {
        let sink = Arc::new(MemoryTransmission::new());
        let builds = Arc::new(AtomicUsize::new(0));

        let (s, b) = (sink.clone(), builds.clone());
        let layer = HoneycombLayer::with_client_builder(config, move |options: &ClientOptions| {
            b.fetch_add(1, Ordering::SeqCst);
            Ok(Client::with_transmission(options.clone(), s.clone()))
        });

        Self { layer, sink, builds }
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Fields of the only event sent. Panics unless exactly one was sent.
    pub fn only_event(&self) -> HashMap<String, FieldValue> {
        let mut events = self.sink.events();
        assert_eq!(events.len(), 1, "expected exactly one event");
        events.remove(0).fields
    }
}

/// A request received by the mock collector.
#[allow(dead_code)]
#[derive(Debug)]
pub struct Received {
    pub dataset: String,
    pub team: Option<String>,
    pub event_time: Option<String>,
    pub body: serde_json::Value,
}

/// Start a collector accepting `POST /1/events/{dataset}` on an ephemeral port.
#[allow(dead_code)]
pub async fn start_mock_collector() -> (SocketAddr, mpsc::UnboundedReceiver<Received>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let app = Router::new().route(
        "/1/events/{dataset}",
        post(
            move |Path(dataset): Path<String>, headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let tx = tx.clone();
                async move {
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .map(String::from)
                    };
                    let _ = tx.send(Received {
                        dataset,
                        team: header("x-honeycomb-team"),
                        event_time: header("x-honeycomb-event-time"),
                        body,
                    });
                    StatusCode::OK
                }
            },
        ),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, rx)
}
