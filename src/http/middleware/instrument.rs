//! Request instrumentation middleware.
//!
//! Wraps an inner service and emits exactly one telemetry event per request:
//!
//! ```text
//! acquire client → new event → start clock → inner.call(request)
//!     → stop clock → response headers, content-length, HTTP_STATUS, REQUEST_TIME_MS
//!     → caller metadata (honeycomb.* keys, removed from the context)
//!     → request allow-list → event.send() → response returned untouched
//! ```
//!
//! If the inner service returns an error it is propagated as-is. No event is
//! sent for that request unless `emit_on_error` is set.

use std::fmt;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::config::InstrumentorConfig;
use crate::http::context::RequestContext;
use crate::http::fields;
use crate::observability::metrics;
use crate::telemetry::{Client, ClientOptions, ClientRegistry, Event, TelemetryError};

struct Shared {
    registry: ClientRegistry,
    emit_on_error: bool,
}

/// [`Layer`] that wraps services in [`Honeycomb`].
///
/// Construction never touches the network; clients are created lazily, one
/// per worker thread.
#[derive(Clone)]
pub struct HoneycombLayer {
    shared: Arc<Shared>,
}

impl HoneycombLayer {
    pub fn new(config: InstrumentorConfig) -> Self {
        let options = ClientOptions::from(&config);
        Self::from_registry(ClientRegistry::new(options), config.emit_on_error)
    }

    /// Use `builder` instead of the HTTP client to create each execution context's client.
    pub fn with_client_builder<F>(config: InstrumentorConfig, builder: F) -> Self
    where
        F: Fn(&ClientOptions) -> Result<Client, TelemetryError> + Send + Sync + 'static,
    {
        let options = ClientOptions::from(&config);
        Self::from_registry(
            ClientRegistry::with_builder(options, builder),
            config.emit_on_error,
        )
    }

    fn from_registry(registry: ClientRegistry, emit_on_error: bool) -> Self {
        Self {
            shared: Arc::new(Shared {
                registry,
                emit_on_error,
            }),
        }
    }

    pub fn registry(&self) -> &ClientRegistry {
        &self.shared.registry
    }
}

impl fmt::Debug for HoneycombLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HoneycombLayer")
            .field("registry", &self.shared.registry)
            .field("emit_on_error", &self.shared.emit_on_error)
            .finish()
    }
}

impl<S> Layer<S> for HoneycombLayer {
    type Service = Honeycomb<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Honeycomb {
            inner,
            shared: self.shared.clone(),
        }
    }
}

/// Service produced by [`HoneycombLayer`].
#[derive(Clone)]
pub struct Honeycomb<S> {
    inner: S,
    shared: Arc<Shared>,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for Honeycomb<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: fmt::Display + Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        // The clone may not be ready; keep the one that was polled.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let shared = self.shared.clone();

        let event = match shared.registry.client() {
            Ok(client) => Some(client.new_event()),
            Err(e) => {
                metrics::record_dropped("client");
                tracing::warn!(error = %e, "Telemetry client unavailable, request not instrumented");
                None
            }
        };

        let context = match request.extensions().get::<RequestContext>().cloned() {
            Some(existing) => {
                existing.fill_from_request(&request);
                existing
            }
            None => {
                let context = RequestContext::from_request(&request);
                request.extensions_mut().insert(context.clone());
                context
            }
        };

        Box::pin(async move {
            let start = Instant::now();
            let result = inner.call(request).await;
            let elapsed = start.elapsed();

            let Some(mut event) = event else {
                context.take_metadata();
                return result;
            };
            metrics::record_duration(elapsed);

            match result {
                Ok(response) => {
                    fields::add_response_headers(&mut event, response.headers());
                    fields::add_field(&mut event, fields::HTTP_STATUS, Some(response.status().as_u16()));
                    record_request(&mut event, &context, elapsed);
                    emit(event);
                    Ok(response)
                }
                Err(err) if shared.emit_on_error => {
                    record_request(&mut event, &context, elapsed);
                    fields::add_field(&mut event, fields::ERROR, Some(err.to_string()));
                    emit(event);
                    Err(err)
                }
                Err(err) => {
                    context.take_metadata();
                    metrics::record_skipped();
                    tracing::debug!(error = %err, "Inner service failed, no event emitted");
                    Err(err)
                }
            }
        })
    }
}

/// Timing, caller metadata and the request allow-list.
fn record_request(event: &mut Event, context: &RequestContext, elapsed: Duration) {
    fields::add_field(
        event,
        fields::REQUEST_TIME_MS,
        Some(elapsed.as_secs_f64() * 1000.0),
    );
    fields::add_metadata(event, context);
    fields::add_request_fields(event, context);
}

fn emit(event: Event) {
    let count = event.len();
    match event.send() {
        Ok(()) => {
            metrics::record_submitted();
            tracing::debug!(fields = count, "Telemetry event submitted");
        }
        Err(e) => {
            metrics::record_dropped("submit");
            tracing::warn!(error = %e, "Telemetry event dropped");
        }
    }
}
