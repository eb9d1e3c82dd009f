//! Per-request environment.
//!
//! # Responsibilities
//! - Describe the request with CGI-style keys (`REQUEST_METHOD`, `HTTP_HOST`, ...)
//! - Carry caller-attached metadata (keys prefixed with [`METADATA_PREFIX`])
//! - Let handlers reach it through an axum extractor
//!
//! # Design Decisions
//! - Lives in the request extensions behind an `Arc<Mutex<_>>`; the middleware
//!   keeps a handle so it can read the map after the handler consumed the request
//! - A context placed by an outer layer is reused, never replaced; keys it
//!   lacks are filled from the request

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{request::Parts, HeaderMap, Request, StatusCode};
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::telemetry::FieldValue;

/// Keys with this prefix are captured onto the event and removed from the context.
pub const METADATA_PREFIX: &str = "honeycomb.";

const SERVER_SOFTWARE: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Shared, mutable environment of one request.
#[derive(Clone, Debug, Default)]
pub struct RequestContext {
    env: Arc<Mutex<HashMap<String, FieldValue>>>,
}

impl RequestContext {
    /// An empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the environment from a request.
    pub fn from_request<B>(request: &Request<B>) -> Self {
        Self {
            env: Arc::new(Mutex::new(request_env(request))),
        }
    }

    /// Add the keys derived from `request` that are not already present.
    /// Values set by the caller are kept.
    pub fn fill_from_request<B>(&self, request: &Request<B>) {
        let mut env = self.lock();
        for (key, value) in request_env(request) {
            env.entry(key).or_insert(value);
        }
    }

    pub fn get(&self, key: &str) -> Option<FieldValue> {
        self.lock().get(key).cloned()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn insert(&self, key: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.lock().insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<FieldValue> {
        self.lock().remove(key)
    }

    /// Attach metadata for the telemetry event, e.g. `add_metadata("user_id", "abc")`
    /// stores `honeycomb.user_id`.
    pub fn add_metadata(&self, name: &str, value: impl Into<FieldValue>) {
        self.insert(format!("{}{}", METADATA_PREFIX, name), value);
    }

    /// Remove every metadata key and return `(name without prefix, value)` pairs.
    ///
    /// Keys are collected first and removed afterwards. Order is unspecified.
    pub fn take_metadata(&self) -> Vec<(String, FieldValue)> {
        let mut env = self.lock();
        let keys: Vec<String> = env
            .keys()
            .filter(|k| k.starts_with(METADATA_PREFIX))
            .cloned()
            .collect();

        keys.into_iter()
            .filter_map(|key| {
                let value = env.remove(&key)?;
                Some((key[METADATA_PREFIX.len()..].to_string(), value))
            })
            .collect()
    }

    /// Copy of the whole environment.
    pub fn snapshot(&self) -> HashMap<String, FieldValue> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, FieldValue>> {
        self.env.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// CGI-style environment of a request.
fn request_env<B>(request: &Request<B>) -> HashMap<String, FieldValue> {
    let uri = request.uri();
    let protocol = format!("{:?}", request.version());

    let mut env: HashMap<String, FieldValue> = HashMap::new();
    env.insert("REQUEST_METHOD".into(), request.method().as_str().into());
    env.insert("SCRIPT_NAME".into(), "".into());
    env.insert("REQUEST_PATH".into(), uri.path().into());
    env.insert("QUERY_STRING".into(), uri.query().unwrap_or("").into());
    env.insert(
        "REQUEST_URI".into(),
        uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("").into(),
    );
    env.insert("SERVER_PROTOCOL".into(), protocol.clone().into());
    env.insert("HTTP_VERSION".into(), protocol.into());
    env.insert("GATEWAY_INTERFACE".into(), "CGI/1.1".into());
    env.insert("SERVER_SOFTWARE".into(), SERVER_SOFTWARE.into());
    env.insert("server.version".into(), env!("CARGO_PKG_VERSION").into());
    env.insert("server.multithread".into(), multithreaded().into());
    env.insert("server.multiprocess".into(), false.into());
    env.insert("server.run_once".into(), false.into());

    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        env.insert("REMOTE_ADDR".into(), addr.ip().to_string().into());
    }

    for (key, value) in header_env(request.headers()) {
        env.insert(key, value.into());
    }
    env
}

/// CGI-style header keys: `HTTP_<NAME>`, except `CONTENT_TYPE` and `CONTENT_LENGTH`.
/// Repeated headers are joined with ", "; non-UTF-8 values are skipped.
fn header_env(headers: &HeaderMap) -> HashMap<String, String> {
    let mut env: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        let upper = name.as_str().to_ascii_uppercase().replace('-', "_");
        let key = match upper.as_str() {
            "CONTENT_TYPE" | "CONTENT_LENGTH" => upper,
            _ => format!("HTTP_{}", upper),
        };
        env.entry(key)
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    env
}

fn multithreaded() -> bool {
    Handle::try_current()
        .map(|handle| handle.runtime_flavor() == RuntimeFlavor::MultiThread)
        .unwrap_or(false)
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "RequestContext missing: is HoneycombLayer installed?",
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Version};

    fn request() -> Request<Body> {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri("/items/7?sort=asc")
            .version(Version::HTTP_11)
            .header(header::HOST, "example.com")
            .header(header::USER_AGENT, "curl/8.0")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-trace", "a")
            .header("x-trace", "b")
            .body(Body::empty())
            .unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo("10.1.2.3:5555".parse::<SocketAddr>().unwrap()));
        request
    }

    #[test]
    fn test_from_request_populates_env() {
        let ctx = RequestContext::from_request(&request());

        assert_eq!(ctx.get("REQUEST_METHOD"), Some("POST".into()));
        assert_eq!(ctx.get("REQUEST_PATH"), Some("/items/7".into()));
        assert_eq!(ctx.get("QUERY_STRING"), Some("sort=asc".into()));
        assert_eq!(ctx.get("REQUEST_URI"), Some("/items/7?sort=asc".into()));
        assert_eq!(ctx.get("SERVER_PROTOCOL"), Some("HTTP/1.1".into()));
        assert_eq!(ctx.get("HTTP_VERSION"), Some("HTTP/1.1".into()));
        assert_eq!(ctx.get("SCRIPT_NAME"), Some("".into()));
        assert_eq!(ctx.get("HTTP_HOST"), Some("example.com".into()));
        assert_eq!(ctx.get("HTTP_USER_AGENT"), Some("curl/8.0".into()));
        assert_eq!(ctx.get("CONTENT_TYPE"), Some("application/json".into()));
        assert_eq!(ctx.get("HTTP_X_TRACE"), Some("a, b".into()));
        assert_eq!(ctx.get("REMOTE_ADDR"), Some("10.1.2.3".into()));
        assert_eq!(ctx.get("server.multiprocess"), Some(false.into()));
    }

    #[test]
    fn test_missing_query_is_empty() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let ctx = RequestContext::from_request(&request);
        assert_eq!(ctx.get("QUERY_STRING"), Some("".into()));
        assert!(!ctx.contains_key("REMOTE_ADDR"));
    }

    #[test]
    fn test_fill_from_request_keeps_existing_keys() {
        let ctx = RequestContext::new();
        ctx.insert("REQUEST_PATH", "/rewritten");
        ctx.add_metadata("source", "upstream");

        ctx.fill_from_request(&request());

        assert_eq!(ctx.get("REQUEST_PATH"), Some("/rewritten".into()));
        assert_eq!(ctx.get("REQUEST_METHOD"), Some("POST".into()));
        assert_eq!(ctx.get("HTTP_HOST"), Some("example.com".into()));
        assert_eq!(ctx.get("REMOTE_ADDR"), Some("10.1.2.3".into()));
        assert_eq!(ctx.get("honeycomb.source"), Some("upstream".into()));
    }

    #[test]
    fn test_take_metadata_strips_prefix_and_removes() {
        let ctx = RequestContext::new();
        ctx.add_metadata("user_id", "abc");
        ctx.insert("honeycomb.team", 42i64);
        ctx.insert("REQUEST_METHOD", "GET");

        let mut taken = ctx.take_metadata();
        taken.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(
            taken,
            vec![
                ("team".to_string(), FieldValue::Int(42)),
                ("user_id".to_string(), FieldValue::from("abc")),
            ]
        );
        assert!(!ctx.contains_key("honeycomb.user_id"));
        assert!(!ctx.contains_key("honeycomb.team"));
        assert!(ctx.contains_key("REQUEST_METHOD"));
        assert!(ctx.take_metadata().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let ctx = RequestContext::new();
        let handle = ctx.clone();
        handle.insert("k", "v");
        assert_eq!(ctx.get("k"), Some("v".into()));
        assert_eq!(ctx.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_extractor_requires_layer() {
        let (mut parts, _) = Request::new(Body::empty()).into_parts();
        let err = RequestContext::from_request_parts(&mut parts, &()).await.unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);

        let ctx = RequestContext::new();
        ctx.insert("k", "v");
        parts.extensions.insert(ctx);
        let extracted = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(extracted.get("k"), Some("v".into()));
    }
}
