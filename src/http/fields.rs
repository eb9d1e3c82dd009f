//! Field extraction onto telemetry events.
//!
//! Every attribute goes through [`add_field`], which drops absent values and
//! empty strings.

use axum::http::{header, HeaderMap};

use crate::http::context::RequestContext;
use crate::telemetry::{Event, FieldValue};

/// Response status code.
pub const HTTP_STATUS: &str = "HTTP_STATUS";

/// Wall-clock time spent in the wrapped service, in milliseconds.
pub const REQUEST_TIME_MS: &str = "REQUEST_TIME_MS";

/// Display of the wrapped service's error, when failed requests are emitted.
pub const ERROR: &str = "error";

/// Request attributes copied from the context onto every event.
pub const REQUEST_FIELDS: &[&str] = &[
    "server.version",
    "server.multithread",
    "server.multiprocess",
    "server.run_once",
    "SCRIPT_NAME",
    "QUERY_STRING",
    "SERVER_PROTOCOL",
    "SERVER_SOFTWARE",
    "GATEWAY_INTERFACE",
    "REQUEST_METHOD",
    "REQUEST_PATH",
    "REQUEST_URI",
    "HTTP_VERSION",
    "HTTP_HOST",
    "HTTP_CONNECTION",
    "HTTP_CACHE_CONTROL",
    "HTTP_UPGRADE_INSECURE_REQUESTS",
    "HTTP_USER_AGENT",
    "HTTP_ACCEPT",
    "HTTP_ACCEPT_LANGUAGE",
    "REMOTE_ADDR",
];

/// Add `name` unless `value` is absent or an empty string.
pub fn add_field<V>(event: &mut Event, name: &str, value: Option<V>)
where
    V: Into<FieldValue>,
{
    let value: Option<FieldValue> = value.map(Into::into);
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        event.add_field(name, value);
    }
}

/// Copy response headers verbatim, then convert `content-length` to an integer.
///
/// Repeated headers are joined with ", ". Non-UTF-8 values are skipped. A
/// `content-length` that does not parse is left off the event.
pub fn add_response_headers(event: &mut Event, headers: &HeaderMap) {
    for name in headers.keys() {
        let values: Vec<&str> = headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            continue;
        }
        add_field(event, name.as_str(), Some(values.join(", ")));
    }

    let name = header::CONTENT_LENGTH.as_str();
    let Some(raw) = event.get(name).and_then(FieldValue::as_str).map(str::to_owned) else {
        return;
    };
    match raw.trim().parse::<i64>() {
        Ok(length) => event.add_field(name, length),
        Err(_) => {
            tracing::debug!(value = %raw, "Dropping unparseable content-length from event");
            event.remove_field(name);
        }
    }
}

/// Move caller-attached metadata from the context onto the event.
pub fn add_metadata(event: &mut Event, context: &RequestContext) {
    for (name, value) in context.take_metadata() {
        add_field(event, &name, Some(value));
    }
}

/// Copy the [`REQUEST_FIELDS`] allow-list from the context.
pub fn add_request_fields(event: &mut Event, context: &RequestContext) {
    let env = context.snapshot();
    for &name in REQUEST_FIELDS {
        add_field(event, name, env.get(name).cloned());
    }
}
