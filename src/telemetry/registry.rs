//! Per-execution-context client registry.
//!
//! # Responsibilities
//! - Hand out one [`Client`] per worker thread
//! - Create each client lazily, on the first request that thread serves
//!
//! # Design Decisions
//! - Owned by the middleware instance; two layers never share clients
//! - A client is only ever looked up from the thread it was created for,
//!   so creation never races and needs no extra locking
//! - Entries are never evicted: `ThreadId`s are not reused and std offers no
//!   liveness check. The map is bounded by the number of distinct threads that
//!   served a request, i.e. the runtime's worker count for a long-lived server.
//!   Hosts that keep spawning fresh threads (rebuilt runtimes, blocking pools
//!   serving requests) should build a new layer with each runtime.

use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use dashmap::DashMap;

use crate::telemetry::client::{Client, ClientOptions};
use crate::telemetry::TelemetryError;

/// Factory invoked once per execution context.
pub type ClientBuilder =
    Arc<dyn Fn(&ClientOptions) -> Result<Client, TelemetryError> + Send + Sync>;

pub struct ClientRegistry {
    options: ClientOptions,
    builder: ClientBuilder,
    clients: DashMap<ThreadId, Arc<Client>>,
}

impl ClientRegistry {
    /// Registry whose clients deliver over HTTP.
    pub fn new(options: ClientOptions) -> Self {
        Self::with_builder(options, |options: &ClientOptions| Client::new(options.clone()))
    }

    pub fn with_builder<F>(options: ClientOptions, builder: F) -> Self
    where
        F: Fn(&ClientOptions) -> Result<Client, TelemetryError> + Send + Sync + 'static,
    {
        Self {
            options,
            builder: Arc::new(builder),
            clients: DashMap::new(),
        }
    }

    /// Client for the calling thread, created on first use.
    pub fn client(&self) -> Result<Arc<Client>, TelemetryError> {
        let id = thread::current().id();
        if let Some(existing) = self.clients.get(&id) {
            return Ok(Arc::clone(existing.value()));
        }

        let client = Arc::new((self.builder)(&self.options)?);
        tracing::debug!(
            thread = ?id,
            dataset = ?self.options.dataset,
            api_host = %self.options.api_host(),
            "Created telemetry client for execution context"
        );
        Ok(Arc::clone(self.clients.entry(id).or_insert(client).value()))
    }

    /// Number of execution contexts holding a client.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("options", &self.options)
            .field("clients", &self.clients.len())
            .finish_non_exhaustive()
    }
}
