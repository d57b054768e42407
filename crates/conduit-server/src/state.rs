//! Shared server state.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;

use conduit_broker::MessageBroker;
use conduit_core::ids::ConnectionId;
use conduit_transport::{ConnectionEvents, NoEvents};

use crate::registry::ConnectionRegistry;

/// Builds the application callback set for one accepted connection.
pub type EventsFactory = Arc<dyn Fn(&ConnectionId) -> Arc<dyn ConnectionEvents> + Send + Sync>;

/// How long a disconnected identity keeps its mailbox before it is reclaimed.
const DEFAULT_RESUME_WINDOW: Duration = Duration::from_secs(60);

/// State shared by every handler: the broker, the mounted connection
/// endpoints, and active-connection bookkeeping.
pub struct ServerState {
    /// Message source shared with the dispatch layer.
    pub broker: Arc<MessageBroker>,
    /// Active physical connections.
    pub registry: ConnectionRegistry,
    /// Grace period during which a disconnected client may resume before its
    /// mailbox is reclaimed.
    pub resume_window: Duration,
    endpoints: HashMap<String, EventsFactory>,
    metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// State with no endpoints mounted yet.
    pub fn new(broker: Arc<MessageBroker>) -> Self {
        Self {
            broker,
            registry: ConnectionRegistry::new(),
            resume_window: DEFAULT_RESUME_WINDOW,
            endpoints: HashMap::new(),
            metrics: None,
        }
    }

    /// Mount a persistent-connection endpoint under `/{name}`.
    #[must_use]
    pub fn map_connection(mut self, name: impl Into<String>, events: EventsFactory) -> Self {
        let _ = self.endpoints.insert(name.into(), events);
        self
    }

    /// Mount an endpoint with no application callbacks.
    #[must_use]
    pub fn map_plain_connection(self, name: impl Into<String>) -> Self {
        self.map_connection(name, Arc::new(|_: &ConnectionId| Arc::new(NoEvents) as _))
    }

    /// Override the resume grace period.
    #[must_use]
    pub fn with_resume_window(mut self, window: Duration) -> Self {
        self.resume_window = window;
        self
    }

    /// Attach the Prometheus render handle backing `/metrics`.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Callback factory for a mounted endpoint.
    pub fn endpoint(&self, name: &str) -> Option<&EventsFactory> {
        self.endpoints.get(name)
    }

    pub(crate) fn metrics_handle(&self) -> Option<&PrometheusHandle> {
        self.metrics.as_ref()
    }
}
