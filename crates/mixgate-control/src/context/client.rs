use std::sync::Arc;

use mixgate_core::Attributes;

use crate::client::{CancelHandle, CheckTransport, DoneFunc, PolicyClient};
use crate::config::FilterConfig;
use crate::obs::ControlMetrics;

/// Process-wide state shared by every request handler.
pub struct ClientContext {
    config: FilterConfig,
    client: PolicyClient,
}

impl ClientContext {
    pub fn new(config: FilterConfig, client: PolicyClient) -> Self {
        Self { config, client }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn client(&self) -> &PolicyClient {
        &self.client
    }

    pub fn metrics(&self) -> &Arc<ControlMetrics> {
        self.client.metrics()
    }

    /// A per-call `transport` takes precedence over the configured one.
    pub fn send_check(
        &self,
        attributes: &Attributes,
        transport: Option<Arc<dyn CheckTransport>>,
        on_done: DoneFunc,
    ) -> CancelHandle {
        tracing::debug!(attributes = ?attributes, "send check");
        self.client.check(attributes, transport, on_done)
    }

    /// Fire-and-forget report; the outcome is only logged.
    pub fn send_report(&self, attributes: &Attributes) {
        tracing::debug!(attributes = ?attributes, "send report");
        self.client.report(
            attributes,
            Box::new(|status| {
                if !status.is_ok() {
                    tracing::debug!(%status, "report completed with error");
                }
            }),
        );
    }

    /// Count a call the handler decided not to make.
    pub(crate) fn skip(&self, call: &'static str, reason: &'static str) {
        self.metrics()
            .skipped
            .inc(&[("call", call), ("reason", reason)]);
    }
}
