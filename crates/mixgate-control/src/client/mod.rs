//! Policy client: Check, Report and Quota over pluggable transports.
//!
//! Every call runs on a tokio task and reports through a [`DoneFunc`]. The
//! callback runs right after the transport future resolves, so aborting the
//! task through a [`CancelHandle`] either prevents it entirely or is a no-op.
//! No call is retried here.

pub mod handle;
pub mod transport;

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use mixgate_core::attributes::{QUOTA_AMOUNT, QUOTA_NAME};
use mixgate_core::{AttributeValue, Attributes, Code, Status};

use crate::obs::ControlMetrics;

pub use handle::{CancelHandle, DedupCounter, DoneFunc};
pub use transport::{
    CheckRequest, CheckResponse, CheckTransport, QuotaRequest, QuotaResponse, QuotaTransport,
    ReportRequest, ReportResponse, ReportTransport,
};

#[derive(Debug, Clone, Copy)]
pub struct CheckOptions {
    /// Treat an unavailable policy service as an allowed Check.
    pub network_fail_open: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            network_fail_open: true,
        }
    }
}

#[derive(Clone, Default)]
pub struct ClientOptions {
    pub check_transport: Option<Arc<dyn CheckTransport>>,
    pub report_transport: Option<Arc<dyn ReportTransport>>,
    pub quota_transport: Option<Arc<dyn QuotaTransport>>,
    pub check_options: CheckOptions,
    pub dedup: DedupCounter,
}

pub struct PolicyClient {
    options: ClientOptions,
    metrics: Arc<ControlMetrics>,
}

impl PolicyClient {
    pub fn new(options: ClientOptions) -> Self {
        Self::with_metrics(options, Arc::new(ControlMetrics::default()))
    }

    pub fn with_metrics(options: ClientOptions, metrics: Arc<ControlMetrics>) -> Self {
        Self { options, metrics }
    }

    pub fn metrics(&self) -> &Arc<ControlMetrics> {
        &self.metrics
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Check `attributes`. A per-call `transport` overrides the configured one.
    pub fn check(
        &self,
        attributes: &Attributes,
        transport: Option<Arc<dyn CheckTransport>>,
        on_done: DoneFunc,
    ) -> CancelHandle {
        let Some(transport) = transport.or_else(|| self.options.check_transport.clone()) else {
            return self.reject("check", on_done);
        };

        let request = CheckRequest {
            attributes: attributes.clone(),
        };
        let fail_open = self.options.check_options.network_fail_open;
        tracing::debug!(attributes = request.attributes.len(), "send check");

        let metrics = Arc::clone(&self.metrics);
        self.spawn("check", on_done, async move {
            match transport.check(request).await {
                Ok(resp) => resp.precondition,
                Err(status) if status.code == Code::Unavailable && fail_open => {
                    tracing::warn!(error = %status, "policy service unavailable, failing open");
                    metrics.fail_open.inc(&[("call", "check")]);
                    Status::ok()
                }
                Err(status) => status,
            }
        })
    }

    /// Report `attributes`. Failures are logged and surfaced to `on_done`.
    pub fn report(&self, attributes: &Attributes, on_done: DoneFunc) -> CancelHandle {
        let Some(transport) = self.options.report_transport.clone() else {
            return self.reject("report", on_done);
        };

        let request = ReportRequest {
            attributes: vec![attributes.clone()],
        };
        tracing::debug!(attributes = attributes.len(), "send report");

        self.spawn("report", on_done, async move {
            match transport.report(request).await {
                Ok(_) => Status::ok(),
                Err(status) => {
                    tracing::warn!(error = %status, "report failed");
                    status
                }
            }
        })
    }

    /// Quota call. Unavailable is always treated as success.
    pub fn quota(&self, attributes: &Attributes, on_done: DoneFunc) -> CancelHandle {
        let Some(transport) = self.options.quota_transport.clone() else {
            return self.reject("quota", on_done);
        };

        let request = self.quota_request(attributes);
        tracing::debug!(
            quota = %request.quota,
            amount = request.amount,
            dedup_id = %request.deduplication_id,
            "send quota"
        );

        let metrics = Arc::clone(&self.metrics);
        self.spawn("quota", on_done, async move {
            match transport.quota(request).await {
                Ok(_) => Status::ok(),
                Err(status) if status.code == Code::Unavailable => {
                    metrics.fail_open.inc(&[("call", "quota")]);
                    Status::ok()
                }
                Err(status) => status,
            }
        })
    }

    fn quota_request(&self, attributes: &Attributes) -> QuotaRequest {
        let mut request = QuotaRequest::default();
        for (name, value) in attributes.iter() {
            match (name, value) {
                (QUOTA_NAME, AttributeValue::String(s)) => request.quota = s.clone(),
                (QUOTA_AMOUNT, AttributeValue::Int64(v)) => request.amount = *v,
                _ => request.attributes.set(name, value.clone()),
            }
        }
        request.deduplication_id = self.options.dedup.next().to_string();
        request.best_effort = false;
        request
    }

    fn reject(&self, call: &'static str, on_done: DoneFunc) -> CancelHandle {
        tracing::debug!(call, "no transport configured");
        self.metrics
            .skipped
            .inc(&[("call", call), ("reason", "missing_transport")]);
        on_done(Status::invalid_argument(format!("missing {call} transport")));
        CancelHandle::noop()
    }

    fn spawn<F>(&self, call: &'static str, on_done: DoneFunc, fut: F) -> CancelHandle
    where
        F: Future<Output = Status> + Send + 'static,
    {
        let Ok(rt) = tokio::runtime::Handle::try_current() else {
            on_done(Status::new(Code::Internal, "no tokio runtime"));
            return CancelHandle::noop();
        };

        let metrics = Arc::clone(&self.metrics);
        let task = rt.spawn(async move {
            let _guard = metrics.start_call(call);
            let started = Instant::now();
            let status = fut.await;
            metrics
                .transport_duration
                .observe(&[("call", call)], started.elapsed());
            metrics
                .calls
                .inc(&[("call", call), ("code", status.code.as_str())]);
            on_done(status);
        });
        CancelHandle::for_task(&task)
    }
}
