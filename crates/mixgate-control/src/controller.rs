//! Entry point used by the proxy: builds the shared client context once and
//! hands out per-request handlers.

use std::sync::Arc;

use dashmap::DashMap;

use crate::client::{
    CheckOptions, CheckTransport, ClientOptions, DedupCounter, PolicyClient, QuotaTransport,
    ReportTransport,
};
use crate::config::{FilterConfig, PerRouteConfig};
use crate::context::{ClientContext, ServiceContext};
use crate::handler::{HttpRequestHandler, TcpRequestHandler};
use crate::obs::ControlMetrics;

#[derive(Clone, Default)]
pub struct ControllerOptions {
    pub config: FilterConfig,
    pub check_transport: Option<Arc<dyn CheckTransport>>,
    pub report_transport: Option<Arc<dyn ReportTransport>>,
    pub quota_transport: Option<Arc<dyn QuotaTransport>>,
}

#[derive(Clone)]
pub struct Controller {
    client: Arc<ClientContext>,
    services: Arc<DashMap<String, Arc<ServiceContext>>>,
}

impl Controller {
    pub fn new(options: ControllerOptions) -> Self {
        let ControllerOptions {
            config,
            check_transport,
            report_transport,
            quota_transport,
        } = options;

        let client = PolicyClient::new(ClientOptions {
            check_transport,
            report_transport,
            quota_transport,
            check_options: CheckOptions {
                network_fail_open: config.fail_open(),
            },
            dedup: DedupCounter::starting_at(config.quota_dedup_start),
        });

        Self {
            client: Arc::new(ClientContext::new(config, client)),
            services: Arc::new(DashMap::new()),
        }
    }

    pub fn client_context(&self) -> &Arc<ClientContext> {
        &self.client
    }

    pub fn metrics(&self) -> &Arc<ControlMetrics> {
        self.client.metrics()
    }

    /// Routes with a legacy config get a private context; others share one
    /// context per destination service.
    pub fn service_context(&self, route: &PerRouteConfig) -> Arc<ServiceContext> {
        if route.legacy.is_some() {
            return Arc::new(ServiceContext::new(Arc::clone(&self.client), route));
        }
        self.services
            .entry(route.destination_service.clone())
            .or_insert_with(|| Arc::new(ServiceContext::new(Arc::clone(&self.client), route)))
            .value()
            .clone()
    }

    pub fn create_http_request_handler(&self, route: &PerRouteConfig) -> HttpRequestHandler {
        HttpRequestHandler::new(self.service_context(route))
    }

    pub fn create_tcp_request_handler(&self, route: &PerRouteConfig) -> TcpRequestHandler {
        TcpRequestHandler::new(self.service_context(route))
    }
}
