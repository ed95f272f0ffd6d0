use std::sync::Arc;

use mixgate_core::Attributes;

use crate::config::PerRouteConfig;

use super::ClientContext;

/// Resolved per-route policy.
pub struct ServiceContext {
    client: Arc<ClientContext>,
    enable_check: bool,
    enable_report: bool,
    attributes: Attributes,
    forward_attributes: Attributes,
}

impl ServiceContext {
    pub fn new(client: Arc<ClientContext>, route: &PerRouteConfig) -> Self {
        let filter = client.config();
        let mut attributes = filter.attributes.clone();
        let mut forward_attributes = filter.forward_attributes.clone();

        let (enable_check, enable_report) = if let Some(legacy) = &route.legacy {
            attributes.merge(&legacy.attributes);
            (legacy.enable_check, legacy.enable_report)
        } else if let Some(svc) = filter.service(&route.destination_service) {
            attributes.merge(&svc.attributes);
            if !svc.forward_attributes.is_empty() {
                forward_attributes = svc.forward_attributes.clone();
            }
            (!svc.disable_check_calls, !svc.disable_report_calls)
        } else {
            (true, true)
        };

        tracing::debug!(
            service = %route.destination_service,
            enable_check,
            enable_report,
            legacy = route.legacy.is_some(),
            "service context resolved"
        );

        Self {
            client,
            enable_check,
            enable_report,
            attributes,
            forward_attributes,
        }
    }

    pub fn client(&self) -> &Arc<ClientContext> {
        &self.client
    }

    pub fn enable_check(&self) -> bool {
        self.enable_check
    }

    pub fn enable_report(&self) -> bool {
        self.enable_report
    }

    /// Static attributes merged into every request on this route.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn forward_attributes(&self) -> &Attributes {
        &self.forward_attributes
    }
}
