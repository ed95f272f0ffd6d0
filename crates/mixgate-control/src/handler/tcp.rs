use std::sync::Arc;
use std::time::SystemTime;

use mixgate_core::{Attributes, Status};

use crate::adapter::{TcpCheckData, TcpReportData};
use crate::attribute_names as names;
use crate::client::{CancelHandle, DoneFunc};
use crate::context::ServiceContext;

use super::{add_endpoint, saturating_i64, CheckCode};

pub struct TcpRequestHandler {
    service: Arc<ServiceContext>,
    attributes: Attributes,
    check_code: CheckCode,
}

impl TcpRequestHandler {
    pub fn new(service: Arc<ServiceContext>) -> Self {
        Self {
            service,
            attributes: Attributes::new(),
            check_code: CheckCode::default(),
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn check_status_code(&self) -> i32 {
        self.check_code.get()
    }

    pub fn check(&mut self, data: &dyn TcpCheckData, on_done: DoneFunc) -> CancelHandle {
        self.attributes.merge(self.service.attributes());

        let mut b = self.attributes.builder();
        if let Some(ep) = data.source_ip_port() {
            add_endpoint(&mut b, names::SOURCE_IP, names::SOURCE_PORT, ep);
        }
        if let Some(user) = data.source_user() {
            b.add_string(names::SOURCE_USER, user);
        }
        b.add_timestamp(names::CONTEXT_TIME, SystemTime::now())
            .add_string(names::CONTEXT_PROTOCOL, "tcp");

        if self.service.client().config().disable_tcp_check_calls {
            self.service.client().skip("check", "tcp_disabled");
            on_done(Status::ok());
            return CancelHandle::noop();
        }
        if !self.service.enable_check() {
            self.service.client().skip("check", "disabled");
            on_done(Status::ok());
            return CancelHandle::noop();
        }

        self.service
            .client()
            .send_check(&self.attributes, None, self.check_code.recording(on_done))
    }

    pub fn report(&mut self, data: &dyn TcpReportData) {
        if !self.service.enable_report() {
            self.service.client().skip("report", "disabled");
            return;
        }
        if self.attributes.is_empty() {
            tracing::debug!("tcp report skipped, no attributes collected");
            self.service.client().skip("report", "empty");
            return;
        }

        let info = data.report_info();
        let received = saturating_i64(info.received_bytes);
        let sent = saturating_i64(info.sent_bytes);

        let mut b = self.attributes.builder();
        b.add_int64(names::CONNECTION_RECEIVED_BYTES, received)
            .add_int64(names::CONNECTION_RECEIVED_TOTAL_BYTES, received)
            .add_int64(names::CONNECTION_SENT_BYTES, sent)
            .add_int64(names::CONNECTION_SENT_TOTAL_BYTES, sent)
            .add_duration(names::CONNECTION_DURATION, info.duration)
            .add_int64(names::CHECK_STATUS, i64::from(self.check_code.get()));
        if let Some(ep) = data.destination_ip_port() {
            add_endpoint(&mut b, names::DESTINATION_IP, names::DESTINATION_PORT, ep);
        }
        b.add_timestamp(names::CONTEXT_TIME, SystemTime::now());

        self.service.client().send_report(&self.attributes);
    }
}
